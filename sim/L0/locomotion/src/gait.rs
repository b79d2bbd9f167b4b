//! Gait detection over quantized footprint sequences.
//!
//! A gait is a short footprint sequence that keeps coming back at a regular
//! interval. Candidate sequences of every length in `[min_len, max_len]` are
//! grouped by content, occurrences inside a group are made non-overlapping,
//! and the interval between consecutive occurrences (start to start) decides
//! which groups are periodic: a group is kept when its most common interval
//! equals the most common interval across all groups.

use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::footprint::Footprint;

/// Resolution used to compare intervals.
const INTERVAL_RESOLUTION: f64 = 1e-6;

/// A recurring footprint sequence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gait {
    /// The repeating sequence.
    pub footprints: Vec<Footprint>,
    /// Most common start-to-start interval between occurrences.
    pub mode_interval: f64,
    /// Mean fraction of each interval covered by the occurrence that opens
    /// it.
    pub coverage: f64,
    /// Total time spanned by the occurrences.
    pub duration: f64,
    /// Fraction of intervals equal to `mode_interval`.
    pub purity: f64,
    /// `(start, end)` time of each occurrence.
    pub occurrences: Vec<(f64, f64)>,
}

impl Gait {
    /// Number of footprints in one cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    /// Whether the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// Average touching slices per footprint.
    #[must_use]
    pub fn avg_touch_area(&self) -> f64 {
        if self.footprints.is_empty() {
            return 0.0;
        }
        let total: usize = self.footprints.iter().map(Footprint::count_touching).sum();
        total as f64 / self.footprints.len() as f64
    }

    /// Ordering used to pick the main gait: longer duration first, then
    /// higher purity, then higher coverage, then the smallest sequence.
    fn rank(&self, other: &Self) -> std::cmp::Ordering {
        other
            .duration
            .total_cmp(&self.duration)
            .then_with(|| other.purity.total_cmp(&self.purity))
            .then_with(|| other.coverage.total_cmp(&self.coverage))
            .then_with(|| self.footprints.cmp(&other.footprints))
    }
}

fn quantize_interval(interval: f64) -> i64 {
    (interval / INTERVAL_RESOLUTION).round() as i64
}

/// Most common value; ties go to the smallest.
fn mode(values: &[i64]) -> Option<i64> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for v in values {
        *counts.entry(*v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
        .map(|(v, _)| v)
}

struct Group {
    footprints: Vec<Footprint>,
    occurrences: Vec<(f64, f64)>,
    intervals: Vec<i64>,
}

/// Detect gaits in a time-sorted sequence of quantized footprints.
///
/// `interval` is the bucket width used for quantization; an occurrence
/// starting at bucket `i` of length `l` spans `[t_i, t_{i+l-1} + interval]`.
/// Gaits are returned best first (see [`main_gait`]).
#[must_use]
pub fn compute_gaits(
    footprints: &[(f64, Footprint)],
    min_len: usize,
    max_len: usize,
    interval: f64,
) -> Vec<Gait> {
    let min_len = min_len.max(1);
    let mut groups: HashMap<Vec<Footprint>, Vec<(f64, f64)>> = HashMap::new();
    for len in min_len..=max_len.min(footprints.len()) {
        for window in footprints.windows(len) {
            let key: Vec<Footprint> = window.iter().map(|(_, f)| f.clone()).collect();
            let start = window[0].0;
            let end = window[len - 1].0 + interval;
            let occurrences = groups.entry(key).or_default();
            // Windows arrive in time order, so the last kept one is the only
            // possible overlap.
            if occurrences.last().map_or(true, |(_, last_end)| start >= last_end - INTERVAL_RESOLUTION) {
                occurrences.push((start, end));
            }
        }
    }
    let groups: Vec<Group> = groups
        .into_iter()
        .filter(|(_, occurrences)| occurrences.len() >= 2)
        .map(|(footprints, occurrences)| {
            let intervals = occurrences
                .windows(2)
                .map(|w| quantize_interval(w[1].0 - w[0].0))
                .collect();
            Group {
                footprints,
                occurrences,
                intervals,
            }
        })
        .collect();

    let all: Vec<i64> = groups.iter().flat_map(|g| g.intervals.iter().copied()).collect();
    let Some(global_mode) = mode(&all) else {
        return Vec::new();
    };

    let mut gaits: Vec<Gait> = groups
        .into_iter()
        .filter(|g| mode(&g.intervals) == Some(global_mode))
        .map(|g| {
            let pure = g.intervals.iter().filter(|i| **i == global_mode).count();
            let purity = pure as f64 / g.intervals.len() as f64;
            let duration: f64 = g.occurrences.iter().map(|(s, e)| e - s).sum();
            let coverage = g
                .occurrences
                .windows(2)
                .map(|w| {
                    let gap = w[1].0 - w[0].0;
                    if gap > 0.0 {
                        ((w[0].1 - w[0].0) / gap).min(1.0)
                    } else {
                        1.0
                    }
                })
                .sum::<f64>()
                / (g.occurrences.len() - 1) as f64;
            Gait {
                footprints: g.footprints,
                mode_interval: global_mode as f64 * INTERVAL_RESOLUTION,
                coverage,
                duration,
                purity,
                occurrences: g.occurrences,
            }
        })
        .collect();
    gaits.sort_by(Gait::rank);
    gaits
}

/// Best gait among `gaits`: longest duration, then highest purity, then
/// highest coverage, then the lexicographically smallest sequence.
#[must_use]
pub fn main_gait(gaits: &[Gait]) -> Option<&Gait> {
    gaits.iter().min_by(|a, b| a.rank(b))
}
