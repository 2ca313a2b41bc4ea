//! Priority classes and the rate-driven adaptive decider.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;

use crate::critical_path::CriticalPathResult;
use crate::graph::TaskId;
use crate::log_debug;

/// Lower sorts first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityClass {
    Critical,
    High,
    Low,
}

/// Classify every task once. Critical-path tasks are promoted regardless of
/// the predicate.
pub fn color_tasks(
    task_count: usize,
    is_high: impl Fn(TaskId) -> bool,
    critical: Option<&CriticalPathResult>,
) -> Vec<PriorityClass> {
    (0..task_count as TaskId)
        .map(|id| {
            if critical.is_some_and(|cp| cp.is_critical(id)) {
                PriorityClass::Critical
            } else if is_high(id) {
                PriorityClass::High
            } else {
                PriorityClass::Low
            }
        })
        .collect()
}

/// Whether `threshold` lies within the observed `[min, max]` of `values`.
pub fn threshold_in_range(values: &[f64], threshold: f64) -> bool {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    min <= threshold && threshold <= max
}

/// Blends class order into a natural order.
///
/// Each output slot is filled from the priority zone (ready tasks above
/// [`PriorityClass::Low`], Critical before High, natural order within a class)
/// with probability `rate`, otherwise with the first unclaimed task of the
/// natural order. Taking from the zone shrinks its window by one; the window
/// starts over at the head of the zone on every call.
#[derive(Debug)]
pub struct AdaptiveDecider {
    classes: Vec<PriorityClass>,
    rate: f64,
    shuffle_fallback: bool,
    rng: StdRng,
    verbosity: u8,
}

impl AdaptiveDecider {
    pub fn new(
        classes: Vec<PriorityClass>,
        rate: f64,
        shuffle_fallback: bool,
        seed: u64,
        verbosity: u8,
    ) -> Self {
        Self {
            classes,
            rate,
            shuffle_fallback,
            rng: StdRng::seed_from_u64(seed),
            verbosity,
        }
    }

    pub fn class_of(&self, task: TaskId) -> PriorityClass {
        self.classes
            .get(task as usize)
            .copied()
            .unwrap_or(PriorityClass::Low)
    }

    /// True when the threshold fell outside the observed range and decisions
    /// are uniform shuffles.
    pub fn is_fallback(&self) -> bool {
        self.shuffle_fallback
    }

    /// Order `natural` for dispatch. Repeated ids keep their first position.
    pub fn decide(&mut self, natural: &[TaskId]) -> Vec<TaskId> {
        let mut seen: FxHashSet<TaskId> =
            FxHashSet::with_capacity_and_hasher(natural.len(), Default::default());
        let natural: Vec<TaskId> = natural
            .iter()
            .copied()
            .filter(|&t| seen.insert(t))
            .collect();

        if self.shuffle_fallback {
            let mut shuffled = natural;
            shuffled.shuffle(&mut self.rng);
            log_debug!(
                self.verbosity,
                "  adaptive: threshold out of range, shuffled {} tasks",
                shuffled.len()
            );
            return shuffled;
        }

        let mut zone: Vec<TaskId> = natural
            .iter()
            .copied()
            .filter(|&t| self.class_of(t) != PriorityClass::Low)
            .collect();
        zone.sort_by_key(|&t| self.class_of(t));

        let mut claimed: FxHashSet<TaskId> =
            FxHashSet::with_capacity_and_hasher(natural.len(), Default::default());
        let mut result = Vec::with_capacity(natural.len());
        let mut window = 0;
        let mut cursor = 0;
        let mut promoted = 0;

        while result.len() < natural.len() {
            while window < zone.len() && claimed.contains(&zone[window]) {
                window += 1;
            }
            while claimed.contains(&natural[cursor]) {
                cursor += 1;
            }

            let pick = if window < zone.len() && self.rng.random_bool(self.rate) {
                promoted += 1;
                zone[window]
            } else {
                natural[cursor]
            };
            claimed.insert(pick);
            result.push(pick);
        }

        log_debug!(
            self.verbosity,
            "  adaptive: zone {} of {}, {} slots promoted",
            zone.len(),
            natural.len(),
            promoted
        );
        result
    }
}
