//! Scheduling algorithms.
//!
//! A policy ([`OrderingPolicy`]) only names its ordering key. The shared
//! machinery lives in [`PolicyScheduler`]: value tables built at
//! construction, offline replay of a precomputed order, and the optional
//! [`AdaptiveDecider`] that blends priority classes into the natural order.

mod adaptive;
mod factory;
mod policies;
mod scheduler;

pub use adaptive::{color_tasks, threshold_in_range, AdaptiveDecider, PriorityClass};
pub use factory::{build_algorithm, AlgorithmKind};
pub use policies::{
    FromCriticalPath, Greedy, MaxRuntimeFirst, MinRuntimeFirst, OrderingPolicy, OutDegreesFirst,
    OutDegreesLast,
};
pub use scheduler::{replay, AlgorithmView, PolicyScheduler};

use thiserror::Error;

use crate::critical_path::CriticalPathError;
use crate::graph::{ProcessorId, TaskGraph, TaskId};

#[derive(Error, Debug)]
pub enum AlgorithmError {
    #[error("Unknown scheduling strategy: {0}")]
    UnknownStrategy(String),
    #[error("Invalid algorithm configuration: {0}")]
    InvalidConfig(String),
    #[error("Critical path analysis failed: {0}")]
    CriticalPath(#[from] CriticalPathError),
}

/// What the simulator needs from a scheduling policy.
pub trait SchedulingAlgorithm {
    fn name(&self) -> &str;

    /// Offline algorithms get [`SchedulingAlgorithm::calculate`] called once
    /// before the first dispatch.
    fn is_offline(&self) -> bool;

    /// Refresh the view before a decision.
    fn update_lists(&mut self, idle: &[ProcessorId], ready: &[TaskId], all: &[TaskId]);

    /// Precompute a total order over every task of the graph.
    fn calculate(&mut self, graph: &TaskGraph) -> Vec<TaskId>;

    /// Order the current ready list, most preferred first.
    ///
    /// The result is always a permutation of the ready list.
    fn decide(&mut self, graph: &TaskGraph) -> Vec<TaskId>;

    /// Candidate thresholds over the attribute this algorithm classifies by.
    fn find_thresholds(&self, graph: &TaskGraph, depth: u32) -> Vec<f64>;
}
