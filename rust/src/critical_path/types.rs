//! Types for critical path analysis.

use crate::graph::{TaskGraph, TaskId};
use crate::topology::TopologyError;

const EPSILON: f64 = 1e-9;

/// Float equality with a tolerance scaled to the operands.
pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// How critical times are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CriticalPathMode {
    /// Forward/backward pass (ES/LS/slack). Authoritative critical set.
    #[default]
    Topological,
    /// Reverse-topological accumulation of tail lengths only. Cheaper, used
    /// for ranking.
    Accumulation,
}

/// Per-task timing information from the forward and backward passes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskTiming {
    /// Earliest possible start time (from forward pass).
    pub earliest_start: f64,
    /// Earliest possible finish time (from forward pass).
    pub earliest_finish: f64,
    /// Latest allowable start time (from backward pass).
    pub latest_start: f64,
    /// Latest allowable finish time (from backward pass).
    pub latest_finish: f64,
    /// Slack = latest_start - earliest_start.
    pub slack: f64,
}

impl TaskTiming {
    pub fn is_critical(&self) -> bool {
        // Allow small epsilon for floating point comparison
        self.slack.abs() < EPSILON * self.latest_finish.abs().max(1.0)
    }
}

/// Error types for critical path analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriticalPathError {
    CycleDetected { task: String },
}

impl std::fmt::Display for CriticalPathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriticalPathError::CycleDetected { task } => {
                write!(f, "Circular dependency detected in task graph at {task}")
            }
        }
    }
}

impl std::error::Error for CriticalPathError {}

impl From<TopologyError> for CriticalPathError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::CycleDetected { task } => CriticalPathError::CycleDetected { task },
        }
    }
}

/// Result of a whole-graph critical path analysis. Every per-task vector is
/// indexed by [`TaskId`].
#[derive(Clone, Debug, Default)]
pub struct CriticalPathResult {
    pub mode: CriticalPathMode,
    /// Longest duration-weighted chain starting at each task, inclusive.
    pub critical_times: Vec<f64>,
    /// ES/LS timings. Empty in accumulation mode.
    pub timings: Vec<TaskTiming>,
    /// Tasks on some longest path, in topological order.
    pub critical_tasks: Vec<TaskId>,
    /// Length of the longest path (lower bound on any makespan).
    pub critical_path_length: f64,
    /// Sum of all task durations.
    pub total_work: f64,
    pub(crate) on_path: Vec<bool>,
}

impl CriticalPathResult {
    pub fn is_critical(&self, task: TaskId) -> bool {
        self.on_path.get(task as usize).copied().unwrap_or(false)
    }

    pub fn critical_time(&self, task: TaskId) -> f64 {
        self.critical_times
            .get(task as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// Every task by descending critical time. Ties keep insertion order.
    pub fn priority_order(&self) -> Vec<TaskId> {
        let mut order: Vec<TaskId> = (0..self.critical_times.len() as TaskId).collect();
        order.sort_by(|&a, &b| {
            self.critical_times[b as usize].total_cmp(&self.critical_times[a as usize])
        });
        order
    }

    pub fn critical_names<'g>(&self, graph: &'g TaskGraph) -> Vec<&'g str> {
        self.critical_tasks.iter().map(|&t| graph.name(t)).collect()
    }
}
