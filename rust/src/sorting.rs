//! Selectable task attributes and stable ordering helpers.
//!
//! Policies pick an attribute once at construction; every comparison after
//! that goes through a precomputed value table, so ordering a ready list is a
//! stable sort over `f64` keys with `total_cmp`.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::graph::{Task, TaskId};

/// Errors that can occur while parsing sort settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortingError {
    UnknownAttribute(String),
    UnknownDirection(String),
}

impl std::fmt::Display for SortingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAttribute(s) => write!(f, "Unknown task attribute: {}", s),
            Self::UnknownDirection(s) => write!(f, "Unknown sort direction: {}", s),
        }
    }
}

impl std::error::Error for SortingError {}

/// A task attribute a policy can order or classify by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskAttribute {
    Duration,
    /// `len(blocking)`
    OutDegree,
    InDegree,
    Priority,
    /// Tail length from critical path analysis. Zero until annotated.
    CriticalTime,
}

impl TaskAttribute {
    pub fn extract(self, task: &Task) -> f64 {
        match self {
            Self::Duration => task.duration,
            Self::OutDegree => task.out_degree() as f64,
            Self::InDegree => task.in_degree() as f64,
            Self::Priority => f64::from(task.priority),
            Self::CriticalTime => task.critical_time,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::OutDegree => "out_degree",
            Self::InDegree => "in_degree",
            Self::Priority => "priority",
            Self::CriticalTime => "critical_time",
        }
    }
}

impl std::fmt::Display for TaskAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskAttribute {
    type Err = SortingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duration" | "runtime" => Ok(Self::Duration),
            "out_degree" | "blocking" => Ok(Self::OutDegree),
            "in_degree" | "blocked_by" => Ok(Self::InDegree),
            "priority" => Ok(Self::Priority),
            "critical_time" => Ok(Self::CriticalTime),
            _ => Err(SortingError::UnknownAttribute(s.to_string())),
        }
    }
}

/// Which end of an attribute's range is preferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Ordering that puts preferred values first.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        match self {
            Self::Ascending => a.total_cmp(&b),
            Self::Descending => b.total_cmp(&a),
        }
    }

    /// Whether `value` is strictly on the preferred side of `threshold`.
    pub fn prefers(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Ascending => value < threshold,
            Self::Descending => value > threshold,
        }
    }
}

impl FromStr for SortDirection {
    type Err = SortingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(SortingError::UnknownDirection(s.to_string())),
        }
    }
}

/// Stable sort of task ids by a per-task value table indexed by [`TaskId`].
pub fn sort_by_values(tasks: &mut [TaskId], values: &[f64], direction: SortDirection) {
    tasks.sort_by(|&a, &b| direction.compare(values[a as usize], values[b as usize]));
}

/// Index of the first task in an already sorted list that is not strictly
/// preferred over `threshold`.
pub fn split_point(
    sorted: &[TaskId],
    values: &[f64],
    direction: SortDirection,
    threshold: f64,
) -> usize {
    sorted.partition_point(|&t| direction.prefers(values[t as usize], threshold))
}
