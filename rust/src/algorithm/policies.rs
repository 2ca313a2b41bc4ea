//! Concrete ordering policies.

use crate::critical_path::CriticalPathMode;
use crate::sorting::{SortDirection, TaskAttribute};

/// A policy's ordering key and mode requirements.
pub trait OrderingPolicy {
    fn name(&self) -> &'static str;

    /// Attribute and preferred direction, or `None` to keep input order.
    fn key(&self) -> Option<(TaskAttribute, SortDirection)>;

    fn requires_offline(&self) -> bool {
        false
    }

    /// Analysis used when the key is [`TaskAttribute::CriticalTime`].
    fn critical_path_mode(&self) -> CriticalPathMode {
        CriticalPathMode::Topological
    }
}

/// Input order unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Greedy;

impl OrderingPolicy for Greedy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn key(&self) -> Option<(TaskAttribute, SortDirection)> {
        None
    }
}

/// Tasks unblocking the most successors first.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutDegreesFirst;

impl OrderingPolicy for OutDegreesFirst {
    fn name(&self) -> &'static str {
        "out_degrees_first"
    }

    fn key(&self) -> Option<(TaskAttribute, SortDirection)> {
        Some((TaskAttribute::OutDegree, SortDirection::Descending))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OutDegreesLast;

impl OrderingPolicy for OutDegreesLast {
    fn name(&self) -> &'static str {
        "out_degrees_last"
    }

    fn key(&self) -> Option<(TaskAttribute, SortDirection)> {
        Some((TaskAttribute::OutDegree, SortDirection::Ascending))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MinRuntimeFirst;

impl OrderingPolicy for MinRuntimeFirst {
    fn name(&self) -> &'static str {
        "min_runtime_first"
    }

    fn key(&self) -> Option<(TaskAttribute, SortDirection)> {
        Some((TaskAttribute::Duration, SortDirection::Ascending))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MaxRuntimeFirst;

impl OrderingPolicy for MaxRuntimeFirst {
    fn name(&self) -> &'static str {
        "max_runtime_first"
    }

    fn key(&self) -> Option<(TaskAttribute, SortDirection)> {
        Some((TaskAttribute::Duration, SortDirection::Descending))
    }
}

/// Longest remaining chain first, always replayed from a precomputed order.
#[derive(Clone, Copy, Debug)]
pub struct FromCriticalPath {
    mode: CriticalPathMode,
}

impl FromCriticalPath {
    pub fn new(mode: CriticalPathMode) -> Self {
        Self { mode }
    }
}

impl Default for FromCriticalPath {
    fn default() -> Self {
        Self::new(CriticalPathMode::Accumulation)
    }
}

impl OrderingPolicy for FromCriticalPath {
    fn name(&self) -> &'static str {
        "from_critical_path"
    }

    fn key(&self) -> Option<(TaskAttribute, SortDirection)> {
        Some((TaskAttribute::CriticalTime, SortDirection::Descending))
    }

    fn requires_offline(&self) -> bool {
        true
    }

    fn critical_path_mode(&self) -> CriticalPathMode {
        self.mode
    }
}
