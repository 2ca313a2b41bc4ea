//! Critical path analysis over the whole task graph.
//!
//! Two derivations are available. The forward/backward pass yields full
//! ES/LS/slack timings and is authoritative for the critical set. The
//! accumulation pass only computes each task's tail length, which is all a
//! ranking policy needs.

mod accumulation;
mod calculation;
mod types;

pub use accumulation::accumulate_critical_times;
pub use calculation::calculate_critical_path;
pub use types::{CriticalPathError, CriticalPathMode, CriticalPathResult, TaskTiming};

use crate::graph::TaskGraph;
use crate::log_debug;

/// Runs one of the two analyses and optionally writes results back onto tasks.
#[derive(Clone, Copy, Debug, Default)]
pub struct CriticalPathAnalyzer {
    mode: CriticalPathMode,
    verbosity: u8,
}

impl CriticalPathAnalyzer {
    pub fn new(mode: CriticalPathMode) -> Self {
        Self { mode, verbosity: 0 }
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn mode(&self) -> CriticalPathMode {
        self.mode
    }

    pub fn analyze(&self, graph: &TaskGraph) -> Result<CriticalPathResult, CriticalPathError> {
        let result = match self.mode {
            CriticalPathMode::Topological => calculate_critical_path(graph)?,
            CriticalPathMode::Accumulation => accumulate_critical_times(graph)?,
        };
        log_debug!(
            self.verbosity,
            "Critical path ({:?}): length {} over {} of {} tasks",
            self.mode,
            result.critical_path_length,
            result.critical_tasks.len(),
            graph.len()
        );
        Ok(result)
    }

    /// Analyze and store critical times (and ES/LS when available) on each task.
    pub fn annotate(&self, graph: &mut TaskGraph) -> Result<CriticalPathResult, CriticalPathError> {
        let result = self.analyze(graph)?;
        for id in 0..graph.len() as u32 {
            let task = graph.task_mut(id);
            task.critical_time = result.critical_times[id as usize];
            if let Some(timing) = result.timings.get(id as usize) {
                task.earliest_start = timing.earliest_start;
                task.latest_start = timing.latest_start;
            }
        }
        Ok(result)
    }
}
