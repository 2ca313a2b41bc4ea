//! Discrete-event simulation of DAG task scheduling on typed processors.
//!
//! A [`TaskGraph`] holds tasks, their blocking edges and a processor pool.
//! The [`Simulator`] advances simulated time from one task completion to the
//! next and, at every step, asks a [`SchedulingAlgorithm`] to order the ready
//! list before matching it against idle processors of the right type.
//!
//! Policies range from Greedy (ready-list order) through attribute sorts to
//! critical-path priority, each optionally replayed offline or blended with
//! priority classes by the adaptive decider. The [`report`] module sweeps
//! thresholds and rates over a workload of graphs.

pub mod algorithm;
pub mod config;
pub mod critical_path;
pub mod graph;
pub mod interner;
pub mod logging;
pub mod models;
pub mod report;
pub mod simulator;
pub mod sorting;
pub mod threshold;
pub mod topology;

#[cfg(feature = "python")]
mod python;

pub use algorithm::{
    build_algorithm, AlgorithmError, AlgorithmKind, PolicyScheduler, SchedulingAlgorithm,
};
pub use config::{AlgorithmConfig, SimulationConfig, SweepConfig};
pub use critical_path::{
    calculate_critical_path, CriticalPathAnalyzer, CriticalPathError, CriticalPathMode,
    CriticalPathResult,
};
pub use graph::{GraphError, Processor, ProcessorId, ProcessorType, Task, TaskGraph, TaskId};
pub use models::{GraphSpec, ScheduledTask, SimulationResult, TaskSpec};
pub use report::{ReportContext, ReportError};
pub use simulator::{SimulationError, Simulator, Timeline, TimelineSink};
pub use sorting::{SortDirection, TaskAttribute};
pub use threshold::{bucket_counts, find_thresholds, ThresholdFinder};
pub use topology::{topological_order, TopologyError};
