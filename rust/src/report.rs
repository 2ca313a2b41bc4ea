//! Threshold sweeps and algorithm comparisons over a workload of graphs.
//!
//! Every run gets a fresh clone of its graph, so one [`ReportContext`] can
//! feed any number of sweeps.

use rustc_hash::FxHashMap;
use std::fmt;
use thiserror::Error;

use crate::algorithm::{build_algorithm, AlgorithmError};
use crate::config::{AlgorithmConfig, SimulationConfig, SweepConfig};
use crate::graph::TaskGraph;
use crate::log_changes;
use crate::models::SimulationResult;
use crate::simulator::{SimulationError, Simulator};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Workload contains no graphs")]
    EmptyWorkload,
    #[error("Duplicate graph name in workload: {0}")]
    DuplicateGraph(String),
    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Named graphs of a workload. The insertion index of a graph is its report
/// column.
#[derive(Clone, Debug, Default)]
pub struct ReportContext {
    graphs: Vec<(String, TaskGraph)>,
    columns: FxHashMap<String, usize>,
}

impl ReportContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_graph(&mut self, name: &str, graph: TaskGraph) -> Result<usize, ReportError> {
        if self.columns.contains_key(name) {
            return Err(ReportError::DuplicateGraph(name.to_string()));
        }
        let column = self.graphs.len();
        self.columns.insert(name.to_string(), column);
        self.graphs.push((name.to_string(), graph));
        Ok(column)
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graphs.iter().map(|(name, _)| name.as_str())
    }

    pub fn graphs(&self) -> &[(String, TaskGraph)] {
        &self.graphs
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

/// Build `config`'s algorithm for `graph` and run it once on a copy.
pub fn run_once(
    graph: &TaskGraph,
    config: &AlgorithmConfig,
    verbosity: u8,
) -> Result<SimulationResult, ReportError> {
    let mut algorithm = build_algorithm(config, graph)?;
    let mut simulator = Simulator::new(graph.clone(), SimulationConfig::verbose(verbosity))?;
    Ok(simulator.start(algorithm.as_mut())?)
}

fn average_makespan(
    context: &ReportContext,
    config: &AlgorithmConfig,
    verbosity: u8,
) -> Result<f64, ReportError> {
    if context.is_empty() {
        return Err(ReportError::EmptyWorkload);
    }
    let mut total = 0.0;
    for (_, graph) in context.graphs() {
        total += run_once(graph, config, verbosity)?.makespan;
    }
    Ok(total / context.len() as f64)
}

/// `value / baseline`, treating an all-zero pair as parity.
fn ratio(value: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        if value == 0.0 {
            1.0
        } else {
            f64::INFINITY
        }
    } else {
        value / baseline
    }
}

/// Row label such as `max_runtime_first+adaptive`.
pub fn algorithm_label(config: &AlgorithmConfig) -> String {
    let mut label = config
        .kind()
        .map(|kind| kind.name().to_string())
        .unwrap_or_else(|_| config.strategy.clone());
    for (enabled, suffix) in [
        (config.offline, "+offline"),
        (config.adaptive, "+adaptive"),
        (config.critical, "+critical"),
    ] {
        if enabled {
            label.push_str(suffix);
        }
    }
    label
}

/// Average makespan for every (threshold, rate) cell of one policy.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepTable {
    pub algorithm: String,
    /// Row headers.
    pub thresholds: Vec<f64>,
    /// Column headers.
    pub rates: Vec<f64>,
    /// `makespans[row][column]`
    pub makespans: Vec<Vec<f64>>,
    /// Average Greedy makespan over the same workload.
    pub baseline: f64,
}

impl SweepTable {
    /// Every cell divided by the Greedy baseline.
    pub fn ratios(&self) -> Vec<Vec<f64>> {
        self.makespans
            .iter()
            .map(|row| row.iter().map(|&m| ratio(m, self.baseline)).collect())
            .collect()
    }

    /// `(threshold, rate, makespan)` of the smallest cell.
    pub fn best(&self) -> Option<(f64, f64, f64)> {
        self.makespans
            .iter()
            .enumerate()
            .flat_map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(move |(column, &makespan)| (row, column, makespan))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(row, column, makespan)| (self.thresholds[row], self.rates[column], makespan))
    }
}

impl fmt::Display for SweepTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (greedy {})", self.algorithm, self.baseline)?;
        writeln!(f)?;
        write!(f, "threshold\\rate")?;
        for rate in &self.rates {
            write!(f, "\t{rate}")?;
        }
        writeln!(f)?;
        for (threshold, row) in self.thresholds.iter().zip(&self.makespans) {
            write!(f, "{threshold}")?;
            for makespan in row {
                write!(f, "\t{makespan}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Candidate thresholds for `config`'s policy, bisected over the first graph
/// of the workload. Sorted and de-duplicated.
pub fn candidate_thresholds(
    context: &ReportContext,
    config: &AlgorithmConfig,
    depth: u32,
) -> Result<Vec<f64>, ReportError> {
    let (_, graph) = context.graphs().first().ok_or(ReportError::EmptyWorkload)?;
    let probe = AlgorithmConfig {
        adaptive: false,
        ..config.clone()
    };
    let algorithm = build_algorithm(&probe, graph)?;
    let mut thresholds = algorithm.find_thresholds(graph, depth);
    thresholds.sort_by(f64::total_cmp);
    thresholds.dedup();
    Ok(thresholds)
}

/// Run `config`'s policy in adaptive mode over every threshold and rate.
pub fn sweep_thresholds(
    context: &ReportContext,
    config: &AlgorithmConfig,
    thresholds: &[f64],
    sweep: &SweepConfig,
) -> Result<SweepTable, ReportError> {
    let baseline = average_makespan(context, &AlgorithmConfig::new("greedy"), sweep.verbosity)?;

    let mut makespans = Vec::with_capacity(thresholds.len());
    for &threshold in thresholds {
        let mut row = Vec::with_capacity(sweep.rates.len());
        for &rate in &sweep.rates {
            let cell_config = config
                .clone()
                .with_adaptive(threshold, rate)
                .with_seed(sweep.seed);
            let makespan = average_makespan(context, &cell_config, sweep.verbosity)?;
            log_changes!(
                sweep.verbosity,
                "{}: threshold {} rate {} -> {}",
                config.strategy,
                threshold,
                rate,
                makespan
            );
            row.push(makespan);
        }
        makespans.push(row);
    }

    Ok(SweepTable {
        algorithm: algorithm_label(config),
        thresholds: thresholds.to_vec(),
        rates: sweep.rates.clone(),
        makespans,
        baseline,
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonRow {
    pub algorithm: String,
    /// One cell per workload graph, in column order.
    pub makespans: Vec<f64>,
}

impl ComparisonRow {
    pub fn average(&self) -> f64 {
        if self.makespans.is_empty() {
            return 0.0;
        }
        self.makespans.iter().sum::<f64>() / self.makespans.len() as f64
    }
}

/// Makespan per (algorithm, graph).
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonReport {
    pub columns: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonReport {
    pub fn row(&self, algorithm: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.algorithm == algorithm)
    }

    /// Every row divided cell-by-cell by the `baseline` row.
    pub fn ratios_to(&self, baseline: &str) -> Option<Vec<ComparisonRow>> {
        let base = self.row(baseline)?;
        Some(
            self.rows
                .iter()
                .map(|row| ComparisonRow {
                    algorithm: row.algorithm.clone(),
                    makespans: row
                        .makespans
                        .iter()
                        .zip(&base.makespans)
                        .map(|(&m, &b)| ratio(m, b))
                        .collect(),
                })
                .collect(),
        )
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "algorithm")?;
        for column in &self.columns {
            write!(f, "\t{column}")?;
        }
        writeln!(f, "\taverage")?;
        for row in &self.rows {
            write!(f, "{}", row.algorithm)?;
            for makespan in &row.makespans {
                write!(f, "\t{makespan}")?;
            }
            writeln!(f, "\t{}", row.average())?;
        }
        Ok(())
    }
}

pub fn compare_algorithms(
    context: &ReportContext,
    configs: &[AlgorithmConfig],
    verbosity: u8,
) -> Result<ComparisonReport, ReportError> {
    if context.is_empty() {
        return Err(ReportError::EmptyWorkload);
    }

    let mut rows = Vec::with_capacity(configs.len());
    for config in configs {
        let mut makespans = Vec::with_capacity(context.len());
        for (_, graph) in context.graphs() {
            makespans.push(run_once(graph, config, verbosity)?.makespan);
        }
        rows.push(ComparisonRow {
            algorithm: algorithm_label(config),
            makespans,
        });
    }

    Ok(ComparisonReport {
        columns: context.names().map(str::to_string).collect(),
        rows,
    })
}
