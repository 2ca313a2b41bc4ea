//! Python bindings over the JSON load contract.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::algorithm::build_algorithm;
use crate::config::{AlgorithmConfig, SimulationConfig};
use crate::critical_path::{calculate_critical_path, CriticalPathAnalyzer, CriticalPathMode};
use crate::graph::TaskGraph;
use crate::simulator::Simulator;
use crate::sorting::TaskAttribute;
use crate::threshold::ThresholdFinder;

fn value_error(e: impl ToString) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Algorithm configuration (PyO3 wrapper).
#[pyclass(name = "AlgorithmConfig")]
#[derive(Clone, Debug)]
pub struct PyAlgorithmConfig {
    #[pyo3(get, set)]
    pub strategy: String,
    #[pyo3(get, set)]
    pub offline: bool,
    #[pyo3(get, set)]
    pub adaptive: bool,
    #[pyo3(get, set)]
    pub critical: bool,
    #[pyo3(get, set)]
    pub threshold: Option<f64>,
    #[pyo3(get, set)]
    pub decide_attribute: Option<String>,
    #[pyo3(get, set)]
    pub priority_rate: f64,
    #[pyo3(get, set)]
    pub seed: u64,
    #[pyo3(get, set)]
    pub verbosity: u8,
}

#[pymethods]
impl PyAlgorithmConfig {
    #[new]
    #[pyo3(signature = (
        strategy="greedy".to_string(),
        offline=false,
        adaptive=false,
        critical=false,
        threshold=None,
        decide_attribute=None,
        priority_rate=1.0,
        seed=0,
        verbosity=0
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        strategy: String,
        offline: bool,
        adaptive: bool,
        critical: bool,
        threshold: Option<f64>,
        decide_attribute: Option<String>,
        priority_rate: f64,
        seed: u64,
        verbosity: u8,
    ) -> Self {
        Self {
            strategy,
            offline,
            adaptive,
            critical,
            threshold,
            decide_attribute,
            priority_rate,
            seed,
            verbosity,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "AlgorithmConfig(strategy={:?}, offline={}, adaptive={}, critical={}, \
             threshold={:?}, priority_rate={})",
            self.strategy,
            self.offline,
            self.adaptive,
            self.critical,
            self.threshold,
            self.priority_rate
        )
    }
}

impl PyAlgorithmConfig {
    fn to_config(&self) -> PyResult<AlgorithmConfig> {
        let decide_attribute = self
            .decide_attribute
            .as_deref()
            .map(str::parse::<TaskAttribute>)
            .transpose()
            .map_err(value_error)?;
        let config = AlgorithmConfig {
            strategy: self.strategy.clone(),
            offline: self.offline,
            adaptive: self.adaptive,
            critical: self.critical,
            threshold: self.threshold,
            decide_attribute,
            priority_rate: self.priority_rate,
            seed: self.seed,
            verbosity: self.verbosity,
        };
        config.validate().map_err(value_error)?;
        Ok(config)
    }
}

/// Simulate a JSON graph and return `(total_busy_time, makespan)`.
///
/// # Raises
/// * ValueError on a malformed graph, an unknown strategy, or a run that
///   cannot finish
#[pyfunction]
#[pyo3(signature = (graph_json, config=None, illustrate=false))]
fn simulate(
    graph_json: &str,
    config: Option<PyAlgorithmConfig>,
    illustrate: bool,
) -> PyResult<(f64, f64)> {
    let graph = TaskGraph::from_json(graph_json).map_err(value_error)?;
    let config = match config {
        Some(config) => config.to_config()?,
        None => AlgorithmConfig::default(),
    };
    let mut algorithm = build_algorithm(&config, &graph).map_err(value_error)?;

    let sim_config = SimulationConfig {
        verbosity: config.verbosity,
        illustrate,
    };
    let mut simulator = Simulator::new(graph, sim_config).map_err(value_error)?;
    let result = simulator.start(algorithm.as_mut()).map_err(value_error)?;
    Ok(result.metrics())
}

/// Critical task names and the critical path length of a JSON graph.
#[pyfunction]
fn critical_path(graph_json: &str) -> PyResult<(Vec<String>, f64)> {
    let graph = TaskGraph::from_json(graph_json).map_err(value_error)?;
    let result = calculate_critical_path(&graph).map_err(value_error)?;
    let names = result
        .critical_names(&graph)
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok((names, result.critical_path_length))
}

/// Bisection thresholds over one task attribute of a JSON graph.
#[pyfunction]
#[pyo3(signature = (graph_json, attribute="duration", depth=3))]
fn find_thresholds(graph_json: &str, attribute: &str, depth: u32) -> PyResult<Vec<f64>> {
    let mut graph = TaskGraph::from_json(graph_json).map_err(value_error)?;
    let attribute: TaskAttribute = attribute.parse().map_err(value_error)?;
    if attribute == TaskAttribute::CriticalTime {
        CriticalPathAnalyzer::new(CriticalPathMode::Accumulation)
            .annotate(&mut graph)
            .map_err(value_error)?;
    }
    Ok(ThresholdFinder::new(attribute).find(&graph, depth))
}

/// The tasksim.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyAlgorithmConfig>()?;

    m.add_function(wrap_pyfunction!(simulate, m)?)?;
    m.add_function(wrap_pyfunction!(critical_path, m)?)?;
    m.add_function(wrap_pyfunction!(find_thresholds, m)?)?;

    Ok(())
}
