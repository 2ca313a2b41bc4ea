//! Configuration types for the simulator and scheduling policies.

use crate::algorithm::{AlgorithmError, AlgorithmKind};
use crate::logging::clamp_verbosity;
use crate::sorting::TaskAttribute;

/// Configuration for one simulation run.
#[derive(Clone, Debug, Default)]
pub struct SimulationConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
    /// Record a processor timeline and print it when the run ends.
    pub illustrate: bool,
}

impl SimulationConfig {
    pub fn verbose(verbosity: u8) -> Self {
        Self {
            verbosity: clamp_verbosity(verbosity),
            ..Self::default()
        }
    }
}

/// Policy selection and mode flags. Fields a policy has no use for are
/// ignored by it.
#[derive(Clone, Debug)]
pub struct AlgorithmConfig {
    /// Policy name, e.g. "greedy", "out_degrees_first", "from_critical_path".
    pub strategy: String,
    /// Precompute a total order once and replay it.
    pub offline: bool,
    /// Blend the priority-class order with the natural order.
    pub adaptive: bool,
    /// Promote critical-path tasks to the highest priority class.
    pub critical: bool,
    /// Classification threshold on the decide attribute. Required when adaptive.
    pub threshold: Option<f64>,
    /// Attribute to classify by. Defaults to the policy's own ordering key.
    pub decide_attribute: Option<TaskAttribute>,
    /// Probability in [0, 1] that a dispatch slot is filled from the
    /// higher-priority zone.
    pub priority_rate: f64,
    pub seed: u64,
    pub verbosity: u8,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            strategy: "greedy".to_string(),
            offline: false,
            adaptive: false,
            critical: false,
            threshold: None,
            decide_attribute: None,
            priority_rate: 1.0,
            seed: 0,
            verbosity: 0,
        }
    }
}

impl AlgorithmConfig {
    pub fn new(strategy: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            ..Self::default()
        }
    }

    /// Switch on adaptive mode with the given threshold and rate.
    pub fn with_adaptive(mut self, threshold: f64, priority_rate: f64) -> Self {
        self.adaptive = true;
        self.threshold = Some(threshold);
        self.priority_rate = priority_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn kind(&self) -> Result<AlgorithmKind, AlgorithmError> {
        self.strategy.parse()
    }

    pub fn validate(&self) -> Result<(), AlgorithmError> {
        self.kind()?;
        self.validate_modes()
    }

    /// Checks everything except the strategy name.
    pub fn validate_modes(&self) -> Result<(), AlgorithmError> {
        if !(0.0..=1.0).contains(&self.priority_rate) {
            return Err(AlgorithmError::InvalidConfig(format!(
                "priority_rate must be within [0, 1], got {}",
                self.priority_rate
            )));
        }
        match self.threshold {
            Some(threshold) if !threshold.is_finite() => Err(AlgorithmError::InvalidConfig(
                format!("threshold must be finite, got {threshold}"),
            )),
            None if self.adaptive => Err(AlgorithmError::InvalidConfig(
                "adaptive mode requires a threshold".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Grid for threshold × rate sweeps.
#[derive(Clone, Debug)]
pub struct SweepConfig {
    pub rates: Vec<f64>,
    /// Bisection depth for candidate thresholds.
    pub depth: u32,
    pub seed: u64,
    pub verbosity: u8,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            rates: vec![0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
            depth: 3,
            seed: 0,
            verbosity: 0,
        }
    }
}
