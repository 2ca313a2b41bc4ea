//! Policy lookup by name.

use std::fmt;
use std::str::FromStr;

use crate::config::AlgorithmConfig;
use crate::graph::TaskGraph;

use super::policies::{
    FromCriticalPath, Greedy, MaxRuntimeFirst, MinRuntimeFirst, OutDegreesFirst, OutDegreesLast,
};
use super::scheduler::PolicyScheduler;
use super::{AlgorithmError, SchedulingAlgorithm};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    Greedy,
    OutDegreesFirst,
    OutDegreesLast,
    MinRuntimeFirst,
    MaxRuntimeFirst,
    FromCriticalPath,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 6] = [
        AlgorithmKind::Greedy,
        AlgorithmKind::OutDegreesFirst,
        AlgorithmKind::OutDegreesLast,
        AlgorithmKind::MinRuntimeFirst,
        AlgorithmKind::MaxRuntimeFirst,
        AlgorithmKind::FromCriticalPath,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::OutDegreesFirst => "out_degrees_first",
            Self::OutDegreesLast => "out_degrees_last",
            Self::MinRuntimeFirst => "min_runtime_first",
            Self::MaxRuntimeFirst => "max_runtime_first",
            Self::FromCriticalPath => "from_critical_path",
        }
    }

    /// Build this policy against `graph`. `config.strategy` is not consulted.
    pub fn build(
        self,
        config: &AlgorithmConfig,
        graph: &TaskGraph,
    ) -> Result<Box<dyn SchedulingAlgorithm>, AlgorithmError> {
        let algorithm: Box<dyn SchedulingAlgorithm> = match self {
            Self::Greedy => Box::new(PolicyScheduler::new(Greedy, config, graph)?),
            Self::OutDegreesFirst => {
                Box::new(PolicyScheduler::new(OutDegreesFirst, config, graph)?)
            }
            Self::OutDegreesLast => Box::new(PolicyScheduler::new(OutDegreesLast, config, graph)?),
            Self::MinRuntimeFirst => {
                Box::new(PolicyScheduler::new(MinRuntimeFirst, config, graph)?)
            }
            Self::MaxRuntimeFirst => {
                Box::new(PolicyScheduler::new(MaxRuntimeFirst, config, graph)?)
            }
            Self::FromCriticalPath => Box::new(PolicyScheduler::new(
                FromCriticalPath::default(),
                config,
                graph,
            )?),
        };
        Ok(algorithm)
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = AlgorithmError;

    /// Accepts snake_case and CamelCase names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "greedy" => Ok(Self::Greedy),
            "outdegreesfirst" => Ok(Self::OutDegreesFirst),
            "outdegreeslast" => Ok(Self::OutDegreesLast),
            "minruntimefirst" => Ok(Self::MinRuntimeFirst),
            "maxruntimefirst" => Ok(Self::MaxRuntimeFirst),
            "fromcriticalpath" | "criticalpath" => Ok(Self::FromCriticalPath),
            _ => Err(AlgorithmError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Build the policy named by `config.strategy`.
pub fn build_algorithm(
    config: &AlgorithmConfig,
    graph: &TaskGraph,
) -> Result<Box<dyn SchedulingAlgorithm>, AlgorithmError> {
    config.kind()?.build(config, graph)
}
