//! Load contract and run result records.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::graph::{GraphError, ProcessorType};

/// Attributes of one task as produced by the trace parser.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TaskSpec {
    pub duration: f64,
    pub processor_type: ProcessorType,
    #[serde(default)]
    pub priority: i32,
    /// Names of the tasks that cannot start until this one finishes.
    #[serde(default)]
    pub blocking: Vec<String>,
}

/// A whole graph in the parser's JSON shape:
/// `{"Tasks": {name: TaskSpec, ...}, "Processors": ["name:type", ...]}`.
///
/// Task order is the order of the JSON object, which becomes the initial
/// ready-list order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphSpec {
    #[serde(rename = "Tasks", deserialize_with = "ordered_tasks")]
    pub tasks: Vec<(String, TaskSpec)>,
    #[serde(rename = "Processors", default)]
    pub processors: Vec<String>,
}

impl GraphSpec {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn ordered_tasks<'de, D>(deserializer: D) -> Result<Vec<(String, TaskSpec)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedTasks;

    impl<'de> Visitor<'de> for OrderedTasks {
        type Value = Vec<(String, TaskSpec)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of task name to task attributes")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut tasks = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, spec)) = map.next_entry::<String, TaskSpec>()? {
                tasks.push((name, spec));
            }
            Ok(tasks)
        }
    }

    deserializer.deserialize_map(OrderedTasks)
}

/// A processor descriptor of the form `"name:type"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProcessorDescriptor {
    pub name: String,
    pub processor_type: ProcessorType,
}

impl FromStr for ProcessorDescriptor {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, processor_type) = s
            .split_once(':')
            .ok_or_else(|| GraphError::InvalidProcessor(s.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(GraphError::InvalidProcessor(s.to_string()));
        }
        let processor_type = processor_type
            .trim()
            .parse::<ProcessorType>()
            .map_err(|_| GraphError::InvalidProcessor(s.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            processor_type,
        })
    }
}

/// One task occupancy interval on a processor.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTask {
    pub task: String,
    pub processor: String,
    pub start: f64,
    pub end: f64,
}

/// Outcome of one `Simulator::start` run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationResult {
    pub algorithm: String,
    /// Sum of all task durations.
    pub total_busy_time: f64,
    /// Completion time of the last task.
    pub makespan: f64,
    /// Occupancy intervals in completion order.
    pub schedule: Vec<ScheduledTask>,
}

impl SimulationResult {
    /// `(total_busy_time, makespan)`.
    pub fn metrics(&self) -> (f64, f64) {
        (self.total_busy_time, self.makespan)
    }

    /// Fraction of processor-time spent busy over the run.
    pub fn utilization(&self, processor_count: usize) -> f64 {
        if self.makespan <= 0.0 || processor_count == 0 {
            return 0.0;
        }
        self.total_busy_time / (self.makespan * processor_count as f64)
    }
}
