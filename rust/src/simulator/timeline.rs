//! Processor occupancy notifications and an in-memory recorder.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

use crate::graph::{Processor, Task};

/// Receives one notification per finished task.
pub trait TimelineSink {
    fn add_to_timeline(&mut self, processor: &Processor, task: &Task, start_time: f64);

    fn show(&self) {}
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineEntry {
    pub task: String,
    pub start: f64,
    pub end: f64,
    pub critical: bool,
}

/// Occupancy intervals grouped by processor, lanes in pool order.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    lanes: Vec<(String, Vec<TimelineEntry>)>,
    lane_index: FxHashMap<String, usize>,
    critical: FxHashSet<String>,
}

impl Timeline {
    pub fn new(processors: &[Processor]) -> Self {
        let mut timeline = Self::default();
        for processor in processors {
            timeline.lane_mut(processor.label());
        }
        timeline
    }

    fn lane_mut(&mut self, label: String) -> &mut Vec<TimelineEntry> {
        let idx = match self.lane_index.get(&label) {
            Some(&idx) => idx,
            None => {
                let idx = self.lanes.len();
                self.lane_index.insert(label.clone(), idx);
                self.lanes.push((label, Vec::new()));
                idx
            }
        };
        &mut self.lanes[idx].1
    }

    /// Mark these task names as critical, including entries already recorded.
    pub fn set_critical_path<S: AsRef<str>>(&mut self, tasks: impl IntoIterator<Item = S>) {
        self.critical = tasks.into_iter().map(|t| t.as_ref().to_string()).collect();
        for (_, entries) in &mut self.lanes {
            for entry in entries {
                entry.critical = self.critical.contains(&entry.task);
            }
        }
    }

    /// Entries of the lane labelled `"name:type"`.
    pub fn lane(&self, label: &str) -> Option<&[TimelineEntry]> {
        self.lane_index
            .get(label)
            .map(|&idx| self.lanes[idx].1.as_slice())
    }

    pub fn lanes(&self) -> impl Iterator<Item = (&str, &[TimelineEntry])> {
        self.lanes
            .iter()
            .map(|(label, entries)| (label.as_str(), entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(|(_, entries)| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimelineSink for Timeline {
    fn add_to_timeline(&mut self, processor: &Processor, task: &Task, start_time: f64) {
        let critical = self.critical.contains(&task.name);
        self.lane_mut(processor.label()).push(TimelineEntry {
            task: task.name.clone(),
            start: start_time,
            end: start_time + task.duration,
            critical,
        });
    }

    fn show(&self) {
        eprint!("{self}");
    }
}

impl fmt::Display for Timeline {
    /// One line per processor; critical-path tasks carry a `*`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, entries) in &self.lanes {
            write!(f, "{label}:")?;
            for entry in entries {
                write!(f, " {}[{}-{}]", entry.task, entry.start, entry.end)?;
                if entry.critical {
                    f.write_str("*")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
