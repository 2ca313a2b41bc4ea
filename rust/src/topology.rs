//! Topological ordering of the task graph.
//!
//! Depth-first post-order over predecessor edges with an explicit stack, so
//! deep chains cannot overflow the call stack. Roots are visited in insertion
//! order, which keeps the result deterministic for a given load order.

use std::fmt;

use crate::graph::{TaskGraph, TaskId};

/// Error raised when the graph is not a DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    CycleDetected { task: String },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::CycleDetected { task } => {
                write!(f, "Cycle detected in task graph at task {task}")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Finished,
}

/// Every task, each listed after all of its predecessors.
pub fn topological_order(graph: &TaskGraph) -> Result<Vec<TaskId>, TopologyError> {
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut order = Vec::with_capacity(graph.len());
    // (task, index of the next predecessor to visit)
    let mut stack: Vec<(TaskId, usize)> = Vec::new();

    for root in graph.task_ids() {
        if marks[root as usize] != Mark::Unvisited {
            continue;
        }
        marks[root as usize] = Mark::InProgress;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (task, next) = *frame;
            let predecessors = graph.task(task).predecessors();

            if next < predecessors.len() {
                frame.1 += 1;
                let pred = predecessors[next];
                match marks[pred as usize] {
                    Mark::Unvisited => {
                        marks[pred as usize] = Mark::InProgress;
                        stack.push((pred, 0));
                    }
                    Mark::InProgress => {
                        return Err(TopologyError::CycleDetected {
                            task: graph.name(pred).to_string(),
                        });
                    }
                    Mark::Finished => {}
                }
            } else {
                marks[task as usize] = Mark::Finished;
                order.push(task);
                stack.pop();
            }
        }
    }

    Ok(order)
}
