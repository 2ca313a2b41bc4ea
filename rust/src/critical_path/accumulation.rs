//! Critical times by reverse accumulation.
//!
//! `critical_time[t] = duration[t] + max(critical_time[s] for s in blocking[t])`,
//! evaluated in reverse topological order so no recursion is needed.

use crate::graph::{TaskGraph, TaskId};
use crate::topology::topological_order;

use super::types::{approx_eq, CriticalPathError, CriticalPathMode, CriticalPathResult};

pub fn accumulate_critical_times(
    graph: &TaskGraph,
) -> Result<CriticalPathResult, CriticalPathError> {
    let topo_order = topological_order(graph)?;
    let n = graph.len();

    let mut critical_times = vec![0.0; n];
    let mut total_work = 0.0;
    for &id in topo_order.iter().rev() {
        let task = graph.task(id);
        total_work += task.duration;
        let tail = task
            .blocking()
            .iter()
            .map(|&s| critical_times[s as usize])
            .fold(0.0, f64::max);
        critical_times[id as usize] = task.duration + tail;
    }

    let critical_path_length = critical_times.iter().copied().fold(0.0, f64::max);

    // Walk the tight edges down from every source that starts a longest path.
    let mut on_path = vec![false; n];
    let mut frontier: Vec<TaskId> = graph
        .task_ids()
        .filter(|&id| {
            graph.task(id).in_degree() == 0
                && approx_eq(critical_times[id as usize], critical_path_length)
        })
        .collect();

    while let Some(id) = frontier.pop() {
        if on_path[id as usize] {
            continue;
        }
        on_path[id as usize] = true;

        let task = graph.task(id);
        let remaining = critical_times[id as usize] - task.duration;
        frontier.extend(
            task.blocking()
                .iter()
                .copied()
                .filter(|&s| approx_eq(critical_times[s as usize], remaining)),
        );
    }

    let critical_tasks = topo_order
        .iter()
        .copied()
        .filter(|&id| on_path[id as usize])
        .collect();

    Ok(CriticalPathResult {
        mode: CriticalPathMode::Accumulation,
        critical_times,
        timings: Vec::new(),
        critical_tasks,
        critical_path_length,
        total_work,
        on_path,
    })
}
