//! Critical path calculation using forward and backward passes.

use crate::graph::TaskGraph;
use crate::topology::topological_order;

use super::types::{CriticalPathError, CriticalPathMode, CriticalPathResult, TaskTiming};

/// Compute ES/EF/LS/LF and slack for every task of the graph.
///
/// Every sink is anchored at the project length, so slack measures how far a
/// task can slip before the whole graph finishes later.
pub fn calculate_critical_path(graph: &TaskGraph) -> Result<CriticalPathResult, CriticalPathError> {
    let topo_order = topological_order(graph)?;
    let n = graph.len();

    // Forward pass: compute earliest start/finish times
    let mut timings = vec![TaskTiming::default(); n];
    let mut total_work = 0.0;

    for &id in &topo_order {
        let task = graph.task(id);
        total_work += task.duration;

        // Earliest start = max of all predecessor finish times
        let earliest_start = task
            .predecessors()
            .iter()
            .map(|&p| timings[p as usize].earliest_finish)
            .fold(0.0, f64::max);

        let timing = &mut timings[id as usize];
        timing.earliest_start = earliest_start;
        timing.earliest_finish = earliest_start + task.duration;
    }

    let critical_path_length = timings
        .iter()
        .map(|t| t.earliest_finish)
        .fold(0.0, f64::max);

    // Backward pass (reverse topological order)
    for &id in topo_order.iter().rev() {
        let task = graph.task(id);

        let latest_finish = task
            .blocking()
            .iter()
            .map(|&s| timings[s as usize].latest_start)
            .fold(critical_path_length, f64::min);

        let timing = &mut timings[id as usize];
        timing.latest_finish = latest_finish;
        timing.latest_start = latest_finish - task.duration;
        timing.slack = timing.latest_start - timing.earliest_start;
    }

    let on_path: Vec<bool> = timings.iter().map(TaskTiming::is_critical).collect();
    let critical_tasks = topo_order
        .iter()
        .copied()
        .filter(|&id| on_path[id as usize])
        .collect();
    let critical_times = timings
        .iter()
        .map(|t| critical_path_length - t.latest_start)
        .collect();

    Ok(CriticalPathResult {
        mode: CriticalPathMode::Topological,
        critical_times,
        timings,
        critical_tasks,
        critical_path_length,
        total_work,
        on_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_graph(tasks: &[(&str, f64)], edges: &[(&str, &str)]) -> TaskGraph {
        let mut graph = TaskGraph::new();
        for (name, duration) in tasks {
            graph.add_task(name, *duration, 1, 0).unwrap();
        }
        for (from, to) in edges {
            graph.add_edge_by_name(from, to).unwrap();
        }
        graph
    }

    fn timing<'r>(result: &'r CriticalPathResult, graph: &TaskGraph, name: &str) -> &'r TaskTiming {
        &result.timings[graph.lookup(name).unwrap() as usize]
    }

    #[test]
    fn test_single_task_critical_path() {
        let graph = make_graph(&[("a", 5.0)], &[]);
        let result = calculate_critical_path(&graph).unwrap();

        assert_eq!(result.critical_path_length, 5.0);
        assert_eq!(result.total_work, 5.0);
        assert_eq!(result.critical_names(&graph), vec!["a"]);
        assert_eq!(result.critical_time(0), 5.0);
    }

    #[test]
    fn test_chain_critical_path() {
        let graph = make_graph(
            &[("a", 2.0), ("b", 3.0), ("c", 4.0)],
            &[("a", "b"), ("b", "c")],
        );
        let result = calculate_critical_path(&graph).unwrap();

        assert_eq!(result.critical_path_length, 9.0);
        assert_eq!(result.critical_names(&graph), vec!["a", "b", "c"]);
        assert_eq!(result.critical_times, vec![9.0, 7.0, 4.0]);
    }

    #[test]
    fn test_parallel_paths_with_slack() {
        let graph = make_graph(
            &[("a", 2.0), ("b", 5.0), ("target", 1.0)],
            &[("a", "target"), ("b", "target")],
        );
        let result = calculate_critical_path(&graph).unwrap();

        assert_eq!(result.critical_path_length, 6.0);
        assert_eq!(result.total_work, 8.0);
        assert!(result.is_critical(graph.lookup("b").unwrap()));
        assert!(result.is_critical(graph.lookup("target").unwrap()));
        assert!(!result.is_critical(graph.lookup("a").unwrap()));
        assert!((timing(&result, &graph, "a").slack - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_diamond_dependency() {
        let graph = make_graph(
            &[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 1.0)],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        let result = calculate_critical_path(&graph).unwrap();

        assert_eq!(result.critical_path_length, 5.0);
        assert_eq!(result.critical_names(&graph), vec!["a", "c", "d"]);

        let b = timing(&result, &graph, "b");
        assert_eq!(b.earliest_start, 1.0);
        assert_eq!(b.latest_start, 2.0);
        assert!((b.slack - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_sink_is_not_critical() {
        // "side" finishes long before the project does.
        let graph = make_graph(
            &[("a", 1.0), ("long", 10.0), ("side", 1.0)],
            &[("a", "long"), ("a", "side")],
        );
        let result = calculate_critical_path(&graph).unwrap();

        assert_eq!(result.critical_path_length, 11.0);
        assert!(!result.is_critical(graph.lookup("side").unwrap()));
        assert_eq!(timing(&result, &graph, "side").latest_finish, 11.0);
    }

    #[test]
    fn test_cycle_reported() {
        let mut graph = make_graph(&[("a", 1.0), ("b", 1.0)], &[("a", "b")]);
        graph.add_edge_by_name("b", "a").unwrap();
        assert!(matches!(
            calculate_critical_path(&graph),
            Err(CriticalPathError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_empty_graph() {
        let result = calculate_critical_path(&TaskGraph::new()).unwrap();
        assert_eq!(result.critical_path_length, 0.0);
        assert!(result.critical_tasks.is_empty());
    }
}
