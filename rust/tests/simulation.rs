//! End-to-end runs over graphs loaded from the JSON load contract.

use serde_json::json;

use tasksim_rust::algorithm::{build_algorithm, AlgorithmKind};
use tasksim_rust::critical_path::accumulate_critical_times;
use tasksim_rust::report::{compare_algorithms, ReportContext};
use tasksim_rust::threshold::bucket_counts;
use tasksim_rust::{
    calculate_critical_path, AlgorithmConfig, GraphError, SimulationConfig, SimulationError,
    SimulationResult, Simulator, TaskAttribute, TaskGraph, ThresholdFinder,
};

const ONE_TWO: &str = r#"{
    "Tasks": {
        "one": {"duration": 3, "processor_type": 1, "blocking": ["one_two"]},
        "two": {"duration": 3, "processor_type": 2, "blocking": ["one_two"]},
        "one_two": {"duration": 3, "processor_type": 1}
    },
    "Processors": ["p1:1", "p2:2"]
}"#;

const DIAMOND: &str = r#"{
    "Tasks": {
        "A": {"duration": 1, "processor_type": 0, "blocking": ["B", "C"]},
        "B": {"duration": 2, "processor_type": 0, "blocking": ["D"]},
        "C": {"duration": 3, "processor_type": 0, "blocking": ["D"]},
        "D": {"duration": 1, "processor_type": 0}
    },
    "Processors": ["p:0", "q:0"]
}"#;

fn run(graph: TaskGraph, config: &AlgorithmConfig) -> Result<SimulationResult, SimulationError> {
    let mut algorithm = build_algorithm(config, &graph).unwrap();
    let mut simulator = Simulator::new(graph, SimulationConfig::default())?;
    simulator.start(algorithm.as_mut())
}

/// Ten tasks in a few converging chains, one processor per task when
/// `unconstrained`, otherwise two.
fn layered(unconstrained: bool) -> TaskGraph {
    let durations = [3.0, 1.0, 2.0, 4.0, 2.0, 1.0, 5.0, 2.0, 1.0, 3.0];
    let edges = [
        (0, 2),
        (1, 2),
        (2, 5),
        (3, 5),
        (4, 6),
        (5, 7),
        (6, 7),
        (8, 9),
    ];
    let mut graph = TaskGraph::new();
    for (i, duration) in durations.iter().enumerate() {
        graph.add_task(&format!("t{i}"), *duration, 0, 0).unwrap();
    }
    for (from, to) in edges {
        graph.add_edge(from, to).unwrap();
    }
    let processors = if unconstrained { durations.len() } else { 2 };
    for i in 0..processors {
        graph.add_processor(&format!("p{i}"), 0);
    }
    graph
}

#[test]
fn one_two_finishes_at_six() {
    let graph = TaskGraph::from_json(ONE_TWO).unwrap();
    let result = run(graph, &AlgorithmConfig::default()).unwrap();
    assert_eq!(result.metrics(), (9.0, 6.0));
    assert!((result.utilization(2) - 0.75).abs() < 1e-9);
}

#[test]
fn diamond_critical_path_agrees_across_modes() {
    let graph = TaskGraph::from_json(DIAMOND).unwrap();
    let passes = calculate_critical_path(&graph).unwrap();
    let accumulated = accumulate_critical_times(&graph).unwrap();

    assert_eq!(passes.critical_names(&graph), vec!["A", "C", "D"]);
    assert_eq!(passes.critical_tasks, accumulated.critical_tasks);
    assert_eq!(passes.critical_path_length, 5.0);
    assert_eq!(accumulated.critical_path_length, 5.0);

    let result = run(graph, &AlgorithmConfig::new("from_critical_path")).unwrap();
    assert_eq!(result.makespan, 5.0);
}

#[test]
fn greedy_follows_load_order() {
    let json = r#"{
        "Tasks": {
            "z": {"duration": 1, "processor_type": 0},
            "a": {"duration": 5, "processor_type": 0},
            "m": {"duration": 2, "processor_type": 0}
        },
        "Processors": ["solo:0"]
    }"#;
    let result = run(
        TaskGraph::from_json(json).unwrap(),
        &AlgorithmConfig::default(),
    )
    .unwrap();
    let order: Vec<&str> = result.schedule.iter().map(|s| s.task.as_str()).collect();
    assert_eq!(order, vec!["z", "a", "m"]);

    let result = run(
        TaskGraph::from_json(json).unwrap(),
        &AlgorithmConfig::new("min_runtime_first"),
    )
    .unwrap();
    let order: Vec<&str> = result.schedule.iter().map(|s| s.task.as_str()).collect();
    assert_eq!(order, vec!["z", "m", "a"]);
}

#[test]
fn duration_thresholds_split_eight_tasks() {
    let tasks: serde_json::Map<String, serde_json::Value> = (1..=8)
        .map(|i| (format!("t{i}"), json!({"duration": i, "processor_type": 0})))
        .collect();
    let spec = json!({"Tasks": tasks, "Processors": ["p:0"]});
    let graph = TaskGraph::from_json(&spec.to_string()).unwrap();

    let finder = ThresholdFinder::new(TaskAttribute::Duration);
    let thresholds = finder.find(&graph, 3);
    assert_eq!(thresholds, vec![5.0, 3.0, 2.0, 4.0, 7.0, 6.0, 8.0]);

    let buckets = bucket_counts(&finder.values(&graph), &thresholds);
    assert_eq!(buckets.iter().map(|(_, count)| count).sum::<usize>(), 8);
}

#[test]
fn makespan_bounded_by_critical_path() {
    let length = calculate_critical_path(&layered(false))
        .unwrap()
        .critical_path_length;
    assert_eq!(length, 9.0);

    for kind in AlgorithmKind::ALL {
        let config = AlgorithmConfig::new(kind.name());

        let unconstrained = run(layered(true), &config).unwrap();
        assert!(
            (unconstrained.makespan - length).abs() < 1e-9,
            "{kind}: {} != {length}",
            unconstrained.makespan
        );

        let constrained = run(layered(false), &config).unwrap();
        assert!(constrained.makespan >= length, "{kind}");
        assert!(
            constrained.makespan >= constrained.total_busy_time / 2.0,
            "{kind}"
        );
        assert_eq!(constrained.schedule.len(), 10, "{kind}");
    }
}

#[test]
fn every_policy_runs_offline() {
    for kind in AlgorithmKind::ALL {
        let mut config = AlgorithmConfig::new(kind.name());
        config.offline = true;
        let result = run(layered(false), &config).unwrap();
        assert_eq!(result.total_busy_time, 24.0, "{kind}");
    }
}

#[test]
fn out_of_range_threshold_still_schedules_everything() {
    let config = AlgorithmConfig::new("max_runtime_first")
        .with_adaptive(100.0, 0.7)
        .with_seed(11);

    let graph = layered(false);
    let mut algorithm = build_algorithm(&config, &graph).unwrap();
    let ready = graph.ready_tasks();
    algorithm.update_lists(&graph.idle_processors(), &ready, &ready);
    let mut decided = algorithm.decide(&graph);
    decided.sort_unstable();
    assert_eq!(decided, ready);

    let result = run(layered(false), &config).unwrap();
    let mut names: Vec<&str> = result.schedule.iter().map(|s| s.task.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), 10);
}

#[test]
fn seeded_adaptive_runs_repeat() {
    let config = AlgorithmConfig::new("out_degrees_first")
        .with_adaptive(0.5, 0.5)
        .with_seed(42);
    let first = run(layered(false), &config).unwrap();
    let second = run(layered(false), &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn cycle_rejected_on_load() {
    let json = r#"{
        "Tasks": {
            "a": {"duration": 1, "processor_type": 0, "blocking": ["b"]},
            "b": {"duration": 1, "processor_type": 0, "blocking": ["c"]},
            "c": {"duration": 1, "processor_type": 0, "blocking": ["a"]}
        },
        "Processors": ["p:0"]
    }"#;
    assert!(matches!(
        TaskGraph::from_json(json),
        Err(GraphError::CycleDetected(_))
    ));
}

#[test]
fn bad_load_contract_rejected() {
    let unknown = r#"{
        "Tasks": {"a": {"duration": 1, "processor_type": 0, "blocking": ["ghost"]}}
    }"#;
    assert!(matches!(
        TaskGraph::from_json(unknown),
        Err(GraphError::UnknownTask(name)) if name == "ghost"
    ));

    let processor = r#"{"Tasks": {}, "Processors": ["nocolon"]}"#;
    assert!(matches!(
        TaskGraph::from_json(processor),
        Err(GraphError::InvalidProcessor(_))
    ));

    assert!(matches!(
        TaskGraph::from_json("{\"Tasks\": ["),
        Err(GraphError::Parse(_))
    ));
}

#[test]
fn missing_processor_type_reported() {
    let json = r#"{
        "Tasks": {
            "cpu": {"duration": 1, "processor_type": 0, "blocking": ["gpu"]},
            "gpu": {"duration": 1, "processor_type": 9}
        },
        "Processors": ["p:0"]
    }"#;
    let err = run(
        TaskGraph::from_json(json).unwrap(),
        &AlgorithmConfig::default(),
    )
    .unwrap_err();
    match err {
        SimulationError::NoCompatibleProcessor {
            task,
            processor_type,
        } => {
            assert_eq!(task, "gpu");
            assert_eq!(processor_type, 9);
        }
        other => panic!("expected NoCompatibleProcessor, got {other:?}"),
    }
}

#[test]
fn empty_graph_completes_immediately() {
    let graph = TaskGraph::from_json(r#"{"Tasks": {}, "Processors": ["p:0"]}"#).unwrap();
    let result = run(graph, &AlgorithmConfig::default()).unwrap();
    assert_eq!(result.metrics(), (0.0, 0.0));
    assert!(result.schedule.is_empty());
}

#[test]
fn duplicate_edges_and_processors_collapse() {
    let json = r#"{
        "Tasks": {
            "a": {"duration": 1, "processor_type": 0, "blocking": ["b", "b"]},
            "b": {"duration": 1, "processor_type": 0}
        },
        "Processors": ["p:0", "p:0"]
    }"#;
    let graph = TaskGraph::from_json(json).unwrap();
    let b = graph.lookup("b").unwrap();
    assert_eq!(graph.task(b).in_degree(), 1);
    assert_eq!(graph.processors().len(), 1);

    let result = run(graph, &AlgorithmConfig::default()).unwrap();
    assert_eq!(result.makespan, 2.0);
}

#[test]
fn comparison_over_workload() {
    let mut context = ReportContext::new();
    context
        .add_graph("one_two", TaskGraph::from_json(ONE_TWO).unwrap())
        .unwrap();
    context
        .add_graph("diamond", TaskGraph::from_json(DIAMOND).unwrap())
        .unwrap();

    let configs: Vec<AlgorithmConfig> = AlgorithmKind::ALL
        .iter()
        .map(|kind| AlgorithmConfig::new(kind.name()))
        .collect();
    let report = compare_algorithms(&context, &configs, 0).unwrap();

    assert_eq!(report.rows.len(), AlgorithmKind::ALL.len());
    for row in &report.rows {
        assert_eq!(row.makespans, vec![6.0, 5.0], "{}", row.algorithm);
    }
}
