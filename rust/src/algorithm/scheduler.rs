//! The scheduler shared by every policy.

use crate::config::AlgorithmConfig;
use crate::critical_path::{CriticalPathAnalyzer, CriticalPathMode, CriticalPathResult};
use crate::graph::{ProcessorId, TaskGraph, TaskId};
use crate::logging::VERBOSITY_DEBUG;
use crate::sorting::{sort_by_values, split_point, SortDirection, TaskAttribute};
use crate::threshold::thresholds_for;
use crate::{log_checks, log_debug};

use super::adaptive::{color_tasks, threshold_in_range, AdaptiveDecider};
use super::policies::OrderingPolicy;
use super::{AlgorithmError, SchedulingAlgorithm};

/// The algorithm's picture of the simulation at the last refresh.
#[derive(Clone, Debug, Default)]
pub struct AlgorithmView {
    pub idle: Vec<ProcessorId>,
    pub ready: Vec<TaskId>,
    pub all: Vec<TaskId>,
}

/// Keep only `ready` tasks, in the order given by `rank` (indexed by
/// [`TaskId`]).
pub fn replay(rank: &[usize], ready: &[TaskId]) -> Vec<TaskId> {
    let mut ordered = ready.to_vec();
    ordered.sort_by_key(|&t| rank.get(t as usize).copied().unwrap_or(usize::MAX));
    ordered
}

/// A policy composed with value tables, offline replay and the optional
/// adaptive decider.
pub struct PolicyScheduler<P> {
    policy: P,
    offline: bool,
    key: Option<(TaskAttribute, SortDirection)>,
    key_values: Vec<f64>,
    decide_key: Option<(TaskAttribute, SortDirection)>,
    decide_values: Vec<f64>,
    adaptive: Option<AdaptiveDecider>,
    replay_rank: Option<Vec<usize>>,
    view: AlgorithmView,
    verbosity: u8,
}

fn attribute_values(
    graph: &TaskGraph,
    attribute: TaskAttribute,
    analysis: Option<&CriticalPathResult>,
) -> Vec<f64> {
    match (attribute, analysis) {
        (TaskAttribute::CriticalTime, Some(cp)) => cp.critical_times.clone(),
        _ => graph.tasks().iter().map(|t| attribute.extract(t)).collect(),
    }
}

impl<P: OrderingPolicy> PolicyScheduler<P> {
    pub fn new(
        policy: P,
        config: &AlgorithmConfig,
        graph: &TaskGraph,
    ) -> Result<Self, AlgorithmError> {
        config.validate_modes()?;

        let key = policy.key();
        let decide_key = match config.decide_attribute {
            Some(attribute) => Some((
                attribute,
                key.map_or(SortDirection::Descending, |(_, direction)| direction),
            )),
            None => key,
        };

        let ranks_by_critical_time = [key, decide_key]
            .iter()
            .flatten()
            .any(|(attribute, _)| *attribute == TaskAttribute::CriticalTime);
        let analysis = if config.critical || ranks_by_critical_time {
            // Tagging needs the authoritative critical set.
            let mode = if config.critical {
                CriticalPathMode::Topological
            } else {
                policy.critical_path_mode()
            };
            Some(
                CriticalPathAnalyzer::new(mode)
                    .with_verbosity(config.verbosity)
                    .analyze(graph)?,
            )
        } else {
            None
        };

        let key_values = key
            .map(|(attribute, _)| attribute_values(graph, attribute, analysis.as_ref()))
            .unwrap_or_default();
        let decide_values = decide_key
            .map(|(attribute, _)| attribute_values(graph, attribute, analysis.as_ref()))
            .unwrap_or_default();

        let adaptive = if config.adaptive || config.critical {
            let threshold = if config.adaptive {
                config.threshold
            } else {
                None
            };
            let direction = match (decide_key, threshold) {
                (Some((_, direction)), _) => direction,
                (None, None) => SortDirection::Descending,
                (None, Some(_)) => {
                    return Err(AlgorithmError::InvalidConfig(format!(
                        "{} has no ordering attribute; set decide_attribute for adaptive mode",
                        policy.name()
                    )));
                }
            };
            let shuffle_fallback =
                threshold.is_some_and(|t| !threshold_in_range(&decide_values, t));
            let classes = color_tasks(
                graph.len(),
                |id| threshold.map_or(true, |t| direction.prefers(decide_values[id as usize], t)),
                analysis.as_ref().filter(|_| config.critical),
            );
            if let (Some(t), Some((_, direction))) = (threshold, decide_key) {
                if config.verbosity >= VERBOSITY_DEBUG {
                    let mut sorted: Vec<TaskId> = graph.task_ids().collect();
                    sort_by_values(&mut sorted, &decide_values, direction);
                    log_debug!(
                        config.verbosity,
                        "{}: split at {} of {} tasks",
                        policy.name(),
                        split_point(&sorted, &decide_values, direction, t),
                        sorted.len()
                    );
                }
            }
            let rate = if config.adaptive {
                config.priority_rate
            } else {
                1.0
            };
            log_debug!(
                config.verbosity,
                "{}: adaptive threshold {:?} rate {} fallback {}",
                policy.name(),
                threshold,
                rate,
                shuffle_fallback
            );
            Some(AdaptiveDecider::new(
                classes,
                rate,
                shuffle_fallback,
                config.seed,
                config.verbosity,
            ))
        } else {
            None
        };

        Ok(Self {
            offline: config.offline || policy.requires_offline(),
            policy,
            key,
            key_values,
            decide_key,
            decide_values,
            adaptive,
            replay_rank: None,
            view: AlgorithmView {
                idle: graph.idle_processors(),
                ready: graph.ready_tasks(),
                all: graph.task_ids().collect(),
            },
            verbosity: config.verbosity,
        })
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn view(&self) -> &AlgorithmView {
        &self.view
    }

    pub fn adaptive(&self) -> Option<&AdaptiveDecider> {
        self.adaptive.as_ref()
    }

    fn natural_order(&self, tasks: &[TaskId]) -> Vec<TaskId> {
        let mut ordered = tasks.to_vec();
        if let Some((_, direction)) = self.key {
            sort_by_values(&mut ordered, &self.key_values, direction);
        }
        ordered
    }
}

impl<P: OrderingPolicy> SchedulingAlgorithm for PolicyScheduler<P> {
    fn name(&self) -> &str {
        self.policy.name()
    }

    fn is_offline(&self) -> bool {
        self.offline
    }

    fn update_lists(&mut self, idle: &[ProcessorId], ready: &[TaskId], all: &[TaskId]) {
        self.view.idle.clear();
        self.view.idle.extend_from_slice(idle);
        self.view.ready.clear();
        self.view.ready.extend_from_slice(ready);
        if self.view.all.as_slice() != all {
            self.view.all.clear();
            self.view.all.extend_from_slice(all);
        }
    }

    fn calculate(&mut self, graph: &TaskGraph) -> Vec<TaskId> {
        let all: Vec<TaskId> = graph.task_ids().collect();
        let order = self.natural_order(&all);

        let mut rank = vec![usize::MAX; graph.len()];
        for (position, &task) in order.iter().enumerate() {
            rank[task as usize] = position;
        }
        self.replay_rank = Some(rank);

        log_debug!(
            self.verbosity,
            "{}: precomputed order over {} tasks",
            self.policy.name(),
            order.len()
        );
        order
    }

    fn decide(&mut self, graph: &TaskGraph) -> Vec<TaskId> {
        if self.offline && self.replay_rank.is_none() {
            self.calculate(graph);
        }

        let natural = match &self.replay_rank {
            Some(rank) => replay(rank, &self.view.ready),
            None => self.natural_order(&self.view.ready),
        };
        log_checks!(
            self.verbosity,
            "{}: deciding over {} ready tasks, {} idle processors",
            self.policy.name(),
            natural.len(),
            self.view.idle.len()
        );

        match self.adaptive.as_mut() {
            Some(decider) => decider.decide(&natural),
            None => natural,
        }
    }

    fn find_thresholds(&self, _graph: &TaskGraph, depth: u32) -> Vec<f64> {
        match self.decide_key {
            Some(_) => thresholds_for(self.decide_values.clone(), depth),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::policies::{
        FromCriticalPath, Greedy, MaxRuntimeFirst, MinRuntimeFirst, OutDegreesFirst,
        OutDegreesLast,
    };

    /// Eight independent roots plus fan-out, so every root is ready at once.
    ///
    /// r0..r7 have durations 1..8; r0 blocks three leaves, r5 blocks one.
    fn fixture() -> TaskGraph {
        let mut graph = TaskGraph::new();
        for i in 0..8 {
            graph.add_task(&format!("r{i}"), f64::from(i + 1), 1, 0).unwrap();
        }
        for leaf in ["l0", "l1", "l2", "l3"] {
            graph.add_task(leaf, 1.0, 1, 0).unwrap();
        }
        for (from, to) in [("r0", "l0"), ("r0", "l1"), ("r0", "l2"), ("r5", "l3")] {
            graph.add_edge_by_name(from, to).unwrap();
        }
        graph.add_processor("p", 1);
        graph
    }

    fn ready_ids(graph: &TaskGraph) -> Vec<TaskId> {
        graph.ready_tasks()
    }

    fn decide<P: OrderingPolicy>(
        policy: P,
        config: &AlgorithmConfig,
        graph: &TaskGraph,
        ready: &[TaskId],
    ) -> Vec<TaskId> {
        let mut scheduler = PolicyScheduler::new(policy, config, graph).unwrap();
        if scheduler.is_offline() {
            scheduler.calculate(graph);
        }
        let all: Vec<TaskId> = graph.task_ids().collect();
        scheduler.update_lists(&graph.idle_processors(), ready, &all);
        scheduler.decide(graph)
    }

    fn names(graph: &TaskGraph, ids: &[TaskId]) -> Vec<String> {
        ids.iter().map(|&t| graph.name(t).to_string()).collect()
    }

    #[test]
    fn test_greedy_is_identity() {
        let graph = fixture();
        let mut ready = ready_ids(&graph);
        ready.reverse();
        let order = decide(Greedy, &AlgorithmConfig::default(), &graph, &ready);
        assert_eq!(order, ready);
    }

    #[test]
    fn test_keyed_policies() {
        let graph = fixture();
        let ready = ready_ids(&graph);
        let config = AlgorithmConfig::default();

        let by_runtime = decide(MaxRuntimeFirst, &config, &graph, &ready);
        assert_eq!(names(&graph, &by_runtime[..3]), vec!["r7", "r6", "r5"]);

        let by_runtime = decide(MinRuntimeFirst, &config, &graph, &ready);
        assert_eq!(names(&graph, &by_runtime[..2]), vec!["r0", "r1"]);

        // Ties keep ready-list order.
        let by_degree = decide(OutDegreesFirst, &config, &graph, &ready);
        assert_eq!(names(&graph, &by_degree[..4]), vec!["r0", "r5", "r1", "r2"]);

        let by_degree = decide(OutDegreesLast, &config, &graph, &ready);
        assert_eq!(names(&graph, &by_degree[6..]), vec!["r5", "r0"]);
    }

    #[test]
    fn test_offline_replay_matches_online_order() {
        let graph = fixture();
        let ready = ready_ids(&graph);
        let online = decide(MaxRuntimeFirst, &AlgorithmConfig::default(), &graph, &ready);

        let mut offline_config = AlgorithmConfig::default();
        offline_config.offline = true;
        let offline = decide(MaxRuntimeFirst, &offline_config, &graph, &ready);
        assert_eq!(online, offline);
    }

    #[test]
    fn test_replay_filters_to_ready() {
        let rank = vec![2, 0, 3, 1];
        assert_eq!(replay(&rank, &[0, 2, 3]), vec![3, 0, 2]);
        assert!(replay(&rank, &[]).is_empty());
    }

    #[test]
    fn test_from_critical_path_ranks_by_tail_length() {
        let mut graph = TaskGraph::new();
        for (name, duration) in [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 1.0), ("e", 2.5)] {
            graph.add_task(name, duration, 1, 0).unwrap();
        }
        for (from, to) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
            graph.add_edge_by_name(from, to).unwrap();
        }

        let mut scheduler = PolicyScheduler::new(
            FromCriticalPath::default(),
            &AlgorithmConfig::default(),
            &graph,
        )
        .unwrap();
        assert!(scheduler.is_offline());
        let order = scheduler.calculate(&graph);
        assert_eq!(names(&graph, &order), vec!["a", "c", "b", "e", "d"]);

        // Ready: a and e; a has the longer tail.
        let ready = graph.ready_tasks();
        scheduler.update_lists(&[], &ready, &order);
        assert_eq!(names(&graph, &scheduler.decide(&graph)), vec!["a", "e"]);
    }

    #[test]
    fn test_find_thresholds_depth_three() {
        let graph = fixture();
        let scheduler =
            PolicyScheduler::new(MaxRuntimeFirst, &AlgorithmConfig::default(), &graph).unwrap();
        let thresholds = scheduler.find_thresholds(&graph, 3);
        assert_eq!(thresholds.len(), 7);

        let greedy = PolicyScheduler::new(Greedy, &AlgorithmConfig::default(), &graph).unwrap();
        assert!(greedy.find_thresholds(&graph, 3).is_empty());
    }

    #[test]
    fn test_adaptive_rate_one_promotes_high_class() {
        let graph = fixture();
        let ready = ready_ids(&graph);
        // Min runtime first, "duration < 1.5" is high: only r0 qualifies.
        let config = AlgorithmConfig::new("min_runtime_first").with_adaptive(1.5, 1.0);
        let order = decide(MinRuntimeFirst, &config, &graph, &ready);
        assert_eq!(graph.name(order[0]), "r0");
        assert_eq!(order.len(), ready.len());

        // Greedy classifying by out-degree pulls the fan-out roots forward.
        let mut config = AlgorithmConfig::new("greedy").with_adaptive(0.5, 1.0);
        config.decide_attribute = Some(TaskAttribute::OutDegree);
        let order = decide(Greedy, &config, &graph, &ready);
        assert_eq!(names(&graph, &order[..3]), vec!["r0", "r5", "r1"]);
    }

    #[test]
    fn test_adaptive_out_of_range_falls_back_to_permutation() {
        let graph = fixture();
        let ready = ready_ids(&graph);
        for threshold in [-5.0, 500.0] {
            let config = AlgorithmConfig::new("max_runtime_first")
                .with_adaptive(threshold, 0.7)
                .with_seed(11);
            let scheduler = PolicyScheduler::new(MaxRuntimeFirst, &config, &graph).unwrap();
            assert!(scheduler.adaptive().is_some_and(|d| d.is_fallback()));

            let mut order = decide(MaxRuntimeFirst, &config, &graph, &ready);
            order.sort_unstable();
            let mut expected = ready.clone();
            expected.sort_unstable();
            assert_eq!(order, expected);
        }
    }

    #[test]
    fn test_critical_tagging_without_adaptive() {
        let mut graph = TaskGraph::new();
        for (name, duration) in [("short", 1.0), ("long", 5.0), ("after", 1.0)] {
            graph.add_task(name, duration, 1, 0).unwrap();
        }
        graph.add_edge_by_name("long", "after").unwrap();

        let mut config = AlgorithmConfig::new("min_runtime_first");
        config.critical = true;
        let ready = graph.ready_tasks();
        let order = decide(MinRuntimeFirst, &config, &graph, &ready);
        assert_eq!(names(&graph, &order), vec!["long", "short"]);
    }

    #[test]
    fn test_greedy_adaptive_needs_attribute() {
        let graph = fixture();
        let config = AlgorithmConfig::new("greedy").with_adaptive(1.0, 0.5);
        assert!(matches!(
            PolicyScheduler::new(Greedy, &config, &graph),
            Err(AlgorithmError::InvalidConfig(_))
        ));
    }
}
