//! Discrete-event loop matching ready tasks to idle processors.

use thiserror::Error;

use crate::algorithm::SchedulingAlgorithm;
use crate::config::SimulationConfig;
use crate::critical_path::calculate_critical_path;
use crate::graph::{GraphError, ProcessorType, TaskGraph, TaskId};
use crate::models::{ScheduledTask, SimulationResult};
use crate::{log_changes, log_checks, log_debug};

use super::events::EventQueue;
use super::timeline::{Timeline, TimelineSink};

/// Errors that can occur during a simulation run.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Cycle detected in task graph at task {0}")]
    CycleDetected(String),
    #[error("Task {task} needs processor type {processor_type}, which no processor provides")]
    NoCompatibleProcessor {
        task: String,
        processor_type: ProcessorType,
    },
    #[error("Simulation stalled with {remaining} tasks unfinished")]
    Stalled { remaining: usize },
    #[error("Invalid graph: {0}")]
    Graph(GraphError),
}

impl From<GraphError> for SimulationError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::CycleDetected(task) => SimulationError::CycleDetected(task),
            other => SimulationError::Graph(other),
        }
    }
}

/// Owns one graph and runs it under any number of algorithms.
pub struct Simulator {
    graph: TaskGraph,
    config: SimulationConfig,
    timeline: Timeline,
}

impl Simulator {
    pub fn new(graph: TaskGraph, config: SimulationConfig) -> Result<Self, SimulationError> {
        graph.validate()?;
        let timeline = Timeline::new(graph.processors());
        Ok(Self {
            graph,
            config,
            timeline,
        })
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn into_graph(self) -> TaskGraph {
        self.graph
    }

    /// The timeline of the last illustrated run.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Run every task to completion under `algorithm`.
    ///
    /// Dynamic task and processor state is reset first, so a simulator can be
    /// started repeatedly.
    pub fn start(
        &mut self,
        algorithm: &mut dyn SchedulingAlgorithm,
    ) -> Result<SimulationResult, SimulationError> {
        let verbosity = self.config.verbosity;
        if !self.config.illustrate {
            return run(&mut self.graph, algorithm, None, verbosity);
        }

        self.timeline = Timeline::new(self.graph.processors());
        if let Ok(critical) = calculate_critical_path(&self.graph) {
            let names = critical.critical_names(&self.graph);
            self.timeline.set_critical_path(names);
        }
        let result = run(
            &mut self.graph,
            algorithm,
            Some(&mut self.timeline),
            verbosity,
        );
        self.timeline.show();
        result
    }

    /// Like [`Simulator::start`], reporting occupancy to a caller-supplied sink.
    pub fn start_with_sink(
        &mut self,
        algorithm: &mut dyn SchedulingAlgorithm,
        sink: &mut dyn TimelineSink,
    ) -> Result<SimulationResult, SimulationError> {
        let result = run(
            &mut self.graph,
            algorithm,
            Some(&mut *sink),
            self.config.verbosity,
        );
        if self.config.illustrate {
            sink.show();
        }
        result
    }
}

/// Loop state for a single run.
struct RunState {
    events: EventQueue,
    ready: Vec<TaskId>,
    all: Vec<TaskId>,
    now: f64,
    remaining: usize,
}

impl RunState {
    /// Hand the ready list to the algorithm and start what fits.
    fn dispatch(
        &mut self,
        graph: &mut TaskGraph,
        algorithm: &mut dyn SchedulingAlgorithm,
        verbosity: u8,
    ) {
        if self.ready.is_empty() {
            return;
        }
        let idle = graph.idle_processors();
        if idle.is_empty() {
            log_checks!(
                verbosity,
                "  No idle processors for {} ready tasks",
                self.ready.len()
            );
            return;
        }

        algorithm.update_lists(&idle, &self.ready, &self.all);
        let decided = algorithm.decide(graph);

        let mut started = 0;
        for task in decided {
            if !graph.is_ready(task) {
                log_checks!(verbosity, "    Skipping {}: not ready", graph.name(task));
                continue;
            }
            let processor_type = graph.task(task).processor_type;
            match graph.find_idle_processor(processor_type) {
                Some(processor) => {
                    let end_time = graph.assign(task, processor, self.now);
                    self.events.push(task, self.now, end_time);
                    started += 1;
                    log_changes!(
                        verbosity,
                        "  Started {} on {} at {} (ends {})",
                        graph.name(task),
                        graph.processor(processor).label(),
                        self.now,
                        end_time
                    );
                }
                None => {
                    log_checks!(
                        verbosity,
                        "    Skipping {}: no idle processor of type {}",
                        graph.name(task),
                        processor_type
                    );
                }
            }
        }

        if started > 0 {
            self.ready.retain(|&t| graph.is_ready(t));
        }
    }

    /// Why the heap ran dry with work left.
    fn deadlock(&self, graph: &TaskGraph) -> SimulationError {
        for &id in &self.ready {
            let task = graph.task(id);
            if !graph.has_processor_type(task.processor_type) {
                return SimulationError::NoCompatibleProcessor {
                    task: task.name.clone(),
                    processor_type: task.processor_type,
                };
            }
        }
        SimulationError::Stalled {
            remaining: self.remaining,
        }
    }
}

fn run(
    graph: &mut TaskGraph,
    algorithm: &mut dyn SchedulingAlgorithm,
    mut sink: Option<&mut dyn TimelineSink>,
    verbosity: u8,
) -> Result<SimulationResult, SimulationError> {
    graph.reset();

    let mut state = RunState {
        events: EventQueue::new(),
        ready: graph.ready_tasks(),
        all: graph.task_ids().collect(),
        now: 0.0,
        remaining: graph.len(),
    };
    let mut result = SimulationResult {
        algorithm: algorithm.name().to_string(),
        schedule: Vec::with_capacity(graph.len()),
        ..SimulationResult::default()
    };

    log_changes!(
        verbosity,
        "Simulating {} tasks on {} processors with {}",
        graph.len(),
        graph.processors().len(),
        algorithm.name()
    );

    if algorithm.is_offline() {
        let order = algorithm.calculate(graph);
        log_debug!(verbosity, "  Precomputed order of {} tasks", order.len());
    }

    state.dispatch(graph, algorithm, verbosity);

    while state.remaining > 0 {
        let Some(event) = state.events.pop() else {
            return Err(state.deadlock(graph));
        };
        if event.time > state.now {
            log_changes!(verbosity, "Time: {}", event.time);
        }
        state.now = event.time;

        let task = event.task;
        if let Some(processor) = graph.task(task).processor() {
            let processor = graph.processor(processor);
            if let Some(sink) = sink.as_deref_mut() {
                sink.add_to_timeline(processor, graph.task(task), event.start);
            }
            result.schedule.push(ScheduledTask {
                task: graph.name(task).to_string(),
                processor: processor.label(),
                start: event.start,
                end: event.time,
            });
        }

        let newly_ready = graph.finish(task);
        result.total_busy_time += graph.task(task).duration;
        result.makespan = result.makespan.max(event.time);
        state.remaining -= 1;

        log_changes!(
            verbosity,
            "  Finished {} at {}, {} newly ready",
            graph.name(task),
            event.time,
            newly_ready.len()
        );
        state.ready.extend(newly_ready);

        state.dispatch(graph, algorithm, verbosity);
    }

    Ok(result)
}
