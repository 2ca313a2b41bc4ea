//! Task graph arena: tasks, processors and incremental readiness.
//!
//! Tasks live in a single `Vec` indexed by [`TaskId`]; edges are id lists on
//! both ends (`blocking` outgoing, `predecessors` incoming), so the mirrored
//! relation never forms an ownership cycle. `blocked_by` is the dynamic copy
//! of `predecessors` that shrinks as predecessors complete.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::interner::NameInterner;
pub use crate::interner::TaskId;
use crate::models::{GraphSpec, ProcessorDescriptor};
use crate::topology::{topological_order, TopologyError};

pub type ProcessorId = u32;
pub type ProcessorType = u32;

/// Errors raised while building or validating a graph.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Duplicate task: {0}")]
    DuplicateTask(String),
    #[error("Unknown task: {0}")]
    UnknownTask(String),
    #[error("Invalid duration {duration} for task {task}")]
    InvalidDuration { task: String, duration: f64 },
    #[error("Invalid processor descriptor {0:?} (expected \"name:type\")")]
    InvalidProcessor(String),
    #[error("Cycle detected in task graph at task {0}")]
    CycleDetected(String),
    #[error("Failed to parse graph: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<TopologyError> for GraphError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::CycleDetected { task } => GraphError::CycleDetected(task),
        }
    }
}

/// Lifecycle of a task during one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Has unmet predecessors.
    Waiting,
    /// No unmet predecessors, not assigned.
    Ready,
    /// Assigned to a processor.
    Running,
    Done,
}

/// A DAG node.
#[derive(Clone, Debug)]
pub struct Task {
    pub name: String,
    pub duration: f64,
    pub processor_type: ProcessorType,
    /// Lower = more urgent.
    pub priority: i32,
    /// Longest duration-weighted chain starting at this task (inclusive).
    pub critical_time: f64,
    pub earliest_start: f64,
    pub latest_start: f64,
    /// Known once the task is assigned: start time + duration.
    pub end_time: Option<f64>,
    blocking: Vec<TaskId>,
    predecessors: Vec<TaskId>,
    blocked_by: Vec<TaskId>,
    done: bool,
    processor: Option<ProcessorId>,
}

impl Task {
    fn new(name: &str, duration: f64, processor_type: ProcessorType, priority: i32) -> Self {
        Self {
            name: name.to_string(),
            duration,
            processor_type,
            priority,
            critical_time: 0.0,
            earliest_start: 0.0,
            latest_start: 0.0,
            end_time: None,
            blocking: Vec::new(),
            predecessors: Vec::new(),
            blocked_by: Vec::new(),
            done: false,
            processor: None,
        }
    }

    /// Tasks that cannot start until this one finishes.
    pub fn blocking(&self) -> &[TaskId] {
        &self.blocking
    }

    /// All incoming edges, regardless of completion.
    pub fn predecessors(&self) -> &[TaskId] {
        &self.predecessors
    }

    /// Predecessors that have not finished yet.
    pub fn blocked_by(&self) -> &[TaskId] {
        &self.blocked_by
    }

    pub fn out_degree(&self) -> usize {
        self.blocking.len()
    }

    pub fn in_degree(&self) -> usize {
        self.predecessors.len()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn processor(&self) -> Option<ProcessorId> {
        self.processor
    }

    pub fn is_ready(&self) -> bool {
        self.blocked_by.is_empty() && !self.done && self.processor.is_none()
    }

    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty() && !self.done
    }

    pub fn state(&self) -> TaskState {
        if self.done {
            TaskState::Done
        } else if self.processor.is_some() {
            TaskState::Running
        } else if self.blocked_by.is_empty() {
            TaskState::Ready
        } else {
            TaskState::Waiting
        }
    }

    fn reset(&mut self) {
        self.blocked_by.clone_from(&self.predecessors);
        self.done = false;
        self.processor = None;
        self.end_time = None;
    }
}

/// A typed execution resource. Idle exactly when it has no current task.
#[derive(Clone, Debug)]
pub struct Processor {
    pub name: String,
    pub processor_type: ProcessorType,
    current_task: Option<TaskId>,
    work_order: Vec<TaskId>,
}

impl Processor {
    fn new(name: &str, processor_type: ProcessorType) -> Self {
        Self {
            name: name.to_string(),
            processor_type,
            current_task: None,
            work_order: Vec::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current_task.is_none()
    }

    pub fn current_task(&self) -> Option<TaskId> {
        self.current_task
    }

    /// Every task this processor has started, in start order.
    pub fn work_order(&self) -> &[TaskId] {
        &self.work_order
    }

    /// `"name:type"`, unique within a pool.
    pub fn label(&self) -> String {
        format!("{}:{}", self.name, self.processor_type)
    }
}

/// Owns every task and processor of one simulation.
#[derive(Clone, Debug, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    names: NameInterner,
    processors: Vec<Processor>,
    processor_index: FxHashMap<(String, ProcessorType), ProcessorId>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from the parser's load contract.
    ///
    /// Edges are mirrored on both ends, processors are de-duplicated by
    /// `(name, type)`, and the result is checked for cycles.
    pub fn from_spec(spec: &GraphSpec) -> Result<Self, GraphError> {
        let mut graph = Self {
            names: NameInterner::with_capacity(spec.tasks.len()),
            ..Self::default()
        };

        for (name, task) in &spec.tasks {
            graph.add_task(name, task.duration, task.processor_type, task.priority)?;
        }

        for (name, task) in &spec.tasks {
            for blocked in &task.blocking {
                graph.add_edge_by_name(name, blocked)?;
            }
        }

        for descriptor in &spec.processors {
            let descriptor: ProcessorDescriptor = descriptor.parse()?;
            graph.add_processor(&descriptor.name, descriptor.processor_type);
        }

        graph.validate()?;
        Ok(graph)
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Self::from_spec(&GraphSpec::from_json(json)?)
    }

    pub fn add_task(
        &mut self,
        name: &str,
        duration: f64,
        processor_type: ProcessorType,
        priority: i32,
    ) -> Result<TaskId, GraphError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(GraphError::InvalidDuration {
                task: name.to_string(),
                duration,
            });
        }
        let (id, is_new) = self.names.intern(name);
        if !is_new {
            return Err(GraphError::DuplicateTask(name.to_string()));
        }
        self.tasks
            .push(Task::new(name, duration, processor_type, priority));
        Ok(id)
    }

    /// Insert the edge `from -> to` (`from` blocks `to`) on both ends.
    ///
    /// Returns `false` when the edge already existed. Self-loops are rejected;
    /// longer cycles are caught by [`TaskGraph::validate`].
    pub fn add_edge(&mut self, from: TaskId, to: TaskId) -> Result<bool, GraphError> {
        for id in [from, to] {
            if id as usize >= self.tasks.len() {
                return Err(GraphError::UnknownTask(format!("#{id}")));
            }
        }
        if from == to {
            return Err(GraphError::CycleDetected(self.name(from).to_string()));
        }
        if self.tasks[from as usize].blocking.contains(&to) {
            return Ok(false);
        }

        self.tasks[from as usize].blocking.push(to);
        let target = &mut self.tasks[to as usize];
        target.predecessors.push(from);
        if !self.tasks[from as usize].done {
            self.tasks[to as usize].blocked_by.push(from);
        }
        Ok(true)
    }

    pub fn add_edge_by_name(&mut self, from: &str, to: &str) -> Result<bool, GraphError> {
        let from = self
            .lookup(from)
            .ok_or_else(|| GraphError::UnknownTask(from.to_string()))?;
        let to = self
            .lookup(to)
            .ok_or_else(|| GraphError::UnknownTask(to.to_string()))?;
        self.add_edge(from, to)
    }

    /// Add a processor unless one with the same `(name, type)` exists.
    pub fn add_processor(&mut self, name: &str, processor_type: ProcessorType) -> ProcessorId {
        let key = (name.to_string(), processor_type);
        if let Some(&id) = self.processor_index.get(&key) {
            return id;
        }
        let id = self.processors.len() as ProcessorId;
        self.processors.push(Processor::new(name, processor_type));
        self.processor_index.insert(key, id);
        id
    }

    /// Check acyclicity, returning a predecessors-first order.
    pub fn validate(&self) -> Result<Vec<TaskId>, GraphError> {
        Ok(topological_order(self)?)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        (0..self.tasks.len()).map(|i| i as TaskId)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Panics on an id that was not issued by this graph.
    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id as usize]
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.tasks[id as usize]
    }

    pub fn lookup(&self, name: &str) -> Option<TaskId> {
        self.names.get(name)
    }

    pub fn name(&self, id: TaskId) -> &str {
        self.names.resolve(id).unwrap_or("<unknown>")
    }

    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    pub fn processor(&self, id: ProcessorId) -> &Processor {
        &self.processors[id as usize]
    }

    pub fn has_processor_type(&self, processor_type: ProcessorType) -> bool {
        self.processors
            .iter()
            .any(|p| p.processor_type == processor_type)
    }

    pub fn is_ready(&self, id: TaskId) -> bool {
        self.task(id).is_ready()
    }

    /// Every currently ready task, in insertion order.
    pub fn ready_tasks(&self) -> Vec<TaskId> {
        self.task_ids().filter(|&id| self.is_ready(id)).collect()
    }

    pub fn idle_processors(&self) -> Vec<ProcessorId> {
        self.processors
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_idle())
            .map(|(i, _)| i as ProcessorId)
            .collect()
    }

    /// First idle processor of the given type, in pool order.
    pub fn find_idle_processor(&self, processor_type: ProcessorType) -> Option<ProcessorId> {
        self.processors
            .iter()
            .position(|p| p.processor_type == processor_type && p.is_idle())
            .map(|i| i as ProcessorId)
    }

    /// Start `task` on `processor` at `now`. Returns the completion time.
    pub(crate) fn assign(&mut self, task: TaskId, processor: ProcessorId, now: f64) -> f64 {
        let proc = &mut self.processors[processor as usize];
        proc.current_task = Some(task);
        proc.work_order.push(task);

        let task = &mut self.tasks[task as usize];
        task.processor = Some(processor);
        let end_time = now + task.duration;
        task.end_time = Some(end_time);
        end_time
    }

    /// Mark `task` done and free its processor.
    ///
    /// Returns the successors that became ready, in `blocking` order.
    pub(crate) fn finish(&mut self, task: TaskId) -> Vec<TaskId> {
        let idx = task as usize;
        if let Some(processor) = self.tasks[idx].processor.take() {
            self.processors[processor as usize].current_task = None;
        }
        self.tasks[idx].done = true;

        let mut newly_ready = Vec::new();
        for i in 0..self.tasks[idx].blocking.len() {
            let successor = self.tasks[idx].blocking[i];
            let succ = &mut self.tasks[successor as usize];
            if let Some(pos) = succ.blocked_by.iter().position(|&p| p == task) {
                succ.blocked_by.remove(pos);
                if succ.blocked_by.is_empty() && !succ.done && succ.processor.is_none() {
                    newly_ready.push(successor);
                }
            }
        }
        newly_ready
    }

    /// Restore every dynamic field so the graph can be run again.
    pub fn reset(&mut self) {
        for task in &mut self.tasks {
            task.reset();
        }
        for processor in &mut self.processors {
            processor.current_task = None;
            processor.work_order.clear();
        }
    }
}

/// Panics unless `blocked_by` holds exactly the unfinished predecessors and
/// processor assignments agree in both directions.
#[cfg(test)]
pub(crate) fn assert_readiness_invariant(graph: &TaskGraph) {
    for (id, task) in graph.tasks().iter().enumerate() {
        let mut pending: Vec<TaskId> = task
            .predecessors()
            .iter()
            .copied()
            .filter(|&p| !graph.task(p).is_done())
            .collect();
        let mut blocked_by = task.blocked_by().to_vec();
        pending.sort_unstable();
        blocked_by.sort_unstable();
        assert_eq!(blocked_by, pending, "stale blocked_by on {}", task.name);

        if task.is_done() || task.processor().is_some() {
            assert!(
                pending.is_empty(),
                "{} started before its inputs",
                task.name
            );
        }
        if let Some(processor) = task.processor() {
            assert!(!task.is_done(), "{} done but still assigned", task.name);
            assert_eq!(
                graph.processor(processor).current_task(),
                Some(id as TaskId),
                "{} not held by its processor",
                task.name
            );
        }
        assert_eq!(
            task.is_ready(),
            pending.is_empty() && task.state() == TaskState::Ready,
            "readiness disagrees for {}",
            task.name
        );
    }
}
