// src/dag/graph.rs

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::errors::ConstructionError;
use crate::task::{TaskDescriptor, TaskName};

/// Validated, immutable dependency graph of tasks.
///
/// Edge direction: predecessor -> dependent. For a task `B` that reads
/// `x.txt` produced by `A`, or lists `A` in its `task_deps`, there is an
/// edge `A -> B`.
///
/// Node indices equal declaration indices, which is what breaks ties in
/// [`TaskGraph::topological_order`].
#[derive(Debug)]
pub struct TaskGraph {
    graph: DiGraph<TaskName, ()>,
    tasks: Vec<Arc<TaskDescriptor>>,
    index: HashMap<TaskName, NodeIndex>,
    producers: HashMap<PathBuf, NodeIndex>,
    order: Vec<NodeIndex>,
    position: HashMap<NodeIndex, usize>,
}

impl TaskGraph {
    /// Validate `descriptors` and derive every dependency edge.
    pub fn build(descriptors: Vec<TaskDescriptor>) -> Result<Self, ConstructionError> {
        let mut graph: DiGraph<TaskName, ()> = DiGraph::with_capacity(descriptors.len(), 0);
        let mut index = HashMap::new();
        let mut tasks = Vec::with_capacity(descriptors.len());

        for task in descriptors {
            if index.contains_key(task.name()) {
                return Err(ConstructionError::DuplicateTask(task.name().to_string()));
            }
            let node = graph.add_node(task.name().to_string());
            index.insert(task.name().to_string(), node);
            tasks.push(Arc::new(task));
        }

        let mut producers: HashMap<PathBuf, NodeIndex> = HashMap::new();
        for (i, task) in tasks.iter().enumerate() {
            for output in task.outputs() {
                let node = NodeIndex::new(i);
                if let Some(&first) = producers.get(output.path()) {
                    return Err(ConstructionError::DuplicateProducer {
                        artifact: output.path().display().to_string(),
                        first: graph[first].clone(),
                        second: task.name().to_string(),
                    });
                }
                producers.insert(output.path().to_path_buf(), node);
            }
        }

        for (i, task) in tasks.iter().enumerate() {
            let node = NodeIndex::new(i);

            for input in task.inputs() {
                // Inputs nobody produces are plain source files.
                if let Some(&producer) = producers.get(input.path()) {
                    if producer != node {
                        graph.update_edge(producer, node, ());
                    }
                }
            }

            for dep in task.task_deps() {
                let Some(&dep_node) = index.get(dep) else {
                    return Err(ConstructionError::UnknownDependency {
                        task: task.name().to_string(),
                        dependency: dep.clone(),
                    });
                };
                if dep_node == node {
                    return Err(ConstructionError::SelfDependency(task.name().to_string()));
                }
                graph.update_edge(dep_node, node, ());
            }
        }

        if let Some(cycle) = find_cycle(&graph) {
            return Err(ConstructionError::Cycle(
                cycle.into_iter().map(|n| graph[n].clone()).collect(),
            ));
        }

        let order = declaration_ordered_toposort(&graph);
        let position = order.iter().enumerate().map(|(pos, &n)| (n, pos)).collect();

        debug!(
            tasks = tasks.len(),
            edges = graph.edge_count(),
            "task graph built"
        );

        Ok(Self {
            graph,
            tasks,
            index,
            producers,
            order,
            position,
        })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn task(&self, name: &str) -> Option<&Arc<TaskDescriptor>> {
        self.index.get(name).map(|n| &self.tasks[n.index()])
    }

    /// All tasks in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<TaskDescriptor>> {
        self.tasks.iter()
    }

    /// Every task name, predecessors always before dependents; ties break on
    /// declaration order.
    pub fn topological_order(&self) -> Vec<TaskName> {
        self.order.iter().map(|&n| self.graph[n].clone()).collect()
    }

    /// Borrowing form of [`TaskGraph::topological_order`].
    pub fn iter_topological(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.order.iter().map(move |&n| self.graph[n].as_str())
    }

    /// Position of `name` in [`TaskGraph::topological_order`].
    pub fn topological_position(&self, name: &str) -> Option<usize> {
        let node = self.index.get(name)?;
        self.position.get(node).copied()
    }

    /// Direct predecessors of `name` (artifact producers and `task_deps`),
    /// in declaration order.
    pub fn predecessors_of(&self, name: &str) -> Vec<TaskName> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Direct predecessors of `name` without sorting or cloning.
    pub fn predecessors<'g>(&'g self, name: &str) -> impl Iterator<Item = &'g str> + use<'g> {
        self.index
            .get(name)
            .copied()
            .into_iter()
            .flat_map(move |node| self.graph.neighbors_directed(node, Direction::Incoming))
            .map(move |n| self.graph[n].as_str())
    }

    /// Direct dependents of `name`, in declaration order.
    pub fn dependents_of(&self, name: &str) -> Vec<TaskName> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// The task declaring `path` as one of its outputs.
    pub fn producer_of(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.producers
            .get(path.as_ref())
            .map(|n| self.graph[*n].as_str())
    }

    /// `roots` plus everything they transitively depend on.
    pub fn with_predecessors<'a, I>(&self, roots: I) -> HashSet<TaskName>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.closure(roots, Direction::Incoming)
    }

    /// `roots` plus everything that transitively depends on them.
    pub fn with_dependents<'a, I>(&self, roots: I) -> HashSet<TaskName>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.closure(roots, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<TaskName> {
        let Some(&node) = self.index.get(name) else {
            return Vec::new();
        };
        let mut nodes: Vec<NodeIndex> = self.graph.neighbors_directed(node, dir).collect();
        nodes.sort();
        nodes.into_iter().map(|n| self.graph[n].clone()).collect()
    }

    fn closure<'a, I>(&self, roots: I, dir: Direction) -> HashSet<TaskName>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut stack: Vec<NodeIndex> = roots
            .into_iter()
            .filter_map(|name| self.index.get(name).copied())
            .collect();
        let mut seen = HashSet::new();

        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            stack.extend(self.graph.neighbors_directed(node, dir));
        }

        seen.into_iter().map(|n| self.graph[n].clone()).collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search with an explicit recursion stack. Returns the first
/// cycle found as a closed walk (`[a, b, a]`), starting roots in
/// declaration order.
fn find_cycle(graph: &DiGraph<TaskName, ()>) -> Option<Vec<NodeIndex>> {
    let mut marks = vec![Mark::Unvisited; graph.node_count()];

    for root in graph.node_indices() {
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }

        // Each frame: node + its remaining successors.
        let mut path: Vec<NodeIndex> = vec![root];
        let mut frames: Vec<Vec<NodeIndex>> = vec![successors(graph, root)];
        marks[root.index()] = Mark::OnStack;

        while let Some(frame) = frames.last_mut() {
            match frame.pop() {
                Some(next) => match marks[next.index()] {
                    Mark::Unvisited => {
                        marks[next.index()] = Mark::OnStack;
                        path.push(next);
                        frames.push(successors(graph, next));
                    }
                    Mark::OnStack => {
                        let start = path.iter().position(|&n| n == next).unwrap_or(0);
                        let mut cycle = path[start..].to_vec();
                        cycle.push(next);
                        return Some(cycle);
                    }
                    Mark::Done => {}
                },
                None => {
                    frames.pop();
                    if let Some(done) = path.pop() {
                        marks[done.index()] = Mark::Done;
                    }
                }
            }
        }
    }

    None
}

/// Successors sorted so that `pop()` yields them in declaration order.
fn successors(graph: &DiGraph<TaskName, ()>, node: NodeIndex) -> Vec<NodeIndex> {
    let mut next: Vec<NodeIndex> = graph.neighbors(node).collect();
    next.sort_by(|a, b| b.cmp(a));
    next.dedup();
    next
}

/// Kahn's algorithm; among ready nodes the earliest-declared goes first.
fn declaration_ordered_toposort(graph: &DiGraph<TaskName, ()>) -> Vec<NodeIndex> {
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<NodeIndex>> = graph
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for next in graph.neighbors(node) {
            in_degree[next.index()] -= 1;
            if in_degree[next.index()] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    order
}
