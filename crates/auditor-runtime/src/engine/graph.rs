//! Stage dependency graph.
//!
//! The graph is acyclic by construction: every mutation that would add an
//! unknown stage or a cycle is rejected with a [`GraphDefinitionError`],
//! so execution never has to handle a malformed graph.

use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Errors from building a stage graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphDefinitionError {
    #[error("Duplicate stage ID: {0}")]
    DuplicateStage(String),

    #[error("Stage {stage} depends on unregistered stage {dependency}")]
    UnknownDependency { stage: String, dependency: String },

    #[error("Dependency {dependency} -> {stage} would introduce a cycle")]
    Cycle { stage: String, dependency: String },
}

#[derive(Debug, Clone)]
struct StageNode {
    id: String,
    upstream: Vec<usize>,
}

/// Directed acyclic graph of stage ids.
#[derive(Debug, Clone, Default)]
pub struct StageGraph {
    nodes: Vec<StageNode>,
    index: HashMap<String, usize>,
}

impl StageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage that depends on already-registered stages.
    pub fn register(&mut self, id: &str, upstream: &[&str]) -> Result<(), GraphDefinitionError> {
        if self.index.contains_key(id) {
            return Err(GraphDefinitionError::DuplicateStage(id.to_string()));
        }

        let mut resolved = Vec::with_capacity(upstream.len());
        for dependency in upstream {
            if *dependency == id {
                return Err(GraphDefinitionError::Cycle {
                    stage: id.to_string(),
                    dependency: id.to_string(),
                });
            }
            let position = self.position(id, dependency)?;
            if !resolved.contains(&position) {
                resolved.push(position);
            }
        }

        self.index.insert(id.to_string(), self.nodes.len());
        self.nodes.push(StageNode {
            id: id.to_string(),
            upstream: resolved,
        });
        Ok(())
    }

    /// Add an edge between two registered stages.
    ///
    /// Rejected when `upstream` already depends on `stage`, directly or
    /// transitively.
    pub fn add_dependency(&mut self, stage: &str, upstream: &str) -> Result<(), GraphDefinitionError> {
        let to = self.position(stage, stage)?;
        let from = self.position(stage, upstream)?;

        if to == from || self.depends_on(from, to) {
            return Err(GraphDefinitionError::Cycle {
                stage: stage.to_string(),
                dependency: upstream.to_string(),
            });
        }

        if !self.nodes[to].upstream.contains(&from) {
            self.nodes[to].upstream.push(from);
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Upstream stage ids of `id`, in declaration order.
    pub fn upstream(&self, id: &str) -> Vec<&str> {
        self.index
            .get(id)
            .map(|&i| {
                self.nodes[i]
                    .upstream
                    .iter()
                    .map(|&u| self.nodes[u].id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Group stages into fan-out layers.
    ///
    /// A stage lands in the first layer after all of its dependencies.
    /// Stages within a layer keep registration order.
    pub fn layers(&self) -> Vec<Vec<&str>> {
        let mut depth = vec![0usize; self.nodes.len()];
        let mut remaining: Vec<usize> = self.nodes.iter().map(|n| n.upstream.len()).collect();
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            for &u in &node.upstream {
                downstream[u].push(i);
            }
        }

        let mut queue: VecDeque<usize> = (0..self.nodes.len()).filter(|&i| remaining[i] == 0).collect();
        while let Some(current) = queue.pop_front() {
            for &next in &downstream[current] {
                depth[next] = depth[next].max(depth[current] + 1);
                remaining[next] -= 1;
                if remaining[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        let count = depth.iter().max().map_or(0, |d| d + 1);
        let mut layers: Vec<Vec<&str>> = vec![Vec::new(); count];
        for (i, node) in self.nodes.iter().enumerate() {
            layers[depth[i]].push(node.id.as_str());
        }
        layers
    }

    fn position(&self, stage: &str, id: &str) -> Result<usize, GraphDefinitionError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphDefinitionError::UnknownDependency {
                stage: stage.to_string(),
                dependency: id.to_string(),
            })
    }

    /// Whether `from` reaches `to` by following upstream edges.
    fn depends_on(&self, from: usize, to: usize) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if visited.insert(current) {
                queue.extend(self.nodes[current].upstream.iter().copied());
            }
        }
        false
    }
}
