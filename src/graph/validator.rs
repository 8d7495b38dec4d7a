use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Kind of an edge declaration, in the order it appears in the source
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Add,
    Remove,
}

/// Outcome of a single edge declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCheck {
    pub cyclic: bool,
}

/// A directed dependency between two task ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub pred: String,
    pub succ: String,
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > {}", self.pred, self.succ)
    }
}

#[derive(Debug, Clone)]
struct EdgeOp {
    pred: usize,
    succ: usize,
    kind: EdgeKind,
}

/// Incremental dependency-graph validator.
///
/// Edge declarations stream through in document order; each `Add` is checked
/// against the graph exactly as it exists at that point in the stream, so a
/// cycle closed and later re-opened by a removal is still reported, while an
/// edge removed before the would-be closing edge arrives never is.
///
/// One validator instance belongs to one document run. Its graph state is
/// not shared; call [`DependencyValidator::reset`] before reusing it for
/// another document.
#[derive(Debug, Default)]
pub struct DependencyValidator {
    handles: HashMap<String, usize>,
    names: Vec<String>,
    adjacency: Vec<Vec<usize>>,
    log: Vec<EdgeOp>,
    cycles: Vec<DependencyEdge>,
}

impl DependencyValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one edge declaration and report whether it closed a cycle.
    ///
    /// `Add` inserts the edge and runs a reachability check from `succ` back
    /// to `pred`; a self-edge is a cycle of length 1. The offending edge
    /// stays in the graph either way, matching the declaration stream.
    /// `Remove` deletes one matching occurrence and never reports a cycle.
    pub fn validate_edge(&mut self, pred: &str, succ: &str, kind: EdgeKind) -> EdgeCheck {
        let pred_ix = self.intern(pred);
        let succ_ix = self.intern(succ);
        self.log.push(EdgeOp {
            pred: pred_ix,
            succ: succ_ix,
            kind,
        });

        match kind {
            EdgeKind::Add => {
                self.adjacency[pred_ix].push(succ_ix);
                let cyclic = self.reaches(succ_ix, pred_ix);
                if cyclic {
                    warn!(pred, succ, "cycle detected in dependency chain");
                    self.cycles.push(DependencyEdge {
                        pred: pred.to_string(),
                        succ: succ.to_string(),
                    });
                }
                EdgeCheck { cyclic }
            }
            EdgeKind::Remove => {
                if let Some(pos) = self.adjacency[pred_ix].iter().position(|&s| s == succ_ix) {
                    self.adjacency[pred_ix].remove(pos);
                }
                EdgeCheck { cyclic: false }
            }
        }
    }

    /// Edges whose declaration closed a cycle, in declaration order.
    pub fn cycles(&self) -> &[DependencyEdge] {
        &self.cycles
    }

    /// The current edge set, in insertion order per predecessor. Removed
    /// edges are absent.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        let mut edges = Vec::new();
        for (pred_ix, successors) in self.adjacency.iter().enumerate() {
            for &succ_ix in successors {
                edges.push(DependencyEdge {
                    pred: self.names[pred_ix].clone(),
                    succ: self.names[succ_ix].clone(),
                });
            }
        }
        edges
    }

    pub fn declaration_count(&self) -> usize {
        self.log.len()
    }

    /// The declaration log replayed in document order, resolved back to
    /// task ids.
    pub fn declarations(&self) -> Vec<(DependencyEdge, EdgeKind)> {
        self.log
            .iter()
            .map(|op| {
                let edge = DependencyEdge {
                    pred: self.names[op.pred].clone(),
                    succ: self.names[op.succ].clone(),
                };
                (edge, op.kind)
            })
            .collect()
    }

    /// Drop all graph state. Required between independent documents; the
    /// validator otherwise leaks edges across runs.
    pub fn reset(&mut self) {
        self.handles.clear();
        self.names.clear();
        self.adjacency.clear();
        self.log.clear();
        self.cycles.clear();
    }

    fn intern(&mut self, id: &str) -> usize {
        if let Some(&handle) = self.handles.get(id) {
            return handle;
        }
        let handle = self.names.len();
        self.handles.insert(id.to_string(), handle);
        self.names.push(id.to_string());
        self.adjacency.push(Vec::new());
        handle
    }

    /// Depth-first reachability from `from` to `target` over the current
    /// adjacency state. Visits each node at most once, so the walk is
    /// bounded even though the graph may already contain cycles.
    fn reaches(&self, from: usize, target: usize) -> bool {
        if from == target {
            return true;
        }
        let mut visited = vec![false; self.names.len()];
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if visited[node] {
                continue;
            }
            visited[node] = true;
            for &succ in &self.adjacency[node] {
                if !visited[succ] {
                    stack.push(succ);
                }
            }
        }
        false
    }
}
