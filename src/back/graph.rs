//! The dependence graph over a renamed block
//!
//! Edges point from a reader (the later operation) to the producer it waits
//! for, so a node's edge list is exactly the set of operations that must
//! retire before it may issue. The transposed adjacency is built once, since
//! the scheduler walks it on every retirement.

use crate::middle::ir::{Block, Opcode, Slot};
use std::collections::HashMap;
use std::fmt::Write;

/// Issue latency of each opcode, in cycles
pub fn latency(opcode: Opcode) -> u32 {
    match opcode {
        Opcode::Load | Opcode::Store => 6,
        Opcode::Mult => 3,
        _ => 1,
    }
}

/// Why one operation must wait for another
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DepKind {
    /// Register value flow, carried by this VR
    Data(u32),
    /// Read-after-write through memory
    Conflict,
    /// Same-kind memory-visible operations keep their program order
    Serial,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Edge {
    pub to: usize,
    pub kind: DepKind,
}

pub struct DepGraph {
    /// `edges[i]`: the earlier operations `i` depends on
    edges: Vec<Vec<Edge>>,
    /// `dependents[i]`: the later operations that depend on `i`
    dependents: Vec<Vec<usize>>,
    /// Latency-weighted longest path from each node to a root
    priority: Vec<u32>,
}

impl DepGraph {
    pub fn build(block: &Block) -> DepGraph {
        let n = block.len();
        let mut edges: Vec<Vec<Edge>> = vec![Vec::new(); n];

        // Latest definition of each VR so far
        let mut last_def: HashMap<u32, usize> = HashMap::new();
        // All memory-visible operations so far, in program order
        let mut memory_ops: Vec<usize> = Vec::new();

        for (i, op) in block.ops().enumerate() {
            // The definition is recorded before uses are looked up, so a
            // same-register def/use in one operation resolves predictably.
            if op.opcode.writes_arg3() {
                last_def.insert(op.arg3.vr.expect("graph over an unrenamed block"), i);
            }

            for slot in op.use_slots() {
                let vr = op.arg(slot).vr.expect("graph over an unrenamed block");
                if let Some(&def) = last_def.get(&vr) {
                    edges[i].push(Edge {
                        to: def,
                        kind: DepKind::Data(vr),
                    });
                }
            }

            // Memory readers wait for every earlier store
            if matches!(op.opcode, Opcode::Load | Opcode::Output) {
                for &m in &memory_ops {
                    if block.op(m).opcode == Opcode::Store {
                        edges[i].push(Edge {
                            to: m,
                            kind: DepKind::Conflict,
                        });
                    }
                }
            }

            // Stores serialise against stores, outputs against outputs
            if op.opcode.is_memory_visible() {
                for &m in &memory_ops {
                    if block.op(m).opcode == op.opcode {
                        edges[i].push(Edge {
                            to: m,
                            kind: DepKind::Serial,
                        });
                    }
                }
                memory_ops.push(i);
            }
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, deps) in edges.iter().enumerate() {
            for edge in deps {
                dependents[edge.to].push(i);
            }
        }

        let priority = compute_priorities(block, &dependents);

        DepGraph {
            edges,
            dependents,
            priority,
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The earlier operations `node` depends on
    pub fn deps(&self, node: usize) -> &[Edge] {
        &self.edges[node]
    }

    /// The later operations that depend on `node`
    pub fn dependents(&self, node: usize) -> &[usize] {
        &self.dependents[node]
    }

    pub fn priority(&self, node: usize) -> u32 {
        self.priority[node]
    }

    /// Nodes with no dependencies at all; ready from the first cycle
    pub fn leaves(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.edges[i].is_empty()).collect()
    }

    /// Render the graph in Graphviz form for debugging
    pub fn to_dot(&self, block: &Block) -> String {
        let mut out = String::from("digraph DependenceGraph {\n");

        for (i, op) in block.ops().enumerate() {
            writeln!(
                out,
                "    \"{}\" [label=\"{}: {}\\nprio: {}\"];",
                i,
                op.line_number + 1,
                op.render(Slot::Virtual),
                self.priority[i]
            )
            .unwrap();
        }

        for (i, deps) in self.edges.iter().enumerate() {
            for edge in deps {
                let label = match edge.kind {
                    DepKind::Data(vr) => format!("data, vr{}", vr),
                    DepKind::Conflict => "conflict".to_string(),
                    DepKind::Serial => "serial".to_string(),
                };
                writeln!(out, "    \"{}\" -> \"{}\" [label=\"{}\"];", i, edge.to, label).unwrap();
            }
        }

        out.push_str("}\n");
        out
    }
}

/// Latency-weighted longest path from each node to a root of the transposed
/// graph
///
/// Every edge points from a later operation to an earlier one, so a single
/// sweep from the last node to the first sees all of a node's dependents
/// before the node itself.
fn compute_priorities(block: &Block, dependents: &[Vec<usize>]) -> Vec<u32> {
    let n = block.len();
    let mut priority = vec![0; n];

    for i in (0..n).rev() {
        let tail = dependents[i].iter().map(|&d| priority[d]).max().unwrap_or(0);
        priority[i] = latency(block.op(i).opcode) + tail;
    }

    priority
}
