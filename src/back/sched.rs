//! List scheduling for a two-issue pipeline
//!
//! Cycle-driven: each cycle issues up to two ready operations, highest
//! priority first, subject to the functional-unit caps (one memory access and
//! one multiply per cycle). Issued operations sit in the active set until
//! their latency elapses; retiring releases any dependent whose dependencies
//! have all retired.

use crate::back::graph::{latency, DepGraph};
use crate::middle::ir::{Block, Opcode, Slot};
use std::cmp::Reverse;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Status {
    NotReady,
    Ready,
    Active,
    Retired,
}

/// One issue cycle: the cycle number and its two slots (node indices)
pub type Row = (u32, [Option<usize>; 2]);

pub struct Schedule {
    pub rows: Vec<Row>,
}

impl Schedule {
    /// The cycle `node` was issued in
    pub fn cycle_of(&self, node: usize) -> Option<u32> {
        self.rows.iter().find_map(|&(cycle, slots)| {
            if slots.iter().flatten().any(|&n| n == node) {
                Some(cycle)
            } else {
                None
            }
        })
    }

    /// Render one `[ op1 ; op2 ]` line per cycle, empty slots as `nop`
    pub fn render(&self, block: &Block) -> String {
        self.rows
            .iter()
            .map(|(_, slots)| {
                let render = |slot: &Option<usize>| match *slot {
                    Some(node) => block.op(node).render(Slot::Virtual),
                    None => "nop".to_string(),
                };
                format!("[ {} ; {} ]", render(&slots[0]), render(&slots[1]))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Schedule the block over its dependence graph
pub fn schedule(block: &Block, graph: &DepGraph) -> Schedule {
    Scheduler::new(block, graph).run()
}

struct Scheduler<'a> {
    block: &'a Block,
    graph: &'a DepGraph,
    status: Vec<Status>,
    ready: Vec<usize>,
    /// Issued operations and the cycle they retire in
    active: Vec<(usize, u32)>,
    cycle: u32,
}

impl<'a> Scheduler<'a> {
    fn new(block: &'a Block, graph: &'a DepGraph) -> Scheduler<'a> {
        let mut status = vec![Status::NotReady; graph.len()];
        let ready = graph.leaves();
        for &node in &ready {
            status[node] = Status::Ready;
        }

        Scheduler {
            block,
            graph,
            status,
            ready,
            active: Vec::new(),
            cycle: 1,
        }
    }

    fn run(mut self) -> Schedule {
        let mut rows = Vec::new();

        while !self.ready.is_empty() || !self.active.is_empty() {
            let issued = self.select_operations();

            // With an empty active set nothing can ever become ready again,
            // so failing to issue would spin forever. Cannot happen for an
            // acyclic graph; bail out loudly if it does.
            if issued.iter().all(Option::is_none) && self.active.is_empty() {
                panic!(
                    "scheduler stalled with {} operations outstanding",
                    self.ready.len()
                );
            }

            for &node in issued.iter().flatten() {
                self.status[node] = Status::Active;
                let retire_cycle = self.cycle + latency(self.block.op(node).opcode);
                self.active.push((node, retire_cycle));
                trace!("cycle {}: issued node {}, retires in {}", self.cycle, node, retire_cycle);
            }

            rows.push((self.cycle, issued));
            self.cycle += 1;
            self.retire();
        }

        Schedule { rows }
    }

    /// Pick up to two ready operations, highest priority first (ties by node
    /// index), honouring the per-cycle functional-unit caps
    fn select_operations(&mut self) -> [Option<usize>; 2] {
        let mut candidates = self.ready.clone();
        candidates.sort_by_key(|&node| (Reverse(self.graph.priority(node)), node));

        let mut selected = [None, None];
        let mut count = 0;

        let mut load_issued = false;
        let mut store_issued = false;
        let mut mult_issued = false;

        for node in candidates {
            match self.block.op(node).opcode {
                // One memory access per cycle, read or write
                Opcode::Load => {
                    if load_issued || store_issued {
                        continue;
                    }
                    load_issued = true;
                }
                Opcode::Store => {
                    if store_issued || load_issued {
                        continue;
                    }
                    store_issued = true;
                }
                Opcode::Mult => {
                    if mult_issued {
                        continue;
                    }
                    mult_issued = true;
                }
                _ => {}
            }

            selected[count] = Some(node);
            count += 1;
            if count == 2 {
                break;
            }
        }

        for node in selected.iter().flatten() {
            self.ready.retain(|n| n != node);
        }

        selected
    }

    /// Retire finished operations and promote dependents whose dependencies
    /// have all retired
    fn retire(&mut self) {
        let cycle = self.cycle;
        let mut finished = Vec::new();

        self.active.retain(|&(node, retire_cycle)| {
            if cycle >= retire_cycle {
                finished.push(node);
                false
            } else {
                true
            }
        });

        for node in finished {
            self.status[node] = Status::Retired;

            for &dependent in self.graph.dependents(node) {
                if self.status[dependent] != Status::NotReady {
                    continue;
                }

                let released = self
                    .graph
                    .deps(dependent)
                    .iter()
                    .all(|edge| self.status[edge.to] == Status::Retired);

                if released {
                    self.status[dependent] = Status::Ready;
                    self.ready.push(dependent);
                }
            }
        }
    }
}
