#![cfg(test)]

use crate::back::alloc::{allocate, Allocator, SPILL_BASE};
use crate::back::graph::{latency, DepGraph, DepKind, Edge};
use crate::back::sched::{schedule, Schedule};
use crate::driver::session;
use crate::front::{Parser, Scanner};
use crate::middle::ir::{Block, Opcode, Operand, Slot};
use crate::middle::rename;
use std::collections::HashMap;

fn renamed(source: &str) -> (Block, u32, u32) {
    let mut block = Parser::new(Scanner::new(source)).parse();
    assert!(!session().has_errors());

    let (vr_count, max_live) = rename(&mut block);
    (block, vr_count, max_live)
}

/// Execute a block, reading registers through the given numbering, and
/// collect the values the `output` operations print
fn simulate(block: &Block, slot: Slot) -> Vec<u32> {
    let mut regs: HashMap<u32, u32> = HashMap::new();
    let mut memory: HashMap<u32, u32> = HashMap::new();
    let mut printed = Vec::new();

    let reg_of = |arg: &Operand| match slot {
        Slot::Virtual => arg.vr.expect("register operand without a vr"),
        Slot::Physical => arg.pr.expect("register operand without a pr"),
    };

    for op in block.ops() {
        match op.opcode {
            Opcode::LoadI => {
                regs.insert(reg_of(&op.arg3), op.arg1.sr.unwrap());
            }
            Opcode::Load => {
                let address = regs[&reg_of(&op.arg1)];
                let value = *memory.get(&address).unwrap_or(&0);
                regs.insert(reg_of(&op.arg3), value);
            }
            Opcode::Store => {
                let address = regs[&reg_of(&op.arg3)];
                let value = regs[&reg_of(&op.arg1)];
                memory.insert(address, value);
            }
            Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::Lshift | Opcode::Rshift => {
                let lhs = regs[&reg_of(&op.arg1)];
                let rhs = regs[&reg_of(&op.arg2)];
                let value = match op.opcode {
                    Opcode::Add => lhs.wrapping_add(rhs),
                    Opcode::Sub => lhs.wrapping_sub(rhs),
                    Opcode::Mult => lhs.wrapping_mul(rhs),
                    Opcode::Lshift => lhs.wrapping_shl(rhs),
                    Opcode::Rshift => lhs.wrapping_shr(rhs),
                    _ => unreachable!(),
                };
                regs.insert(reg_of(&op.arg3), value);
            }
            Opcode::Output => {
                printed.push(*memory.get(&op.arg1.sr.unwrap()).unwrap_or(&0));
            }
            Opcode::Nop => {}
        }
    }

    printed
}

const FIVE_LIVE: &str = "loadI 1 => r1\n\
                         loadI 2 => r2\n\
                         loadI 3 => r3\n\
                         loadI 4 => r4\n\
                         loadI 5 => r5\n\
                         add r1, r2 => r6\n\
                         add r6, r3 => r7\n\
                         add r7, r4 => r8\n\
                         add r8, r5 => r9\n\
                         store r9 => r1\n\
                         output 1\n";

// --- Allocator ----------------------------------------------------------------

#[test]
fn alloc_no_spill_when_registers_suffice() {
    let (mut block, vr_count, max_live) = renamed(
        "loadI 1024 => r1\nloadI 4 => r2\nadd r1, r2 => r3\noutput 1024\n",
    );
    assert_eq!(max_live, 2);

    allocate(&mut block, 3, vr_count, max_live);

    // No spill code: the block keeps its four operations
    assert_eq!(block.len(), 4);

    for op in block.ops() {
        for slot in 0..3 {
            if let Some(pr) = op.arg(slot).pr {
                assert!(pr < 3, "r{} is outside the register budget", pr);
            }
        }
    }
}

#[test]
fn alloc_no_spill_when_k_equals_maxlive() {
    let (mut block, vr_count, max_live) = renamed(FIVE_LIVE);
    assert_eq!(max_live, 5);

    let before = block.len();
    allocate(&mut block, 5, vr_count, max_live);

    assert_eq!(block.len(), before);
    assert_eq!(simulate(&block, Slot::Physical), vec![15]);
}

#[test]
fn alloc_forced_spill_reserves_the_top_register() {
    let (mut block, vr_count, max_live) = renamed(FIVE_LIVE);
    allocate(&mut block, 3, vr_count, max_live);

    // Spill code was inserted
    assert!(block.len() > 11);

    // Every spill/restore sequence is a `loadI offset => r2` followed by the
    // store or load moving the value
    let mut spill_member = vec![false; block.len()];
    for (i, op) in block.ops().enumerate() {
        if op.opcode == Opcode::LoadI && op.arg3.pr == Some(2) {
            let offset = op.arg1.sr.unwrap();
            assert!(offset >= SPILL_BASE);
            assert_eq!(offset % 4, 0);

            let next = block.op(i + 1);
            match next.opcode {
                Opcode::Store => assert_eq!(next.arg3.pr, Some(2)),
                Opcode::Load => assert_eq!(next.arg1.pr, Some(2)),
                opcode => panic!("unexpected {} after a spill address", opcode),
            }

            spill_member[i] = true;
            spill_member[i + 1] = true;
        }
    }

    // The reserved register never leaks into ordinary operations
    for (i, op) in block.ops().enumerate() {
        if spill_member[i] {
            continue;
        }
        for slot in 0..3 {
            assert_ne!(
                op.arg(slot).pr,
                Some(2),
                "reserved register used by `{}`",
                op.render(Slot::Physical)
            );
        }
    }

    // The first spill sits at the base of the spill area
    let offsets: Vec<u32> = block
        .ops()
        .filter(|op| op.opcode == Opcode::LoadI && op.arg3.pr == Some(2))
        .map(|op| op.arg1.sr.unwrap())
        .collect();
    assert!(offsets.contains(&SPILL_BASE));
}

#[test]
fn alloc_spill_offsets_grow_by_four() {
    let (mut block, vr_count, max_live) = renamed(FIVE_LIVE);
    allocate(&mut block, 3, vr_count, max_live);

    let mut offsets: Vec<u32> = block
        .ops()
        .filter(|op| op.opcode == Opcode::LoadI && op.arg3.pr == Some(2))
        .map(|op| op.arg1.sr.unwrap())
        .collect();
    offsets.sort_unstable();
    offsets.dedup();

    for (i, offset) in offsets.iter().enumerate() {
        assert_eq!(*offset, SPILL_BASE + 4 * i as u32);
    }
}

#[test]
fn alloc_spilled_code_computes_the_same_values() {
    let (block, vr_count, max_live) = renamed(FIVE_LIVE);
    let expected = simulate(&block, Slot::Virtual);
    assert_eq!(expected, vec![15]);

    for k in 3..=6 {
        let mut allocated = block.clone();
        allocate(&mut allocated, k, vr_count, max_live);
        assert_eq!(
            simulate(&allocated, Slot::Physical),
            expected,
            "wrong results with {} registers",
            k
        );
    }
}

#[test]
fn alloc_restores_spilled_values_before_reuse() {
    let (mut block, vr_count, max_live) = renamed(FIVE_LIVE);
    allocate(&mut block, 3, vr_count, max_live);

    // The address in r1 is live across the whole block; with two allocatable
    // registers it must be spilled and restored at least once
    let restores = block
        .ops()
        .filter(|op| op.opcode == Opcode::Load && op.arg1.pr == Some(2))
        .count();
    assert!(restores >= 1);
}

#[test]
fn alloc_maps_stay_mutual_inverses() {
    let (mut block, vr_count, max_live) = renamed(FIVE_LIVE);

    let mut allocator = Allocator::new(3, vr_count, max_live);
    allocator.run(&mut block);
    allocator.check_maps();
}

// --- Dependence graph ---------------------------------------------------------

#[test]
fn graph_data_edges_point_at_the_latest_definition() {
    let (block, ..) = renamed("loadI 2 => r1\nload r1 => r2\nadd r1, r2 => r3\nstore r3 => r1\n");
    let graph = DepGraph::build(&block);

    let vr = |i: usize, slot: usize| block.op(i).arg(slot).vr.unwrap();

    assert!(graph.deps(0).is_empty());
    assert_eq!(
        graph.deps(1),
        &[Edge {
            to: 0,
            kind: DepKind::Data(vr(1, 0)),
        }]
    );
    assert_eq!(
        graph.deps(2),
        &[
            Edge {
                to: 0,
                kind: DepKind::Data(vr(2, 0)),
            },
            Edge {
                to: 1,
                kind: DepKind::Data(vr(2, 1)),
            },
        ]
    );
    assert_eq!(
        graph.deps(3),
        &[
            Edge {
                to: 2,
                kind: DepKind::Data(vr(3, 0)),
            },
            Edge {
                to: 0,
                kind: DepKind::Data(vr(3, 2)),
            },
        ]
    );
}

#[test]
fn graph_memory_edges() {
    let (block, ..) = renamed(
        "store r1 => r2\nload r3 => r4\nstore r4 => r5\noutput 100\noutput 200\n",
    );
    let graph = DepGraph::build(&block);

    // The load reads memory a store may have written
    assert!(graph
        .deps(1)
        .contains(&Edge { to: 0, kind: DepKind::Conflict }));

    // Stores serialise against earlier stores
    assert!(graph
        .deps(2)
        .contains(&Edge { to: 0, kind: DepKind::Serial }));

    // Outputs read memory: conflict edges against both stores
    assert!(graph
        .deps(3)
        .contains(&Edge { to: 0, kind: DepKind::Conflict }));
    assert!(graph
        .deps(3)
        .contains(&Edge { to: 2, kind: DepKind::Conflict }));

    // Outputs serialise against earlier outputs
    assert!(graph
        .deps(4)
        .contains(&Edge { to: 3, kind: DepKind::Serial }));
}

#[test]
fn graph_edges_always_point_backwards() {
    let (block, ..) = renamed(FIVE_LIVE);
    let graph = DepGraph::build(&block);

    for node in 0..graph.len() {
        for edge in graph.deps(node) {
            assert!(edge.to < node);
        }
    }
}

#[test]
fn graph_latency_weighted_priorities() {
    let (block, ..) = renamed("load r1 => r2\nadd r2, r2 => r3\n");
    let graph = DepGraph::build(&block);

    assert_eq!(latency(Opcode::Load), 6);
    assert_eq!(latency(Opcode::Mult), 3);
    assert_eq!(latency(Opcode::Add), 1);

    // The load heads a chain ending at the add
    assert_eq!(graph.priority(1), 1);
    assert_eq!(graph.priority(0), 7);
}

#[test]
fn graph_leaves_have_no_dependencies() {
    let (block, ..) = renamed("load r1 => r2\nadd r2, r2 => r3\nnop\n");
    let graph = DepGraph::build(&block);

    assert_eq!(graph.leaves(), vec![0, 2]);
}

#[test]
fn graph_renders_dot() {
    let (block, ..) = renamed("store r1 => r2\nload r3 => r4\n");
    let graph = DepGraph::build(&block);
    let dot = graph.to_dot(&block);

    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("conflict"));
    assert!(dot.contains("prio"));
}

// --- Scheduler ----------------------------------------------------------------

fn assert_schedule_valid(block: &Block, graph: &DepGraph, schedule: &Schedule) {
    // Every operation issues exactly once
    let mut seen = vec![0u32; block.len()];
    for (_, slots) in &schedule.rows {
        for &node in slots.iter().flatten() {
            seen[node] += 1;
        }
    }
    assert!(seen.iter().all(|&count| count == 1), "issue counts: {:?}", seen);

    // Dependencies retire before their dependents issue
    for node in 0..graph.len() {
        let cycle = schedule.cycle_of(node).unwrap();
        for edge in graph.deps(node) {
            let dep_cycle = schedule.cycle_of(edge.to).unwrap();
            let dep_latency = latency(block.op(edge.to).opcode);
            assert!(
                dep_cycle + dep_latency <= cycle,
                "node {} issued in cycle {} before node {} retired",
                node,
                cycle,
                edge.to
            );
        }
    }

    // Per-cycle functional-unit caps
    for (cycle, slots) in &schedule.rows {
        let opcodes: Vec<Opcode> = slots
            .iter()
            .flatten()
            .map(|&node| block.op(node).opcode)
            .collect();
        let count = |wanted: Opcode| opcodes.iter().filter(|&&op| op == wanted).count();

        assert!(
            count(Opcode::Load) + count(Opcode::Store) <= 1,
            "two memory operations in cycle {}",
            cycle
        );
        assert!(count(Opcode::Mult) <= 1, "two mults in cycle {}", cycle);
    }
}

#[test]
fn schedule_two_wide_issue() {
    let (block, ..) = renamed(
        "add r1, r2 => r10\nadd r3, r4 => r11\nadd r5, r6 => r12\nadd r7, r8 => r13\n",
    );
    let graph = DepGraph::build(&block);
    let schedule = schedule(&block, &graph);

    assert_schedule_valid(&block, &graph, &schedule);
    assert_eq!(schedule.rows.len(), 2);
    for (_, slots) in &schedule.rows {
        assert!(slots[0].is_some() && slots[1].is_some());
    }
}

#[test]
fn schedule_respects_load_latency() {
    let (block, ..) = renamed("load r1 => r2\nadd r2, r2 => r3\n");
    let graph = DepGraph::build(&block);
    let schedule = schedule(&block, &graph);

    assert_schedule_valid(&block, &graph, &schedule);
    assert_eq!(schedule.cycle_of(0), Some(1));
    assert_eq!(schedule.cycle_of(1), Some(7));
}

#[test]
fn schedule_keeps_loads_behind_earlier_stores() {
    let (block, ..) = renamed("store r1 => r2\nload r3 => r4\n");
    let graph = DepGraph::build(&block);
    let schedule = schedule(&block, &graph);

    assert_schedule_valid(&block, &graph, &schedule);

    let store_cycle = schedule.cycle_of(0).unwrap();
    let load_cycle = schedule.cycle_of(1).unwrap();
    assert!(load_cycle >= store_cycle + latency(Opcode::Store));
}

#[test]
fn schedule_one_memory_operation_per_cycle() {
    let (block, ..) = renamed("load r1 => r5\nload r2 => r6\n");
    let graph = DepGraph::build(&block);
    let schedule = schedule(&block, &graph);

    assert_schedule_valid(&block, &graph, &schedule);
    assert_ne!(schedule.cycle_of(0), schedule.cycle_of(1));
}

#[test]
fn schedule_never_pairs_a_load_with_a_store() {
    let (block, ..) = renamed("load r1 => r2\nstore r3 => r4\n");
    let graph = DepGraph::build(&block);
    let schedule = schedule(&block, &graph);

    assert_schedule_valid(&block, &graph, &schedule);
    // Both are ready in cycle one; the memory unit takes the load first
    assert_eq!(schedule.cycle_of(0), Some(1));
    assert_eq!(schedule.cycle_of(1), Some(2));
}

#[test]
fn schedule_one_mult_per_cycle() {
    let (block, ..) = renamed("mult r1, r2 => r10\nmult r3, r4 => r11\n");
    let graph = DepGraph::build(&block);
    let schedule = schedule(&block, &graph);

    assert_schedule_valid(&block, &graph, &schedule);
    assert_ne!(schedule.cycle_of(0), schedule.cycle_of(1));
}

#[test]
fn schedule_mixed_block() {
    let (block, ..) = renamed(
        "loadI 4 => r1\n\
         loadI 8 => r2\n\
         load r1 => r3\n\
         load r2 => r4\n\
         mult r3, r4 => r5\n\
         add r3, r4 => r6\n\
         add r5, r6 => r7\n\
         store r7 => r1\n\
         output 4\n",
    );
    let graph = DepGraph::build(&block);
    let schedule = schedule(&block, &graph);

    assert_schedule_valid(&block, &graph, &schedule);
}

#[test]
fn schedule_renders_two_slot_rows() {
    let (block, ..) = renamed("load r1 => r2\nadd r2, r2 => r3\n");
    let graph = DepGraph::build(&block);
    let schedule = schedule(&block, &graph);
    let rendered = schedule.render(&block);

    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("[ load "));
    assert!(lines[0].ends_with("; nop ]"));
    assert_eq!(lines[1], "[ nop ; nop ]");
    assert!(lines[6].starts_with("[ add "));
}
