//! Register renaming: rewrite source registers into virtual registers and
//! record next-use distances
//!
//! One backward pass over the block. Walking bottom-up, the first time a
//! source register is seen it starts a fresh live range (a fresh virtual
//! register); a definition ends the range and resets the next-use bookkeeping
//! for that source register. The pass also measures MAXLIVE, the largest
//! number of ranges live across any one operation.

use crate::middle::ir::{Block, NU_INF};

/// Rewrite the block in place. Returns `(vr_count, max_live)`.
pub fn rename(block: &mut Block) -> (u32, u32) {
    let max_sr = block.max_sr() as usize;

    let mut sr_to_vr: Vec<Option<u32>> = vec![None; max_sr + 1];
    let mut last_use: Vec<u32> = vec![NU_INF; max_sr + 1];
    let mut next_vr: u32 = 0;
    let mut live: u32 = 0;
    let mut max_live: u32 = 0;

    // Number the operations in program order; next-use distances refer to
    // these indices.
    let ops = block.ops_mut();
    for (index, op) in ops.iter_mut().enumerate() {
        op.line_number = index;
    }

    for index in (0..ops.len()).rev() {
        let opcode = ops[index].opcode;

        // Definition first: the value dies (upwards) here, so its source
        // register leaves the live set before the uses below re-enter it.
        if opcode.writes_arg3() {
            let sr = ops[index].arg3.sr.expect("definition without a source register") as usize;

            // A mapping is only missing when no later use exists: a dead
            // definition. It still names a fresh range, with no next use.
            if sr_to_vr[sr].is_none() {
                sr_to_vr[sr] = Some(next_vr);
                next_vr += 1;
                live += 1;
            }

            let arg3 = &mut ops[index].arg3;
            arg3.vr = sr_to_vr[sr];
            arg3.nu = last_use[sr];

            sr_to_vr[sr] = None;
            last_use[sr] = NU_INF;
            live -= 1;
        }

        // Uses, in operand order. `store`'s third operand is a use (the
        // destination address), never a definition.
        let use_slots = ops[index].use_slots();
        for &slot in &use_slots {
            let sr = ops[index].arg(slot).sr.expect("use without a source register") as usize;

            if sr_to_vr[sr].is_none() {
                sr_to_vr[sr] = Some(next_vr);
                next_vr += 1;
                live += 1;
            }

            let arg = ops[index].arg_mut(slot);
            arg.vr = sr_to_vr[sr];
            arg.nu = last_use[sr];
        }

        // Only now does this operation become the "next use" of the
        // registers it reads.
        for &slot in &use_slots {
            let sr = ops[index].arg(slot).sr.unwrap() as usize;
            last_use[sr] = index as u32;
        }

        if live > max_live {
            max_live = live;
        }
    }

    debug!(
        "renamed into {} virtual registers, MAXLIVE = {}",
        next_vr, max_live
    );

    (next_vr, max_live)
}
