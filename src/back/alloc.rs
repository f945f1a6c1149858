//! Bottom-up local register allocation with on-demand spilling
//!
//! One forward pass over the renamed block. Values live in physical registers
//! while they have uses left; when the register file runs dry the bound value
//! with the farthest next use is written out to the spill area and its
//! register reused. Spill and restore code is spliced into the block
//! immediately in front of the operation being allocated.
//!
//! When `k < MAXLIVE` the highest-numbered register is withdrawn from the
//! allocatable pool and reserved for materialising spill addresses, so a
//! spill or restore sequence can always be emitted.

use crate::middle::ir::{Block, Opcode, Operand, Operation, NU_INF};

/// Memory at and above this address is reserved for spill storage
pub const SPILL_BASE: u32 = 32768;

/// Rewrite every operand's `pr` slot, spilling as needed to fit `k` registers
pub fn allocate(block: &mut Block, k: usize, vr_count: u32, max_live: u32) {
    Allocator::new(k, vr_count, max_live).run(block);
}

pub struct Allocator {
    /// VR currently bound to each allocatable PR; `None` = free
    pr_to_vr: Vec<Option<u32>>,
    /// Next use of the value in each PR; `NU_INF` when free
    pr_nu: Vec<u32>,
    vr_to_pr: Vec<Option<usize>>,
    /// Spill offset of each VR, once one has been assigned
    vr_spill: Vec<Option<u32>>,
    /// LIFO of free PRs, r0 on top
    free: Vec<usize>,
    next_spill: u32,
    /// PR reserved for spill/restore addressing, present iff k < MAXLIVE
    spill_reg: Option<usize>,
    /// PR most recently handed to the current operation; never a spill victim
    mark: Option<usize>,
    cursor: usize,
}

impl Allocator {
    pub fn new(k: usize, vr_count: u32, max_live: u32) -> Allocator {
        let (pool, spill_reg) = if (k as u32) < max_live {
            debug!(
                "reserving r{} for spill code: k = {}, MAXLIVE = {}",
                k - 1,
                k,
                max_live
            );
            (k - 1, Some(k - 1))
        } else {
            (k, None)
        };

        Allocator {
            pr_to_vr: vec![None; pool],
            pr_nu: vec![NU_INF; pool],
            vr_to_pr: vec![None; vr_count as usize],
            vr_spill: vec![None; vr_count as usize],
            free: (0..pool).rev().collect(),
            next_spill: SPILL_BASE,
            spill_reg,
            mark: None,
            cursor: 0,
        }
    }

    pub fn run(&mut self, block: &mut Block) {
        while self.cursor < block.len() {
            self.mark = None;
            self.allocate_operation(block);

            if cfg!(debug_assertions) {
                self.check_maps();
            }

            self.cursor += 1;
        }
    }

    // --- Allocator: Per-operation protocol ------------------------------------

    fn allocate_operation(&mut self, block: &mut Block) {
        let use_slots = block.op(self.cursor).use_slots();

        for &slot in &use_slots {
            self.allocate_use(block, slot);
        }

        // Last uses release their registers before the definition claims one.
        // The binding check keeps two uses of one VR from freeing it twice.
        for &slot in &use_slots {
            let arg = *block.op(self.cursor).arg(slot);
            if arg.nu == NU_INF {
                let pr = arg.pr.expect("use left unassigned") as usize;
                if self.pr_to_vr[pr].is_some() {
                    self.free_pr(pr);
                }
            }
        }

        if block.op(self.cursor).opcode.writes_arg3() {
            let (vr, nu) = {
                let arg = &block.op(self.cursor).arg3;
                (arg.vr.expect("allocating an unrenamed block"), arg.nu)
            };
            let pr = self.get_pr(block, vr, nu);
            block.op_mut(self.cursor).arg3.pr = Some(pr as u32);
        }
    }

    fn allocate_use(&mut self, block: &mut Block, slot: usize) {
        let (vr, nu) = {
            let arg = block.op(self.cursor).arg(slot);
            (arg.vr.expect("allocating an unrenamed block"), arg.nu)
        };

        let pr = match self.vr_to_pr[vr as usize] {
            Some(pr) => {
                // Still resident; just refresh its next use
                self.pr_nu[pr] = nu;
                pr
            }
            None => {
                let pr = self.get_pr(block, vr, nu);
                if let Some(offset) = self.vr_spill[vr as usize] {
                    self.emit_restore(block, offset, pr);
                }
                pr
            }
        };

        block.op_mut(self.cursor).arg_mut(slot).pr = Some(pr as u32);
        self.mark = Some(pr);
    }

    // --- Allocator: Register management ---------------------------------------

    /// Bind `vr` to a register, evicting the farthest-next-use value if none
    /// is free
    fn get_pr(&mut self, block: &mut Block, vr: u32, nu: u32) -> usize {
        let pr = match self.free.pop() {
            Some(pr) => pr,
            None => self.spill(block),
        };

        self.vr_to_pr[vr as usize] = Some(pr);
        self.pr_to_vr[pr] = Some(vr);
        self.pr_nu[pr] = nu;
        pr
    }

    /// Unbind `pr` and return it to the free stack
    fn free_pr(&mut self, pr: usize) {
        let vr = self.pr_to_vr[pr].expect("freeing an unbound register");
        self.vr_to_pr[vr as usize] = None;
        self.pr_to_vr[pr] = None;
        self.pr_nu[pr] = NU_INF;
        self.free.push(pr);
    }

    /// Evict the bound value with the farthest next use (ties to the lowest
    /// register) and hand its register back, unbound and off the free stack
    fn spill(&mut self, block: &mut Block) -> usize {
        let victim = (0..self.pr_nu.len())
            .filter(|&pr| self.mark != Some(pr))
            .max_by_key(|&pr| (self.pr_nu[pr], std::cmp::Reverse(pr)))
            .unwrap_or_else(|| panic!("no spill candidate among {} registers", self.pr_nu.len()));

        let vr = self.pr_to_vr[victim].expect("free register missed by the allocation stack");

        let offset = match self.vr_spill[vr as usize] {
            Some(offset) => offset,
            None => {
                let offset = self.next_spill;
                self.next_spill += 4;
                self.vr_spill[vr as usize] = Some(offset);
                offset
            }
        };

        trace!("spilling vr{} from r{} to {}", vr, victim, offset);
        self.emit_spill(block, offset, victim);

        self.vr_to_pr[vr as usize] = None;
        self.pr_to_vr[victim] = None;
        self.pr_nu[victim] = NU_INF;
        victim
    }

    // --- Allocator: Spill code ------------------------------------------------

    /// `loadI offset => rSpill; store rVictim => rSpill`, in front of the
    /// current operation
    fn emit_spill(&mut self, block: &mut Block, offset: u32, victim: usize) {
        let spill_reg = self.spill_reg();
        let line = block.op(self.cursor).line_number;

        let mut load_address = Operation::new(
            Opcode::LoadI,
            Operand::val(offset),
            Operand::none(),
            Operand::none(),
            line,
        );
        load_address.arg3.pr = Some(spill_reg);

        let mut store = Operation::new(
            Opcode::Store,
            Operand::none(),
            Operand::none(),
            Operand::none(),
            line,
        );
        store.arg1.pr = Some(victim as u32);
        store.arg3.pr = Some(spill_reg);

        self.insert(block, load_address);
        self.insert(block, store);
    }

    /// `loadI offset => rSpill; load rSpill => rTarget`, in front of the
    /// current operation
    fn emit_restore(&mut self, block: &mut Block, offset: u32, target: usize) {
        let spill_reg = self.spill_reg();
        let line = block.op(self.cursor).line_number;

        trace!("restoring r{} from {}", target, offset);

        let mut load_address = Operation::new(
            Opcode::LoadI,
            Operand::val(offset),
            Operand::none(),
            Operand::none(),
            line,
        );
        load_address.arg3.pr = Some(spill_reg);

        let mut load = Operation::new(
            Opcode::Load,
            Operand::none(),
            Operand::none(),
            Operand::none(),
            line,
        );
        load.arg1.pr = Some(spill_reg);
        load.arg3.pr = Some(target as u32);

        self.insert(block, load_address);
        self.insert(block, load);
    }

    fn spill_reg(&self) -> u32 {
        self.spill_reg
            .expect("spill code emitted without a reserved register") as u32
    }

    fn insert(&mut self, block: &mut Block, op: Operation) {
        block.insert_before(self.cursor, op);
        self.cursor += 1;
    }

    // --- Allocator: Consistency -----------------------------------------------

    /// Verify the binding maps are mutual inverses and that the free stack
    /// and the reserved register are consistent with them
    pub fn check_maps(&self) {
        for (pr, vr) in self.pr_to_vr.iter().enumerate() {
            match *vr {
                Some(vr) => assert_eq!(
                    self.vr_to_pr[vr as usize],
                    Some(pr),
                    "r{} bound to vr{} without the inverse binding",
                    pr,
                    vr
                ),
                None => assert_eq!(
                    self.pr_nu[pr], NU_INF,
                    "free register r{} carries a next use",
                    pr
                ),
            }
        }

        for (vr, pr) in self.vr_to_pr.iter().enumerate() {
            if let Some(pr) = *pr {
                assert_eq!(
                    self.pr_to_vr[pr],
                    Some(vr as u32),
                    "vr{} bound to r{} without the inverse binding",
                    vr,
                    pr
                );
            }
        }

        for &pr in &self.free {
            assert!(
                self.pr_to_vr[pr].is_none(),
                "r{} is both free and bound",
                pr
            );
        }

        if let Some(spill_reg) = self.spill_reg {
            assert_eq!(
                spill_reg,
                self.pr_to_vr.len(),
                "reserved register r{} lies inside the allocatable pool",
                spill_reg
            );
        }
    }
}
