//! The intermediate representation: a single straight-line block of
//! three-address operations
//!
//! Every operand carries four parallel numberings. The parser fills in the
//! source register (`sr`), the renamer the virtual register (`vr`) and the
//! next-use distance (`nu`), the allocator the physical register (`pr`).
//! Constants travel in the `sr` slot of the operand the opcode reserves for
//! them (`loadI` arg1 and `output` arg1).

use std::fmt;

pub use self::print::Slot;

mod print;

/// Next-use sentinel for "no further use". All comparisons are ordinal.
pub const NU_INF: u32 = u32::MAX;

// --- Opcodes ------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Opcode {
    Load,
    Store,
    LoadI,
    Add,
    Sub,
    Mult,
    Lshift,
    Rshift,
    Output,
    Nop,
}

impl Opcode {
    pub fn name(&self) -> &'static str {
        match *self {
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::LoadI => "loadI",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mult => "mult",
            Opcode::Lshift => "lshift",
            Opcode::Rshift => "rshift",
            Opcode::Output => "output",
            Opcode::Nop => "nop",
        }
    }

    // --- Operand role table ---------------------------------------------------
    //
    // The passes never match on opcode strings; these predicates answer
    // "does argN play a use/def/constant role" for each opcode.

    /// arg1 is a register read (everything except `loadI`, `output`, `nop`)
    pub fn reads_arg1(&self) -> bool {
        !matches!(*self, Opcode::LoadI | Opcode::Output | Opcode::Nop)
    }

    /// arg2 is a register read (the arithmetic opcodes only)
    pub fn reads_arg2(&self) -> bool {
        matches!(
            *self,
            Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::Lshift | Opcode::Rshift
        )
    }

    /// arg3 is a register read. Holds for `store` alone: its third operand
    /// names the destination address, not a definition.
    pub fn reads_arg3(&self) -> bool {
        *self == Opcode::Store
    }

    /// arg3 is a register write
    pub fn writes_arg3(&self) -> bool {
        matches!(
            *self,
            Opcode::Load
                | Opcode::LoadI
                | Opcode::Add
                | Opcode::Sub
                | Opcode::Mult
                | Opcode::Lshift
                | Opcode::Rshift
        )
    }

    /// arg1 holds an immediate constant instead of a register
    pub fn arg1_is_const(&self) -> bool {
        matches!(*self, Opcode::LoadI | Opcode::Output)
    }

    /// Memory-visible operations participate in memory ordering
    pub fn is_memory_visible(&self) -> bool {
        matches!(*self, Opcode::Store | Opcode::Output)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// --- Operands -----------------------------------------------------------------

/// A four-slot operand record
///
/// `None` means the slot has not been assigned (or does not apply to this
/// opcode). `nu` defaults to [`NU_INF`]; it only becomes meaningful once the
/// renamer has run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Operand {
    pub sr: Option<u32>,
    pub vr: Option<u32>,
    pub pr: Option<u32>,
    pub nu: u32,
}

impl Operand {
    pub fn none() -> Operand {
        Operand {
            sr: None,
            vr: None,
            pr: None,
            nu: NU_INF,
        }
    }

    /// A register operand, numbered as the source program wrote it
    pub fn reg(sr: u32) -> Operand {
        Operand {
            sr: Some(sr),
            ..Operand::none()
        }
    }

    /// An immediate constant, carried in the `sr` slot
    pub fn val(value: u32) -> Operand {
        Operand {
            sr: Some(value),
            ..Operand::none()
        }
    }
}

// --- Operations ---------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct Operation {
    pub opcode: Opcode,
    pub arg1: Operand,
    pub arg2: Operand,
    pub arg3: Operand,
    /// Source line while parsing; the renamer renumbers this to the
    /// operation's index in program order.
    pub line_number: usize,
}

impl Operation {
    pub fn new(
        opcode: Opcode,
        arg1: Operand,
        arg2: Operand,
        arg3: Operand,
        line_number: usize,
    ) -> Operation {
        Operation {
            opcode,
            arg1,
            arg2,
            arg3,
            line_number,
        }
    }

    pub fn arg(&self, slot: usize) -> &Operand {
        match slot {
            0 => &self.arg1,
            1 => &self.arg2,
            2 => &self.arg3,
            _ => panic!("operand slot out of range: {}", slot),
        }
    }

    pub fn arg_mut(&mut self, slot: usize) -> &mut Operand {
        match slot {
            0 => &mut self.arg1,
            1 => &mut self.arg2,
            2 => &mut self.arg3,
            _ => panic!("operand slot out of range: {}", slot),
        }
    }

    /// The operand slots this opcode reads registers from, in evaluation order
    pub fn use_slots(&self) -> Vec<usize> {
        let mut slots = Vec::with_capacity(2);
        if self.opcode.reads_arg1() {
            slots.push(0);
        }
        if self.opcode.reads_arg2() {
            slots.push(1);
        }
        if self.opcode.reads_arg3() {
            slots.push(2);
        }
        slots
    }

    /// The largest source register this operation mentions
    pub fn max_sr(&self) -> u32 {
        match self.opcode {
            Opcode::Nop | Opcode::Output => 0,
            Opcode::LoadI => self.arg3.sr.unwrap_or(0),
            _ => [&self.arg1, &self.arg2, &self.arg3]
                .iter()
                .filter_map(|arg| arg.sr)
                .max()
                .unwrap_or(0),
        }
    }
}

// --- The block ----------------------------------------------------------------

/// A straight-line block of operations
///
/// The passes only ever append or insert in front of a cursor; nothing is
/// removed. A plain vector therefore stands in for the classic doubly linked
/// list: insertion shifts the suffix, and the inserting pass advances its
/// cursor past the new operations.
#[derive(Clone, Debug, Default)]
pub struct Block {
    ops: Vec<Operation>,
}

impl Block {
    pub fn new() -> Block {
        Block { ops: Vec::new() }
    }

    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
    }

    /// Splice `op` in front of the operation currently at `index`
    pub fn insert_before(&mut self, index: usize, op: Operation) {
        self.ops.insert(index, op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn op(&self, index: usize) -> &Operation {
        &self.ops[index]
    }

    pub fn op_mut(&mut self, index: usize) -> &mut Operation {
        &mut self.ops[index]
    }

    pub fn ops(&self) -> impl Iterator<Item = &Operation> + DoubleEndedIterator + ExactSizeIterator {
        self.ops.iter()
    }

    pub fn ops_mut(&mut self) -> &mut [Operation] {
        &mut self.ops
    }

    /// The largest source register mentioned anywhere in the block
    pub fn max_sr(&self) -> u32 {
        self.ops.iter().map(Operation::max_sr).max().unwrap_or(0)
    }
}
