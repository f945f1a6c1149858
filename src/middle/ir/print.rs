//! Rendering the block in its three visible forms: as parsed (source
//! registers), renamed (virtual registers) and allocated (physical registers)

use crate::middle::ir::{Block, Opcode, Operand, Operation};

/// Which register numbering to render
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Slot {
    Virtual,
    Physical,
}

impl Operand {
    fn number(&self, slot: Slot) -> u32 {
        let n = match slot {
            Slot::Virtual => self.vr,
            Slot::Physical => self.pr,
        };
        n.expect("operand not yet numbered for this form")
    }
}

impl Operation {
    /// One operand in the `-p` dump: `[ ]`, `[ val 1024 ]` or `[ s3 ]`
    fn parsed_operand(&self, slot: usize) -> String {
        let arg = self.arg(slot);
        match arg.sr {
            None => "[ ]".to_string(),
            Some(value) if slot == 0 && self.opcode.arg1_is_const() => {
                format!("[ val {} ]", value)
            }
            Some(sr) => format!("[ s{} ]", sr),
        }
    }

    /// The operation as parsed, operands shown positionally
    pub fn render_parsed(&self) -> String {
        format!(
            "{:<8}{}, {}, {}",
            self.opcode,
            self.parsed_operand(0),
            self.parsed_operand(1),
            self.parsed_operand(2)
        )
    }

    /// The operation in executable form, registers drawn from `slot`
    pub fn render(&self, slot: Slot) -> String {
        match self.opcode {
            Opcode::Load | Opcode::Store => format!(
                "{} r{} => r{}",
                self.opcode,
                self.arg1.number(slot),
                self.arg3.number(slot)
            ),
            Opcode::LoadI => format!(
                "{} {} => r{}",
                self.opcode,
                self.arg1.sr.expect("loadI without a constant"),
                self.arg3.number(slot)
            ),
            Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::Lshift | Opcode::Rshift => {
                format!(
                    "{} r{}, r{} => r{}",
                    self.opcode,
                    self.arg1.number(slot),
                    self.arg2.number(slot),
                    self.arg3.number(slot)
                )
            }
            Opcode::Output => format!(
                "{} {}",
                self.opcode,
                self.arg1.sr.expect("output without a constant")
            ),
            Opcode::Nop => "nop".to_string(),
        }
    }
}

impl Block {
    pub fn render_parsed(&self) -> String {
        self.ops()
            .map(Operation::render_parsed)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn render(&self, slot: Slot) -> String {
        self.ops()
            .map(|op| op.render(slot))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
