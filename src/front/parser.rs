//! The parser: turn the token stream into an IR block
//!
//! One production per opcode family, one operation per line. A malformed line
//! records a diagnostic in the session and resynchronises on the next NEWLINE;
//! whatever parsed cleanly stays in the block. The driver aborts before the
//! core passes run if any diagnostics were recorded, so the passes may assume
//! well-formed IR.

use crate::front::scanner::Scanner;
use crate::front::tokens::Token;
use crate::middle::ir::{Block, Opcode, Operand, Operation};

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    token: Token,
    line: usize,
}

impl<'a> Parser<'a> {
    // --- Parser: The public API -----------------------------------------------

    pub fn new(mut scanner: Scanner<'a>) -> Parser<'a> {
        let (line, token) = scanner.next_token();

        Parser {
            scanner,
            token,
            line,
        }
    }

    /// Parse the whole input into a block
    pub fn parse(&mut self) -> Block {
        let mut block = Block::new();

        loop {
            match self.token {
                Token::Eof => break,
                Token::Newline => self.bump(),
                Token::Opcode(opcode) => self.parse_operation(opcode, &mut block),
                token => {
                    fatal_at!("expected an opcode, found `{}`", token; self.line);
                    self.skip_line();
                }
            }
        }

        debug!("parsed {} operations", block.len());

        block
    }

    // --- Parser: Helpers ------------------------------------------------------

    /// Move along to the next token
    fn bump(&mut self) {
        let (line, token) = self.scanner.next_token();
        self.line = line;
        self.token = token;
    }

    /// Discard tokens up to and including the next NEWLINE
    fn skip_line(&mut self) {
        loop {
            match self.token {
                Token::Eof => break,
                Token::Newline => {
                    self.bump();
                    break;
                }
                _ => self.bump(),
            }
        }
    }

    /// Consume a register operand or record an error
    fn expect_reg(&mut self, what: &str, opcode: Opcode) -> Option<u32> {
        if let Token::Reg(n) = self.token {
            self.bump();
            Some(n)
        } else {
            fatal_at!("missing {} register in {}", what, opcode; self.line);
            None
        }
    }

    /// Consume a constant operand or record an error
    fn expect_const(&mut self, opcode: Opcode) -> Option<u32> {
        if let Token::Const(value) = self.token {
            self.bump();
            Some(value)
        } else {
            fatal_at!("missing constant in {}", opcode; self.line);
            None
        }
    }

    /// Consume `=>` or record an error
    fn expect_into(&mut self, opcode: Opcode) -> Option<()> {
        if self.token == Token::Into {
            self.bump();
            Some(())
        } else {
            fatal_at!("missing `=>` in {}", opcode; self.line);
            None
        }
    }

    /// Consume `,` or record an error
    fn expect_comma(&mut self, opcode: Opcode) -> Option<()> {
        if self.token == Token::Comma {
            self.bump();
            Some(())
        } else {
            fatal_at!("missing comma in {}", opcode; self.line);
            None
        }
    }

    /// After a complete operation only a NEWLINE (or the end of the input)
    /// may follow
    fn finish_line(&mut self) {
        match self.token {
            Token::Eof => {}
            Token::Newline => self.bump(),
            token => {
                fatal_at!("extra token at end of line: `{}`", token; self.line);
                self.skip_line();
            }
        }
    }

    // --- Parser: Productions --------------------------------------------------

    fn parse_operation(&mut self, opcode: Opcode, block: &mut Block) {
        let line = self.line;
        self.bump();

        let operation = match opcode {
            Opcode::Load | Opcode::Store => self.parse_memop(opcode, line),
            Opcode::LoadI => self.parse_loadi(line),
            Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::Lshift | Opcode::Rshift => {
                self.parse_arithop(opcode, line)
            }
            Opcode::Output => self.parse_output(line),
            Opcode::Nop => Some(Operation::new(
                Opcode::Nop,
                Operand::none(),
                Operand::none(),
                Operand::none(),
                line,
            )),
        };

        match operation {
            Some(operation) => {
                block.push(operation);
                self.finish_line();
            }
            None => self.skip_line(),
        }
    }

    /// MEMOP := ("load" | "store") REG "=>" REG
    fn parse_memop(&mut self, opcode: Opcode, line: usize) -> Option<Operation> {
        let src = self.expect_reg("source", opcode)?;
        self.expect_into(opcode)?;
        let dst = self.expect_reg("target", opcode)?;

        Some(Operation::new(
            opcode,
            Operand::reg(src),
            Operand::none(),
            Operand::reg(dst),
            line,
        ))
    }

    /// LOADI := "loadI" CONST "=>" REG
    fn parse_loadi(&mut self, line: usize) -> Option<Operation> {
        let value = self.expect_const(Opcode::LoadI)?;
        self.expect_into(Opcode::LoadI)?;
        let dst = self.expect_reg("target", Opcode::LoadI)?;

        Some(Operation::new(
            Opcode::LoadI,
            Operand::val(value),
            Operand::none(),
            Operand::reg(dst),
            line,
        ))
    }

    /// ARITHOP := opcode REG "," REG "=>" REG
    fn parse_arithop(&mut self, opcode: Opcode, line: usize) -> Option<Operation> {
        let src1 = self.expect_reg("first source", opcode)?;
        self.expect_comma(opcode)?;
        let src2 = self.expect_reg("second source", opcode)?;
        self.expect_into(opcode)?;
        let dst = self.expect_reg("target", opcode)?;

        Some(Operation::new(
            opcode,
            Operand::reg(src1),
            Operand::reg(src2),
            Operand::reg(dst),
            line,
        ))
    }

    /// OUTPUT := "output" CONST
    fn parse_output(&mut self, line: usize) -> Option<Operation> {
        let value = self.expect_const(Opcode::Output)?;

        Some(Operation::new(
            Opcode::Output,
            Operand::val(value),
            Operand::none(),
            Operand::none(),
            line,
        ))
    }
}
