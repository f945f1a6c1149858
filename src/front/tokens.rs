//! All tokens of the textual IR surface syntax

use crate::middle::ir::Opcode;
use std::collections::HashMap;
use std::fmt;

// --- List of tokens -----------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Token {
    Opcode(Opcode),
    Const(u32),
    Reg(u32),
    Comma,
    Into,
    Newline,
    Eof,
}

impl Token {
    pub fn category(&self) -> Category {
        match *self {
            Token::Opcode(op) => match op {
                Opcode::Load | Opcode::Store => Category::Memop,
                Opcode::LoadI => Category::LoadI,
                Opcode::Add
                | Opcode::Sub
                | Opcode::Mult
                | Opcode::Lshift
                | Opcode::Rshift => Category::Arithop,
                Opcode::Output => Category::Output,
                Opcode::Nop => Category::Nop,
            },
            Token::Const(..) => Category::Const,
            Token::Reg(..) => Category::Reg,
            Token::Comma => Category::Comma,
            Token::Into => Category::Into,
            Token::Newline => Category::Newline,
            Token::Eof => Category::Endfile,
        }
    }

    /// The lexeme as the token dump prints it
    pub fn lexeme(&self) -> String {
        match *self {
            Token::Opcode(op) => op.name().to_string(),
            Token::Const(value) => value.to_string(),
            Token::Reg(n) => format!("r{}", n),
            Token::Comma => ",".to_string(),
            Token::Into => "=>".to_string(),
            Token::Newline => "\\n".to_string(),
            Token::Eof => String::new(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Token::Eof => write!(f, "EOF"),
            _ => write!(f, "{}", self.lexeme()),
        }
    }
}

// --- Token categories ---------------------------------------------------------

/// The syntactic category a token belongs to, as the `-s` dump names it
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Category {
    Memop,
    LoadI,
    Arithop,
    Output,
    Nop,
    Const,
    Reg,
    Comma,
    Into,
    Newline,
    Endfile,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Category::Memop => "MEMOP",
            Category::LoadI => "LOADI",
            Category::Arithop => "ARITHOP",
            Category::Output => "OUTPUT",
            Category::Nop => "NOP",
            Category::Const => "CONST",
            Category::Reg => "REG",
            Category::Comma => "COMMA",
            Category::Into => "INTO",
            Category::Newline => "NEWLINE",
            Category::Endfile => "ENDFILE",
        };
        write!(f, "{}", name)
    }
}

// --- Keyword lookup -----------------------------------------------------------

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Opcode> = {
        let mut map = HashMap::new();
        map.insert("load", Opcode::Load);
        map.insert("store", Opcode::Store);
        map.insert("loadI", Opcode::LoadI);
        map.insert("add", Opcode::Add);
        map.insert("sub", Opcode::Sub);
        map.insert("mult", Opcode::Mult);
        map.insert("lshift", Opcode::Lshift);
        map.insert("rshift", Opcode::Rshift);
        map.insert("output", Opcode::Output);
        map.insert("nop", Opcode::Nop);
        map
    };
}

/// Get the opcode a word represents, if possible
pub fn lookup_keyword(s: &str) -> Option<Opcode> {
    KEYWORDS.get(s).copied()
}
