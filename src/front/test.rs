#![cfg(test)]

use crate::driver::session;
use crate::front::{Parser, Scanner, Token};
use crate::middle::ir::{Opcode, Operand};

macro_rules! parse(
    ($source:expr) => (
        Parser::new(Scanner::new($source)).parse()
    )
);

fn tokenize(source: &str) -> Vec<(usize, Token)> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();

    loop {
        let (line, token) = scanner.next_token();
        if token == Token::Eof {
            return tokens;
        }
        tokens.push((line, token));
    }
}

// --- Scanner ------------------------------------------------------------------

#[test]
fn scan_memop() {
    let tokens = tokenize("load r1 => r2");

    assert_eq!(
        tokens,
        vec![
            (1, Token::Opcode(Opcode::Load)),
            (1, Token::Reg(1)),
            (1, Token::Into),
            (1, Token::Reg(2)),
        ]
    );
    assert!(!session().has_errors());
}

#[test]
fn scan_arithop_with_comment() {
    let tokens = tokenize("add r1, r2 => r3 // the sum\nnop");

    assert_eq!(
        tokens,
        vec![
            (1, Token::Opcode(Opcode::Add)),
            (1, Token::Reg(1)),
            (1, Token::Comma),
            (1, Token::Reg(2)),
            (1, Token::Into),
            (1, Token::Reg(3)),
            (1, Token::Newline),
            (2, Token::Opcode(Opcode::Nop)),
        ]
    );
    assert!(!session().has_errors());
}

#[test]
fn scan_constant() {
    let tokens = tokenize("loadI 1024 => r7");

    assert_eq!(
        tokens,
        vec![
            (1, Token::Opcode(Opcode::LoadI)),
            (1, Token::Const(1024)),
            (1, Token::Into),
            (1, Token::Reg(7)),
        ]
    );
}

#[test]
fn scan_invalid_word_skips_line() {
    let tokens = tokenize("frobnicate r1 => r2\noutput 4");

    assert_eq!(
        tokens,
        vec![
            (1, Token::Newline),
            (2, Token::Opcode(Opcode::Output)),
            (2, Token::Const(4)),
        ]
    );

    let errors = session().take_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, 1);
    assert!(errors[0].1.contains("not a valid word"));
}

#[test]
fn scan_bare_register_prefix_is_an_error() {
    tokenize("store r => r2\nnop");

    let errors = session().take_errors();
    assert_eq!(errors.len(), 1);
}

#[test]
fn token_lexemes_and_categories() {
    assert_eq!(Token::Reg(12).lexeme(), "r12");
    assert_eq!(Token::Into.lexeme(), "=>");
    assert_eq!(Token::Opcode(Opcode::LoadI).lexeme(), "loadI");
    assert_eq!(Token::Reg(12).category().to_string(), "REG");
    assert_eq!(Token::Opcode(Opcode::Store).category().to_string(), "MEMOP");
    assert_eq!(Token::Eof.category().to_string(), "ENDFILE");
}

// --- Parser -------------------------------------------------------------------

#[test]
fn parse_all_productions() {
    let block = parse!(
        "loadI 8 => r1\nload r1 => r2\nadd r1, r2 => r3\nstore r3 => r1\noutput 8\nnop\n"
    );

    assert!(!session().has_errors());
    assert_eq!(block.len(), 6);

    let op = block.op(0);
    assert_eq!(op.opcode, Opcode::LoadI);
    assert_eq!(op.arg1, Operand::val(8));
    assert_eq!(op.arg3, Operand::reg(1));
    assert_eq!(op.line_number, 1);

    let op = block.op(2);
    assert_eq!(op.opcode, Opcode::Add);
    assert_eq!(op.arg1, Operand::reg(1));
    assert_eq!(op.arg2, Operand::reg(2));
    assert_eq!(op.arg3, Operand::reg(3));
    assert_eq!(op.line_number, 3);

    let op = block.op(3);
    assert_eq!(op.opcode, Opcode::Store);
    assert_eq!(op.arg1, Operand::reg(3));
    assert_eq!(op.arg3, Operand::reg(1));

    assert_eq!(block.op(4).arg1, Operand::val(8));
    assert_eq!(block.op(5).opcode, Opcode::Nop);
}

#[test]
fn parse_missing_comma() {
    let block = parse!("add r1 r2 => r3");

    assert!(block.is_empty());

    let errors = session().take_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.contains("missing comma"));
}

#[test]
fn parse_missing_target_register() {
    let block = parse!("load r1 => 5");

    assert!(block.is_empty());

    let errors = session().take_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.contains("missing target register"));
}

#[test]
fn parse_recovers_on_the_next_line() {
    let block = parse!("load r1 =>\nadd r1, r2 => r3\n");

    assert_eq!(block.len(), 1);
    assert_eq!(block.op(0).opcode, Opcode::Add);
    assert_eq!(session().take_errors().len(), 1);
}

#[test]
fn parse_extra_token_at_end_of_line() {
    let block = parse!("nop nop\n");

    assert_eq!(block.len(), 1);

    let errors = session().take_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.contains("extra token"));
}
