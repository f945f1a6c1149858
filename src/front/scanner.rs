//! The scanner: split the source into a stream of tokens
//!
//! The surface syntax is line-oriented, so tokens are reported together with
//! the 1-based line they start on, and a malformed word discards the rest of
//! its line only. Errors are recorded in the session; the caller decides
//! whether the run may continue.

use crate::front::tokens::{lookup_keyword, Token};
use std::str::CharIndices;

pub struct Scanner<'a> {
    source: &'a str,

    iter: CharIndices<'a>,
    pos: usize,
    curr: Option<char>,

    lineno: usize,
}

impl<'a> Scanner<'a> {
    // --- Scanner: The public API ----------------------------------------------

    /// Create a new scanner from a given string
    pub fn new(source: &'a str) -> Scanner<'a> {
        let mut iter = source.char_indices();
        let (pos, curr) = match iter.next() {
            Some((pos, curr)) => (pos, Some(curr)),
            None => (0, None),
        };

        Scanner {
            source,

            iter,
            pos,
            curr,

            lineno: 1,
        }
    }

    /// Get the next token along with the line it starts on
    pub fn next_token(&mut self) -> (usize, Token) {
        loop {
            let c = match self.curr {
                Some(c) => c,
                None => return (self.lineno, Token::Eof),
            };
            let line = self.lineno;

            match c {
                '\n' => {
                    self.lineno += 1;
                    self.bump();
                    return (line, Token::Newline);
                }

                c if c.is_whitespace() => self.bump(),

                ',' => {
                    self.bump();
                    return (line, Token::Comma);
                }

                '=' => {
                    self.bump();
                    if self.curr == Some('>') {
                        self.bump();
                        return (line, Token::Into);
                    }
                    fatal_at!("expected `=>`, found `={}`", self.curr_escaped(); line);
                    self.skip_line();
                }

                '/' => {
                    self.bump();
                    if self.curr == Some('/') {
                        // A comment runs to the end of the line
                        self.eat_all(|c| *c != '\n');
                    } else {
                        fatal_at!("`/{}` is not a valid word", self.curr_escaped(); line);
                        self.skip_line();
                    }
                }

                c if c.is_ascii_digit() => return (line, self.tokenize_constant()),

                c if c.is_alphabetic() => {
                    if let Some(token) = self.tokenize_word() {
                        return (line, token);
                    }
                    // Malformed word: error already recorded, line skipped
                }

                c => {
                    fatal_at!("unexpected character: `{}`", c; line);
                    self.skip_line();
                }
            }
        }
    }

    // --- Scanner: Helpers -----------------------------------------------------

    /// An escaped representation of the current character
    fn curr_escaped(&self) -> String {
        match self.curr {
            Some(c) => c.escape_default().collect(),
            None => "EOF".to_string(),
        }
    }

    /// Discard everything up to (not including) the next newline, so the
    /// caller resynchronises on the NEWLINE token
    fn skip_line(&mut self) {
        self.eat_all(|c| *c != '\n');
    }

    // --- Scanner: Character processing ----------------------------------------

    /// Move along to the next character
    fn bump(&mut self) {
        if let Some((pos, curr)) = self.iter.next() {
            self.curr = Some(curr);
            self.pos = pos;
        } else {
            self.curr = None;
            self.pos = self.source.len();
        }

        trace!("moved on to {:?}", self.curr)
    }

    /// Collect & consume all consecutive characters into a string as long as a
    /// condition is true
    fn collect<F>(&mut self, cond: F) -> &'a str
    where
        F: Fn(&char) -> bool,
    {
        let start = self.pos;

        while let Some(c) = self.curr {
            if cond(&c) {
                self.bump();
            } else {
                break;
            }
        }

        &self.source[start..self.pos]
    }

    /// Consume all consecutive characters matching a condition
    fn eat_all<F>(&mut self, cond: F)
    where
        F: Fn(&char) -> bool,
    {
        while let Some(c) = self.curr {
            if cond(&c) {
                self.bump();
            } else {
                break;
            }
        }
    }

    // --- Scanner: Tokenizers --------------------------------------------------

    /// Tokenize an integer constant
    fn tokenize_constant(&mut self) -> Token {
        let line = self.lineno;
        let digits = self.collect(|c| c.is_ascii_digit());

        match digits.parse() {
            Ok(value) => Token::Const(value),
            Err(_) => {
                fatal_at!("invalid integer: `{}`", digits; line);
                Token::Const(0)
            }
        }
    }

    /// Tokenize an opcode or a register
    ///
    /// Returns `None` for a malformed word; the error has been recorded and
    /// the rest of the line discarded.
    fn tokenize_word(&mut self) -> Option<Token> {
        let line = self.lineno;
        let word = self.collect(|c| c.is_alphabetic());

        if let Some(opcode) = lookup_keyword(word) {
            return Some(Token::Opcode(opcode));
        }

        // A register is the letter `r` immediately followed by digits
        if word == "r" && self.curr.map_or(false, |c| c.is_ascii_digit()) {
            let digits = self.collect(|c| c.is_ascii_digit());
            return match digits.parse() {
                Ok(n) => Some(Token::Reg(n)),
                Err(_) => {
                    fatal_at!("invalid register: `r{}`", digits; line);
                    self.skip_line();
                    None
                }
            };
        }

        fatal_at!("\"{}\" is not a valid word", word; line);
        self.skip_line();
        None
    }
}
