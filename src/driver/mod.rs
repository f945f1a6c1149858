//! Coordinating all the steps of a run: The Driver (tm)

use crate::back;
use crate::front::{Parser, Scanner, Token};
use crate::middle::ir::Slot;
use crate::middle::rename;
use crate::util;

pub use self::session::{session, Session};

pub mod error;
mod session;

/// What the invocation asked for
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// `-s`: dump the token stream
    Scan,
    /// `-p`: print the parsed IR
    Parse,
    /// `-r` / `-x`: print the renamed IR
    Rename,
    /// `-d`: print the two-slot schedule
    Schedule,
    /// `k`: print the code allocated into `k` physical registers
    Allocate(usize),
}

pub fn compile_input(source: String, mode: Mode) {
    if mode == Mode::Scan {
        dump_tokens(&source);
        session().abort_if_errors();
        return;
    }

    // Phase 1: Lexical & syntactical analysis
    let mut parser = Parser::new(Scanner::new(&source));
    let mut block = parser.parse();
    session().abort_if_errors();

    if mode == Mode::Parse {
        println!("{}", block.render_parsed());
        return;
    }

    // Phase 2: Register renaming + live range measurement
    let (vr_count, max_live) = rename(&mut block);
    debug!("{} virtual registers, MAXLIVE = {}", vr_count, max_live);

    match mode {
        Mode::Rename => println!("{}", block.render(Slot::Virtual)),

        // Phase 3a: Dependence graph, priorities, list scheduling
        Mode::Schedule => {
            let graph = back::DepGraph::build(&block);

            if log_enabled!(log::Level::Debug) {
                util::write_file("dependence_graph.dot", &graph.to_dot(&block));
            }

            let schedule = back::schedule(&block, &graph);
            println!("{}", schedule.render(&block));
        }

        // Phase 3b: Register allocation
        Mode::Allocate(k) => {
            back::allocate(&mut block, k, vr_count, max_live);
            println!("{}", block.render(Slot::Physical));
        }

        Mode::Scan | Mode::Parse => unreachable!(),
    }
}

/// Stream tokens to stdout, one `<line>: < <category>, "<lexeme>" >` line
/// per token
fn dump_tokens(source: &str) {
    let mut scanner = Scanner::new(source);

    loop {
        let (line, token) = scanner.next_token();
        println!("{}: < {}, \"{}\" >", line, token.category(), token.lexeme());

        if token == Token::Eof {
            break;
        }
    }
}
