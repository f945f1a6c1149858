//! The front end: scanning + parsing of the textual IR

pub use self::parser::Parser;
pub use self::scanner::Scanner;
pub use self::tokens::{lookup_keyword, Category, Token};

mod parser;
mod scanner;
mod tokens;

mod test;
