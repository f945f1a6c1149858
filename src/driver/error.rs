//! Error reporting

use ansi_term::Colour::Red;
use std::env;
use std::io::{self, Write};
use std::process;

fn colors_enabled() -> bool {
    if env::var_os("COLORED_OUTPUT").and_then(|s| s.into_string().ok()) == Some("off".into()) {
        return false;
    }

    term::stderr().map_or(false, |t| {
        t.supports_attr(term::Attr::ForegroundColor(term::color::RED))
            && t.supports_attr(term::Attr::ForegroundColor(term::color::YELLOW))
    })
}

/// Abort the current run
pub fn abort() -> ! {
    process::exit(1)
}

/// Helper for printing the `Error` string
/// If stderr is not redirected, the string will be colored
fn print_error(stderr: &mut io::Stderr) {
    if colors_enabled() {
        write!(stderr, "{}", Red.paint("Error")).ok();
    } else {
        write!(stderr, "Error").ok();
    }
}

/// Report a fatal error
pub fn fatal<S: AsRef<str>>(msg: S) {
    let mut stderr = io::stderr();

    print_error(&mut stderr);
    writeln!(&mut stderr, ": {}", msg.as_ref()).ok();
}

/// Report a fatal error at a source line
pub fn fatal_at<S: AsRef<str>>(msg: S, line: usize) {
    let mut stderr = io::stderr();

    print_error(&mut stderr);
    writeln!(&mut stderr, " in line {}: {}", line, msg.as_ref()).ok();
}
