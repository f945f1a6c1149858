//! The main executable: run the requested pipeline stage

use docopt::Docopt;
use serde::Deserialize;

use tinyloc::driver::{self, session, Mode};
use tinyloc::fatal;
use tinyloc::util::read_file;

const USAGE: &str = "
Usage: tinyloc (-h | --help)
       tinyloc -s <input>
       tinyloc -p <input>
       tinyloc -r <input>
       tinyloc -x <input>
       tinyloc -d <input>
       tinyloc <k> <input>

Options:
    -h          Show this screen
    --help      Show this screen
    -s          Scan <input> and print the token stream
    -p          Parse <input> and print the intermediate representation
    -r          Rename registers and print the renamed code
    -x          Alias for -r
    -d          Schedule for the two-issue pipeline and print the schedule

With a register count k (3 <= k <= 64) instead of a flag, the renamed code
is allocated into the physical registers r0 .. r(k-1) and printed.
";

#[derive(Debug, Deserialize)]
struct Args {
    flag_h: bool,
    flag_help: bool,
    flag_s: bool,
    flag_p: bool,
    flag_r: bool,
    flag_x: bool,
    flag_d: bool,
    arg_k: Option<String>,
    arg_input: Option<String>,
}

fn main() {
    env_logger::init();

    // Parse arguments
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if args.flag_h || args.flag_help {
        print!("{}", USAGE);
        return;
    }

    let mode = if args.flag_s {
        Mode::Scan
    } else if args.flag_p {
        Mode::Parse
    } else if args.flag_r || args.flag_x {
        Mode::Rename
    } else if args.flag_d {
        Mode::Schedule
    } else {
        Mode::Allocate(parse_register_count(args.arg_k.as_deref()))
    };

    // Read the input file
    let input_file = args.arg_input.expect("usage patterns guarantee an input file");
    let source = read_file(&input_file);

    // Run the requested stage
    driver::compile_input(source, mode);
}

/// A bare register count selects allocation and must lie in [3, 64]
fn parse_register_count(arg: Option<&str>) -> usize {
    let arg = arg.unwrap_or_default();

    match arg.parse() {
        Ok(k) if (3..=64).contains(&k) => k,
        _ => {
            fatal!("invalid register count `{}`: must lie in [3, 64]", arg);
            session().abort()
        }
    }
}
