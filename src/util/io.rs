//! File I/O for the driver: the input block and debug dumps

use crate::driver::session;
use std::fs;

/// Read an input file into memory, or abort the run
///
/// `fs::read_to_string` also rejects non-UTF-8 input, which the scanner
/// relies on.
pub fn read_file(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            fatal!("can't read {}: {}", path, err);
            session().abort()
        }
    }
}

/// Write a debug artifact (e.g. the dependence graph dump), or abort the run
pub fn write_file(path: &str, contents: &str) {
    if let Err(err) = fs::write(path, contents) {
        fatal!("can't write {}: {}", path, err);
        session().abort()
    }
}
