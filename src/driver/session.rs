//! The Session
//!
//! # Motivation
//!
//! The scanner and the parser both need to report malformed input, and the
//! driver decides later whether the run may continue. Instead of threading a
//! diagnostics struct through every pass, we store the current Session in
//! thread local storage and provide a method for accessing it
//! (`driver::session()`). Its members rely on interior mutability, so the
//! handed-out reference can stay immutable.

use crate::driver::error;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// The current run's diagnostics state
pub struct Session {
    /// Scan/parse diagnostics, collected and reported in one batch
    errors: RefCell<Vec<(usize, String)>>,
    failed: Cell<bool>,
}

impl Session {
    /// Print an error immediately
    pub fn err(&self, msg: String) {
        error::fatal(&msg);
        self.failed.set(true);
    }

    /// Record an error at a source line; reported by `abort_if_errors`
    pub fn span_err(&self, msg: String, line: usize) {
        self.errors.borrow_mut().push((line, msg));
    }

    pub fn has_errors(&self) -> bool {
        self.failed.get() || !self.errors.borrow().is_empty()
    }

    /// Drain the recorded diagnostics (used by tests and `abort_if_errors`)
    pub fn take_errors(&self) -> Vec<(usize, String)> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }

    /// Report all recorded errors and abort if any occurred
    pub fn abort_if_errors(&self) {
        let errors = self.take_errors();
        for (line, msg) in &errors {
            error::fatal_at(msg, *line);
        }

        if self.failed.get() || !errors.is_empty() {
            error::abort();
        }
    }

    /// Abort the run
    pub fn abort(&self) -> ! {
        error::abort()
    }
}

/// Get a reference to the thread local session object
pub fn session() -> Rc<Session> {
    thread_local! {
        static SESSION: Rc<Session> = Rc::new(Session {
            errors: RefCell::new(Vec::new()),
            failed: Cell::new(false),
        })
    };

    SESSION.with(Rc::clone)
}
