//! The back end: register allocation and instruction scheduling

pub use self::alloc::{allocate, Allocator, SPILL_BASE};
pub use self::graph::{latency, DepGraph, DepKind, Edge};
pub use self::sched::{schedule, Schedule};

pub mod alloc;
pub mod graph;
pub mod sched;

mod test;
