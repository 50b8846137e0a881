//! Console output

pub mod console;

pub use console::{ConsoleReporter, print_summary};
