//! Subcommands

pub mod clean;
pub mod replicate;
