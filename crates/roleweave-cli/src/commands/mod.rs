//! Subcommand implementations

pub mod check;
pub mod describe;
pub mod encode;
