//! CLI subcommand implementations.

pub mod check;
pub mod legs;
pub mod prizes;
pub mod results;
pub mod util;
