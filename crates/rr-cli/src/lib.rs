//! Race results CLI library.
//!
//! This crate provides the command-line interface for the results engine:
//! race definition loading and the text and JSON renderers.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{LegDeclaration, MassStart, RaceFile, StartOverride};
