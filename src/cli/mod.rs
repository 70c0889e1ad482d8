//! CLI module for stylerag
//!
//! Handles command-line argument parsing.

pub mod args;

pub use args::{Args, Commands, RetrieveArgs, Verbosity};
