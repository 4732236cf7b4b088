//! Storage Layer
//!
//! Handles all file persistence: TOML configuration, transcript batches and
//! run output.

pub mod config;
pub mod output;
pub mod transcripts;

pub use config::*;
pub use output::*;
pub use transcripts::*;
