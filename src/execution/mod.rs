//! Execution Engine Module
//!
//! Enumerates inputs, runs the per-file pipeline on a bounded worker pool,
//! and either reports the resulting plan or applies it.

pub mod context;
pub mod executor;
pub mod scanner;


pub use context::{ProgressCallback, RunContext};
pub use executor::{ExecutionEngine, FailedEntry, RunOutcome, RunRequest, RunSummary};
