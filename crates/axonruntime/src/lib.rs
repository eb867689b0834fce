//! Synapse execution runtime
//!
//! This crate provides the engine that fires synapses: dependency-aware
//! scheduling (sequential or concurrency-bounded parallel), per-neuron
//! retry/backoff, condition gating, rollback dispatch, and append-only
//! execution-history persistence.

pub mod condition;
mod error;
mod executor;
mod history;
mod loader;
mod runner;
mod sink;

pub use error::{ExecutorError, HistoryError, RunnerError};
pub use executor::Executor;
pub use history::HistoryManager;
pub use loader::{load_synapse_dir, load_synapse_file};
pub use runner::{Excitation, FileNeuronRunner, NeuronRunner};
pub use sink::{CapturedOutput, OutputSink};
