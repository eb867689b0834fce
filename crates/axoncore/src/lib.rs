//! Core types for the axon runbook engine
//!
//! This crate provides the data model shared by the runtime and CLI:
//! neuron and synapse definitions, retry policy, execution records, and
//! structural validation (including dependency-cycle detection). It has
//! no runtime dependencies.

mod duration;
mod error;
mod neuron;
mod record;
mod synapse;
mod validate;

pub use duration::parse_duration;
pub use error::{CoreError, ValidationError};
pub use neuron::Neuron;
pub use record::{ExecutionId, ExecutionRecord, ExecutionStatus, NeuronResult, NeuronStatus};
pub use synapse::{Backoff, ExecutionMode, NeuronRef, RetryPolicy, Synapse};
pub use validate::{detect_cycle, validate};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
