use std::path::PathBuf;
use thiserror::Error;

/// Hard scheduling errors that abort an in-progress run.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("execution timeout exceeded")]
    Timeout,

    #[error("deadlock detected: some neurons cannot execute due to unmet dependencies")]
    DeadlockDetected,

    #[error("neuron {name} failed: {error}")]
    NeuronFailed { name: String, error: String },

    #[error("invalid timeout: {0}")]
    InvalidTimeout(#[source] axoncore::CoreError),
}

/// Failures of the single-shot neuron runner.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("neuron not found: {0}")]
    NotFound(String),

    #[error("failed to read neuron config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse neuron config {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// History-store failures. Persistence is best-effort from the executor's
/// point of view; these never alter a run's own outcome.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("synapse name cannot be empty")]
    EmptyName,

    #[error("history not found for synapse {0}")]
    HistoryNotFound(String),

    #[error("execution {execution_id} not found for synapse {synapse}")]
    ExecutionNotFound {
        synapse: String,
        execution_id: String,
    },

    #[error("home directory could not be determined")]
    NoHomeDir,

    #[error("history IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse history: {0}")]
    Corrupt(#[from] serde_json::Error),
}
