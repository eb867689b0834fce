use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid duration: {0:?}")]
    InvalidDuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Structural errors detected before any execution is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("synapse name cannot be empty")]
    EmptyName,

    #[error("synapse must contain at least one neuron")]
    NoNeurons,

    #[error("duplicate neuron name: {0}")]
    DuplicateNeuron(String),

    #[error("neuron {neuron} depends on unknown neuron {dependency}")]
    DanglingDependency { neuron: String, dependency: String },

    #[error("circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },
}
