use crate::{duration::parse_duration, CoreError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// A named workflow: an ordered list of neuron references plus
/// scheduling, retry, condition and rollback policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synapse {
    pub name: String,

    #[serde(default)]
    pub neurons: Vec<NeuronRef>,

    #[serde(default)]
    pub execution: ExecutionMode,

    #[serde(default)]
    pub stop_on_error: bool,

    /// Parallel mode only; values ≤ 0 fall back to the default of 5.
    #[serde(default)]
    pub max_concurrency: i64,

    /// Overall run deadline as a duration string, e.g. `"5s"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl Synapse {
    /// Effective concurrency bound for parallel scheduling.
    pub fn effective_concurrency(&self) -> usize {
        if self.max_concurrency <= 0 {
            DEFAULT_MAX_CONCURRENCY
        } else {
            self.max_concurrency as usize
        }
    }

    /// Parse the optional timeout string. `None` means no deadline.
    pub fn timeout_duration(&self) -> Result<Option<Duration>, CoreError> {
        match self.timeout.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => parse_duration(raw).map(Some),
        }
    }
}

/// Reference to a neuron inside a synapse, with execution metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuronRef {
    pub name: String,

    /// Condition expression gating execution; empty/absent means always run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,

    /// Rollback neurons dispatched when this neuron fails.
    #[serde(default)]
    pub on_failure: Vec<String>,

    /// Names of neurons that must complete before this one (parallel mode).
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl NeuronRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: None,
            retry: None,
            on_failure: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_on_failure(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.on_failure = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_depends_on(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.depends_on = names.into_iter().map(Into::into).collect();
        self
    }
}

/// How the neurons of a synapse are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

/// Retry timing for a single neuron reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first; values < 1 are treated as 1.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub backoff: Backoff,

    /// Base delay as a duration string; defaults to 1s when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay: Option<String>,
}

fn default_max_attempts() -> u32 {
    1
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Linear,
            initial_delay: None,
        }
    }
}

/// Function mapping retry attempt number to wait duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    #[default]
    Linear,
    Exponential,
}
