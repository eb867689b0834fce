use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ExecutionId = Uuid;

/// Durable summary of one synapse run, persisted to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: ExecutionId,
    pub synapse_name: String,
    pub timestamp: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub duration_ms: u64,
    pub neuron_results: Vec<NeuronResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ExecutionRecord {
    /// Fresh record in the `running` state, stamped with the current time.
    pub fn started(id: ExecutionId, synapse_name: impl Into<String>) -> Self {
        Self {
            id,
            synapse_name: synapse_name.into(),
            timestamp: Utc::now(),
            status: ExecutionStatus::Running,
            duration_ms: 0,
            neuron_results: Vec::new(),
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
    /// Run finished but at least one neuron failed.
    Partial,
}

/// Outcome of a single neuron within a run. Never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuronResult {
    pub name: String,
    pub status: NeuronStatus,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NeuronResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: NeuronStatus::Success,
            exit_code: 0,
            duration_ms: 0,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
        }
    }

    /// Result for a neuron whose condition was not met.
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            status: NeuronStatus::Skipped,
            ..Self::new(name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeuronStatus {
    Success,
    Failed,
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Partial).unwrap(),
            "\"partial\""
        );
        assert_eq!(
            serde_json::to_string(&NeuronStatus::Skipped).unwrap(),
            "\"skipped\""
        );
    }

    #[test]
    fn record_round_trips() {
        let mut record = ExecutionRecord::started(Uuid::new_v4(), "health-check");
        record.status = ExecutionStatus::Success;
        record.neuron_results.push(NeuronResult::new("check-nginx"));

        let json = serde_json::to_string_pretty(&record).unwrap();
        let back: ExecutionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, record.id);
        assert_eq!(back.synapse_name, "health-check");
        assert_eq!(back.neuron_results.len(), 1);
        assert!(back.error_message.is_none());
    }
}
