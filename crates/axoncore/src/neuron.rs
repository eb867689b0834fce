use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Definition of a single executable check/mutation script.
///
/// Loaded from a YAML config file, executed zero or more times, never
/// mutated after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neuron {
    pub name: String,

    /// Free-form type tag (e.g. "check", "fix").
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub description: String,

    /// Path to the command this neuron executes.
    pub exec_file: String,

    /// Human-readable text streamed before the command launches.
    #[serde(default)]
    pub pre_exec_debug: String,

    /// Exit codes considered successful. Empty means "only 0".
    #[serde(default)]
    pub assert_exit_status: Vec<i32>,

    #[serde(default)]
    pub post_exec_success_debug: String,

    /// Per-exit-code hints rendered when the command fails.
    #[serde(default)]
    pub post_exec_fail_debug: HashMap<i32, String>,
}

impl Neuron {
    /// Whether the given exit code counts as success for this neuron.
    pub fn accepts(&self, exit_code: i32) -> bool {
        if self.assert_exit_status.is_empty() {
            exit_code == 0
        } else {
            self.assert_exit_status.contains(&exit_code)
        }
    }

    /// Hint text for a failing exit code, if the definition carries one.
    pub fn fail_hint(&self, exit_code: i32) -> Option<&str> {
        self.post_exec_fail_debug.get(&exit_code).map(String::as_str)
    }
}
