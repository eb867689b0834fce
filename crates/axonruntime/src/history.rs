use crate::HistoryError;
use axoncore::ExecutionRecord;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

/// Append-only execution history, one pretty-printed JSON array per
/// synapse name.
///
/// All read-modify-write access to a synapse's history file goes through
/// this instance's read-write lock, so concurrent writers within a process
/// are serialized rather than lost. Final on-disk order reflects critical
/// section completion order.
pub struct HistoryManager {
    base_dir: PathBuf,
    lock: RwLock<()>,
}

impl HistoryManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            lock: RwLock::new(()),
        }
    }

    /// Manager rooted at the default per-user directory, `~/.axon/history`.
    pub fn with_default_dir() -> Result<Self, HistoryError> {
        let home = dirs_next::home_dir().ok_or(HistoryError::NoHomeDir)?;
        Ok(Self::new(home.join(".axon").join("history")))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn history_path(&self, synapse_name: &str) -> PathBuf {
        self.base_dir.join(format!("{synapse_name}.json"))
    }

    /// Append a record to the named synapse's history.
    ///
    /// A missing history file is treated as an empty list; malformed JSON
    /// in an existing file is a hard error.
    pub fn add_execution(
        &self,
        synapse_name: &str,
        record: ExecutionRecord,
    ) -> Result<(), HistoryError> {
        if synapse_name.is_empty() {
            return Err(HistoryError::EmptyName);
        }

        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());

        std::fs::create_dir_all(&self.base_dir)?;
        let path = self.history_path(synapse_name);

        let mut history: Vec<ExecutionRecord> = match std::fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        history.push(record);

        let data = serde_json::to_vec_pretty(&history)?;
        std::fs::write(&path, data)?;
        Ok(())
    }

    /// All records for a synapse; empty when it has never run.
    pub fn get_history(&self, synapse_name: &str) -> Result<Vec<ExecutionRecord>, HistoryError> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());

        let path = self.history_path(synapse_name);
        match std::fs::read(&path) {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up one execution by id.
    ///
    /// Distinguishes "this synapse never ran" (`HistoryNotFound`) from
    /// "it ran, but not with this id" (`ExecutionNotFound`).
    pub fn get_execution_logs(
        &self,
        synapse_name: &str,
        execution_id: Uuid,
    ) -> Result<ExecutionRecord, HistoryError> {
        let history = self.get_history(synapse_name)?;
        if history.is_empty() {
            return Err(HistoryError::HistoryNotFound(synapse_name.to_string()));
        }

        history
            .into_iter()
            .find(|record| record.id == execution_id)
            .ok_or_else(|| HistoryError::ExecutionNotFound {
                synapse: synapse_name.to_string(),
                execution_id: execution_id.to_string(),
            })
    }
}
