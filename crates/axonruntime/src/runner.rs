use crate::{OutputSink, RunnerError};
use async_trait::async_trait;
use axoncore::Neuron;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Sentinel exit code when the child process could not be launched or was
/// terminated without reporting a status.
pub const LAUNCH_FAILED_EXIT_CODE: i32 = -1;

/// Outcome of exciting a single neuron once.
#[derive(Debug, Clone)]
pub struct Excitation {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Single-shot command runner for neurons.
///
/// No retries, no concurrency, no knowledge of synapses; the executor owns
/// all of that. A trait so tests can substitute a recording stub.
#[async_trait]
pub trait NeuronRunner: Send + Sync {
    /// Load the neuron named `name` from `synapse_dir` and run it once.
    ///
    /// A non-zero exit code is not an error here; callers interpret the
    /// code. `Err` means the definition could not be loaded or the command
    /// could not be launched at all.
    async fn excite(
        &self,
        name: &str,
        synapse_dir: &Path,
        sink: &OutputSink,
    ) -> Result<Excitation, RunnerError>;
}

/// Runner backed by YAML neuron definitions under `<dir>/neurons/`.
///
/// Definitions are loaded fresh per invocation; there is no shared cache.
#[derive(Debug, Default)]
pub struct FileNeuronRunner;

impl FileNeuronRunner {
    fn resolve(&self, name: &str, synapse_dir: &Path) -> Result<PathBuf, RunnerError> {
        let with_ext = synapse_dir.join("neurons").join(format!("{name}.yml"));
        if with_ext.exists() {
            return Ok(with_ext);
        }
        let bare = synapse_dir.join("neurons").join(name);
        if bare.exists() {
            return Ok(bare);
        }
        Err(RunnerError::NotFound(name.to_string()))
    }

    fn load(&self, path: &Path) -> Result<Neuron, RunnerError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RunnerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| RunnerError::Load {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl NeuronRunner for FileNeuronRunner {
    async fn excite(
        &self,
        name: &str,
        synapse_dir: &Path,
        sink: &OutputSink,
    ) -> Result<Excitation, RunnerError> {
        let path = self.resolve(name, synapse_dir)?;
        let neuron = self.load(&path)?;

        if !neuron.pre_exec_debug.is_empty() {
            sink.line(format!("===> {}", neuron.pre_exec_debug));
        }

        tracing::debug!(neuron = %neuron.name, exec_file = %neuron.exec_file, "exciting neuron");

        let output = Command::new(&neuron.exec_file)
            .current_dir(synapse_dir)
            .output()
            .await
            .map_err(|source| RunnerError::Launch {
                program: neuron.exec_file.clone(),
                source,
            })?;

        // Killed-by-signal yields no code; report the sentinel.
        let exit_code = output.status.code().unwrap_or(LAUNCH_FAILED_EXIT_CODE);

        Ok(Excitation {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
