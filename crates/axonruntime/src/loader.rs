use axoncore::{validate, CoreError, Synapse};
use std::path::Path;

/// Load and validate a synapse from `<dir>/config.yml`.
///
/// Validation runs here, once, before any execution is attempted; the
/// executor does not re-validate.
pub fn load_synapse_dir(dir: &Path) -> Result<Synapse, CoreError> {
    let config_path = dir.join("config.yml");
    if !config_path.exists() {
        return Err(CoreError::ConfigNotFound(config_path));
    }
    load_synapse_file(&config_path)
}

/// Load and validate a synapse from a specific config file.
pub fn load_synapse_file(path: &Path) -> Result<Synapse, CoreError> {
    let raw = std::fs::read_to_string(path)?;
    let synapse: Synapse = serde_yaml::from_str(&raw)?;
    validate(&synapse)?;
    Ok(synapse)
}
