use std::path::Path;

use anyhow::{Context, Result};

use crate::env::EnvMap;

/// Read a dotenv file into a fresh map of config variables.
///
/// Later lines win over earlier ones. Nothing is written to the process
/// environment.
pub fn load_env_file(path: &Path) -> Result<EnvMap> {
    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("reading env file {}", path.display()))?;

    let variables = entries
        .collect::<Result<EnvMap, _>>()
        .with_context(|| format!("parsing env file {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = variables.len(), "loaded env file");
    Ok(variables)
}
