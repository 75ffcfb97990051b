use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "taskprobe.json";

/// Settings that may appear at the top level or inside a profile.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileConfig {
    pub base_url: Option<String>,
    pub auth_file: Option<String>,
    pub auth_scheme: Option<String>,
    pub timeout_secs: Option<u64>,
    pub preview_chars: Option<usize>,
    pub env: Option<String>,
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskprobeConfig {
    #[serde(flatten)]
    pub defaults: ProfileConfig,
    pub default_profile: Option<String>,
    pub profiles: BTreeMap<String, ProfileConfig>,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TaskprobeConfig,
    pub path: PathBuf,
    pub dir: PathBuf,
}

/// Load `taskprobe.json` from `target`, which may name the file itself or
/// the directory holding it. A missing file is not an error.
pub fn load_config(target: &Path) -> Result<Option<LoadedConfig>> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(CONFIG_FILE_NAME), resolved)
    } else {
        let dir = match resolved.parent() {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()?,
        };
        (resolved, dir)
    };

    if !file_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading config {}", file_path.display()))?;

    let config: TaskprobeConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", file_path.display()))?;

    tracing::debug!(path = %file_path.display(), profiles = config.profiles.len(), "loaded config");

    Ok(Some(LoadedConfig {
        config,
        path: file_path,
        dir,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn returns_none_when_config_missing() -> Result<()> {
        let temp = tempdir()?;
        let result = load_config(temp.path())?;
        assert!(result.is_none());
        Ok(())
    }

    #[test]
    fn loads_config_from_directory() -> Result<()> {
        let temp = tempdir()?;
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            r#"{
  "baseUrl": "https://api.example.com/v1",
  "previewChars": 80,
  "defaultProfile": "staging",
  "profiles": {"staging": {"authScheme": "Bearer", "timeoutSecs": 5}}
}"#,
        )?;

        let result = load_config(temp.path())?.expect("config should load");
        assert_eq!(result.path, config_path);
        assert_eq!(result.dir, temp.path());
        assert_eq!(
            result.config.defaults.base_url.as_deref(),
            Some("https://api.example.com/v1")
        );
        assert_eq!(result.config.defaults.preview_chars, Some(80));
        assert_eq!(result.config.default_profile.as_deref(), Some("staging"));

        let staging = &result.config.profiles["staging"];
        assert_eq!(staging.auth_scheme.as_deref(), Some("Bearer"));
        assert_eq!(staging.timeout_secs, Some(5));
        Ok(())
    }

    #[test]
    fn loads_config_from_explicit_file() -> Result<()> {
        let temp = tempdir()?;
        let config_path = temp.path().join("ci.json");
        std::fs::write(&config_path, r#"{"authFile": "auth.json"}"#)?;

        let result = load_config(&config_path)?.expect("config should load");
        assert_eq!(result.dir, temp.path());
        assert_eq!(result.config.defaults.auth_file.as_deref(), Some("auth.json"));
        Ok(())
    }

    #[test]
    fn reports_parse_errors_with_path() -> Result<()> {
        let temp = tempdir()?;
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "{ not json")?;

        let err = load_config(temp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
        Ok(())
    }
}
