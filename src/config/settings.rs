use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use url::Url;

use crate::credential::DEFAULT_AUTH_FILE;
use crate::env::{expand_with, load_env_file, EnvMap};
use crate::executor::ExecutorOptions;
use crate::suite::DEFAULT_PREVIEW_CHARS;

use super::loader::{LoadedConfig, ProfileConfig, TaskprobeConfig};

pub const DEFAULT_BASE_URL: &str =
    "https://a9206bd8od.execute-api.eu-west-1.amazonaws.com/dev/api/v1";

/// Values given on the command line (or their environment fallbacks).
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_url: Option<String>,
    pub auth_file: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub profile: Option<String>,
    pub preview_chars: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessSettings {
    pub base_url: String,
    pub auth_file: PathBuf,
    pub auth_scheme: Option<String>,
    pub timeout: Option<Duration>,
    pub preview_chars: usize,
    pub profile_name: Option<String>,
    pub env_files: Vec<PathBuf>,
}

impl HarnessSettings {
    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            base_url: self.base_url.clone(),
            auth_scheme: self.auth_scheme.clone(),
            timeout: self.timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    base_dir: PathBuf,
    config: Option<LoadedConfig>,
    overrides: SettingsOverrides,
}

impl SettingsBuilder {
    pub fn new(base_dir: PathBuf, config: Option<LoadedConfig>, overrides: SettingsOverrides) -> Self {
        Self {
            base_dir,
            config,
            overrides,
        }
    }

    /// Merge flags over profile over top-level config over defaults.
    pub fn build(&self) -> Result<HarnessSettings> {
        let empty = TaskprobeConfig::default();
        let (config, config_dir) = match &self.config {
            Some(loaded) => (&loaded.config, loaded.dir.as_path()),
            None => (&empty, self.base_dir.as_path()),
        };

        let profile = resolve_profile(config, self.overrides.profile.as_deref())?;
        let top = &config.defaults;
        let layer = Layered {
            profile: profile.as_ref().map(|p| p.config),
            top,
        };

        let mut variables: EnvMap = top.variables.clone();
        if let Some(p) = &profile {
            variables.extend(p.config.variables.clone());
        }

        let mut env_files = Vec::new();
        let env_path = match &self.overrides.env_file {
            Some(explicit) => Some(resolve_relative(&self.base_dir, explicit)),
            None => layer
                .pick(|c| c.env.clone())
                .map(|env| resolve_relative(config_dir, Path::new(&env))),
        };
        if let Some(env_path) = env_path {
            variables.extend(load_env_file(&env_path)?);
            env_files.push(env_path);
        }

        let expand = |field: &str, raw: String| -> Result<String> {
            expand_with(&raw, |key| {
                variables
                    .get(key)
                    .cloned()
                    .or_else(|| std::env::var(key).ok())
            })
            .with_context(|| format!("expanding {field}"))
        };

        let base_url = match &self.overrides.base_url {
            Some(url) => url.clone(),
            None => match layer.pick(|c| c.base_url.clone()) {
                Some(raw) => expand("baseUrl", raw)?,
                None => DEFAULT_BASE_URL.to_string(),
            },
        };
        validate_base_url(&base_url)?;

        let auth_file = match &self.overrides.auth_file {
            Some(path) => resolve_relative(&self.base_dir, path),
            None => match layer.pick(|c| c.auth_file.clone()) {
                Some(raw) => resolve_relative(config_dir, Path::new(&expand("authFile", raw)?)),
                None => PathBuf::from(DEFAULT_AUTH_FILE),
            },
        };

        let auth_scheme = layer
            .pick(|c| c.auth_scheme.clone())
            .map(|raw| expand("authScheme", raw))
            .transpose()?;

        let timeout = self
            .overrides
            .timeout_secs
            .or_else(|| layer.pick(|c| c.timeout_secs))
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let preview_chars = self
            .overrides
            .preview_chars
            .or_else(|| layer.pick(|c| c.preview_chars))
            .unwrap_or(DEFAULT_PREVIEW_CHARS);

        Ok(HarnessSettings {
            base_url,
            auth_file,
            auth_scheme,
            timeout,
            preview_chars,
            profile_name: profile.map(|p| p.name),
            env_files,
        })
    }
}

struct Layered<'a> {
    profile: Option<&'a ProfileConfig>,
    top: &'a ProfileConfig,
}

impl Layered<'_> {
    fn pick<T>(&self, field: impl Fn(&ProfileConfig) -> Option<T>) -> Option<T> {
        self.profile.and_then(&field).or_else(|| field(self.top))
    }
}

struct ResolvedProfile<'a> {
    name: String,
    config: &'a ProfileConfig,
}

fn resolve_profile<'a>(
    config: &'a TaskprobeConfig,
    requested: Option<&str>,
) -> Result<Option<ResolvedProfile<'a>>> {
    let available = || {
        if config.profiles.is_empty() {
            "none defined".to_string()
        } else {
            config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
        }
    };

    if let Some(name) = requested {
        return match config.profiles.get(name) {
            Some(profile) => Ok(Some(ResolvedProfile {
                name: name.to_string(),
                config: profile,
            })),
            None => bail!("Unknown profile: {name} (available: {})", available()),
        };
    }

    if let Some(default) = &config.default_profile {
        return match config.profiles.get(default) {
            Some(profile) => Ok(Some(ResolvedProfile {
                name: default.clone(),
                config: profile,
            })),
            None => bail!(
                "defaultProfile {default} is not defined (available: {})",
                available()
            ),
        };
    }

    Ok(config
        .profiles
        .iter()
        .next()
        .map(|(name, profile)| ResolvedProfile {
            name: name.clone(),
            config: profile,
        }))
}

fn validate_base_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("invalid base URL {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("base URL must use http or https: {raw}");
    }
    Ok(())
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
