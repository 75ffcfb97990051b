mod loader;
mod settings;

pub use loader::{load_config, LoadedConfig, ProfileConfig, TaskprobeConfig, CONFIG_FILE_NAME};
pub use settings::{HarnessSettings, SettingsBuilder, SettingsOverrides, DEFAULT_BASE_URL};
