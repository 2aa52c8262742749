mod settings;

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};

use crate::utils::{Result, TalkerError};
use settings::PartialSettings;

pub use settings::{
    LogSettings, MiddlewareSettings, NodeSettings, PublisherSettings, Settings, TransportKind,
};

/// Prefix of environment variables read by `load_config`.
pub const ENV_PREFIX: &str = "TALKER";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values and validates the result
/// Returns a `Settings` struct ready to start the talker
pub fn load_config() -> Result<Settings> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    let settings = Settings::merge(partial);
    settings.validate()?;
    Ok(settings)
}

/// Loads `KEY=VALUE` pairs from `path` into the process environment without
/// overriding variables that are already set.
///
/// A missing file is not an error and yields `Ok(None)`.
pub fn load_env_file(path: &Path) -> Result<Option<PathBuf>> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(TalkerError::Config(format!(
            "cannot read {}: {e}",
            path.display()
        ))),
    }
}
