mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    BrokerSettings, DirectorySettings, DispatchSettings, LoggingSettings, NotifierSettings,
    ServerSettings, Settings, StorageSettings,
};

/// Prefix of environment overrides, e.g. `CAMPUS__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "CAMPUS";

/// Loads the configuration from `config/default.*` and environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Loads the configuration from the file at `path` (optional, any format the
/// `config` crate understands) with environment overrides on top, then merges
/// the result onto the defaults.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge(Settings::default()))
}
