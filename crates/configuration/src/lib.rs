use std::path::Path;

use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{AnalyticsSettings, Config, DataSettings, LoggingSettings};

/// Prefix of the environment variables that override file settings,
/// e.g. `INDEX360__ANALYTICS__NAV_BASE=1000`.
pub const ENV_PREFIX: &str = "INDEX360";
const ENV_SEPARATOR: &str = "__";

/// Loads the application configuration.
///
/// Layers, lowest precedence first: built-in defaults, the TOML file at `path`
/// (skipped when `None` or missing), then `INDEX360__`-prefixed environment
/// variables. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    build_config(path, environment())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn build_config(path: Option<&Path>, env: config::Environment) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(false));
    }
    let settings = builder.add_source(env).build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = settings.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
