use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Config file read when no path is given. It may be absent.
pub const DEFAULT_CONFIG_PATH: &str = "opsbatch.toml";

/// Load configuration from file with environment variable overrides
///
/// Precedence, lowest first: built-in defaults, the TOML file,
/// `CLERK_SECRET_KEY`, then `OPSBATCH_*` variables with `__` separating
/// nested keys (`OPSBATCH_MIGRATION__MAX_WORKERS=40`).
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            Toml::file(path)
        }
        None => Toml::file(DEFAULT_CONFIG_PATH),
    };

    let config: Config = Figment::new()
        .merge(file)
        .merge(
            Env::raw()
                .only(&["CLERK_SECRET_KEY"])
                .map(|_| "identity.secret_key".into()),
        )
        .merge(Env::prefixed("OPSBATCH_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
