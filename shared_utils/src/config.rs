use thiserror::Error;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent from both the config file and the environment.
    #[error("Missing setting `{0}` (set it in the config file or the environment)")]
    MissingSetting(String),

    /// A setting is present but cannot be interpreted.
    #[error("Invalid value {value:?} for `{key}`: {reason}")]
    InvalidValue {
        /// Setting or variable name.
        key: String,
        /// The offending raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The config file could not be read or parsed.
    #[error("Config file {path}: {message}")]
    File {
        /// Path of the config file.
        path: String,
        /// Underlying read or parse failure.
        message: String,
    },
}
