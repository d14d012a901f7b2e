use std::path::PathBuf;

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required value is absent from both the environment and the file.
    #[error("missing required configuration value {var}")]
    Missing { var: &'static str },

    /// A value is present but cannot be used.
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Error {
    #[must_use]
    pub fn invalid(var: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Invalid {
            var,
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
