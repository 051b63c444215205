use std::path::PathBuf;

use crate::namespace::Namespace;

/// Errors from building a storage configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for a storage config.
    #[error("invalid storage config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Namespace roots must be absolute.
    #[error("{namespace} root must be an absolute path, got {path}")]
    RelativeRoot { namespace: Namespace, path: PathBuf },

    /// The environment offers no location for a namespace root.
    #[error("no {namespace} root: set {variable} or HOME")]
    MissingRoot {
        namespace: Namespace,
        variable: &'static str,
    },

    /// The application name would not produce a single directory component.
    #[error("invalid application name: {0:?}")]
    InvalidAppName(String),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
