use std::fmt;

use serde::{Deserialize, Serialize};

/// The two logical storage areas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Data the system may purge at any time.
    Cache,
    /// Data expected to survive across runs.
    Documents,
}

impl Namespace {
    /// Every namespace, cache first.
    pub const ALL: [Namespace; 2] = [Namespace::Cache, Namespace::Documents];

    /// Whether the operating environment is allowed to purge this namespace.
    ///
    /// Informational only: no eviction happens at this layer.
    pub fn is_purgeable(self) -> bool {
        matches!(self, Self::Cache)
    }

    /// Lowercase name, as used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Documents => "documents",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
