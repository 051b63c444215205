use serde::{Deserialize, Serialize};

/// How a save lands its bytes on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Stage in a temporary file beside the target, then rename it into place.
    /// Readers never observe a partially written blob.
    Atomic,
    /// Truncate and write the target in place.
    Direct,
}

impl Default for WriteMode {
    fn default() -> Self {
        Self::Atomic
    }
}

/// Write behavior shared by every save through a persistence backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Atomic (temp + rename) or direct writes.
    pub mode: WriteMode,
    /// `fsync` file contents before a save reports success.
    pub sync_on_write: bool,
    /// Treat a zero-length blob as invalid input.
    pub reject_empty_blobs: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            mode: WriteMode::default(),
            sync_on_write: true,
            reject_empty_blobs: false,
        }
    }
}

impl WriteOptions {
    /// In-place writes without fsync. Fast, and the least durable.
    pub fn direct() -> Self {
        Self {
            mode: WriteMode::Direct,
            sync_on_write: false,
            ..Default::default()
        }
    }

    /// Replace the write mode.
    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Turn fsync on save on or off.
    pub fn with_sync(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }

    /// Set whether zero-length blobs are refused.
    pub fn rejecting_empty_blobs(mut self, reject: bool) -> Self {
        self.reject_empty_blobs = reject;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_atomic_and_durable() {
        let opts = WriteOptions::default();
        assert_eq!(opts.mode, WriteMode::Atomic);
        assert!(opts.sync_on_write);
        assert!(!opts.reject_empty_blobs);
    }

    #[test]
    fn direct_preset() {
        let opts = WriteOptions::direct();
        assert_eq!(opts.mode, WriteMode::Direct);
        assert!(!opts.sync_on_write);
    }

    #[test]
    fn builder_chain() {
        let opts = WriteOptions::default()
            .with_mode(WriteMode::Direct)
            .with_sync(false)
            .rejecting_empty_blobs(true);
        assert_eq!(opts.mode, WriteMode::Direct);
        assert!(!opts.sync_on_write);
        assert!(opts.reject_empty_blobs);
    }
}
