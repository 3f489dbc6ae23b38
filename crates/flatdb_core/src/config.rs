//! Store configuration.

/// Configuration for a record store and its transactions.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the data directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether staged content and directory entries are synced to disk
    /// (safer but slower).
    pub sync_on_commit: bool,

    /// Extension of record files, without the leading dot.
    pub file_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
            file_extension: "json".to_string(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the data directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync staged files and directories on commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets the record file extension.
    #[must_use]
    pub fn file_extension(mut self, ext: impl Into<String>) -> Self {
        self.file_extension = ext.into().trim_start_matches('.').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(config.sync_on_commit);
        assert_eq!(config.file_extension, "json");
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_if_missing(false)
            .sync_on_commit(false)
            .file_extension(".cbor");

        assert!(!config.create_if_missing);
        assert!(!config.sync_on_commit);
        assert_eq!(config.file_extension, "cbor");
    }
}
