//! Relay configuration.

use std::path::{Path, PathBuf};

/// Default bound on the message log.
pub const DEFAULT_MAX_MESSAGES: usize = 500;

/// Messages returned to an agent when it joins a channel.
pub const DEFAULT_JOIN_HISTORY: usize = 50;

/// How recently an agent must have been seen to count as online.
pub const DEFAULT_PRESENCE_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Events queued per stream subscriber before new ones are dropped.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Name of the persisted document inside the data directory.
pub const STORE_FILE: &str = "store.json";

/// Engine settings, fixed for the lifetime of a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Directory holding the persisted document.
    pub data_dir: PathBuf,
    /// Oldest messages are evicted once the log grows past this.
    pub max_messages: usize,
    /// Number of recent messages handed back by `join`.
    pub join_history: usize,
    /// Window used for online/offline presence display.
    pub presence_window_ms: i64,
    /// Per-subscriber notification queue length.
    pub subscriber_buffer: usize,
}

impl RelayConfig {
    /// Create a configuration with default limits.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_messages: DEFAULT_MAX_MESSAGES,
            join_history: DEFAULT_JOIN_HISTORY,
            presence_window_ms: DEFAULT_PRESENCE_WINDOW_MS,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }

    #[must_use]
    pub const fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages;
        self
    }

    #[must_use]
    pub const fn with_join_history(mut self, join_history: usize) -> Self {
        self.join_history = join_history;
        self
    }

    #[must_use]
    pub const fn with_presence_window_ms(mut self, window_ms: i64) -> Self {
        self.presence_window_ms = window_ms;
        self
    }

    #[must_use]
    pub const fn with_subscriber_buffer(mut self, buffer: usize) -> Self {
        self.subscriber_buffer = buffer;
        self
    }

    /// Path of the persisted document.
    #[must_use]
    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    /// Data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::new(default_data_dir())
    }
}

/// `~/.marc`, or `./.marc` when no home directory is known.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marc")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = RelayConfig::new("/tmp/marc")
            .with_max_messages(10)
            .with_join_history(3);
        assert_eq!(config.max_messages, 10);
        assert_eq!(config.join_history, 3);
        assert_eq!(config.subscriber_buffer, DEFAULT_SUBSCRIBER_BUFFER);
        assert_eq!(config.store_file(), PathBuf::from("/tmp/marc/store.json"));
    }

    #[test]
    fn default_dir_ends_in_marc() {
        assert!(default_data_dir().ends_with(".marc"));
    }
}
