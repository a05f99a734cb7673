//! Typed configuration builders.
//!
//! Each builder renders the engine's configuration string through
//! [`Display`](fmt::Display). Builders are a convenience; every call that
//! takes one also takes plain configuration text.

use crate::marshal::ConfigArg;
use std::fmt;

/// Writes `items` as a comma separated configuration string.
fn write_items(f: &mut fmt::Formatter<'_>, items: &[Option<String>]) -> fmt::Result {
    let mut first = true;
    for item in items.iter().flatten() {
        if !first {
            f.write_str(",")?;
        }
        f.write_str(item)?;
        first = false;
    }
    Ok(())
}

fn flag(name: &str, value: Option<bool>) -> Option<String> {
    value.map(|v| format!("{name}={v}"))
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    /// Reads see uncommitted changes of other transactions.
    ReadUncommitted,
    /// Reads see changes committed before each read.
    ReadCommitted,
    /// Reads see a snapshot taken when the transaction started.
    Snapshot,
}

impl Isolation {
    fn as_str(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "read-uncommitted",
            Self::ReadCommitted => "read-committed",
            Self::Snapshot => "snapshot",
        }
    }
}

/// Configuration for opening a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Create the store if it does not exist.
    pub create: bool,

    /// Fail if the store already exists.
    pub exclusive: bool,

    /// Keep the store in memory only; it is discarded on close.
    pub in_memory: bool,

    /// Cache budget in bytes.
    pub cache_size: Option<u64>,

    /// Maximum number of concurrently open sessions.
    pub session_max: Option<u32>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            create: true,
            exclusive: false,
            in_memory: false,
            cache_size: None,
            session_max: None,
        }
    }
}

impl ConnectionConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create a missing store.
    #[must_use]
    pub const fn create(mut self, value: bool) -> Self {
        self.create = value;
        self
    }

    /// Sets whether opening an existing store fails.
    #[must_use]
    pub const fn exclusive(mut self, value: bool) -> Self {
        self.exclusive = value;
        self
    }

    /// Sets whether the store lives in memory only.
    #[must_use]
    pub const fn in_memory(mut self, value: bool) -> Self {
        self.in_memory = value;
        self
    }

    /// Sets the cache budget in bytes.
    #[must_use]
    pub const fn cache_size(mut self, bytes: u64) -> Self {
        self.cache_size = Some(bytes);
        self
    }

    /// Sets the maximum number of sessions.
    #[must_use]
    pub const fn session_max(mut self, sessions: u32) -> Self {
        self.session_max = Some(sessions);
        self
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(
            f,
            &[
                self.create.then(|| "create".to_string()),
                self.exclusive.then(|| "exclusive=true".to_string()),
                self.in_memory.then(|| "in_memory=true".to_string()),
                self.cache_size.map(|b| format!("cache_size={b}")),
                self.session_max.map(|n| format!("session_max={n}")),
            ],
        )
    }
}

/// Configuration for opening a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Default isolation for transactions started in the session.
    pub isolation: Option<Isolation>,
}

impl SessionConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default isolation level.
    #[must_use]
    pub const fn isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = Some(isolation);
        self
    }
}

impl fmt::Display for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(
            f,
            &[self.isolation.map(|i| format!("isolation={}", i.as_str()))],
        )
    }
}

/// Configuration for opening a cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorConfig {
    /// Whether inserts replace existing keys and removes of missing keys
    /// succeed. The engine default is `true`.
    pub overwrite: Option<bool>,
}

impl CursorConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets overwrite behavior.
    #[must_use]
    pub const fn overwrite(mut self, value: bool) -> Self {
        self.overwrite = Some(value);
        self
    }
}

impl fmt::Display for CursorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(f, &[flag("overwrite", self.overwrite)])
    }
}

/// Configuration for starting a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Isolation level for this transaction.
    pub isolation: Option<Isolation>,

    /// Whether commit waits for the log to be durable.
    pub sync: Option<bool>,
}

impl TransactionConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the isolation level.
    #[must_use]
    pub const fn isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = Some(isolation);
        self
    }

    /// Sets whether commit syncs the log.
    #[must_use]
    pub const fn sync(mut self, value: bool) -> Self {
        self.sync = Some(value);
        self
    }
}

impl fmt::Display for TransactionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(
            f,
            &[
                self.isolation.map(|i| format!("isolation={}", i.as_str())),
                flag("sync", self.sync),
            ],
        )
    }
}

macro_rules! render_with_display {
    ($($ty:ty),*) => {
        $(
            impl ConfigArg for $ty {
                fn render(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

render_with_display!(ConnectionConfig, SessionConfig, CursorConfig, TransactionConfig);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_connection_config() {
        let config = ConnectionConfig::default();
        assert!(config.create);
        assert!(!config.in_memory);
        assert_eq!(config.to_string(), "create");
    }

    #[test]
    fn builder_pattern() {
        let config = ConnectionConfig::new()
            .exclusive(true)
            .in_memory(true)
            .cache_size(1 << 20)
            .session_max(8);
        assert_eq!(
            config.to_string(),
            "create,exclusive=true,in_memory=true,cache_size=1048576,session_max=8"
        );
        assert_eq!(ConnectionConfig::new().create(false).to_string(), "");
    }

    #[test]
    fn cursor_and_transaction_configs() {
        assert_eq!(CursorConfig::new().to_string(), "");
        assert_eq!(CursorConfig::new().overwrite(false).to_string(), "overwrite=false");
        assert_eq!(
            TransactionConfig::new()
                .isolation(Isolation::Snapshot)
                .sync(true)
                .to_string(),
            "isolation=snapshot,sync=true"
        );
        assert_eq!(
            SessionConfig::new()
                .isolation(Isolation::ReadCommitted)
                .to_string(),
            "isolation=read-committed"
        );
    }

    #[test]
    fn empty_builders_render_as_null() {
        assert_eq!(crate::marshal::config_arg(&CursorConfig::new()).unwrap(), None);
    }
}
