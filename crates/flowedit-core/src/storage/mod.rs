//! Storage abstraction for configuration persistence.

mod file;
mod memory;

pub use file::{DEFAULT_CONFIG_FILE, FileStore};
pub use memory::MemoryStore;

use crate::config::{ConfigDocument, ConfigError};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing has been saved yet. A valid state, not a failure.
    #[error("No configuration has been saved")]
    NotFound,
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

impl From<ConfigError> for StoreError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Parse(msg) => StoreError::Parse(msg),
            ConfigError::Serialization(msg) => StoreError::Serialization(msg),
        }
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future for store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A backend holding the single persisted configuration.
///
/// Saves replace the whole document; there is no partial update.
pub trait ConfigStore: Send + Sync {
    /// Save the configuration, replacing whatever was stored.
    fn save(&self, document: &ConfigDocument) -> BoxFuture<'_, StoreResult<()>>;

    /// Load the configuration. Fails with [`StoreError::NotFound`] when
    /// nothing has been saved.
    fn load(&self) -> BoxFuture<'_, StoreResult<ConfigDocument>>;

    /// Check if a configuration has been saved.
    fn exists(&self) -> BoxFuture<'_, StoreResult<bool>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_keep_their_side() {
        let read: StoreError = ConfigError::Parse("bad pair".to_string()).into();
        assert!(matches!(read, StoreError::Parse(ref m) if m == "bad pair"));

        let write: StoreError = ConfigError::Serialization("bad value".to_string()).into();
        assert!(matches!(write, StoreError::Serialization(ref m) if m == "bad value"));
        assert!(!write.is_not_found());
    }
}

#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
