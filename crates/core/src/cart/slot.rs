//! Durable key-value slot the cart persists through.

use std::collections::HashMap;
use std::convert::Infallible;

/// A string key-value store supplied by the host.
///
/// Implementations can back this with a browser-style local store, an HTTP
/// session, a file or a database row. Values are opaque strings; the cart
/// decides what it writes.
pub trait KeyValueSlot {
    /// The error type returned by slot operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error>;
}

/// In-memory slot.
///
/// Lives as long as the value does; useful for tests and for hosts that only
/// need the cart for the lifetime of one process.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    values: HashMap<String, String>,
}

impl MemorySlot {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-populated with one value.
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut values = HashMap::new();
        values.insert(key.into(), value.into());
        Self { values }
    }

    /// Borrow the raw value under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueSlot for MemorySlot {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }
}

impl<S: KeyValueSlot + ?Sized> KeyValueSlot for &mut S {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error> {
        (**self).set(key, value)
    }
}
