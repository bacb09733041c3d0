//! Session-backed cart persistence.
//!
//! Each request gets its own [`CartStore`] over a [`SessionSlot`]. Session
//! reads and writes are async while cart operations are not, so the slot
//! buffers: [`load_cart`] reads the cart key up front, the handler runs its
//! cart operations, and [`save_cart`] writes back whatever changed.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

use serde_json::Value;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use hearthloom_core::cart::{CartStore, KeyValueSlot};

use crate::models::session_keys;

/// [`KeyValueSlot`] over a `tower_sessions` session.
pub struct SessionSlot {
    session: Session,
    values: HashMap<String, String>,
    dirty: HashSet<String>,
}

impl SessionSlot {
    /// Read `keys` from the session into a new slot.
    ///
    /// A non-string session value is kept as its JSON text, so the cart sees
    /// it as an unreadable snapshot rather than as a missing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: &Session, keys: &[&str]) -> Result<Self, SessionError> {
        let mut values = HashMap::with_capacity(keys.len());

        for key in keys {
            let value = match session.get_value(key).await? {
                Some(Value::String(s)) => s,
                Some(other) => {
                    tracing::warn!(key, "Session value is not a string");
                    other.to_string()
                }
                None => continue,
            };
            values.insert((*key).to_owned(), value);
        }

        Ok(Self {
            session: session.clone(),
            values,
            dirty: HashSet::new(),
        })
    }

    /// Keys written since the slot was loaded.
    pub fn dirty_keys(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    /// Write changed keys back into the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be updated.
    pub async fn flush(mut self) -> Result<(), SessionError> {
        for key in std::mem::take(&mut self.dirty) {
            if let Some(value) = self.values.remove(&key) {
                self.session.insert(&key, value).await?;
            }
        }
        Ok(())
    }
}

impl KeyValueSlot for SessionSlot {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error> {
        self.values.insert(key.to_owned(), value);
        self.dirty.insert(key.to_owned());
        Ok(())
    }
}

/// Open the cart stored in `session`.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<CartStore<SessionSlot>, SessionError> {
    let slot = SessionSlot::load(session, &[session_keys::CART]).await?;
    Ok(CartStore::open(slot))
}

/// Write the cart back into its session.
///
/// # Errors
///
/// Returns an error if the session cannot be updated.
pub async fn save_cart(store: CartStore<SessionSlot>) -> Result<(), SessionError> {
    store.into_slot().flush().await
}
