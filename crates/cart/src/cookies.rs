//! Cookie persistence for the anonymous cart.
//!
//! The cookie is a serialization boundary only: the in-memory
//! [`CartStore`](crate::store::CartStore) stays the source of truth within a
//! manager's lifetime, and is written out as one JSON object in a single
//! cookie named `cart` after each mutation. A malformed or absent cookie
//! decodes to an empty store - the degradation is logged, never raised.

use std::collections::HashMap;
use std::sync::Mutex;

use cookie::Cookie;
use cookie::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::store::CartStore;

/// Name of the cart cookie.
pub const CART_COOKIE: &str = "cart";

/// Default cart cookie lifetime: 30 days.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Error persisting a cookie.
///
/// The manager swallows these after a WARN log: the in-memory store remains
/// correct for the current page view but will not survive reload.
#[derive(Debug, Error)]
#[error("cookie write failed: {reason}")]
pub struct CookieWriteError {
    pub reason: String,
}

/// Abstraction over the host's cookie storage.
///
/// Browsers, tests, and the CLI provide different backends; the manager only
/// ever reads one named value and writes whole cookies through this seam.
pub trait CookieStore: Send + Sync {
    /// Raw value of the named cookie, if present.
    fn get(&self, name: &str) -> Option<String>;

    /// Persist a cookie, replacing any previous one with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot persist the value (quota
    /// exceeded, cookies disabled).
    fn set(&self, cookie: Cookie<'static>) -> Result<(), CookieWriteError>;
}

/// Encode a store as the cart cookie's JSON value.
///
/// # Errors
///
/// Returns an error if JSON encoding fails; the caller treats this as a
/// storage degradation, not a cart failure.
pub fn encode_store(store: &CartStore) -> Result<String, serde_json::Error> {
    serde_json::to_string(store)
}

/// Decode a raw cookie value into a store.
///
/// `None` or malformed input yields the empty store; this never fails.
#[must_use]
pub fn decode_store(raw: Option<&str>) -> CartStore {
    let Some(raw) = raw else {
        return CartStore::new();
    };

    match serde_json::from_str(raw) {
        Ok(store) => store,
        Err(error) => {
            warn!(%error, "malformed cart cookie, starting from an empty cart");
            CartStore::new()
        }
    }
}

/// Build the cart cookie: `path=/`, the given max-age, no domain restriction.
#[must_use]
pub fn build_cart_cookie(value: String, max_age_days: i64) -> Cookie<'static> {
    Cookie::build((CART_COOKIE, value))
        .path("/")
        .max_age(Duration::days(max_age_days))
        .build()
}

/// In-memory cookie store for tests and the CLI.
///
/// Stores name/value pairs only; attributes are accepted and dropped, like a
/// browser jar queried from script.
#[derive(Debug, Default)]
pub struct MemoryCookies {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCookies {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the jar with a raw name/value pair.
    pub fn insert_raw(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut values = self
            .values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        values.insert(name.into(), value.into());
    }
}

impl CookieStore for MemoryCookies {
    fn get(&self, name: &str) -> Option<String> {
        let values = self
            .values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        values.get(name).cloned()
    }

    fn set(&self, cookie: Cookie<'static>) -> Result<(), CookieWriteError> {
        let mut values = self
            .values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        values.insert(cookie.name().to_owned(), cookie.value().to_owned());
        Ok(())
    }
}
