//! Cart error taxonomy.
//!
//! Three families, none fatal to the host page:
//!
//! - *Contract violation*: the caller handed the manager unusable input
//!   (empty product ID). Rejected before any side effect; the aggregate sink
//!   is never notified because there is nothing the user can do about it.
//! - *Network/backend failure*: the authenticated path could not complete.
//!   Cart state stays untouched, the sink is notified once, and the user can
//!   retry by re-clicking.
//! - Storage degradation (cookie write/parse failure) is deliberately NOT a
//!   variant here: it is swallowed with a WARN log and never reaches callers.

use thiserror::Error;

/// Error from a cart operation.
#[derive(Debug, Error)]
pub enum CartError {
    /// The caller violated the mutation contract; nothing happened.
    #[error("contract violation: {0}")]
    ContractViolation(&'static str),

    /// The HTTP request itself failed (connection, timeout, TLS).
    #[error("cart request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status or an `error` field.
    #[error("backend rejected cart update ({status}): {message}")]
    Backend { status: u16, message: String },

    /// The backend answered 2xx but the body was not a cart summary.
    #[error("unexpected cart response: {0}")]
    UnexpectedResponse(#[from] serde_json::Error),
}

impl CartError {
    /// Whether re-issuing the same mutation can succeed.
    ///
    /// Contract violations are caller bugs; everything else is transient
    /// from the cart's point of view.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::ContractViolation(_))
    }
}
