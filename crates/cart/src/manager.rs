//! The cart state manager.
//!
//! One manager per page view. The authoritative store is chosen once, at
//! construction, from the session's auth signal:
//!
//! - *Anonymous*: mutations apply to an in-memory [`CartStore`] synchronously
//!   and are persisted to the `cart` cookie. No network traffic.
//! - *Authenticated*: mutations are shipped to the backend, which owns the
//!   order; the manager keeps only the last summary for display.
//!
//! Overlapping authenticated requests are not serialized; instead each
//! mutation takes a monotonic sequence number and a response older than the
//! latest applied one is discarded, so a slow response can never overwrite a
//! newer aggregate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;
use tracing::{debug, error, instrument, warn};

use crate::action::CartAction;
use crate::api::CartApiClient;
use crate::config::CartConfig;
use crate::cookies::{self, CookieStore};
use crate::error::CartError;
use crate::sink::{AggregateSink, CartAggregate};
use crate::store::CartStore;

/// Session facts captured at manager construction.
///
/// Hosts build this from whatever their page rendered (auth flag, resolved
/// CSRF token) instead of the manager reading ambient globals.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Whether the current user is authenticated.
    pub authenticated: bool,
    /// Resolved anti-forgery token, required for authenticated mutations.
    pub csrf_token: Option<SecretString>,
}

impl SessionContext {
    /// Context for an anonymous session.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            authenticated: false,
            csrf_token: None,
        }
    }

    /// Context for an authenticated session.
    #[must_use]
    pub const fn authenticated(csrf_token: Option<SecretString>) -> Self {
        Self {
            authenticated: true,
            csrf_token,
        }
    }
}

/// What a completed mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The mutation was applied and this aggregate is now authoritative.
    Applied(CartAggregate),
    /// The response arrived after a newer mutation had already been applied
    /// and was discarded.
    Superseded,
}

/// Last-known remote state, guarded together so a stale response check and
/// its apply are one step.
struct RemoteView {
    latest_seq: u64,
    aggregate: Option<CartAggregate>,
}

enum Mode {
    Anonymous {
        store: Mutex<CartStore>,
        jar: Arc<dyn CookieStore>,
        cookie_max_age_days: i64,
    },
    Authenticated {
        client: CartApiClient,
        view: Mutex<RemoteView>,
        next_seq: AtomicU64,
    },
}

/// Client-visible shopping cart, mirrored to the backend or to a cookie
/// depending on the session's auth state.
pub struct CartStateManager {
    mode: Mode,
    sink: Arc<dyn AggregateSink>,
}

impl CartStateManager {
    /// Create a manager for the given session.
    ///
    /// Anonymous sessions load their store from the `cart` cookie (malformed
    /// or absent decodes to empty). Authenticated sessions build the API
    /// client; the cookie jar is not retained because the backend owns the
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured API base URL cannot carry the
    /// endpoint path.
    pub fn new(
        context: &SessionContext,
        config: &CartConfig,
        jar: Arc<dyn CookieStore>,
        sink: Arc<dyn AggregateSink>,
    ) -> Result<Self, url::ParseError> {
        let mode = if context.authenticated {
            Mode::Authenticated {
                client: CartApiClient::new(&config.api_base, context.csrf_token.clone())?,
                view: Mutex::new(RemoteView {
                    latest_seq: 0,
                    aggregate: None,
                }),
                next_seq: AtomicU64::new(0),
            }
        } else {
            let store = cookies::decode_store(jar.get(cookies::CART_COOKIE).as_deref());
            Mode::Anonymous {
                store: Mutex::new(store),
                jar,
                cookie_max_age_days: config.cookie_max_age_days,
            }
        };

        Ok(Self { mode, sink })
    }

    /// Whether this manager mirrors the cart to the backend.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.mode, Mode::Authenticated { .. })
    }

    /// Apply one cart mutation.
    ///
    /// At most one outbound request (authenticated) or one cookie write
    /// (anonymous) per call. On success the new aggregate is pushed to the
    /// sink; on an authenticated failure the sink's error channel fires
    /// exactly once and cart state is left untouched.
    ///
    /// # Errors
    ///
    /// - [`CartError::ContractViolation`] for an empty product ID; rejected
    ///   before any side effect and not surfaced to the sink.
    /// - Network/backend errors on the authenticated path; retryable.
    #[instrument(skip(self), fields(action = %action.kind(), product_id = %action.product_id()))]
    pub async fn mutate(&self, action: CartAction) -> Result<MutationOutcome, CartError> {
        if action.product_id().is_empty() {
            warn!("cart mutation rejected: empty product id");
            return Err(CartError::ContractViolation("product id must not be empty"));
        }

        match &self.mode {
            Mode::Anonymous {
                store,
                jar,
                cookie_max_age_days,
            } => Ok(self.mutate_local(&action, store, jar.as_ref(), *cookie_max_age_days)),
            Mode::Authenticated {
                client,
                view,
                next_seq,
            } => self.mutate_remote(&action, client, view, next_seq).await,
        }
    }

    /// The aggregate currently authoritative for display.
    ///
    /// Anonymous sessions always have one (possibly empty); authenticated
    /// sessions have none until the first successful mutation.
    #[must_use]
    pub fn aggregate(&self) -> Option<CartAggregate> {
        match &self.mode {
            Mode::Anonymous { store, .. } => {
                let store = lock(store);
                Some(CartAggregate {
                    item_count: store.item_count(),
                    total: None,
                })
            }
            Mode::Authenticated { view, .. } => lock(view).aggregate.clone(),
        }
    }

    /// Snapshot of the local store. `None` for authenticated sessions, whose
    /// line-level truth lives on the backend.
    #[must_use]
    pub fn local_store(&self) -> Option<CartStore> {
        match &self.mode {
            Mode::Anonymous { store, .. } => Some(lock(store).clone()),
            Mode::Authenticated { .. } => None,
        }
    }

    /// Empty the anonymous cart and persist the empty store (the guest
    /// checkout flow does this after handing the shadow cart to the backend).
    ///
    /// No-op for authenticated sessions: the backend owns row lifecycle and
    /// the client never deletes server-side rows directly.
    pub fn clear(&self) {
        match &self.mode {
            Mode::Anonymous {
                store,
                jar,
                cookie_max_age_days,
            } => {
                let aggregate = {
                    let mut store = lock(store);
                    store.clear();
                    persist_store(&store, jar.as_ref(), *cookie_max_age_days);
                    CartAggregate {
                        item_count: 0,
                        total: None,
                    }
                };
                self.sink.aggregate_changed(&aggregate);
            }
            Mode::Authenticated { .. } => {
                debug!("clear ignored: the backend owns the authenticated cart");
            }
        }
    }

    fn mutate_local(
        &self,
        action: &CartAction,
        store: &Mutex<CartStore>,
        jar: &dyn CookieStore,
        cookie_max_age_days: i64,
    ) -> MutationOutcome {
        let aggregate = {
            let mut store = lock(store);
            store.apply(action);
            persist_store(&store, jar, cookie_max_age_days);
            CartAggregate {
                item_count: store.item_count(),
                total: None,
            }
        };

        self.sink.aggregate_changed(&aggregate);
        MutationOutcome::Applied(aggregate)
    }

    async fn mutate_remote(
        &self,
        action: &CartAction,
        client: &CartApiClient,
        view: &Mutex<RemoteView>,
        next_seq: &AtomicU64,
    ) -> Result<MutationOutcome, CartError> {
        // Sequence numbers are handed out before the request leaves, so the
        // order responses are applied in matches the order clicks happened.
        let seq = next_seq.fetch_add(1, Ordering::Relaxed);

        match client.update_item(action).await {
            Ok(summary) => {
                let aggregate = CartAggregate {
                    item_count: summary.cart_items,
                    total: summary.cart_total,
                };

                {
                    let mut view = lock(view);
                    if seq < view.latest_seq {
                        debug!(
                            seq,
                            latest = view.latest_seq,
                            "discarding stale cart response"
                        );
                        return Ok(MutationOutcome::Superseded);
                    }
                    view.latest_seq = seq;
                    view.aggregate = Some(aggregate.clone());
                }

                self.sink.aggregate_changed(&aggregate);
                Ok(MutationOutcome::Applied(aggregate))
            }
            Err(err) => {
                error!(error = %err, "cart update failed; cart state unchanged");
                self.sink.sync_failed(&err);
                Err(err)
            }
        }
    }
}

/// Lock a mutex, recovering from poisoning - a panicking sibling must not
/// take the cart down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Write the store out to the cart cookie. Failures degrade to an
/// unpersisted cart: correct for this page view, gone after reload.
fn persist_store(store: &CartStore, jar: &dyn CookieStore, cookie_max_age_days: i64) {
    match cookies::encode_store(store) {
        Ok(value) => {
            let cookie = cookies::build_cart_cookie(value, cookie_max_age_days);
            if let Err(err) = jar.set(cookie) {
                warn!(error = %err, "cart cookie write failed; cart will not survive reload");
            }
        }
        Err(err) => {
            warn!(error = %err, "cart cookie encode failed; cart will not survive reload");
        }
    }
}
