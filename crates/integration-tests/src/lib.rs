//! Integration tests for the Manipi cart.
//!
//! The authenticated path is exercised end-to-end against an in-process stub
//! backend: each test builds an `axum` router that plays the part of the
//! storefront backend's `/update_item/` view, binds it to an ephemeral port,
//! and points a [`CartStateManager`](manipi_cart::CartStateManager) at it.
//! No external services are required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p manipi-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Mutex;

use axum::Router;
use tokio::net::TcpListener;

use manipi_cart::{AggregateSink, CartAggregate, CartError};

/// Bind a stub backend on an ephemeral port and serve it in the background.
///
/// # Panics
///
/// Panics if the listener cannot bind; tests have no recovery path for that.
pub async fn spawn_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub backend");
    let addr = listener.local_addr().expect("listener has no local addr");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("stub backend exited");
    });

    addr
}

/// Sink that records every notification, for asserting what reached the UI.
#[derive(Debug, Default)]
pub struct RecordingSink {
    aggregates: Mutex<Vec<CartAggregate>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// All aggregates pushed so far, in order.
    #[must_use]
    pub fn aggregates(&self) -> Vec<CartAggregate> {
        self.aggregates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of failure notifications pushed so far.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl AggregateSink for RecordingSink {
    fn aggregate_changed(&self, aggregate: &CartAggregate) {
        self.aggregates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(aggregate.clone());
    }

    fn sync_failed(&self, error: &CartError) {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(error.to_string());
    }
}
