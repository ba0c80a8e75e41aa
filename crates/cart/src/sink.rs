//! Aggregate observers.
//!
//! The core never touches DOM nodes; hosts implement [`AggregateSink`] to
//! route count/total updates into their badges and transient failure notices
//! into their toast layer. The core only writes into the sink, it never
//! reads business meaning back out of the UI.

use rust_decimal::Decimal;

use crate::error::CartError;

/// The count/total summary derived from a cart, shown in UI badges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartAggregate {
    /// Sum of all line quantities.
    pub item_count: u32,
    /// Cart total in the store currency; `None` when the price is unknown
    /// client-side (anonymous carts never know it).
    pub total: Option<Decimal>,
}

/// Observer for aggregate updates and transient sync failures.
pub trait AggregateSink: Send + Sync {
    /// A new aggregate became authoritative for display.
    fn aggregate_changed(&self, aggregate: &CartAggregate);

    /// An authenticated mutation failed; cart state is unchanged and the
    /// user may retry. Called exactly once per failed mutation.
    fn sync_failed(&self, error: &CartError);
}

/// Sink that routes updates into the `tracing` log stream.
///
/// Useful as a default for headless hosts (the CLI uses it); browser hosts
/// supply their own badge-writing implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AggregateSink for TracingSink {
    fn aggregate_changed(&self, aggregate: &CartAggregate) {
        tracing::info!(
            item_count = aggregate.item_count,
            total = ?aggregate.total,
            "cart aggregate updated"
        );
    }

    fn sync_failed(&self, error: &CartError) {
        tracing::warn!(%error, "cart sync failed");
    }
}
