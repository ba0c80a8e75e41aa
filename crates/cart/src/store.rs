//! In-memory cart store and its mutation semantics.
//!
//! The store is the single source of truth within a page lifetime for
//! anonymous sessions; the cookie is only a serialization boundary it is
//! persisted through (see [`crate::cookies`]). Mutations are pure functions
//! of the current store plus a [`CartAction`] - no I/O happens here.

use std::collections::HashMap;

use manipi_core::{ProductId, VariantId};
use serde::{Deserialize, Serialize};

use crate::action::CartAction;

/// Identity of one cart line.
///
/// The key is the product ID alone, or `productId_variantId` when a variant
/// is present. Distinct variants of the same product are distinct lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineKey(String);

impl LineKey {
    /// Derive the key for a product and optional variant.
    #[must_use]
    pub fn new(product_id: &ProductId, variant_id: Option<&VariantId>) -> Self {
        match variant_id {
            Some(variant) => Self(format!("{product_id}_{variant}")),
            None => Self(product_id.as_str().to_owned()),
        }
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the cart: a quantity plus the variant that distinguishes the
/// line from the base product.
///
/// Invariant: `quantity >= 1` while the line exists. A mutation that would
/// drop it to zero removes the line from the store instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Number of units of this product(+variant) in the cart.
    pub quantity: u32,
    /// Variant the line refers to; `None` means the base product.
    ///
    /// Defaults on decode so cookies written before variants existed still
    /// parse.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
}

/// Mapping from line key to cart line. Insertion order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartStore {
    lines: HashMap<LineKey, CartLine>,
}

impl CartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a mutation to the store.
    ///
    /// | action | existing line | effect |
    /// |---|---|---|
    /// | add | absent | create with quantity 1 |
    /// | add | present | quantity += 1 |
    /// | remove | absent | no-op |
    /// | remove | present, qty > 1 | quantity -= 1 |
    /// | remove | present, qty == 1 | line deleted |
    /// | delete | any | line deleted (idempotent) |
    pub fn apply(&mut self, action: &CartAction) {
        let key = action.line_key();
        match action {
            CartAction::Add { variant_id, .. } => {
                self.lines
                    .entry(key)
                    .and_modify(|line| line.quantity = line.quantity.saturating_add(1))
                    .or_insert_with(|| CartLine {
                        quantity: 1,
                        variant_id: variant_id.clone(),
                    });
            }
            CartAction::Remove { .. } => {
                if let Some(line) = self.lines.get_mut(&key) {
                    if line.quantity > 1 {
                        line.quantity -= 1;
                    } else {
                        self.lines.remove(&key);
                    }
                }
            }
            CartAction::Delete { .. } => {
                self.lines.remove(&key);
            }
        }
    }

    /// Total item count: the sum of all line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .values()
            .fold(0, |count, line| count.saturating_add(line.quantity))
    }

    /// Look up a line by key.
    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.get(key)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the store has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over all lines.
    pub fn lines(&self) -> impl Iterator<Item = (&LineKey, &CartLine)> {
        self.lines.iter()
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn add(product: &str, variant: Option<&str>) -> CartAction {
        CartAction::Add {
            product_id: ProductId::new(product),
            variant_id: variant.map(VariantId::new),
        }
    }

    fn remove(product: &str, variant: Option<&str>) -> CartAction {
        CartAction::Remove {
            product_id: ProductId::new(product),
            variant_id: variant.map(VariantId::new),
        }
    }

    fn delete(product: &str, variant: Option<&str>) -> CartAction {
        CartAction::Delete {
            product_id: ProductId::new(product),
            variant_id: variant.map(VariantId::new),
        }
    }

    fn key(product: &str, variant: Option<&str>) -> LineKey {
        LineKey::new(
            &ProductId::new(product),
            variant.map(VariantId::new).as_ref(),
        )
    }

    #[test]
    fn test_line_key_with_and_without_variant() {
        assert_eq!(key("42", None).as_str(), "42");
        assert_eq!(key("42", Some("7")).as_str(), "42_7");
    }

    #[test]
    fn test_add_creates_then_increments() {
        let mut store = CartStore::new();
        store.apply(&add("42", None));
        assert_eq!(store.get(&key("42", None)).unwrap().quantity, 1);

        store.apply(&add("42", None));
        assert_eq!(store.get(&key("42", None)).unwrap().quantity, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.item_count(), 2);
    }

    #[test]
    fn test_remove_decrements_then_deletes() {
        let mut store = CartStore::new();
        store.apply(&add("42", None));
        store.apply(&add("42", None));

        store.apply(&remove("42", None));
        assert_eq!(store.get(&key("42", None)).unwrap().quantity, 1);

        store.apply(&remove("42", None));
        assert!(store.get(&key("42", None)).is_none());
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = CartStore::new();
        store.apply(&remove("42", None));
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = CartStore::new();
        store.apply(&add("42", None));
        store.apply(&add("42", None));

        store.apply(&delete("42", None));
        assert!(store.is_empty());

        store.apply(&delete("42", None));
        assert!(store.is_empty());
    }

    #[test]
    fn test_variants_are_independent_lines() {
        let mut store = CartStore::new();
        store.apply(&add("42", None));
        store.apply(&add("42", Some("7")));
        store.apply(&add("42", Some("7")));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&key("42", None)).unwrap().quantity, 1);
        assert_eq!(store.get(&key("42", Some("7"))).unwrap().quantity, 2);

        // Mutating one variant never changes the other's quantity.
        store.apply(&remove("42", Some("7")));
        assert_eq!(store.get(&key("42", None)).unwrap().quantity, 1);
        assert_eq!(store.get(&key("42", Some("7"))).unwrap().quantity, 1);
    }

    #[test]
    fn test_variant_id_stored_on_line() {
        let mut store = CartStore::new();
        store.apply(&add("42", Some("7")));
        let line = store.get(&key("42", Some("7"))).unwrap();
        assert_eq!(line.variant_id, Some(VariantId::new("7")));
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = CartStore::new();
        store.apply(&add("42", None));
        store.apply(&add("43", None));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.item_count(), 0);
    }

    fn action_strategy() -> impl Strategy<Value = CartAction> {
        let product = prop_oneof![Just("1"), Just("2"), Just("3")];
        let variant = prop_oneof![Just(None), Just(Some("a")), Just(Some("b"))];
        let kind = 0..3u8;
        (product, variant, kind).prop_map(|(product, variant, kind)| match kind {
            0 => add(product, variant),
            1 => remove(product, variant),
            _ => delete(product, variant),
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn item_count_is_sum_of_positive_quantities(
            actions in prop::collection::vec(action_strategy(), 0..40),
        ) {
            let mut store = CartStore::new();
            for action in &actions {
                store.apply(action);
                let sum: u32 = store.lines().map(|(_, line)| line.quantity).sum();
                prop_assert_eq!(store.item_count(), sum);
                prop_assert!(store.lines().all(|(_, line)| line.quantity >= 1));
            }
        }

        #[test]
        fn add_then_remove_restores_prior_state(
            setup in prop::collection::vec(action_strategy(), 0..20),
            product in prop_oneof![Just("1"), Just("2"), Just("3")],
            variant in prop_oneof![Just(None), Just(Some("a")), Just(Some("b"))],
        ) {
            let mut store = CartStore::new();
            for action in &setup {
                store.apply(action);
            }

            let before = store.clone();
            store.apply(&add(product, variant));
            store.apply(&remove(product, variant));
            prop_assert_eq!(store, before);
        }

        #[test]
        fn remove_on_missing_line_is_noop(
            setup in prop::collection::vec(action_strategy(), 0..20),
        ) {
            let mut store = CartStore::new();
            for action in &setup {
                store.apply(action);
            }
            store.apply(&delete("9", None));

            let before = store.clone();
            store.apply(&remove("9", None));
            prop_assert_eq!(store, before);
        }
    }
}
