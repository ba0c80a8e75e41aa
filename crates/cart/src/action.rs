//! Cart mutation actions.
//!
//! Actions are modeled as tagged variants so invalid combinations are
//! unrepresentable; the loose `{productId, action, variantId?}` wire shape
//! exists only at the serialization boundary in [`crate::api`].

use manipi_core::{ProductId, VariantId};
use serde::Serialize;

use crate::store::LineKey;

/// One cart mutation, as triggered by a storefront control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit of the product(+variant), creating the line if absent.
    Add {
        product_id: ProductId,
        variant_id: Option<VariantId>,
    },
    /// Remove one unit; removing the last unit deletes the line.
    Remove {
        product_id: ProductId,
        variant_id: Option<VariantId>,
    },
    /// Delete the whole line regardless of quantity.
    Delete {
        product_id: ProductId,
        variant_id: Option<VariantId>,
    },
}

/// Wire name of an action (`"add"`, `"remove"`, `"delete"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Add,
    Remove,
    Delete,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Delete => "delete",
        };
        write!(f, "{name}")
    }
}

impl CartAction {
    /// Add one unit of a base product.
    #[must_use]
    pub fn add(product_id: impl Into<ProductId>) -> Self {
        Self::Add {
            product_id: product_id.into(),
            variant_id: None,
        }
    }

    /// Add one unit of a specific variant.
    #[must_use]
    pub fn add_variant(product_id: impl Into<ProductId>, variant_id: impl Into<VariantId>) -> Self {
        Self::Add {
            product_id: product_id.into(),
            variant_id: Some(variant_id.into()),
        }
    }

    /// Remove one unit of a base product.
    #[must_use]
    pub fn remove(product_id: impl Into<ProductId>) -> Self {
        Self::Remove {
            product_id: product_id.into(),
            variant_id: None,
        }
    }

    /// Remove one unit of a specific variant.
    #[must_use]
    pub fn remove_variant(
        product_id: impl Into<ProductId>,
        variant_id: impl Into<VariantId>,
    ) -> Self {
        Self::Remove {
            product_id: product_id.into(),
            variant_id: Some(variant_id.into()),
        }
    }

    /// Delete a base product's line.
    #[must_use]
    pub fn delete(product_id: impl Into<ProductId>) -> Self {
        Self::Delete {
            product_id: product_id.into(),
            variant_id: None,
        }
    }

    /// Delete a specific variant's line.
    #[must_use]
    pub fn delete_variant(
        product_id: impl Into<ProductId>,
        variant_id: impl Into<VariantId>,
    ) -> Self {
        Self::Delete {
            product_id: product_id.into(),
            variant_id: Some(variant_id.into()),
        }
    }

    /// The product the action targets.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        match self {
            Self::Add { product_id, .. }
            | Self::Remove { product_id, .. }
            | Self::Delete { product_id, .. } => product_id,
        }
    }

    /// The variant the action targets, if any.
    #[must_use]
    pub const fn variant_id(&self) -> Option<&VariantId> {
        match self {
            Self::Add { variant_id, .. }
            | Self::Remove { variant_id, .. }
            | Self::Delete { variant_id, .. } => variant_id.as_ref(),
        }
    }

    /// Wire name of the action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Add { .. } => ActionKind::Add,
            Self::Remove { .. } => ActionKind::Remove,
            Self::Delete { .. } => ActionKind::Delete,
        }
    }

    /// The line key the action targets.
    #[must_use]
    pub fn line_key(&self) -> LineKey {
        LineKey::new(self.product_id(), self.variant_id())
    }
}
