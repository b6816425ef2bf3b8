use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// One row of the inventory table. `item_name` is the primary key and must
/// be non-empty; quantity and description are nullable in the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_name: String,
    pub quantity: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(
        item_name: impl Into<String>,
        quantity: Option<i64>,
        description: Option<String>,
    ) -> Result<Self, DomainError> {
        let item_name = item_name.into();
        validate_item_name(&item_name)?;
        validate_quantity(quantity)?;
        Ok(Self { item_name, quantity, description, created_at: Utc::now() })
    }
}

/// Read filter over the inventory table, produced by the query handler's
/// extraction step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ItemFilter {
    All,
    NameContains(String),
    QuantityAtLeast(i64),
    QuantityBelow(i64),
}

impl ItemFilter {
    /// Whether an item passes this filter. The SQL repository pushes the
    /// same predicate into the query; this form exists for in-memory use
    /// and for tests.
    pub fn matches(&self, item: &InventoryItem) -> bool {
        match self {
            Self::All => true,
            Self::NameContains(needle) => {
                item.item_name.to_lowercase().contains(&needle.to_lowercase())
            }
            Self::QuantityAtLeast(bound) => item.quantity.is_some_and(|q| q >= *bound),
            Self::QuantityBelow(bound) => item.quantity.is_some_and(|q| q < *bound),
        }
    }
}

/// How an upsert manipulates the stored quantity.
///
/// `Set` overwrites; `Add` increments the stored value, treating a NULL
/// quantity as zero. Ambiguous phrasing is extracted as `Set`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityChange {
    Set(i64),
    Add(i64),
}

/// A validated insert-or-update request keyed by item name. Fields left as
/// `None` preserve whatever the store already holds for an existing row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemChange {
    pub item_name: String,
    pub quantity: Option<QuantityChange>,
    pub description: Option<String>,
}

impl ItemChange {
    pub fn new(
        item_name: impl Into<String>,
        quantity: Option<QuantityChange>,
        description: Option<String>,
    ) -> Result<Self, DomainError> {
        let item_name = item_name.into();
        validate_item_name(&item_name)?;
        if let Some(QuantityChange::Set(value) | QuantityChange::Add(value)) = quantity {
            validate_quantity(Some(value))?;
        }
        Ok(Self { item_name, quantity, description })
    }
}

/// What the delete handler resolved the utterance to: one row by exact
/// name, or every row matching a filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteTarget {
    Name(String),
    Filter(ItemFilter),
}

fn validate_item_name(item_name: &str) -> Result<(), DomainError> {
    if item_name.trim().is_empty() {
        return Err(DomainError::EmptyItemName);
    }
    Ok(())
}

fn validate_quantity(quantity: Option<i64>) -> Result<(), DomainError> {
    match quantity {
        Some(value) if value < 0 => Err(DomainError::NegativeQuantity(value)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{InventoryItem, ItemChange, ItemFilter, QuantityChange};
    use crate::errors::DomainError;

    #[test]
    fn rejects_empty_item_name() {
        let result = InventoryItem::new("   ", Some(3), None);
        assert_eq!(result.unwrap_err(), DomainError::EmptyItemName);
    }

    #[test]
    fn rejects_negative_quantity() {
        let result = InventoryItem::new("laptops", Some(-1), None);
        assert_eq!(result.unwrap_err(), DomainError::NegativeQuantity(-1));
    }

    #[test]
    fn change_rejects_negative_set_quantity() {
        let result = ItemChange::new("laptops", Some(QuantityChange::Set(-5)), None);
        assert_eq!(result.unwrap_err(), DomainError::NegativeQuantity(-5));
    }

    #[test]
    fn name_filter_is_case_insensitive() {
        let item = InventoryItem::new("HDMI Cable", Some(4), None).expect("valid item");
        assert!(ItemFilter::NameContains("hdmi".to_string()).matches(&item));
        assert!(!ItemFilter::NameContains("usb".to_string()).matches(&item));
    }

    #[test]
    fn quantity_filters_skip_null_quantities() {
        let item = InventoryItem::new("monitors", None, None).expect("valid item");
        assert!(!ItemFilter::QuantityAtLeast(0).matches(&item));
        assert!(!ItemFilter::QuantityBelow(10).matches(&item));
        assert!(ItemFilter::All.matches(&item));
    }
}
