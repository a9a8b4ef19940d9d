//! Product entitlements - which purchasable products a user owns.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Key of a purchasable product (e.g. `"curso-avancado"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductKey(String);

impl ProductKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ValidationError::empty_field("product_key"));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProductKey> for String {
    fn from(key: ProductKey) -> Self {
        key.0
    }
}

impl Borrow<str> for ProductKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single ownership record, as stored in the data store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductEntitlement {
    pub product_key: ProductKey,
}

impl ProductEntitlement {
    pub fn new(product_key: ProductKey) -> Self {
        Self { product_key }
    }
}

/// Unordered set of owned product keys.
///
/// Membership-only: no quantities and no per-entitlement expiry. Duplicate
/// records from the store collapse into one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementSet {
    keys: HashSet<ProductKey>,
}

impl EntitlementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `product_key` is owned. Unknown or malformed keys are simply
    /// not owned.
    pub fn contains(&self, product_key: &str) -> bool {
        self.keys.contains(product_key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductKey> {
        self.keys.iter()
    }

    /// Keys in lexical order, for stable display and logging.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys.iter().map(ProductKey::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl FromIterator<ProductEntitlement> for EntitlementSet {
    fn from_iter<I: IntoIterator<Item = ProductEntitlement>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(|e| e.product_key).collect(),
        }
    }
}

impl FromIterator<ProductKey> for EntitlementSet {
    fn from_iter<I: IntoIterator<Item = ProductKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(s: &str) -> ProductKey {
        ProductKey::new(s).unwrap()
    }

    #[test]
    fn product_key_rejects_blank() {
        assert!(ProductKey::new("").is_err());
        assert!(ProductKey::new("  ").is_err());
    }

    #[test]
    fn entitlement_deserializes_from_store_row() {
        let row: ProductEntitlement =
            serde_json::from_str(r#"{"product_key":"modulo-1"}"#).unwrap();
        assert_eq!(row.product_key.as_str(), "modulo-1");
    }

    #[test]
    fn entitlement_row_with_blank_key_is_rejected() {
        let row: Result<ProductEntitlement, _> = serde_json::from_str(r#"{"product_key":""}"#);
        assert!(row.is_err());
    }

    #[test]
    fn empty_set_contains_nothing() {
        let set = EntitlementSet::new();
        assert!(set.is_empty());
        assert!(!set.contains("modulo-1"));
        assert!(!set.contains(""));
    }

    #[test]
    fn duplicates_collapse() {
        let set: EntitlementSet = vec![
            ProductEntitlement::new(key("a")),
            ProductEntitlement::new(key("a")),
            ProductEntitlement::new(key("b")),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.sorted_keys(), vec!["a", "b"]);
    }

    proptest! {
        #[test]
        fn contains_matches_membership(
            owned in proptest::collection::hash_set("[a-z0-9-]{1,12}", 0..8),
            probe in "[a-z0-9-]{1,12}",
        ) {
            let set: EntitlementSet = owned.iter().map(|k| key(k)).collect();
            prop_assert_eq!(set.contains(&probe), owned.contains(&probe));
            for k in &owned {
                prop_assert!(set.contains(k));
            }
        }

        #[test]
        fn empty_set_never_grants(probe in ".*") {
            prop_assert!(!EntitlementSet::new().contains(&probe));
        }
    }
}
