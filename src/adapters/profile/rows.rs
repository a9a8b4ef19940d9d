//! Lenient decoding of entitlement rows shared by the store-backed readers.

use serde::Deserialize;

use crate::domain::foundation::UserId;
use crate::domain::membership::{ProductEntitlement, ProductKey};

/// Raw `product_key` column as the store returns it.
#[derive(Debug, Deserialize)]
pub(super) struct EntitlementRow {
    #[serde(default)]
    pub product_key: Option<String>,
}

/// Keeps rows with a usable key. A blank or null key owns nothing and
/// must not take the member's other products down with it.
pub(super) fn valid_entitlements<I>(table: &str, user_id: &UserId, keys: I) -> Vec<ProductEntitlement>
where
    I: IntoIterator<Item = Option<String>>,
{
    keys.into_iter()
        .filter_map(|raw| match raw.map(ProductKey::new) {
            Some(Ok(key)) => Some(ProductEntitlement::new(key)),
            Some(Err(e)) => {
                tracing::warn!(table, user_id = %user_id, "Skipping entitlement row: {}", e);
                None
            }
            None => {
                tracing::warn!(table, user_id = %user_id, "Skipping entitlement row without product_key");
                None
            }
        })
        .collect()
}
