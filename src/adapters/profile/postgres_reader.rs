//! PostgreSQL adapter for ProfileReader

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::membership::{ProductEntitlement, Profile};
use crate::ports::ProfileReader;

use super::rows::valid_entitlements;

/// PostgreSQL implementation of ProfileReader.
///
/// Reads the same profile and entitlement tables the hosted REST API
/// exposes, for deployments that reach the database directly. Table names
/// default to `profiles` / `user_products` and follow
/// `SupabaseConfig::profiles_table` / `entitlements_table` when set through
/// [`PgProfileReader::with_tables`].
pub struct PgProfileReader {
    pool: PgPool,
    profiles_table: String,
    entitlements_table: String,
}

impl PgProfileReader {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            profiles_table: "profiles".to_string(),
            entitlements_table: "user_products".to_string(),
        }
    }

    pub fn with_tables(
        mut self,
        profiles_table: impl Into<String>,
        entitlements_table: impl Into<String>,
    ) -> Self {
        self.profiles_table = profiles_table.into();
        self.entitlements_table = entitlements_table.into();
        self
    }

    fn profile_query(&self) -> String {
        format!(
            "SELECT id::text AS id, email, login_expires_at FROM {} WHERE id::text = $1",
            quote_ident(&self.profiles_table)
        )
    }

    fn entitlements_query(&self) -> String {
        format!(
            "SELECT product_key FROM {} WHERE user_id::text = $1",
            quote_ident(&self.entitlements_table)
        )
    }
}

/// Double-quoted identifier; embedded quotes are doubled.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl ProfileReader for PgProfileReader {
    async fn load_profile(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        let row = sqlx::query(&self.profile_query())
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Database error: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let table = &self.profiles_table;
        let id: String = row
            .try_get("id")
            .map_err(|e| DomainError::database(format!("{}.id: {}", table, e)))?;
        let email: Option<String> = row
            .try_get("email")
            .map_err(|e| DomainError::database(format!("{}.email: {}", table, e)))?;
        let login_expires_at: Option<DateTime<Utc>> = row
            .try_get("login_expires_at")
            .map_err(|e| DomainError::database(format!("{}.login_expires_at: {}", table, e)))?;

        Ok(Some(Profile {
            id: UserId::new(id)?,
            email: email.unwrap_or_default(),
            login_expires_at: login_expires_at.map(Timestamp::from_datetime),
        }))
    }

    async fn load_entitlements(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ProductEntitlement>, DomainError> {
        let table = &self.entitlements_table;
        let rows = sqlx::query(&self.entitlements_query())
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Database error: {}", e)))?;

        let keys = rows
            .iter()
            .map(|row| {
                row.try_get::<Option<String>, _>("product_key")
                    .map_err(|e| DomainError::database(format!("{}.product_key: {}", table, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(valid_entitlements(table, user_id, keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn reader() -> PgProfileReader {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/portal")
            .unwrap();
        PgProfileReader::new(pool)
    }

    #[test]
    fn quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("profiles"), "\"profiles\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[tokio::test]
    async fn default_tables_match_portal_schema() {
        let reader = reader();
        assert!(reader.profile_query().contains("FROM \"profiles\""));
        assert!(reader.entitlements_query().contains("FROM \"user_products\""));
    }

    #[tokio::test]
    async fn configured_tables_are_used() {
        let reader = reader().with_tables("members", "member_products");
        assert!(reader.profile_query().contains("FROM \"members\""));
        assert!(reader.entitlements_query().contains("FROM \"member_products\""));
    }
}
