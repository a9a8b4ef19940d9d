//! Supabase REST (PostgREST) adapter for ProfileReader.
//!
//! Reads the `profiles` and `user_products` tables over HTTP. Requests carry
//! the signed-in user's access token when an identity provider is attached,
//! so row-level security sees the right user; otherwise the anon key is
//! used as the bearer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::membership::{ProductEntitlement, Profile};
use crate::ports::{IdentityProvider, ProfileReader};

use super::rows::{valid_entitlements, EntitlementRow};

/// Configuration for the PostgREST adapter.
#[derive(Debug)]
pub struct PostgrestConfig {
    /// Project URL (e.g., "https://xyz.supabase.co").
    pub base_url: String,
    anon_key: SecretString,
    pub timeout: Duration,
    pub profiles_table: String,
    pub entitlements_table: String,
}

impl PostgrestConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: SecretString::new(anon_key.into()),
            timeout: Duration::from_secs(10),
            profiles_table: "profiles".to_string(),
            entitlements_table: "user_products".to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
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

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }
}

/// PostgREST implementation of [`ProfileReader`].
pub struct PostgrestProfileReader {
    config: PostgrestConfig,
    client: Client,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl PostgrestProfileReader {
    pub fn new(config: PostgrestConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::external(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            identity: None,
        })
    }

    /// Authenticates reads with the provider's current session token.
    pub fn with_identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    async fn bearer(&self) -> String {
        if let Some(identity) = &self.identity {
            match identity.current_session().await {
                Ok(Some(session)) => return session.access_token.expose().to_string(),
                Ok(None) => {}
                Err(e) => tracing::warn!("Falling back to anon key for data store read: {}", e),
            }
        }
        self.config.anon_key.expose_secret().clone()
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>, DomainError> {
        let response = request
            .header("apikey", self.config.anon_key.expose_secret())
            .bearer_auth(self.bearer().await)
            .send()
            .await
            .map_err(|e| DomainError::external(format!("{} request failed: {}", table, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::external(format!(
                "{} returned {}: {}",
                table, status, body
            ))
            .with_detail("table", table));
        }

        response.json().await.map_err(|e| {
            DomainError::new(
                ErrorCode::UnexpectedResponse,
                format!("{} rows could not be decoded: {}", table, e),
            )
        })
    }
}

/// At most one profile row per user; zero rows means not provisioned.
fn single_row(mut rows: Vec<Profile>) -> Result<Option<Profile>, DomainError> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => Err(DomainError::new(
            ErrorCode::UnexpectedResponse,
            format!("expected at most one profile row, got {}", n),
        )),
    }
}

fn eq_filter(user_id: &UserId) -> String {
    format!("eq.{}", user_id.as_str())
}

#[async_trait]
impl ProfileReader for PostgrestProfileReader {
    async fn load_profile(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        let table = &self.config.profiles_table;
        let request = self
            .client
            .get(self.config.table_url(table))
            .query(&[("id", eq_filter(user_id)), ("select", "*".to_string())]);

        single_row(self.fetch_rows(table, request).await?)
    }

    async fn load_entitlements(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ProductEntitlement>, DomainError> {
        let table = &self.config.entitlements_table;
        let request = self.client.get(self.config.table_url(table)).query(&[
            ("user_id", eq_filter(user_id)),
            ("select", "product_key".to_string()),
        ]);

        let rows: Vec<EntitlementRow> = self.fetch_rows(table, request).await?;
        Ok(valid_entitlements(
            table,
            user_id,
            rows.into_iter().map(|row| row.product_key),
        ))
    }
}
