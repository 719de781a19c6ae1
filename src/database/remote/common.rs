// Shared types and utilities for remote Supabase operations

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Error type for Supabase sync operations
#[derive(Debug)]
pub enum SyncError {
    /// HTTP request failed
    RequestFailed(String),
    /// Supabase API returned an error
    ApiError { status: u16, message: String },
    /// Failed to parse response
    ParseError(String),
    /// No row matched the query
    NotFound(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            SyncError::ApiError { status, message } => {
                write!(f, "Supabase API error {}: {}", status, message)
            }
            SyncError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SyncError::NotFound(what) => write!(f, "Not found: {}", what),
        }
    }
}

impl std::error::Error for SyncError {}

/// Supabase REST (PostgREST) client
///
/// Anonymous callers authenticate with the publishable anon key; signed-in
/// callers additionally pass their session's access token as the bearer.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a new Supabase client
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            anon_key,
        }
    }

    fn bearer(&self, access_token: Option<&str>) -> String {
        format!("Bearer {}", access_token.unwrap_or(&self.anon_key))
    }

    /// Fetch rows matching a PostgREST query string
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        access_token: Option<&str>,
    ) -> Result<Vec<T>, SyncError> {
        let url = format!("{}/rest/v1/{}?{}", self.base_url, table, query);

        let res = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer(access_token))
            .send()
            .await
            .map_err(|e| SyncError::RequestFailed(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(SyncError::ApiError {
                status,
                message: text,
            });
        }

        let body = res
            .text()
            .await
            .map_err(|e| SyncError::ParseError(e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| SyncError::ParseError(format!("Failed to parse response: {}", e)))
    }

    /// Insert-or-update rows, returning the stored representation
    ///
    /// Uses POST with `Prefer: resolution=merge-duplicates` so retries of the
    /// same payload are idempotent. `query` carries the `on_conflict` target
    /// (empty for plain inserts keyed on the primary key).
    pub async fn upsert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        payload: &T,
        access_token: Option<&str>,
    ) -> Result<Vec<R>, SyncError> {
        let url = if query.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, table)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, table, query)
        };

        let res = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer(access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(payload)
            .send()
            .await
            .map_err(|e| SyncError::RequestFailed(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(SyncError::ApiError {
                status,
                message: text,
            });
        }

        let body = res
            .text()
            .await
            .map_err(|e| SyncError::ParseError(e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| SyncError::ParseError(format!("Failed to parse response: {}", e)))
    }

    /// Update rows matching a PostgREST query string
    pub async fn patch<T: Serialize>(
        &self,
        table: &str,
        query: &str,
        payload: &T,
        access_token: Option<&str>,
    ) -> Result<(), SyncError> {
        let url = format!("{}/rest/v1/{}?{}", self.base_url, table, query);

        let res = self
            .client
            .patch(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer(access_token))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| SyncError::RequestFailed(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(SyncError::ApiError {
                status,
                message: text,
            });
        }

        Ok(())
    }
}
