//! REST account store.
//!
//! Talks to a PostgREST-style endpoint (`{base}/rest/v1/{table}`):
//! - reads filter with `?id=eq.{user_id}`
//! - plain saves upsert with `Prefer: resolution=merge-duplicates`
//! - conditional saves `PATCH` with an extra `revision=eq.{n}` filter, so an
//!   empty result means another writer moved the row on
//!
//! Every call carries the service key as both `apikey` and bearer token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use qledger_models::{now_millis, Account};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::error::{StoreError, StoreResult};
use crate::metrics::record_request;
use crate::record::ProfileRecord;
use crate::retry::{with_retry, RetryConfig};
use crate::store::AccountStore;

/// Default table holding account rows.
pub const DEFAULT_TABLE: &str = "profiles";

// =============================================================================
// Configuration
// =============================================================================

/// REST store configuration.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Service root, e.g. `https://project.example.co`
    pub base_url: String,
    /// Service key sent with every request
    pub api_key: String,
    /// Table holding account rows
    pub table: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl RestStoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let base_url = std::env::var("ACCOUNT_STORE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| StoreError::configuration("ACCOUNT_STORE_URL must be set for the rest store"))?;

        let api_key = std::env::var("ACCOUNT_STORE_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| StoreError::configuration("ACCOUNT_STORE_KEY must be set for the rest store"))?;

        let timeout_secs: u64 = std::env::var("ACCOUNT_STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            table: std::env::var("ACCOUNT_STORE_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            retry: RetryConfig::from_env(),
            ..Self::new(base_url, api_key)
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Account store backed by a remote REST table.
#[derive(Clone)]
pub struct RestAccountStore {
    http: Client,
    config: RestStoreConfig,
    table_url: String,
}

impl std::fmt::Debug for RestAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAccountStore")
            .field("table_url", &self.table_url)
            .finish_non_exhaustive()
    }
}

impl RestAccountStore {
    pub fn new(config: RestStoreConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("qledger-store/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let table_url = format!(
            "{}/rest/v1/{}",
            config.base_url.trim_end_matches('/'),
            config.table
        );

        Ok(Self {
            http,
            config,
            table_url,
        })
    }

    pub fn from_env() -> StoreResult<Self> {
        Self::new(RestStoreConfig::from_env()?)
    }

    fn row_url(&self, user_id: &str) -> String {
        format!("{}?id=eq.{}", self.table_url, urlencoding::encode(user_id))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn fetch_rows(&self, url: &str) -> StoreResult<Vec<ProfileRecord>> {
        let response = self.authed(self.http.get(url)).send().await?;
        Self::read_rows(url, response).await
    }

    async fn upsert_row(&self, record: &ProfileRecord) -> StoreResult<Vec<ProfileRecord>> {
        let response = self
            .authed(self.http.post(&self.table_url))
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[record])
            .send()
            .await?;
        Self::read_rows(&self.table_url, response).await
    }

    async fn patch_row(&self, url: &str, record: &ProfileRecord) -> StoreResult<Vec<ProfileRecord>> {
        let response = self
            .authed(self.http.patch(url))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;
        Self::read_rows(url, response).await
    }

    async fn read_rows(url: &str, response: reqwest::Response) -> StoreResult<Vec<ProfileRecord>> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, url, response).await);
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: reqwest::Response) -> StoreError {
        let body = response.text().await.unwrap_or_default();
        StoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }

    /// Run one store call inside a span and record its metrics.
    async fn execute_request<T, F>(&self, operation: &str, user_id: &str, fut: F) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        let span = info_span!("store_request", backend = "rest", operation = %operation, user_id = %user_id);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    fn first_account(rows: Vec<ProfileRecord>) -> Option<Account> {
        rows.into_iter().next().map(|row| row.into_account(now_millis()))
    }
}

// =============================================================================
// AccountStore
// =============================================================================

#[async_trait]
impl AccountStore for RestAccountStore {
    async fn load(&self, user_id: &str) -> StoreResult<Option<Account>> {
        let url = self.row_url(user_id);
        let rows = self
            .execute_request(
                "load",
                user_id,
                with_retry(&self.config.retry, "load", || self.fetch_rows(&url)),
            )
            .await?;
        Ok(Self::first_account(rows))
    }

    async fn save(&self, account: &Account) -> StoreResult<Account> {
        // The stored revision only moves forward, even for a stale upsert
        let current = self.load(&account.user_id).await?.map(|a| a.revision).unwrap_or(0);

        let mut next = account.clone();
        next.revision = current.max(account.revision) + 1;
        let record = ProfileRecord::from_account(&next);

        let rows = self
            .execute_request(
                "save",
                &account.user_id,
                with_retry(&self.config.retry, "save", || self.upsert_row(&record)),
            )
            .await?;

        debug!(user_id = %account.user_id, revision = next.revision, "Upserted account");
        Ok(Self::first_account(rows).unwrap_or(next))
    }

    async fn save_if_revision(&self, account: &Account, expected: u64) -> StoreResult<Account> {
        let mut next = account.clone();
        next.revision = expected + 1;
        let record = ProfileRecord::from_account(&next);
        let url = format!("{}&revision=eq.{}", self.row_url(&account.user_id), expected);

        // Set when an attempt failed after the PATCH may have reached the
        // server, so a later empty match could be our own write
        let uncertain = AtomicBool::new(false);

        let rows = {
            let (url, record, uncertain) = (&url, &record, &uncertain);
            self.execute_request(
                "save_if_revision",
                &account.user_id,
                with_retry(&self.config.retry, "save_if_revision", move || async move {
                    let result = self.patch_row(url, record).await;
                    if matches!(&result, Err(e) if e.is_retryable()) {
                        uncertain.store(true, Ordering::Relaxed);
                    }
                    result
                }),
            )
            .await?
        };

        if let Some(stored) = Self::first_account(rows) {
            return Ok(stored);
        }

        // Nothing matched: the row is gone, its revision moved on, or an
        // earlier attempt already applied this exact write
        match self.load(&account.user_id).await? {
            None => Err(StoreError::not_found(account.user_id.clone())),
            Some(current)
                if uncertain.load(Ordering::Relaxed)
                    && current.revision == next.revision
                    && current.same_quota(&next) =>
            {
                debug!(
                    user_id = %account.user_id,
                    revision = current.revision,
                    "Conditional write already applied by an earlier attempt"
                );
                Ok(current)
            }
            Some(current) => Err(StoreError::PreconditionFailed(format!(
                "{} is at revision {}, expected {}",
                account.user_id, current.revision, expected
            ))),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        let url = format!("{}?select=id&limit=1", self.table_url);
        self.execute_request("ping", "-", self.fetch_rows(&url)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}

// =============================================================================
// Tests
// =============================================================================
