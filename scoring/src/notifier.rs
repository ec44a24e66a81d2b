use async_trait::async_trait;
use common::config::NotifierConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::{sync::Arc, time::Duration};
use url::Url;

use crate::{
    error::ErrorKind,
    model::{DeliveryOutcome, StorePatch, UpdateRecord, UpdateResponse},
};

/// Status and body of the store's answer to a PATCH.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    pub status: u16,
    pub body: String,
}

impl StoreResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    #[error("record store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("could not connect to record store: {0}")]
    Connect(String),

    #[error("record store request failed: {0}")]
    Request(String),
}

impl DeliveryError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::DownstreamDelivery
    }
}

/// An external store that upserts risk fields onto a customer row by id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn patch_record(&self, record: &UpdateRecord) -> Result<StoreResponse, DeliveryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreConfigError {
    #[error("invalid record store URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid record store API key")]
    InvalidApiKey,

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// PostgREST-style store: `PATCH {base}/rest/v1/{table}?id=eq.{customer_id}`.
pub struct RestRecordStore {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl RestRecordStore {
    pub fn new(config: &NotifierConfig) -> Result<Self, StoreConfigError> {
        let invalid_url = |reason: String| StoreConfigError::InvalidUrl {
            url: config.base_url.clone(),
            reason,
        };
        let mut endpoint = Url::parse(config.base_url.trim()).map_err(|e| invalid_url(e.to_string()))?;
        endpoint
            .path_segments_mut()
            .map_err(|_| invalid_url("not a base URL".to_string()))?
            .pop_if_empty()
            .extend(["rest", "v1", config.table.as_str()]);
        endpoint.set_query(None);
        endpoint.set_fragment(None);

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| StoreConfigError::InvalidApiKey)?;
        let bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(|_| StoreConfigError::InvalidApiKey)?;
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static("return=minimal"));

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn record_url(&self, customer_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", customer_id));
        url
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn patch_record(&self, record: &UpdateRecord) -> Result<StoreResponse, DeliveryError> {
        let url = self.record_url(&record.customer_id);
        tracing::debug!(url = %url, "Sending record store update");

        let response = self
            .client
            .patch(url)
            .json(&StorePatch::from(record))
            .send()
            .await
            .map_err(|e| classify_transport_error(e, self.timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(e, self.timeout))?;
        Ok(StoreResponse { status, body })
    }
}

fn classify_transport_error(error: reqwest::Error, timeout: Duration) -> DeliveryError {
    if error.is_timeout() {
        DeliveryError::Timeout(timeout)
    } else if error.is_connect() {
        DeliveryError::Connect(error.to_string())
    } else {
        DeliveryError::Request(error.to_string())
    }
}

pub const NOT_CONFIGURED_WARNING: &str = "record store not configured";

/// Best-effort, at-most-once forwarding of scoring results.
///
/// `notify` never fails: the primary fields are always returned and the
/// store's outcome is attached as diagnostics.
#[derive(Clone)]
pub struct Notifier {
    store: Option<Arc<dyn RecordStore>>,
}

impl Notifier {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Builds a REST-backed notifier, or a disabled one when no base URL is set.
    pub fn from_config(config: &NotifierConfig) -> Result<Self, StoreConfigError> {
        if !config.is_configured() {
            tracing::warn!("No record store configured, updates will be skipped");
            return Ok(Self::disabled());
        }
        let store = RestRecordStore::new(config)?;
        tracing::info!(endpoint = %store.endpoint, "Record store configured");
        Ok(Self::new(Arc::new(store)))
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn notify(&self, record: &UpdateRecord) -> UpdateResponse {
        let Some(store) = &self.store else {
            let mut response = UpdateResponse::queued(record, DeliveryOutcome::Skipped);
            response.warning = Some(NOT_CONFIGURED_WARNING.to_string());
            record_outcome(DeliveryOutcome::Skipped);
            return response;
        };

        let response = match store.patch_record(record).await {
            Ok(answer) if answer.is_success() => {
                tracing::info!(
                    customer_id = %record.customer_id,
                    status = answer.status,
                    "Record store updated"
                );
                let mut response = UpdateResponse::queued(record, DeliveryOutcome::Delivered);
                response.supabase_status = Some(answer.status);
                response.supabase_response = non_empty(answer.body);
                response
            }
            Ok(answer) => {
                tracing::warn!(
                    customer_id = %record.customer_id,
                    status = answer.status,
                    body = %answer.body,
                    "Record store rejected update"
                );
                let mut response = UpdateResponse::queued(record, DeliveryOutcome::Rejected);
                response.warning = Some(format!("record store answered HTTP {}", answer.status));
                response.supabase_status = Some(answer.status);
                response.supabase_response = non_empty(answer.body);
                response
            }
            Err(e) => {
                tracing::warn!(
                    customer_id = %record.customer_id,
                    error = %e,
                    kind = %e.kind(),
                    "Record store update failed"
                );
                let mut response = UpdateResponse::queued(record, DeliveryOutcome::Failed);
                response.error = Some(e.to_string());
                response
            }
        };

        record_outcome(response.delivery);
        response
    }
}

fn record_outcome(outcome: DeliveryOutcome) {
    metrics::counter!("churn_notifications_total", "outcome" => outcome.to_string()).increment(1);
}

fn non_empty(body: String) -> Option<String> {
    if body.trim().is_empty() { None } else { Some(body) }
}
