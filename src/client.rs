use std::time::Instant;

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    configuration::BackendSettings,
    model::{Alert, Items, NewTransaction, SubmitOutcome, Transaction},
};

const TRANSACTIONS_PATH: &str = "/api/transactions";
const ALERTS_PATH: &str = "/api/alerts";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("failed to build http client: {0}")]
    Build(reqwest::Error),
}

/// Everything the dashboard page needs from one refresh.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub transactions: Vec<Transaction>,
    pub alerts: Vec<Alert>,
}

/// Result of probing one backend endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointCheck {
    pub url: String,
    pub status: Option<u16>,
    pub latency_ms: u128,
    pub error: Option<String>,
}

impl EndpointCheck {
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.status.map_or(false, |s| (200..300).contains(&s))
    }
}

/// HTTP client for the fraud scoring API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    fetch_limit: u32,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<BackendClient, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(ClientError::Build)?;

        Ok(BackendClient {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            fetch_limit: settings.fetch_limit,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fetch_limit(&self) -> u32 {
        self.fetch_limit
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[tracing::instrument(name = "Fetching transactions from the scoring API", skip(self))]
    pub async fn fetch_transactions(&self, limit: u32) -> Result<Vec<Transaction>, ClientError> {
        let items: Items<Transaction> = self.get_items(TRANSACTIONS_PATH, limit).await?;
        Ok(items.items)
    }

    #[tracing::instrument(name = "Fetching alerts from the scoring API", skip(self))]
    pub async fn fetch_alerts(&self, limit: u32) -> Result<Vec<Alert>, ClientError> {
        let items: Items<Alert> = self.get_items(ALERTS_PATH, limit).await?;
        Ok(items.items)
    }

    /// Fetches transactions and alerts concurrently. Either failing discards both.
    pub async fn fetch_dashboard(&self) -> Result<DashboardData, ClientError> {
        let (transactions, alerts) = tokio::try_join!(
            self.fetch_transactions(self.fetch_limit),
            self.fetch_alerts(self.fetch_limit)
        )?;

        tracing::info!(
            transactions = transactions.len(),
            alerts = alerts.len(),
            "Dashboard data fetched"
        );

        Ok(DashboardData {
            transactions,
            alerts,
        })
    }

    #[tracing::instrument(name = "Submitting simulated transaction", skip(self, transaction), fields(user_id = %transaction.user_id))]
    pub async fn submit_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> Result<SubmitOutcome, ClientError> {
        let url = self.endpoint(TRANSACTIONS_PATH);
        let response = self.http.post(&url).json(transaction).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(body) => body,
                Err(_) if !status.is_success() => {
                    return Ok(SubmitOutcome::Rejected {
                        error: status_message(status, &bytes),
                    })
                }
                Err(source) => return Err(ClientError::Decode { url, source }),
            }
        };

        let outcome = SubmitOutcome::from_response(status.is_success(), body);
        tracing::info!(status = status.as_u16(), ?outcome, "Submission answered");
        Ok(outcome)
    }

    /// Probes both list endpoints with `limit=1`.
    #[tracing::instrument(name = "Testing scoring API connection", skip(self))]
    pub async fn ping(&self) -> Vec<EndpointCheck> {
        let (transactions, alerts) = futures::future::join(
            self.probe(TRANSACTIONS_PATH),
            self.probe(ALERTS_PATH),
        )
        .await;

        vec![transactions, alerts]
    }

    async fn probe(&self, path: &str) -> EndpointCheck {
        let url = self.endpoint(path);
        let started = Instant::now();
        let result = self.http.get(&url).query(&[("limit", 1)]).send().await;
        let latency_ms = started.elapsed().as_millis();

        match result {
            Ok(response) => EndpointCheck {
                url,
                status: Some(response.status().as_u16()),
                latency_ms,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Probe of {} failed: {}", url, e);
                EndpointCheck {
                    url,
                    status: None,
                    latency_ms,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn get_items<T: DeserializeOwned>(
        &self,
        path: &str,
        limit: u32,
    ) -> Result<Items<T>, ClientError> {
        let url = self.endpoint(path);
        let response = self
            .http
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = status_message(status, &bytes);
            tracing::error!("{} answered {}: {}", url, status, message);
            return Err(ClientError::Status { status, message });
        }

        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode { url, source })
    }
}

/// The response text, or the status line when the body is empty.
fn status_message(status: StatusCode, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status.to_string()
    } else {
        text.to_string()
    }
}
