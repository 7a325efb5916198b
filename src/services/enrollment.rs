//! Remote enrollment client
//!
//! Talks to the approval service that admits kiosks into the private
//! network: submit a registration keyed by hardware fingerprint, poll
//! until an administrator approves or rejects it, and hand back the join
//! credential on approval. The service owns all record transitions; this
//! client only observes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::settings::SettingsStore;

pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Rejected => "rejected",
            EnrollmentStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Remote enrollment record as observed through the status endpoint.
/// `credential` travels only with `approved`; `reason` only with
/// `rejected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub status: EnrollmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Response to a submission. A pre-approved record answers with the
/// credential immediately; otherwise the record starts out `pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAck {
    pub status: EnrollmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Metadata attached to a submission so the administrator can recognize
/// the machine asking for approval.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentMetadata {
    pub hostname: String,
    pub panel_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kiosk_id: Option<String>,
}

impl EnrollmentMetadata {
    pub fn collect(settings: &SettingsStore) -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            hostname,
            panel_version: env!("CARGO_PKG_VERSION").to_string(),
            kiosk_id: settings.get_str("kiosk.id"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnrollmentError {
    /// The service rejected the request itself (bad fingerprint or
    /// metadata). Not retryable.
    #[error("enrollment request rejected by service: {0}")]
    Denied(String),

    #[error("enrollment service rate limited the request")]
    RateLimited,

    /// No record exists for this fingerprint. Distinct from `rejected`.
    #[error("no enrollment record for this fingerprint")]
    NotFound,

    #[error("enrollment service error (status {0})")]
    Server(u16),

    #[error("enrollment transport failure: {0}")]
    Transport(String),
}

impl EnrollmentError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EnrollmentError::RateLimited | EnrollmentError::Server(_) | EnrollmentError::Transport(_)
        )
    }
}

/// The two remote operations the protocol needs. The HTTP client
/// implements this; tests script it.
#[async_trait]
pub trait EnrollmentApi: Send + Sync {
    async fn submit(
        &self,
        fingerprint: &str,
        metadata: &EnrollmentMetadata,
    ) -> Result<SubmitAck, EnrollmentError>;

    async fn poll_status(&self, fingerprint: &str) -> Result<EnrollmentRecord, EnrollmentError>;
}

#[derive(Clone)]
pub struct EnrollmentClient {
    http: reqwest::Client,
    base_url: String,
}

impl EnrollmentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    async fn classify(response: reqwest::Response) -> EnrollmentError {
        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => EnrollmentError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => EnrollmentError::RateLimited,
            s if s.is_client_error() => {
                let detail = response.text().await.unwrap_or_default();
                EnrollmentError::Denied(detail)
            }
            s => EnrollmentError::Server(s.as_u16()),
        }
    }
}

#[async_trait]
impl EnrollmentApi for EnrollmentClient {
    async fn submit(
        &self,
        fingerprint: &str,
        metadata: &EnrollmentMetadata,
    ) -> Result<SubmitAck, EnrollmentError> {
        let url = format!("{}/api/enrollments", self.base_url);
        let body = serde_json::json!({
            "fingerprint": fingerprint,
            "metadata": metadata,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EnrollmentError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| EnrollmentError::Transport(e.to_string()))
    }

    async fn poll_status(&self, fingerprint: &str) -> Result<EnrollmentRecord, EnrollmentError> {
        let url = format!("{}/api/enrollments/{}", self.base_url, fingerprint);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrollmentError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| EnrollmentError::Transport(e.to_string()))
    }
}

/// How an approval wait ended. `credential()` collapses this to the
/// credential-or-nothing view; the variants stay distinguishable so the
/// caller can report rejection (with the service's reason) separately
/// from the anomalous approved-without-credential case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved(String),
    Rejected { reason: Option<String> },
    MissingCredential,
    TimedOut,
}

impl ApprovalOutcome {
    pub fn credential(self) -> Option<String> {
        match self {
            ApprovalOutcome::Approved(credential) => Some(credential),
            _ => None,
        }
    }
}

/// Poll the enrollment record until it reaches a terminal state or the
/// wall-clock timeout expires.
///
/// Transport and server errors are logged and absorbed up to the timeout;
/// they never abort the wait. `rejected` is terminal immediately.
/// `approved` without a credential is terminal too: it cannot self-heal
/// by polling again, so it is logged as an anomaly and given up on.
/// `expired` keeps polling, since the service is expected to re-issue or
/// reach another terminal state. The loop suspends in the sleep between
/// polls; dropping the future there cancels the wait without leaking
/// anything.
pub async fn await_approval(
    api: &dyn EnrollmentApi,
    fingerprint: &str,
    total_timeout: Duration,
    poll_interval: Duration,
) -> ApprovalOutcome {
    let deadline = tokio::time::Instant::now() + total_timeout;

    while tokio::time::Instant::now() < deadline {
        match api.poll_status(fingerprint).await {
            Ok(record) => match record.status {
                EnrollmentStatus::Approved => match record.credential {
                    Some(credential) => return ApprovalOutcome::Approved(credential),
                    None => {
                        tracing::warn!(
                            fingerprint,
                            "enrollment approved but no credential attached"
                        );
                        return ApprovalOutcome::MissingCredential;
                    }
                },
                EnrollmentStatus::Rejected => {
                    tracing::info!(fingerprint, reason = ?record.reason, "enrollment rejected");
                    return ApprovalOutcome::Rejected {
                        reason: record.reason,
                    };
                }
                EnrollmentStatus::Expired => {
                    tracing::warn!(fingerprint, "enrollment record expired; continuing to poll");
                }
                EnrollmentStatus::Pending => {
                    tracing::debug!(fingerprint, "enrollment still pending approval");
                }
            },
            Err(EnrollmentError::NotFound) => {
                tracing::debug!(fingerprint, "no enrollment record yet");
            }
            Err(err) => {
                tracing::warn!(fingerprint, error = %err, "enrollment status poll failed; will retry");
            }
        }

        // The next poll would land past the deadline; stop here rather
        // than sleep beyond it.
        if tokio::time::Instant::now() + poll_interval >= deadline {
            return ApprovalOutcome::TimedOut;
        }
        tokio::time::sleep(poll_interval).await;
    }

    ApprovalOutcome::TimedOut
}
