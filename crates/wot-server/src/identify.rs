//! HTTP client for the external identification service.
//!
//! The service receives `{uid, eldestSeqno, username, reason}` as JSON and
//! answers with an [`IdentifyOutcome`] (`{trackBreaks?, failingProofs}`).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use wot_service::{IdentifyOutcome, Identifier};
use wot_types::{ExternalError, User};

use crate::config::IdentifyConfig;

/// Errors from the identify client.
#[derive(Debug, Error)]
pub enum IdentifyError {
    /// No endpoint is configured.
    #[error("identification service is not configured")]
    Unconfigured,

    /// The request could not be sent or the response not decoded.
    #[error("identification request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("identification service returned {0}")]
    Status(u16),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdentifyRequest<'a> {
    uid: &'a str,
    eldest_seqno: i64,
    username: &'a str,
    reason: &'a str,
}

/// [`Identifier`] that POSTs to the configured identification endpoint.
#[derive(Clone)]
pub struct HttpIdentifier {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl HttpIdentifier {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `IdentifyError::Network` if the HTTP client cannot be built.
    pub fn new(config: &IdentifyConfig) -> Result<Self, IdentifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("wot-server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn request(&self, user: &User, reason: &str) -> Result<IdentifyOutcome, IdentifyError> {
        let endpoint = self.endpoint.as_deref().ok_or(IdentifyError::Unconfigured)?;
        let body = IdentifyRequest {
            uid: user.uv.uid.as_str(),
            eldest_seqno: user.uv.eldest_seqno,
            username: user.username.as_str(),
            reason,
        };

        let resp = self.client.post(endpoint).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(IdentifyError::Status(resp.status().as_u16()));
        }
        let outcome: IdentifyOutcome = resp.json().await?;

        tracing::debug!(
            username = %user.username,
            track_breaks = outcome.track_breaks.is_some(),
            failing_proofs = outcome.failing_proofs.len(),
            "identification finished"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl Identifier for HttpIdentifier {
    async fn identify(&self, user: &User, reason: &str) -> Result<IdentifyOutcome, ExternalError> {
        self.request(user, reason).await.map_err(|err| {
            tracing::warn!(username = %user.username, error = %err, "identification failed");
            ExternalError::new(err)
        })
    }
}
