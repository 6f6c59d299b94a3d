//! Delivery client: dry-run, body construction, retry and classification.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::bundle;
use super::error::{error_message, DeliveryError, TransportError};
use super::request::{DeliveryRequest, DeliveryResponse, Outcome, Payload};
use super::retry::RetryPolicy;
use super::transport::{RawResponse, Transport, WireBody, WireRequest};

/// Classification of one attempt
enum Attempt {
    Success(RawResponse),
    Retryable(AttemptFailure),
    Fatal(DeliveryError),
}

/// Last retryable failure, kept for the exhausted error
enum AttemptFailure {
    Network(TransportError),
    Server(RawResponse),
}

/// Sends requests to the tracking service
pub struct DeliveryClient {
    transport: Arc<dyn Transport>,
    retry_policy: RetryPolicy,
    dry_run: bool,
    scratch_dir: Option<PathBuf>,
}

impl DeliveryClient {
    /// Create a client over `transport` with the default retry policy
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry_policy: RetryPolicy::default(),
            dry_run: false,
            scratch_dir: None,
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// In dry-run mode requests are logged and never sent
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Directory under which temporary evidence bundles are created
    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(scratch_dir.into());
        self
    }

    /// Send a request, retrying transient failures.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn send(&self, request: &DeliveryRequest) -> Result<DeliveryResponse, DeliveryError> {
        if self.dry_run {
            let payload = serde_json::to_string_pretty(&request.redacted_payload())
                .map_err(DeliveryError::Serialization)?;
            info!(
                method = %request.method,
                url = %request.url,
                "dry-run: request not sent\n{}",
                payload
            );
            return Ok(DeliveryResponse::dry_run());
        }

        // Held until return so any bundle is removed on every path.
        let (body, _attachment) = match &request.payload {
            Payload::Empty => (WireBody::Empty, None),
            Payload::Json(value) => {
                let bytes = serde_json::to_vec(value).map_err(DeliveryError::Serialization)?;
                (WireBody::Json(bytes), None)
            }
            Payload::Form(form) => {
                let prepared = bundle::prepare(&form.attachments, self.scratch_dir.as_deref())?;
                if let Some(ref attachment) = prepared {
                    debug!(
                        path = %attachment.path().display(),
                        bundled = attachment.is_bundle(),
                        "attaching evidence"
                    );
                }
                let body = WireBody::Multipart {
                    fields: form
                        .fields
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    attachment: prepared.as_ref().map(|a| a.path().to_path_buf()),
                };
                (body, prepared)
            }
        };

        let wire = WireRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            credentials: request.credentials.clone(),
            body,
        };

        self.send_with_retry(&wire).await
    }

    async fn send_with_retry(&self, wire: &WireRequest) -> Result<DeliveryResponse, DeliveryError> {
        let policy = &self.retry_policy;
        let started_at = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "sending request");

            let failure = match self.attempt(wire).await {
                Attempt::Success(response) => {
                    debug!(attempt, status = response.status, "request delivered");
                    return Ok(DeliveryResponse {
                        status_code: response.status,
                        body: response.body,
                        outcome: Outcome::Delivered,
                    });
                }
                Attempt::Fatal(err) => {
                    error!(attempt, error = %err, "request rejected");
                    return Err(err);
                }
                Attempt::Retryable(failure) => failure,
            };

            let delay = policy.delay_for_attempt(attempt);
            let within_budget = started_at.elapsed() + delay < policy.max_elapsed();

            if policy.should_retry(attempt) && within_budget {
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure.describe(),
                    "request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let err = failure.into_error(wire, attempt);
            error!(attempt, error = %err, "request failed permanently");
            return Err(err);
        }
    }

    async fn attempt(&self, wire: &WireRequest) -> Attempt {
        match self.transport.execute(wire).await {
            Ok(response) if (200..300).contains(&response.status) => Attempt::Success(response),
            Ok(response) if response.status >= 500 => {
                Attempt::Retryable(AttemptFailure::Server(response))
            }
            Ok(response) => Attempt::Fatal(DeliveryError::ClientRejected {
                method: wire.method.clone(),
                url: wire.url.clone(),
                status: response.status,
                message: error_message(&response.body),
            }),
            Err(err) if err.is_retryable() => Attempt::Retryable(AttemptFailure::Network(err)),
            Err(TransportError::Attachment { path, source }) => {
                Attempt::Fatal(DeliveryError::Attachment { path, source })
            }
            Err(err) => Attempt::Fatal(DeliveryError::Transport {
                method: wire.method.clone(),
                url: wire.url.clone(),
                attempts: 1,
                source: err,
            }),
        }
    }
}

impl AttemptFailure {
    fn describe(&self) -> String {
        match self {
            Self::Network(err) => err.to_string(),
            Self::Server(response) => format!("status {}", response.status),
        }
    }

    fn into_error(self, wire: &WireRequest, attempts: u32) -> DeliveryError {
        match self {
            Self::Network(source) => DeliveryError::Transport {
                method: wire.method.clone(),
                url: wire.url.clone(),
                attempts,
                source,
            },
            Self::Server(response) => DeliveryError::Server {
                method: wire.method.clone(),
                url: wire.url.clone(),
                status: response.status,
                message: error_message(&response.body),
                attempts,
            },
        }
    }
}
