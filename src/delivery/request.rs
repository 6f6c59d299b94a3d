//! Request and response shapes for the delivery client.

use std::collections::BTreeMap;
use std::path::PathBuf;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::error::DeliveryError;

/// Form field carrying the JSON payload of an evidence record
pub const DATA_JSON_FIELD: &str = "data_json";

/// Keys whose values are masked in dry-run output
const SENSITIVE_KEYS: &[&str] = &["token", "password", "secret", "authorization"];

/// Credentials attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
}

/// Multipart form with optional file attachments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceForm {
    /// Text fields, sent in key order
    pub fields: BTreeMap<String, String>,

    /// Files or directories to attach
    pub attachments: Vec<PathBuf>,
}

impl EvidenceForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Serialize `payload` into the `data_json` field
    pub fn payload<T: Serialize>(self, payload: &T) -> Result<Self, DeliveryError> {
        let json = serde_json::to_string(payload).map_err(DeliveryError::Serialization)?;
        Ok(self.field(DATA_JSON_FIELD, json))
    }

    /// Attach a file or directory
    pub fn attach(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }
}

/// Body of a delivery request
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No body (queries)
    Empty,

    /// Structured JSON body
    Json(Value),

    /// multipart/form-data body
    Form(EvidenceForm),
}

/// A fully described call to the tracking service.
///
/// Requests are immutable once built and resent verbatim on retry.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub method: Method,
    pub url: String,
    pub credentials: Option<Credentials>,
    pub payload: Payload,
}

impl DeliveryRequest {
    fn new(method: Method, url: impl Into<String>, payload: Payload) -> Self {
        Self {
            method,
            url: url.into(),
            credentials: None,
            payload,
        }
    }

    /// Request without a body
    pub fn empty(method: Method, url: impl Into<String>) -> Self {
        Self::new(method, url, Payload::Empty)
    }

    /// Request with a JSON body built from any serializable payload
    pub fn json<T: Serialize>(
        method: Method,
        url: impl Into<String>,
        payload: &T,
    ) -> Result<Self, DeliveryError> {
        let value = serde_json::to_value(payload).map_err(DeliveryError::Serialization)?;
        Ok(Self::new(method, url, Payload::Json(value)))
    }

    /// Request with a multipart form body
    pub fn form(method: Method, url: impl Into<String>, form: EvidenceForm) -> Self {
        Self::new(method, url, Payload::Form(form))
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Payload as shown in dry-run output, with secrets masked
    pub fn redacted_payload(&self) -> Value {
        match &self.payload {
            Payload::Empty => Value::Null,
            Payload::Json(value) => redact(value),
            Payload::Form(form) => {
                let fields = form
                    .fields
                    .iter()
                    .map(|(name, value)| {
                        let shown = if name == DATA_JSON_FIELD {
                            serde_json::from_str::<Value>(value)
                                .map(|v| redact(&v))
                                .unwrap_or_else(|_| Value::String(value.clone()))
                        } else if is_sensitive(name) {
                            Value::String("***".to_string())
                        } else {
                            Value::String(value.clone())
                        };
                        (name.clone(), shown)
                    })
                    .collect::<serde_json::Map<_, _>>();

                let attachments = form
                    .attachments
                    .iter()
                    .map(|p| Value::String(p.display().to_string()))
                    .collect();

                serde_json::json!({
                    "fields": fields,
                    "attachments": Value::Array(attachments),
                })
            }
        }
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    if is_sensitive(k) {
                        (k.clone(), Value::String("***".to_string()))
                    } else {
                        (k.clone(), redact(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// How a request was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The service accepted the request
    Delivered,

    /// Dry-run mode: nothing was sent
    DryRunSkipped,
}

/// Normalized response handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status_code: u16,
    pub body: String,
    pub outcome: Outcome,
}

impl DeliveryResponse {
    pub(crate) fn dry_run() -> Self {
        Self {
            status_code: 200,
            body: String::new(),
            outcome: Outcome::DryRunSkipped,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.outcome == Outcome::DryRunSkipped
    }
}
