//! Reliable delivery of payloads to the tracking service.
//!
//! Every reporting command hands its payload to a [`DeliveryClient`], which:
//! - short-circuits in dry-run mode, logging a redacted view of the request
//! - encodes JSON bodies or builds multipart forms with streamed attachments
//! - attaches credentials
//! - retries network failures and 5xx responses with bounded backoff
//!
//! 4xx responses are never retried.

mod bundle;
pub mod client;
pub mod error;
pub mod request;
pub mod retry;
pub mod transport;

pub use bundle::BUNDLE_FILE_NAME;
pub use client::DeliveryClient;
pub use error::{DeliveryError, TransportError};
pub use request::{
    Credentials, DeliveryRequest, DeliveryResponse, EvidenceForm, Outcome, Payload, DATA_JSON_FIELD,
};
pub use retry::RetryPolicy;
pub use transport::{
    HttpTransport, RawResponse, Transport, WireBody, WireRequest, EVIDENCE_FILE_PART,
};
