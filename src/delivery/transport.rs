//! Network boundary of the delivery client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method};
use tokio_util::io::ReaderStream;

use super::error::TransportError;
use super::request::Credentials;

/// Multipart part name carrying the evidence file
pub const EVIDENCE_FILE_PART: &str = "evidence_file";

/// Body ready to be put on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum WireBody {
    Empty,

    /// Canonical JSON bytes
    Json(Vec<u8>),

    /// Text fields plus an optional file streamed at send time
    Multipart {
        fields: Vec<(String, String)>,
        attachment: Option<PathBuf>,
    },
}

/// One attempt's worth of request data. Identical across retries.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub credentials: Option<Credentials>,
    pub body: WireBody,
}

/// Raw status and body returned by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs a single HTTP exchange.
///
/// Implementations report any response they receive, whatever its status;
/// classification and retries are the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &WireRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest` backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("reporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| TransportError::Invalid(err.into()))?;
        Ok(Self { client })
    }

    async fn file_part(path: &Path) -> Result<Part, TransportError> {
        let to_error = |source| TransportError::Attachment {
            path: path.to_path_buf(),
            source,
        };

        let file = tokio::fs::File::open(path).await.map_err(to_error)?;
        let length = file.metadata().await.map_err(to_error)?.len();
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let body = Body::wrap_stream(ReaderStream::new(file));
        Ok(Part::stream_with_length(body, length).file_name(file_name))
    }

    async fn multipart(
        fields: &[(String, String)],
        attachment: Option<&Path>,
    ) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.clone(), value.clone());
        }
        if let Some(path) = attachment {
            form = form.part(EVIDENCE_FILE_PART, Self::file_part(path).await?);
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &WireRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str());

        builder = match &request.credentials {
            Some(Credentials::Bearer(token)) => builder.bearer_auth(token),
            Some(Credentials::Basic { username, password }) => {
                builder.basic_auth(username, Some(password))
            }
            None => builder,
        };

        builder = match &request.body {
            WireBody::Empty => builder,
            WireBody::Json(bytes) => builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes.clone()),
            WireBody::Multipart { fields, attachment } => {
                builder.multipart(Self::multipart(fields, attachment.as_deref()).await?)
            }
        };

        let response = builder.send().await.map_err(|err| {
            if err.is_builder() {
                TransportError::Invalid(err.into())
            } else {
                TransportError::network(err)
            }
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(TransportError::network)?;

        Ok(RawResponse { status, body })
    }
}
