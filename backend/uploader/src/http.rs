use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client};
use tracing::{error, info, warn};

use screencap_core::{EncodedImage, ImageUploader, UploadOutcome};
use screencap_logging::{redact_sensitive_data, redact_url};

/// Numeric codes reported for transport failures.
pub mod codes {
    pub const OTHER: u32 = 1;
    pub const MALFORMED_URL: u32 = 3;
    pub const RESOLVE_HOST: u32 = 6;
    pub const CONNECT: u32 = 7;
    pub const TIMEOUT: u32 = 28;
    pub const REDIRECT: u32 = 47;
    pub const SEND: u32 = 55;
    pub const RECEIVE: u32 = 56;
}

/// A request that never produced an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub code: u32,
    pub description: String,
}

impl TransportFailure {
    pub fn from_error(err: &reqwest::Error) -> Self {
        let description = error_chain(err);
        let code = if err.is_builder() {
            codes::MALFORMED_URL
        } else if err.is_timeout() {
            codes::TIMEOUT
        } else if err.is_connect() {
            if is_resolve_failure(&description) {
                codes::RESOLVE_HOST
            } else {
                codes::CONNECT
            }
        } else if err.is_redirect() {
            codes::REDIRECT
        } else if err.is_body() || err.is_decode() {
            codes::RECEIVE
        } else if err.is_request() {
            codes::SEND
        } else {
            codes::OTHER
        };
        Self { code, description }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:'{}'", self.code, self.description)
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if parts.last() != Some(&text) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

fn is_resolve_failure(description: &str) -> bool {
    description.contains("dns error") || description.contains("failed to lookup address")
}

/// Map an HTTP status to an upload outcome. Only `[400, 600)` counts as failure.
pub fn classify_status(status: u16) -> UploadOutcome {
    if (400..600).contains(&status) {
        UploadOutcome::Failure(format!("response code:{status}"))
    } else {
        UploadOutcome::Success
    }
}

/// Posts encoded captures with a single best-effort request per job.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: Client,
}

impl HttpUploader {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_user_agent(None)
    }

    /// Redirects are reported as the 3xx status they are, never followed.
    /// A blank user agent leaves the client default in place.
    pub fn with_user_agent(user_agent: Option<&str>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().redirect(redirect::Policy::none());
        if let Some(agent) = user_agent.filter(|a| !a.trim().is_empty()) {
            builder = builder.user_agent(agent.to_string());
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl ImageUploader for HttpUploader {
    async fn upload(&self, image: &EncodedImage, url: &str) -> UploadOutcome {
        if url.trim().is_empty() {
            error!("No upload url given");
            return UploadOutcome::Failure("no upload url given".to_string());
        }

        let target = redact_url(url);
        info!(bytes = image.len(), url = %target, "Uploading capture");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, image.content_type)
            .body(image.data.clone())
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let outcome = classify_status(status);
                match &outcome {
                    UploadOutcome::Success => info!(status, url = %target, "Upload done"),
                    UploadOutcome::Failure(_) => {
                        warn!(status, url = %target, "Upload rejected by server")
                    }
                }
                outcome
            }
            Err(e) => {
                let failure = TransportFailure::from_error(&e);
                error!(
                    code = failure.code,
                    error = %redact_sensitive_data(&failure.description),
                    url = %target,
                    "Upload failed"
                );
                UploadOutcome::Failure(failure.to_string())
            }
        }
    }
}
