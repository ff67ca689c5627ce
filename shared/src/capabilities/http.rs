use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{ErrorKind, RequestError};

/// Raw outcome of a request as delivered by the shell.
pub type HttpOutcome = crux_http::Result<crux_http::Response<Vec<u8>>>;

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_RESPONSE_BODY_SIZE: usize = 100 * 1024 * 1024;
pub const MAX_HEADER_VALUE_LENGTH: usize = 8192;
const ERROR_BODY_PREVIEW: usize = 200;

/// An absolute http(s) URL with a host and no embedded credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
    scheme: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        let trimmed = url.trim();

        if trimmed.is_empty() {
            return Err(HttpError::InvalidUrl {
                url: String::new(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if trimmed.len() > MAX_URL_LENGTH {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(trimmed),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let parsed = Url::parse(trimmed).map_err(|e| HttpError::InvalidUrl {
            url: Self::truncate_url(trimmed),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(trimmed),
                reason: format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            });
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl {
                url: Self::truncate_url(trimmed),
                reason: "URL must have a host".to_string(),
            })?
            .to_lowercase();

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(trimmed),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        Ok(Self {
            url: parsed.as_str().trim_end_matches('/').to_string(),
            scheme,
            host,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Appends a path below this URL, keeping exactly one separator.
    pub fn join_path(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }

    fn truncate_url(url: &str) -> String {
        if url.len() <= 100 {
            url.to_string()
        } else {
            let cut = (0..=100).rev().find(|&i| url.is_char_boundary(i)).unwrap_or(0);
            format!("{}...", &url[..cut])
        }
    }
}

pub fn validate_header_value(value: &str) -> Result<(), HttpError> {
    if value.len() > MAX_HEADER_VALUE_LENGTH {
        return Err(HttpError::InvalidHeader {
            reason: format!("header value exceeds maximum length of {MAX_HEADER_VALUE_LENGTH} bytes"),
        });
    }

    if value.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
        return Err(HttpError::InvalidHeader {
            reason: "header value contains invalid characters (CR, LF, or NULL)".to_string(),
        });
    }

    Ok(())
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("transport failure: {message}")]
    Transport { message: String },

    #[error("HTTP error {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("response body too large: {size} bytes exceeds maximum of {max} bytes")]
    ResponseTooLarge { size: usize, max: usize },
}

impl HttpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpError::InvalidUrl { .. }
            | HttpError::InvalidHeader { .. }
            | HttpError::Serialization { .. } => ErrorKind::InvalidRequest,
            HttpError::Transport { .. } => ErrorKind::Network,
            HttpError::HttpStatus { status, .. } => ErrorKind::from_http_status(*status),
            HttpError::ResponseTooLarge { .. } => ErrorKind::InvalidResponse,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<HttpError> for RequestError {
    fn from(e: HttpError) -> Self {
        RequestError {
            kind: e.kind(),
            status: e.status(),
            message: e.to_string(),
        }
    }
}

/// Turns the shell's answer into a successful body or a typed failure.
///
/// Non-2xx statuses are failures even when the transport reports them as a
/// successful exchange.
pub fn response_body(outcome: HttpOutcome) -> Result<Vec<u8>, HttpError> {
    let mut response = outcome.map_err(classify_failure)?;

    let status = response.status() as u16;
    let body = response.take_body().unwrap_or_default();

    if !(200..300).contains(&status) {
        return Err(HttpError::HttpStatus {
            status,
            message: error_preview(&body),
        });
    }

    if body.len() > MAX_RESPONSE_BODY_SIZE {
        return Err(HttpError::ResponseTooLarge {
            size: body.len(),
            max: MAX_RESPONSE_BODY_SIZE,
        });
    }

    Ok(body)
}

/// 4xx and 5xx answers arrive as `crux_http::Error::Http`, not as a response.
fn classify_failure(error: crux_http::Error) -> HttpError {
    match error {
        crux_http::Error::Http(e) => HttpError::HttpStatus {
            status: e.code as u16,
            message: error_preview(e.body.as_deref().unwrap_or_default()),
        },
        crux_http::Error::Json(message) => HttpError::Serialization { message },
        crux_http::Error::Url(reason) => HttpError::InvalidUrl {
            url: String::new(),
            reason,
        },
        crux_http::Error::Io(message) => HttpError::Transport { message },
        crux_http::Error::Timeout => HttpError::Transport {
            message: "request timed out".to_string(),
        },
    }
}

fn error_preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    text.chars().take(ERROR_BODY_PREVIEW).collect()
}
