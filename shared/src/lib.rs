// lib.rs - Hairstyle try-on shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod gemini;
pub mod model;
pub mod reducer;
pub mod upload;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::{App, DownloadView, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::{Event, ShellConfig};
pub use gemini::{GeminiClient, GeminiConfig};
pub use model::{AppState, HairstyleSuggestion, ImageRef, Model, RequestFence, RequestTicket};
pub use reducer::{reduce, Action};

pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze face shape.";
pub const EDIT_EMPTY_MESSAGE: &str = "Could not process image.";
pub const EDIT_FAILED_MESSAGE: &str = "Error applying hairstyle.";
pub const UPLOAD_REJECTED_MESSAGE: &str = "Could not read image file.";

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 8192;
pub const DOWNLOAD_FILE_STEM: &str = "new-look";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Authentication,
    Authorization,
    RateLimited,
    Server,
    InvalidRequest,
    InvalidResponse,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Quota exhaustion is reported by the service as 429, so it folds into
    /// `RateLimited`.
    #[must_use]
    pub const fn from_http_status(status: u16) -> Self {
        match status {
            400 | 404 | 413 => Self::InvalidRequest,
            401 => Self::Authentication,
            403 => Self::Authorization,
            429 => Self::RateLimited,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }
}

/// Failure handed from the request client to the controller.
///
/// Only transport, auth and quota problems end up here. Content problems in
/// an analysis response are absorbed by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("[{}] {message}", .kind.code())]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl RequestError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_http_status(status),
            message: message.into(),
            status: Some(status),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

pub type RequestResult<T> = Result<T, RequestError>;
