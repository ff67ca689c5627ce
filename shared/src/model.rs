use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gemini::GeminiConfig;
use crate::upload;

/// An encoded image: mime type plus base64 payload.
///
/// Used for both the user's upload and any generated edit. Never mutated;
/// a new upload or edit replaces the whole value.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    mime_type: String,
    data: String,
}

impl ImageRef {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Accepts either a `data:<mime>;base64,<payload>` URL or a bare
    /// payload. Bare payloads are assumed to be JPEG.
    pub fn parse(encoded: &str) -> Self {
        let mime_type = upload::mime_of(encoded).unwrap_or(crate::DEFAULT_IMAGE_MIME);
        Self::new(mime_type, upload::payload_of(encoded))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// File extension matching the mime type, used for download names.
    /// Unknown types fall back to `png`.
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("png")
    }
}

// Payloads are megabytes of base64; keep them out of logs.
impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRef")
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HairstyleSuggestion {
    pub style_name: String,
    pub description: String,
    pub reason: String,
}

/// The application state record the shell renders from.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    pub original_image: Option<ImageRef>,
    pub edited_image: Option<ImageRef>,
    pub suggestions: Vec<HairstyleSuggestion>,
    pub custom_hairstyle: String,
    pub is_loading: bool,
    pub is_analyzing: bool,
    pub error: Option<String>,
}

impl AppState {
    /// The style an edit request would use: an explicit choice wins over the
    /// free-text field. Empty text counts as no choice.
    pub fn effective_style<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit
            .filter(|s| !s.is_empty())
            .or(Some(self.custom_hairstyle.as_str()))
            .filter(|s| !s.is_empty())
    }
}

/// Generation token captured when a request is dispatched.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTicket(pub u64);

/// Tracks the latest dispatched request of one kind. A completion is only
/// applied while its ticket is still current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestFence {
    generation: u64,
}

impl RequestFence {
    pub fn issue(&mut self) -> RequestTicket {
        self.generation = self.generation.wrapping_add(1);
        RequestTicket(self.generation)
    }

    /// Invalidates whatever is in flight without issuing a new ticket.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn admits(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub state: AppState,
    pub config: GeminiConfig,
    pub analysis_fence: RequestFence,
    pub edit_fence: RequestFence,
}
