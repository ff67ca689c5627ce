//! Client for the generative model behind hairstyle analysis and editing.
//!
//! Request construction and response validation are plain functions so they
//! can be tested without a shell. [`GeminiClient`] ties them to the HTTP
//! capability.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::capabilities::{
    response_body, validate_header_value, AppHttp, HttpError, HttpOutcome, ValidatedUrl,
};
use crate::event::{Event, ShellConfig};
use crate::model::{HairstyleSuggestion, ImageRef};
use crate::upload;
use crate::{ErrorKind, RequestError, RequestResult};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_EDIT_MODEL: &str = "gemini-2.5-flash-image";
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Checked in order; the first non-empty value wins.
const API_KEY_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY"];
const ENDPOINT_VAR: &str = "GEMINI_API_BASE";
const ANALYSIS_MODEL_VAR: &str = "GEMINI_ANALYSIS_MODEL";
const EDIT_MODEL_VAR: &str = "GEMINI_EDIT_MODEL";

pub const ANALYSIS_INSTRUCTION: &str = "Analyze the face shape and features of the person in \
this image. Suggest 3-4 diverse hairstyles that would suit them. For each, give the style name, \
a short description, and the reason it fits their face shape and features.";

pub fn edit_instruction(style: &str) -> String {
    format!(
        "Change the hair of the person in this image to the following style: {style}. \
         Keep the face, clothing, and background exactly as they are in the original photo. \
         Only the hair should change, and it should look realistic in the new style."
    )
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug)]
pub struct GeminiConfig {
    api_key: Option<SecretString>,
    /// `None` means [`DEFAULT_ENDPOINT`].
    endpoint: Option<ValidatedUrl>,
    analysis_model: String,
    edit_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
        }
    }
}

impl GeminiConfig {
    /// Reads settings from the process environment.
    ///
    /// A missing credential is not fatal. Requests go out unauthenticated
    /// and fail upstream.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let settings = ShellConfig {
            api_key: API_KEY_VARS.iter().find_map(|name| non_empty(*name)),
            endpoint: non_empty(ENDPOINT_VAR),
            analysis_model: non_empty(ANALYSIS_MODEL_VAR),
            edit_model: non_empty(EDIT_MODEL_VAR),
        };

        let mut config = Self::default();
        if let Err(e) = config.apply(settings) {
            warn!(error = %e, "ignoring invalid generative service settings from environment");
        }
        if !config.has_api_key() {
            warn!("no API credential configured; generative requests will be rejected");
        }
        config
    }

    /// Applies every provided setting, or none of them if any is invalid.
    pub fn apply(&mut self, settings: ShellConfig) -> Result<(), HttpError> {
        let endpoint = settings.endpoint.map(ValidatedUrl::new).transpose()?;
        let analysis_model = settings
            .analysis_model
            .as_deref()
            .map(normalize_model_id)
            .transpose()?;
        let edit_model = settings
            .edit_model
            .as_deref()
            .map(normalize_model_id)
            .transpose()?;
        let api_key = settings.api_key.map(|key| key.trim().to_string());
        if let Some(key) = &api_key {
            validate_header_value(key)?;
        }

        if let Some(endpoint) = endpoint {
            self.endpoint = Some(endpoint);
        }
        if let Some(model) = analysis_model {
            self.analysis_model = model;
        }
        if let Some(model) = edit_model {
            self.edit_model = model;
        }
        if let Some(key) = api_key {
            self.api_key = (!key.is_empty()).then(|| SecretString::new(key));
        }
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_ref()
            .map_or(DEFAULT_ENDPOINT, ValidatedUrl::as_str)
    }

    pub fn analysis_model(&self) -> &str {
        &self.analysis_model
    }

    pub fn edit_model(&self) -> &str {
        &self.edit_model
    }

    pub fn generate_url(&self, model: &str) -> String {
        let path = format!("models/{model}:generateContent");
        match &self.endpoint {
            Some(endpoint) => endpoint.join_path(&path),
            None => format!("{DEFAULT_ENDPOINT}/{path}"),
        }
    }
}

fn normalize_model_id(raw: &str) -> Result<String, HttpError> {
    let trimmed = raw.trim();
    let id = trimmed.strip_prefix("models/").unwrap_or(trimmed);
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(id.to_string())
    } else {
        Err(HttpError::InvalidUrl {
            url: trimmed.to_string(),
            reason: "model id may only contain letters, digits, '-', '_' and '.'".to_string(),
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "inline_data")]
    pub inline_data: Option<Blob>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// Inline image part. Tolerates an image whose payload still carries
    /// its data URL prefix.
    pub fn image(image: &ImageRef) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: image.mime_type().to_string(),
                data: upload::payload_of(image.data()).to_string(),
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    #[serde(alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map_or(&[], |content| content.parts.as_slice())
    }

    /// Concatenated text of the first candidate.
    pub fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }

    /// First inline image of the first candidate. Parts whose payload is
    /// empty are skipped, since they cannot be displayed.
    pub fn first_inline_image(&self) -> Option<ImageRef> {
        self.first_parts()
            .iter()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|blob| !blob.data.is_empty())
            .map(|blob| ImageRef::new(blob.mime_type.clone(), blob.data.clone()))
    }
}

// ============================================================================
// Requests
// ============================================================================

fn suggestion_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "styleName": { "type": "STRING" },
                "description": { "type": "STRING" },
                "reason": { "type": "STRING" },
            },
            "required": ["styleName", "description", "reason"],
        },
    })
}

pub fn analysis_request(image: &ImageRef) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part::image(image), Part::text(ANALYSIS_INSTRUCTION)],
        }],
        generation_config: Some(GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: suggestion_schema(),
        }),
    }
}

pub fn edit_request(image: &ImageRef, style: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part::image(image), Part::text(edit_instruction(style))],
        }],
        generation_config: None,
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Parses suggestion JSON. Never fails: malformed output means no
/// suggestions, so the user can still type a style themselves.
pub fn parse_suggestions(text: &str) -> Vec<HairstyleSuggestion> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<HairstyleSuggestion>>(trimmed) {
        Ok(suggestions) => suggestions,
        Err(e) => {
            warn!(error = %e, text_len = trimmed.len(), "failed to parse hairstyle suggestions");
            Vec::new()
        }
    }
}

/// Extracts suggestions from a successful analysis response body. A body
/// that is not a response envelope is tried as the suggestion array itself.
pub fn suggestions_from_body(body: &[u8]) -> Vec<HairstyleSuggestion> {
    match serde_json::from_slice::<GenerateContentResponse>(body) {
        Ok(envelope) => {
            if envelope.candidates.is_empty() {
                debug!("analysis response carried no candidates");
            }
            parse_suggestions(&envelope.text())
        }
        Err(_) => parse_suggestions(&String::from_utf8_lossy(body)),
    }
}

/// `Ok(None)` when the service answered but produced no image.
pub fn edited_image_from_body(body: &[u8]) -> RequestResult<Option<ImageRef>> {
    let envelope = serde_json::from_slice::<GenerateContentResponse>(body).map_err(|e| {
        RequestError::new(
            ErrorKind::InvalidResponse,
            format!("undecodable edit response: {e}"),
        )
    })?;
    Ok(envelope.first_inline_image())
}

// ============================================================================
// Client
// ============================================================================

pub struct GeminiClient<'a> {
    http: &'a AppHttp,
    config: &'a GeminiConfig,
}

impl<'a> GeminiClient<'a> {
    pub fn new(http: &'a AppHttp, config: &'a GeminiConfig) -> Self {
        Self { http, config }
    }

    /// Requests hairstyle suggestions for `image`. Only transport failures
    /// reach `make_event` as errors.
    pub fn analyze<F>(&self, image: &ImageRef, make_event: F) -> RequestResult<()>
    where
        F: FnOnce(RequestResult<Vec<HairstyleSuggestion>>) -> Event + Send + 'static,
    {
        let request = analysis_request(image);
        self.send(self.config.analysis_model(), &request, move |outcome| {
            let result = response_body(outcome)
                .map_err(RequestError::from)
                .map(|body| suggestions_from_body(&body));
            make_event(result)
        })
    }

    /// Requests an edit of `image` applying `style`.
    pub fn edit<F>(&self, image: &ImageRef, style: &str, make_event: F) -> RequestResult<()>
    where
        F: FnOnce(RequestResult<Option<ImageRef>>) -> Event + Send + 'static,
    {
        let request = edit_request(image, style);
        self.send(self.config.edit_model(), &request, move |outcome| {
            let result = response_body(outcome)
                .map_err(RequestError::from)
                .and_then(|body| edited_image_from_body(&body));
            make_event(result)
        })
    }

    fn send<F>(&self, model: &str, request: &GenerateContentRequest, on_outcome: F) -> RequestResult<()>
    where
        F: FnOnce(HttpOutcome) -> Event + Send + 'static,
    {
        let url = self.config.generate_url(model);

        let mut builder = self.http.post(&url);
        if let Some(key) = &self.config.api_key {
            builder = builder.header(API_KEY_HEADER, key.expose_secret().as_str());
        }
        let builder = builder.body_json(request).map_err(|e| {
            RequestError::from(HttpError::Serialization {
                message: e.to_string(),
            })
        })?;

        info!(
            model,
            authenticated = self.config.has_api_key(),
            "dispatching generateContent"
        );
        builder.send(on_outcome);
        Ok(())
    }
}
