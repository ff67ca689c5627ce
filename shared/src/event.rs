use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{HairstyleSuggestion, ImageRef, RequestTicket};
use crate::RequestResult;

/// Settings a shell may inject instead of relying on the process
/// environment. `None` keeps the current value.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShellConfig {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub analysis_model: Option<String>,
    pub edit_model: Option<String>,
}

// Redact the credential.
impl fmt::Debug for ShellConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellConfig")
            .field("api_key_present", &self.api_key.is_some())
            .field("endpoint", &self.endpoint)
            .field("analysis_model", &self.analysis_model)
            .field("edit_model", &self.edit_model)
            .finish()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub enum Event {
    #[default]
    Noop,

    /// Loads the credential and endpoint settings from the process environment.
    AppStarted,
    Configure(ShellConfig),

    /// Raw bytes of the file the user picked.
    ImageSelected {
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },
    /// The shell already read the file as a data URL.
    ImageLoaded {
        data_url: String,
    },

    CustomStyleChanged {
        text: String,
    },
    /// Applies `style` if given, otherwise the custom style text.
    ApplyStyle {
        style: Option<String>,
    },
    SuggestionChosen {
        style_name: String,
    },
    Clear,

    // Completions of outbound requests; only the core creates these.
    #[serde(skip)]
    AnalysisCompleted {
        ticket: RequestTicket,
        outcome: RequestResult<Vec<HairstyleSuggestion>>,
    },
    #[serde(skip)]
    EditCompleted {
        ticket: RequestTicket,
        outcome: RequestResult<Option<ImageRef>>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Noop => "noop",
            Event::AppStarted => "app_started",
            Event::Configure(_) => "configure",
            Event::ImageSelected { .. } => "image_selected",
            Event::ImageLoaded { .. } => "image_loaded",
            Event::CustomStyleChanged { .. } => "custom_style_changed",
            Event::ApplyStyle { .. } => "apply_style",
            Event::SuggestionChosen { .. } => "suggestion_chosen",
            Event::Clear => "clear",
            Event::AnalysisCompleted { .. } => "analysis_completed",
            Event::EditCompleted { .. } => "edit_completed",
        }
    }

    pub fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Event::ImageSelected { .. }
                | Event::ImageLoaded { .. }
                | Event::CustomStyleChanged { .. }
                | Event::ApplyStyle { .. }
                | Event::SuggestionChosen { .. }
                | Event::Clear
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_config_debug_redacts_key() {
        let config = ShellConfig {
            api_key: Some("super_secret".into()),
            ..ShellConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super_secret"));
        assert!(rendered.contains("api_key_present: true"));
    }

    #[test]
    fn user_events_round_trip_through_json() {
        let event = Event::SuggestionChosen {
            style_name: "Pixie Cut".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(serde_json::from_str::<Event>(&json).unwrap(), event);
    }

    #[test]
    fn completions_are_not_user_initiated() {
        let event = Event::EditCompleted {
            ticket: RequestTicket(1),
            outcome: Ok(None),
        };
        assert!(!event.is_user_initiated());
        assert!(Event::Clear.is_user_initiated());
    }
}
