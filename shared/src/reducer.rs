//! State transitions for [`AppState`].
//!
//! Every mutation the controller makes goes through [`reduce`], so each
//! transition can be exercised without a shell or a network.

use crate::model::{AppState, HairstyleSuggestion, ImageRef};
use crate::{
    ANALYSIS_FAILED_MESSAGE, EDIT_EMPTY_MESSAGE, EDIT_FAILED_MESSAGE, UPLOAD_REJECTED_MESSAGE,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    ImageUploaded(ImageRef),
    /// The picked file could not be turned into an image.
    UploadRejected,
    AnalysisStarted,
    AnalysisSucceeded(Vec<HairstyleSuggestion>),
    AnalysisFailed,
    EditStarted,
    /// `None` means the service answered without producing an image.
    EditSucceeded(Option<ImageRef>),
    EditFailed,
    /// An in-flight edit was superseded and its result will be ignored.
    EditCancelled,
    CustomStyleChanged(String),
    Cleared,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ImageUploaded(_) => "image_uploaded",
            Action::UploadRejected => "upload_rejected",
            Action::AnalysisStarted => "analysis_started",
            Action::AnalysisSucceeded(_) => "analysis_succeeded",
            Action::AnalysisFailed => "analysis_failed",
            Action::EditStarted => "edit_started",
            Action::EditSucceeded(_) => "edit_succeeded",
            Action::EditFailed => "edit_failed",
            Action::EditCancelled => "edit_cancelled",
            Action::CustomStyleChanged(_) => "custom_style_changed",
            Action::Cleared => "cleared",
        }
    }
}

#[must_use]
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::ImageUploaded(image) => {
            state.original_image = Some(image);
            state.edited_image = None;
            state.suggestions = Vec::new();
            state.error = None;
        }
        Action::UploadRejected => {
            state.error = Some(UPLOAD_REJECTED_MESSAGE.to_string());
        }
        Action::AnalysisStarted => {
            state.is_analyzing = true;
        }
        Action::AnalysisSucceeded(suggestions) => {
            state.suggestions = suggestions;
            state.is_analyzing = false;
        }
        Action::AnalysisFailed => {
            state.is_analyzing = false;
            state.error = Some(ANALYSIS_FAILED_MESSAGE.to_string());
        }
        Action::EditStarted => {
            state.is_loading = true;
            state.error = None;
        }
        Action::EditSucceeded(Some(image)) => {
            state.edited_image = Some(image);
            state.is_loading = false;
        }
        Action::EditSucceeded(None) => {
            state.is_loading = false;
            state.error = Some(EDIT_EMPTY_MESSAGE.to_string());
        }
        Action::EditFailed => {
            state.is_loading = false;
            state.error = Some(EDIT_FAILED_MESSAGE.to_string());
        }
        Action::EditCancelled => {
            state.is_loading = false;
        }
        Action::CustomStyleChanged(text) => {
            state.custom_hairstyle = text;
        }
        Action::Cleared => return AppState::default(),
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(name: &str) -> HairstyleSuggestion {
        HairstyleSuggestion {
            style_name: name.into(),
            description: "desc".into(),
            reason: "reason".into(),
        }
    }

    fn populated() -> AppState {
        AppState {
            original_image: Some(ImageRef::new("image/jpeg", "OLD")),
            edited_image: Some(ImageRef::new("image/png", "EDIT")),
            suggestions: vec![suggestion("Bob")],
            custom_hairstyle: "curly".into(),
            is_loading: true,
            is_analyzing: true,
            error: Some("previous".into()),
        }
    }

    #[test]
    fn upload_replaces_original_and_clears_derived_data() {
        let next = reduce(populated(), Action::ImageUploaded(ImageRef::new("image/png", "NEW")));
        assert_eq!(next.original_image, Some(ImageRef::new("image/png", "NEW")));
        assert_eq!(next.edited_image, None);
        assert!(next.suggestions.is_empty());
        assert_eq!(next.error, None);
        assert_eq!(next.custom_hairstyle, "curly");
    }

    #[test]
    fn analysis_success_replaces_suggestions() {
        let state = reduce(AppState::default(), Action::AnalysisStarted);
        assert!(state.is_analyzing);

        let state = reduce(
            state,
            Action::AnalysisSucceeded(vec![suggestion("Pixie"), suggestion("Pixie")]),
        );
        assert!(!state.is_analyzing);
        assert_eq!(state.suggestions.len(), 2);
        assert_eq!(state.error, None);
    }

    #[test]
    fn analysis_failure_sets_message_and_keeps_no_suggestions() {
        let state = reduce(AppState::default(), Action::AnalysisStarted);
        let state = reduce(state, Action::AnalysisFailed);
        assert!(!state.is_analyzing);
        assert!(state.suggestions.is_empty());
        assert_eq!(state.error.as_deref(), Some(ANALYSIS_FAILED_MESSAGE));
    }

    #[test]
    fn edit_start_clears_error() {
        let state = reduce(populated(), Action::EditStarted);
        assert!(state.is_loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn edit_success_sets_edited_image() {
        let state = reduce(populated(), Action::EditStarted);
        let state = reduce(
            state,
            Action::EditSucceeded(Some(ImageRef::new("image/png", "AAAA"))),
        );
        assert!(!state.is_loading);
        assert_eq!(state.edited_image, Some(ImageRef::new("image/png", "AAAA")));
    }

    #[test]
    fn empty_edit_keeps_previous_edited_image() {
        let before = reduce(populated(), Action::EditStarted);
        let state = reduce(before.clone(), Action::EditSucceeded(None));
        assert!(!state.is_loading);
        assert_eq!(state.edited_image, before.edited_image);
        assert_eq!(state.error.as_deref(), Some(EDIT_EMPTY_MESSAGE));
    }

    #[test]
    fn edit_failure_uses_distinct_message() {
        let state = reduce(populated(), Action::EditFailed);
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some(EDIT_FAILED_MESSAGE));
        assert_ne!(EDIT_FAILED_MESSAGE, EDIT_EMPTY_MESSAGE);
    }

    #[test]
    fn edit_cancel_only_drops_loading() {
        let before = populated();
        let state = reduce(before.clone(), Action::EditCancelled);
        assert!(!state.is_loading);
        assert_eq!(state.edited_image, before.edited_image);
        assert_eq!(state.error, before.error);
    }

    #[test]
    fn custom_style_accepts_empty_text() {
        let state = reduce(populated(), Action::CustomStyleChanged(String::new()));
        assert_eq!(state.custom_hairstyle, "");
    }

    #[test]
    fn upload_rejection_keeps_previous_image() {
        let before = populated();
        let state = reduce(before.clone(), Action::UploadRejected);
        assert_eq!(state.original_image, before.original_image);
        assert_eq!(state.error.as_deref(), Some(UPLOAD_REJECTED_MESSAGE));
    }

    #[test]
    fn clear_restores_initial_record() {
        assert_eq!(reduce(populated(), Action::Cleared), AppState::default());
        assert_eq!(reduce(AppState::default(), Action::Cleared), AppState::default());
    }
}
