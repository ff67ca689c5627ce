use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capabilities::Capabilities;
use crate::event::Event;
use crate::gemini::{GeminiClient, GeminiConfig};
use crate::model::{HairstyleSuggestion, ImageRef, Model};
use crate::reducer::{reduce, Action};
use crate::upload::{self, ImageError};
use crate::DOWNLOAD_FILE_STEM;

/// What the shell needs to offer the edited image as a file.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadView {
    pub file_name: String,
    pub data_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewModel {
    pub original_image: Option<String>,
    pub edited_image: Option<String>,
    pub suggestions: Vec<HairstyleSuggestion>,
    pub custom_hairstyle: String,
    pub is_loading: bool,
    pub is_analyzing: bool,
    pub error: Option<String>,
    pub can_apply_custom: bool,
    pub can_choose_suggestion: bool,
    pub download: Option<DownloadView>,
    pub credential_configured: bool,
}

#[derive(Default)]
pub struct App;

impl App {
    fn dispatch(model: &mut Model, action: Action) {
        debug!(action = action.name(), "applying action");
        model.state = reduce(std::mem::take(&mut model.state), action);
    }

    fn submit_image(model: &mut Model, caps: &Capabilities, encoded: Result<ImageRef, ImageError>) {
        let image = match encoded {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "rejected upload");
                Self::dispatch(model, Action::UploadRejected);
                caps.render.render();
                return;
            }
        };

        // An edit of the previous photo must not land on the new one.
        model.edit_fence.cancel();
        if model.state.is_loading {
            Self::dispatch(model, Action::EditCancelled);
        }

        Self::dispatch(model, Action::ImageUploaded(image.clone()));
        Self::dispatch(model, Action::AnalysisStarted);

        let ticket = model.analysis_fence.issue();
        let sent = GeminiClient::new(&caps.http, &model.config)
            .analyze(&image, move |outcome| Event::AnalysisCompleted { ticket, outcome });
        if let Err(e) = sent {
            warn!(code = e.code(), error = %e, "could not dispatch analysis");
            Self::dispatch(model, Action::AnalysisFailed);
        } else {
            info!(
                generation = ticket.0,
                mime_type = image.mime_type(),
                payload_len = image.data().len(),
                "analysis requested"
            );
        }

        caps.render.render();
    }

    fn request_edit(model: &mut Model, caps: &Capabilities, explicit: Option<String>) {
        let Some(image) = model.state.original_image.clone() else {
            debug!("edit requested without an image");
            return;
        };
        let Some(style) = model
            .state
            .effective_style(explicit.as_deref())
            .map(str::to_owned)
        else {
            debug!("edit requested without a style");
            return;
        };

        Self::dispatch(model, Action::EditStarted);

        let ticket = model.edit_fence.issue();
        let sent = GeminiClient::new(&caps.http, &model.config)
            .edit(&image, &style, move |outcome| Event::EditCompleted { ticket, outcome });
        if let Err(e) = sent {
            warn!(code = e.code(), error = %e, "could not dispatch edit");
            Self::dispatch(model, Action::EditFailed);
        } else {
            info!(generation = ticket.0, style = %style, "edit requested");
        }

        caps.render.render();
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "update"
        );

        match event {
            Event::Noop => {}

            Event::AppStarted => {
                model.config = GeminiConfig::from_env();
                info!(
                    credential_configured = model.config.has_api_key(),
                    endpoint = model.config.endpoint(),
                    "configuration loaded"
                );
                caps.render.render();
            }

            Event::Configure(settings) => {
                if let Err(e) = model.config.apply(settings) {
                    warn!(error = %e, "rejected configuration");
                }
                caps.render.render();
            }

            Event::ImageSelected { bytes, mime_type } => {
                let encoded = upload::encode_upload(&bytes, mime_type.as_deref());
                Self::submit_image(model, caps, encoded);
            }

            Event::ImageLoaded { data_url } => {
                let encoded = upload::decode_data_url(&data_url);
                Self::submit_image(model, caps, encoded);
            }

            Event::CustomStyleChanged { text } => {
                Self::dispatch(model, Action::CustomStyleChanged(text));
                caps.render.render();
            }

            Event::ApplyStyle { style } => Self::request_edit(model, caps, style),

            Event::SuggestionChosen { style_name } => {
                Self::request_edit(model, caps, Some(style_name));
            }

            Event::Clear => {
                model.analysis_fence.cancel();
                model.edit_fence.cancel();
                Self::dispatch(model, Action::Cleared);
                caps.render.render();
            }

            Event::AnalysisCompleted { ticket, outcome } => {
                if !model.analysis_fence.admits(ticket) {
                    debug!(
                        ticket = ticket.0,
                        current = model.analysis_fence.generation(),
                        "dropping stale analysis result"
                    );
                    return;
                }
                match outcome {
                    Ok(suggestions) => {
                        info!(count = suggestions.len(), "analysis complete");
                        Self::dispatch(model, Action::AnalysisSucceeded(suggestions));
                    }
                    Err(e) => {
                        warn!(code = e.code(), status = ?e.status, error = %e, "analysis failed");
                        Self::dispatch(model, Action::AnalysisFailed);
                    }
                }
                caps.render.render();
            }

            Event::EditCompleted { ticket, outcome } => {
                if !model.edit_fence.admits(ticket) {
                    debug!(
                        ticket = ticket.0,
                        current = model.edit_fence.generation(),
                        "dropping stale edit result"
                    );
                    return;
                }
                match outcome {
                    Ok(image) => {
                        if image.is_none() {
                            warn!("edit response carried no image");
                        }
                        Self::dispatch(model, Action::EditSucceeded(image));
                    }
                    Err(e) => {
                        warn!(code = e.code(), status = ?e.status, error = %e, "edit failed");
                        Self::dispatch(model, Action::EditFailed);
                    }
                }
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let state = &model.state;
        let has_image = state.original_image.is_some();

        ViewModel {
            original_image: state.original_image.as_ref().map(ImageRef::data_url),
            edited_image: state.edited_image.as_ref().map(ImageRef::data_url),
            suggestions: state.suggestions.clone(),
            custom_hairstyle: state.custom_hairstyle.clone(),
            is_loading: state.is_loading,
            is_analyzing: state.is_analyzing,
            error: state.error.clone(),
            can_apply_custom: has_image && !state.custom_hairstyle.is_empty() && !state.is_loading,
            can_choose_suggestion: has_image && !state.is_loading,
            download: state.edited_image.as_ref().map(|image| DownloadView {
                file_name: format!("{DOWNLOAD_FILE_STEM}.{}", image.extension()),
                data_url: image.data_url(),
            }),
            credential_configured: model.config.has_api_key(),
        }
    }
}
