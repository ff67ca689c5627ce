mod common;

use common::{photo_data_url, photo_payload};
use crux_core::testing::AppTester;
use crux_http::protocol::HttpRequest;
use pretty_assertions::{assert_eq, assert_ne};
use shared::{
    App, AppState, Effect, Event, HairstyleSuggestion, ImageRef, Model, RequestTicket,
    ShellConfig,
};

fn outbound(effects: Vec<Effect>) -> Vec<HttpRequest> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some(request.operation),
            _ => None,
        })
        .collect()
}

fn upload(app: &AppTester<App, Effect>, model: &mut Model, shade: u8) -> Vec<HttpRequest> {
    let update = app.update(
        Event::ImageLoaded {
            data_url: photo_data_url(shade),
        },
        model,
    );
    outbound(update.effects)
}

fn apply(app: &AppTester<App, Effect>, model: &mut Model, style: &str) -> Vec<HttpRequest> {
    let update = app.update(
        Event::ApplyStyle {
            style: Some(style.into()),
        },
        model,
    );
    outbound(update.effects)
}

fn suggestion(name: &str) -> HairstyleSuggestion {
    HairstyleSuggestion {
        style_name: name.into(),
        description: "d".into(),
        reason: "r".into(),
    }
}

fn api_key_header(request: &HttpRequest) -> Option<&str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("x-goog-api-key"))
        .map(|h| h.value.as_str())
}

#[test]
fn stale_analysis_is_dropped_after_reupload() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    upload(&app, &mut model, 1);
    let first = RequestTicket(model.analysis_fence.generation());
    upload(&app, &mut model, 2);
    let second = RequestTicket(model.analysis_fence.generation());
    assert_ne!(first, second);

    let update = app.update(
        Event::AnalysisCompleted {
            ticket: first,
            outcome: Ok(vec![suggestion("For the first photo")]),
        },
        &mut model,
    );
    assert!(update.effects.is_empty());
    assert!(model.state.is_analyzing);
    assert!(model.state.suggestions.is_empty());

    app.update(
        Event::AnalysisCompleted {
            ticket: second,
            outcome: Ok(vec![suggestion("For the second photo")]),
        },
        &mut model,
    );
    assert!(!model.state.is_analyzing);
    assert_eq!(model.state.suggestions, vec![suggestion("For the second photo")]);
}

#[test]
fn latest_edit_wins_regardless_of_completion_order() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    upload(&app, &mut model, 1);

    apply(&app, &mut model, "Bob");
    let bob = RequestTicket(model.edit_fence.generation());
    apply(&app, &mut model, "Mohawk");
    let mohawk = RequestTicket(model.edit_fence.generation());

    app.update(
        Event::EditCompleted {
            ticket: mohawk,
            outcome: Ok(Some(ImageRef::new("image/png", "MOHAWK"))),
        },
        &mut model,
    );
    app.update(
        Event::EditCompleted {
            ticket: bob,
            outcome: Ok(Some(ImageRef::new("image/png", "BOB"))),
        },
        &mut model,
    );

    assert!(!model.state.is_loading);
    assert_eq!(
        model.state.edited_image,
        Some(ImageRef::new("image/png", "MOHAWK"))
    );
}

#[test]
fn clear_during_edit_ignores_late_result() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    upload(&app, &mut model, 1);
    apply(&app, &mut model, "Bob");
    let in_flight = RequestTicket(model.edit_fence.generation());
    let analysis = RequestTicket(model.analysis_fence.generation());

    app.update(Event::Clear, &mut model);

    app.update(
        Event::EditCompleted {
            ticket: in_flight,
            outcome: Ok(Some(ImageRef::new("image/png", "LATE"))),
        },
        &mut model,
    );
    app.update(
        Event::AnalysisCompleted {
            ticket: analysis,
            outcome: Ok(vec![suggestion("Late")]),
        },
        &mut model,
    );

    assert_eq!(model.state, AppState::default());
}

#[test]
fn reupload_during_edit_drops_old_edit() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    upload(&app, &mut model, 1);
    apply(&app, &mut model, "Bob");
    let in_flight = RequestTicket(model.edit_fence.generation());
    assert!(model.state.is_loading);

    upload(&app, &mut model, 2);
    assert!(!model.state.is_loading);

    app.update(
        Event::EditCompleted {
            ticket: in_flight,
            outcome: Ok(Some(ImageRef::new("image/png", "OLD_EDIT"))),
        },
        &mut model,
    );
    assert_eq!(model.state.edited_image, None);
    assert_eq!(
        model.state.original_image,
        Some(ImageRef::new("image/png", photo_payload(2)))
    );
}

#[test]
fn credential_header_only_when_configured() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let requests = upload(&app, &mut model, 1);
    assert_eq!(requests.len(), 1);
    assert_eq!(api_key_header(&requests[0]), None);
    assert!(!app.view(&model).credential_configured);

    app.update(
        Event::Configure(ShellConfig {
            api_key: Some("test-key-123".into()),
            ..ShellConfig::default()
        }),
        &mut model,
    );
    assert!(app.view(&model).credential_configured);

    let requests = upload(&app, &mut model, 1);
    assert_eq!(api_key_header(&requests[0]), Some("test-key-123"));

    let requests = apply(&app, &mut model, "Bob");
    assert_eq!(api_key_header(&requests[0]), Some("test-key-123"));

    assert!(!format!("{model:?}").contains("test-key-123"));
}

#[test]
fn configured_endpoint_is_used() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(
        Event::Configure(ShellConfig {
            endpoint: Some("https://proxy.example.com/v1beta/".into()),
            ..ShellConfig::default()
        }),
        &mut model,
    );

    let requests = upload(&app, &mut model, 1);
    assert_eq!(
        requests[0].url,
        "https://proxy.example.com/v1beta/models/gemini-3-flash-preview:generateContent"
    );
}
