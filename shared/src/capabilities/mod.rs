mod http;

pub use self::http::{
    response_body, validate_header_value, HttpError, HttpOutcome, ValidatedUrl,
    MAX_RESPONSE_BODY_SIZE,
};

pub use crux_core::render::Render;
pub use crux_http::Http;

// Older effect derives look up `App` by name in this scope.
#[allow(unused_imports)]
use crate::app::App;
use crate::event::Event;

pub type AppHttp = Http<Event>;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
}
