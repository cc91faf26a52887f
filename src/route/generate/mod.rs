use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, pipeline, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<pipeline::Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/", post_with(generate, generate_docs))
}

/// Only the failing stage is shown to the client, the cause is logged.
impl error::ErrorShape for pipeline::Error {
	fn status(&self) -> StatusCode {
		StatusCode::INTERNAL_SERVER_ERROR
	}

	fn message(&self) -> error::Message {
		error::Message::new(match self {
			Self::Video(..) => "Failed to fetch video",
			Self::Transcription(..) => "Failed to get transcript",
			Self::Generation(..) => "Failed to generate blog article",
		})
	}
}
