use aide::axum::{routing::get_with, ApiRouter};
use axum::{
	http::{header, StatusCode},
	response::{IntoResponse, Response},
};
use macros::route;

use crate::{
	error::AppError,
	extract::{Json, Session},
	openapi::tag,
	AppState,
};

pub mod auth;
pub mod docs;
pub mod generate;
pub mod model;
pub mod post;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route("/", get_with(index, index_docs))
		.nest("/auth", auth::routes())
		.nest("/generate", generate::routes())
		.nest("/posts", post::routes())
		.nest_api_service("/docs", docs::routes())
}

/// Home page
/// Returns the authenticated user. This is where every redirect lands.
#[route(tag = tag::AUTH)]
pub async fn index(session: Session) -> Json<auth::model::User> {
	Json(session.user)
}

/// Replaces the empty body of a 405 from the router with an error message.
///
/// Headers of the original response, such as `Allow`, are kept unless the
/// error message sets them itself.
pub async fn method_not_allowed(response: Response) -> Response {
	if response.status() != StatusCode::METHOD_NOT_ALLOWED {
		return response;
	}

	let mut replaced = AppError::MethodNotAllowed.into_response();
	let headers = replaced.headers_mut();

	for (name, value) in response.headers() {
		if name != header::CONTENT_LENGTH && !headers.contains_key(name) {
			headers.append(name, value.clone());
		}
	}

	replaced
}
