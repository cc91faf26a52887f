use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::extract::Json;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// The body of every error response.
///
/// Only [`Message::content`] is guaranteed to be present, the other
/// fields are omitted when empty.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	/// A human-readable description of what went wrong.
	#[serde(rename = "error")]
	pub content: Cow<'static, str>,
	/// The input field that caused the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'static, str>>,
	/// Additional machine-readable context.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Message {
	pub fn new(content: impl Into<Cow<'static, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'static, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}
}

/// Describes how a route-specific error is presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn message(&self) -> Message;
}

/// Errors shared by every route, mostly produced by extractors.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid json body")]
	Json,
	#[error("form error: {0}")]
	Form(#[from] rejection::FormRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("method not allowed")]
	MethodNotAllowed,
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(_: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Json
	}
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json | Self::Form(..) | Self::Path(..) => StatusCode::BAD_REQUEST,
			Self::Database(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
		}
	}

	pub fn message(&self) -> Message {
		match self {
			Self::Validation(errors) => errors.field_errors().into_iter().fold(
				Message::new("Invalid data sent"),
				|message, (field, errors)| {
					let codes = errors
						.iter()
						.map(|error| error.code.to_string())
						.collect::<Vec<_>>();

					message.detail(field, codes)
				},
			),
			Self::Json | Self::Form(..) | Self::Path(..) => Message::new("Invalid data sent"),
			Self::Database(..) => Message::new("Internal server error"),
			Self::MethodNotAllowed => Message::new("Invalid request method"),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		} else {
			tracing::debug!(error = %self, "request rejected");
		}

		(status, Json(self.message())).into_response()
	}
}

/// An error returned from a route handler.
///
/// `T` is the error type of the route module, anything else
/// is handled by [`AppError`].
#[derive(Debug)]
pub enum RouteError<T> {
	App(AppError),
	Route(T),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<sqlx::Error> for RouteError<T> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(AppError::Database(error))
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(error = %error, "request failed");
				}

				(status, Json(error.message())).into_response()
			}
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = Message;
}
