#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod openapi;
mod pipeline;
mod route;
mod session;
mod trace;

use std::sync::Arc;

use aide::openapi::OpenApi;
use argon2::Argon2;
use axum::{extract::Request, middleware, Extension, Router, ServiceExt};
use tower::Layer;
use tower_http::{
	compression::CompressionLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use config::Config;
use pipeline::Pipeline;

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// Everything in here is cheap to clone: the pool and the pipeline
/// are reference-counted.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub pipeline: Pipeline,
}

/// Builds the router with its documentation and middleware.
pub fn app(state: State) -> Router {
	let mut api = OpenApi::default();

	route::routes()
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(middleware::map_response(route::method_not_allowed))
		.layer(CompressionLayer::new())
		.layer(TraceLayer::new_for_http())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

#[tokio::main]
async fn main() {
	let config = Config::from_env().expect("failed to read configuration from the environment");
	let _guard = trace::init_tracing_subscriber(config.otlp_endpoint.as_deref());

	let database = Database::connect(&config.database_url)
		.await
		.expect("failed to connect to database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let state = State {
		database,
		hasher: Argon2::default(),
		pipeline: Pipeline::from_config(&config),
	};

	let app = NormalizePathLayer::trim_trailing_slash().layer(app(state));

	let listener = tokio::net::TcpListener::bind((config.host, config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
		.await
		.expect("server error");
}
