use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::header,
	response::{IntoResponse, Redirect, Response},
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Form, Session},
	openapi::tag,
	session, AppState, Database,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
/// Since this is only used for logging in and creating a new password,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Opens a session for the user and sends them to the home page with its cookie.
async fn start_session(database: &Database, user_id: Uuid) -> Result<Response, RouteError> {
	let session_id = sqlx::query_scalar::<_, Uuid>(
		"INSERT INTO session (user_id) VALUES ($1) RETURNING id",
	)
	.bind(user_id)
	.fetch_one(database)
	.await?;

	let cookie = session::create_cookie(session_id);

	Ok((
		[(header::SET_COOKIE, cookie.to_string())],
		Redirect::to("/"),
	)
		.into_response())
}

/// Log in
/// Logs in with a username and password, setting a session cookie and redirecting to the home page.
#[route(tag = tag::AUTH, response(status = 303, description = "Logged in, redirecting to the home page."))]
pub async fn login(
	State(state): State<AppState>,
	Form(auth): Form<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user = sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" WHERE username = $1"#)
		.bind(&auth.username)
		.fetch_optional(&state.database)
		.await?;

	let Some(user) = user else {
		return Err(Error::InvalidUsernameOrPassword.into());
	};

	let hashed = hash_password(&state.hasher, &auth.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		return Err(Error::InvalidUsernameOrPassword.into());
	}

	tracing::info!(user = %user.id, "user logged in");

	start_session(&state.database, user.id).await
}

/// Log out
/// Logs out of the authenticated account and redirects to the home page.
#[route(tag = tag::AUTH, response(status = 303, description = "Logged out, redirecting to the home page."))]
pub async fn logout(
	State(database): State<Database>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	sqlx::query("DELETE FROM session WHERE id = $1")
		.bind(session.id)
		.execute(&database)
		.await?;

	// Clear the session cookie
	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		Redirect::to("/"),
	)
		.into_response())
}

/// Sign up
/// Creates a new account, then logs in to it and redirects to the home page.
#[route(tag = tag::AUTH, response(status = 303, description = "Signed up, redirecting to the home page."))]
pub async fn signup(
	State(state): State<AppState>,
	Form(auth): Form<model::SignupInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	if auth.password != auth.repeat_password {
		return Err(Error::PasswordMismatch.into());
	}

	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &auth.password, &user_id).map_err(Error::Argon)?;

	sqlx::query(
		r#"
			INSERT INTO "user" (id, email, username, password) VALUES ($1, $2, $3, $4)
		"#,
	)
	.bind(user_id)
	.bind(&auth.email)
	.bind(&auth.username)
	.bind(&hashed[..])
	.execute(&state.database)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) => match d.constraint() {
			Some("user_email_key") => Error::EmailTaken.into(),
			Some("user_username_key") => Error::UsernameTaken.into(),
			_ => RouteError::from(e),
		},
		e => RouteError::from(e),
	})?;

	tracing::info!(user = %user_id, "user signed up");

	start_session(&state.database, user_id).await
}
