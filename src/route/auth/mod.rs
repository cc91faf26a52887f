use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid username or password")]
	InvalidUsernameOrPassword,
	#[error("Passwords do not match")]
	PasswordMismatch,
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
	#[error("No session cookie")]
	NoSessionCookie,
	#[error("Invalid session cookie")]
	InvalidSessionCookie,
	#[error("Username already taken")]
	UsernameTaken,
	#[error("Email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/signup", post_with(signup, signup_docs))
		.api_route("/logout", get_with(logout, logout_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword | Self::NoSessionCookie | Self::InvalidSessionCookie => {
				StatusCode::UNAUTHORIZED
			}
			Self::PasswordMismatch => StatusCode::BAD_REQUEST,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn message(&self) -> error::Message {
		match self {
			Self::Argon(..) => error::Message::new("Error creating account"),
			Self::PasswordMismatch => error::Message::new(self.to_string()).field("repeatPassword"),
			Self::UsernameTaken => error::Message::new(self.to_string()).field("username"),
			Self::EmailTaken => error::Message::new(self.to_string()).field("email"),
			_ => error::Message::new(self.to_string()),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_signup_flow(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/auth/signup")
			.form(&json!({
				"username": "john",
				"email": "john@smith.com",
				"password": "hunter2hunter",
				"repeatPassword": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header("location"), "/");
		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = app.get("/").await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let user = response.json::<serde_json::Value>();

		assert_eq!(user["username"], "john");
		assert_eq!(user["email"], "john@smith.com");
		assert!(user.get("password").is_none());

		let response = app.get("/auth/logout").await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

		let response = app.get("/").await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

		let response = app
			.post("/auth/login")
			.form(&json!({
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

		let response = app.get("/").await;

		assert_eq!(response.status_code(), StatusCode::OK);
	}

	#[sqlx::test]
	async fn test_signup_password_mismatch(pool: Database) {
		let app = app(pool.clone());

		let response = app
			.post("/auth/signup")
			.form(&json!({
				"username": "john",
				"email": "john@smith.com",
				"password": "hunter2hunter",
				"repeatPassword": "hunter3hunter",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(
			response.json::<serde_json::Value>()["error"],
			"Passwords do not match"
		);

		let users = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "user""#)
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(users, 0);
	}

	#[sqlx::test]
	async fn test_signup_username_taken(pool: Database) {
		signup(&app(pool.clone()), "john").await;

		let response = app(pool)
			.post("/auth/signup")
			.form(&json!({
				"username": "john",
				"email": "other@smith.com",
				"password": "hunter2hunter",
				"repeatPassword": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::CONFLICT);
		assert_eq!(
			response.json::<serde_json::Value>()["error"],
			"Username already taken"
		);
	}

	#[sqlx::test]
	async fn test_login_wrong_password(pool: Database) {
		signup(&app(pool.clone()), "john").await;

		let app = app(pool);
		let response = app
			.post("/auth/login")
			.form(&json!({
				"username": "john",
				"password": "not-the-password",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			response.json::<serde_json::Value>()["error"],
			"Invalid username or password"
		);
	}
}
