use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_user_posts, get_user_posts_docs))
		.api_route("/:id", get_with(get_post, get_post_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn message(&self) -> error::Message {
		match self {
			Self::UnknownPost(post) => error::Message::new("Post not found")
				.field("id")
				.detail("post", post.to_string()),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	async fn generate(app: &TestServer, link: &str) {
		let response = app.post("/generate").json(&json!({ "link": link })).await;

		assert_eq!(response.status_code(), StatusCode::OK);
	}

	#[sqlx::test]
	async fn test_list_only_own_posts(pool: Database) {
		let alice = app(pool.clone());
		let bob = app(pool);

		signup(&alice, "alice").await;
		signup(&bob, "bob").await;

		generate(&alice, "https://www.youtube.com/watch?v=a").await;
		generate(&alice, "https://www.youtube.com/watch?v=b").await;
		generate(&bob, "https://www.youtube.com/watch?v=c").await;

		let posts = alice.get("/posts").await.json::<Vec<serde_json::Value>>();

		assert_eq!(posts.len(), 2);
		assert_eq!(posts[0]["youtube_link"], "https://www.youtube.com/watch?v=b");
		assert_eq!(posts[1]["youtube_link"], "https://www.youtube.com/watch?v=a");
	}

	#[sqlx::test]
	async fn test_other_users_post_redirects(pool: Database) {
		let alice = app(pool.clone());
		let bob = app(pool);

		signup(&alice, "alice").await;
		signup(&bob, "bob").await;

		generate(&alice, "https://www.youtube.com/watch?v=a").await;

		let posts = alice.get("/posts").await.json::<Vec<serde_json::Value>>();
		let id = posts[0]["id"].as_str().unwrap().to_owned();

		let response = alice.get(&format!("/posts/{id}")).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<serde_json::Value>()["generated_content"], ARTICLE);

		let response = bob.get(&format!("/posts/{id}")).await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header("location"), "/");
		assert!(!response.text().contains(ARTICLE));
	}

	#[sqlx::test]
	async fn test_unknown_post(pool: Database) {
		let app = app(pool);
		signup(&app, "alice").await;

		let response = app.get(&format!("/posts/{}", uuid::Uuid::new_v4())).await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

		let response = app.get("/posts/not-a-uuid").await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
	}
}
