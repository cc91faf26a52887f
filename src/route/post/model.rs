use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

use crate::Database;

pub use crate::route::model::IdInput;

/// A blog article generated from a video, owned by the user who submitted it.
#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	pub id: Uuid,
	/// The user that generated the post.
	#[serde(skip)]
	pub user_id: Uuid,
	/// The title of the source video.
	pub youtube_title: String,
	/// The link that was submitted.
	pub youtube_link: String,
	/// The generated article.
	pub generated_content: String,
	/// The creation time of the post.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Post {
	pub async fn create(
		database: &Database,
		user_id: Uuid,
		title: &str,
		link: &str,
		content: &str,
	) -> Result<Self, sqlx::Error> {
		sqlx::query_as(
			r#"
				INSERT INTO post (id, user_id, youtube_title, youtube_link, generated_content)
				VALUES (DEFAULT, $1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(user_id)
		.bind(title)
		.bind(link)
		.bind(content)
		.fetch_one(database)
		.await
	}

	/// Returns every post owned by `user_id`, newest first.
	pub async fn list(database: &Database, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
		sqlx::query_as(
			r#"
				SELECT * FROM post
				WHERE user_id = $1
				ORDER BY created_at DESC
			"#,
		)
		.bind(user_id)
		.fetch_all(database)
		.await
	}

	/// Returns the post regardless of its owner. Check [`Post::is_owned_by`]
	/// before showing it to anyone.
	pub async fn find(database: &Database, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
		sqlx::query_as("SELECT * FROM post WHERE id = $1")
			.bind(id)
			.fetch_optional(database)
			.await
	}

	pub fn is_owned_by(&self, user_id: Uuid) -> bool {
		self.user_id == user_id
	}
}
