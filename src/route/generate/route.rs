use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	route::post::model::Post,
	AppState,
};

use super::{model, RouteError};

/// Generate blog post
/// Transcribes the linked video and writes a blog article from it. The article is saved as a new post owned by you.
#[route(tag = tag::GENERATE)]
pub async fn generate(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::GenerateInput>,
) -> Result<Json<model::GenerateOutput>, RouteError> {
	let article = state.pipeline.run(&input.link).await?;

	let post = Post::create(
		&state.database,
		session.user.id,
		&article.title,
		&input.link,
		&article.content,
	)
	.await?;

	tracing::info!(post = %post.id, user = %session.user.id, "generated post");

	Ok(Json(model::GenerateOutput {
		content: post.generated_content,
	}))
}
