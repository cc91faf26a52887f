use aide::axum::IntoApiResponse;
use axum::{
	extract::State,
	response::{IntoResponse, Redirect},
};
use macros::route;

use crate::{
	extract::{Json, Path, Session},
	openapi::tag,
	Database,
};

use super::{model, Error, RouteError};

/// Get own posts
/// Returns every post you generated, newest first.
#[route(tag = tag::POST)]
pub async fn get_user_posts(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let posts = model::Post::list(&database, session.user.id).await?;

	Ok(Json(posts))
}

/// Get single post
/// Returns one of your posts by its unique id. Posts owned by someone else redirect to the home page.
#[route(tag = tag::POST, response(status = 200, shape = "Json<model::Post>"), response(status = 303, description = "The post belongs to another user."))]
pub async fn get_post(
	State(database): State<Database>,
	session: Session,
	Path(path): Path<model::IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = model::Post::find(&database, path.id)
		.await?
		.ok_or(Error::UnknownPost(path.id))?;

	if !post.is_owned_by(session.user.id) {
		tracing::warn!(post = %post.id, user = %session.user.id, "denied access to post");

		return Ok(Redirect::to("/").into_response());
	}

	Ok(Json(post).into_response())
}
