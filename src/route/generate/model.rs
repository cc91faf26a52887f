use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct GenerateInput {
	/// Link to the video to turn into a blog article.
	#[validate(url, length(max = 2048))]
	pub link: String,
}

#[derive(Serialize, JsonSchema)]
pub struct GenerateOutput {
	/// The generated article, also stored as a new post.
	pub content: String,
}
