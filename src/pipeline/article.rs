use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("provider responded with {status}: {body}")]
	Api { status: u16, body: String },
	#[error("completion is empty")]
	Empty,
}

/// Builds the instruction sent to the text-generation provider.
pub fn prompt(transcript: &str) -> String {
	format!(
		"Based on the following transcript from a YouTube video, write a comprehensive blog article. \
		 Ensure it reads as a proper blog article and not like a video transcript:\n\n{transcript}\n\nArticle:"
	)
}

/// Turns a transcript into blog prose.
#[axum::async_trait]
pub trait ArticleWriter: Send + Sync {
	/// Returns the generated article with surrounding whitespace removed.
	async fn write(&self, transcript: &str) -> Result<String, Error>;
}

/// An [`ArticleWriter`] backed by the OpenAI completions API.
pub struct OpenAi {
	client: reqwest::Client,
	api_key: String,
	base_url: String,
	model: String,
	max_tokens: u32,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
	model: &'a str,
	prompt: String,
	max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
	choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
	text: String,
}

impl OpenAi {
	pub fn new(
		api_key: impl Into<String>,
		base_url: impl Into<String>,
		model: impl Into<String>,
		max_tokens: u32,
	) -> Self {
		Self {
			client: reqwest::Client::new(),
			api_key: api_key.into(),
			base_url: base_url.into().trim_end_matches('/').to_owned(),
			model: model.into(),
			max_tokens,
		}
	}
}

#[axum::async_trait]
impl ArticleWriter for OpenAi {
	#[tracing::instrument(skip_all, fields(model = %self.model))]
	async fn write(&self, transcript: &str) -> Result<String, Error> {
		let response = self
			.client
			.post(format!("{}/v1/completions", self.base_url))
			.bearer_auth(&self.api_key)
			.json(&CompletionRequest {
				model: &self.model,
				prompt: prompt(transcript),
				max_tokens: self.max_tokens,
			})
			.send()
			.await?;

		let status = response.status();

		if !status.is_success() {
			return Err(Error::Api {
				status: status.as_u16(),
				body: response.text().await.unwrap_or_default(),
			});
		}

		let completion: CompletionResponse = response.json().await?;
		let text = completion
			.choices
			.into_iter()
			.next()
			.map(|choice| choice.text.trim().to_owned())
			.unwrap_or_default();

		if text.is_empty() {
			return Err(Error::Empty);
		}

		Ok(text)
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;
	use wiremock::{
		matchers::{body_partial_json, header, method, path},
		Mock, MockServer, ResponseTemplate,
	};

	use super::{prompt, ArticleWriter, Error, OpenAi};

	#[test]
	fn test_prompt_wraps_transcript() {
		let prompt = prompt("we talk about rust");

		assert!(prompt.starts_with("Based on the following transcript from a YouTube video"));
		assert!(prompt.contains("\n\nwe talk about rust\n\n"));
		assert!(prompt.ends_with("Article:"));
	}

	#[tokio::test]
	async fn test_write_strips_completion() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/completions"))
			.and(header("authorization", "Bearer sk-test"))
			.and(body_partial_json(json!({
				"model": "gpt-3.5-turbo-instruct",
				"max_tokens": 1000,
				"prompt": prompt("a transcript"),
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"choices": [{ "text": "\n\n# A Blog Post\n\nBody.  \n" }],
			})))
			.expect(1)
			.mount(&server)
			.await;

		let writer = OpenAi::new("sk-test", server.uri(), "gpt-3.5-turbo-instruct", 1000);

		assert_eq!(
			writer.write("a transcript").await.unwrap(),
			"# A Blog Post\n\nBody."
		);
	}

	#[tokio::test]
	async fn test_write_without_choices() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/completions"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
			.mount(&server)
			.await;

		let writer = OpenAi::new("sk-test", server.uri(), "gpt-3.5-turbo-instruct", 1000);

		assert!(matches!(writer.write("text").await, Err(Error::Empty)));
	}

	#[tokio::test]
	async fn test_write_quota_exceeded() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v1/completions"))
			.respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
			.mount(&server)
			.await;

		let writer = OpenAi::new("sk-test", server.uri(), "gpt-3.5-turbo-instruct", 1000);

		match writer.write("text").await {
			Err(Error::Api { status, .. }) => assert_eq!(status, 429),
			other => panic!("expected an api error, got {other:?}"),
		}
	}
}
