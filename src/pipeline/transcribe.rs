use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to read audio file: {0}")]
	Io(#[from] std::io::Error),
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("provider responded with {status}: {body}")]
	Api { status: u16, body: String },
	#[error("transcription failed: {0}")]
	Failed(String),
	#[error("transcript is empty")]
	Empty,
}

/// Turns an audio file into text.
#[axum::async_trait]
pub trait Transcriber: Send + Sync {
	/// Returns the full transcript of the audio file, waiting for it to complete.
	async fn transcribe(&self, audio: &Path) -> Result<String, Error>;
}

/// A [`Transcriber`] backed by the AssemblyAI REST API.
pub struct AssemblyAi {
	client: reqwest::Client,
	api_key: String,
	base_url: String,
	poll_interval: Duration,
}

#[derive(Deserialize)]
struct UploadResponse {
	upload_url: String,
}

#[derive(Serialize)]
struct TranscriptRequest<'a> {
	audio_url: &'a str,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Status {
	Queued,
	Processing,
	Completed,
	Error,
}

#[derive(Deserialize)]
struct Transcript {
	id: String,
	status: Status,
	text: Option<String>,
	error: Option<String>,
}

impl AssemblyAi {
	pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, poll_interval: Duration) -> Self {
		Self {
			client: reqwest::Client::new(),
			api_key: api_key.into(),
			base_url: base_url.into().trim_end_matches('/').to_owned(),
			poll_interval,
		}
	}

	/// Sends a request with the API key attached, rejecting non-success statuses.
	async fn send<T>(&self, request: reqwest::RequestBuilder) -> Result<T, Error>
	where
		T: serde::de::DeserializeOwned,
	{
		let response = request
			.header(reqwest::header::AUTHORIZATION, &self.api_key)
			.send()
			.await?;

		let status = response.status();

		if !status.is_success() {
			return Err(Error::Api {
				status: status.as_u16(),
				body: response.text().await.unwrap_or_default(),
			});
		}

		Ok(response.json().await?)
	}

	/// Streams the audio file to the provider, returning the url it is stored at.
	async fn upload(&self, audio: &Path) -> Result<String, Error> {
		let file = tokio::fs::File::open(audio).await?;
		let size = file.metadata().await?.len();

		tracing::debug!(size, "uploading audio");

		let response: UploadResponse = self
			.send(
				self.client
					.post(format!("{}/v2/upload", self.base_url))
					.header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
					.header(reqwest::header::CONTENT_LENGTH, size)
					.body(reqwest::Body::from(file)),
			)
			.await?;

		Ok(response.upload_url)
	}
}

#[axum::async_trait]
impl Transcriber for AssemblyAi {
	#[tracing::instrument(skip(self))]
	async fn transcribe(&self, audio: &Path) -> Result<String, Error> {
		let audio_url = self.upload(audio).await?;

		let mut transcript: Transcript = self
			.send(
				self.client
					.post(format!("{}/v2/transcript", self.base_url))
					.json(&TranscriptRequest {
						audio_url: &audio_url,
					}),
			)
			.await?;

		let url = format!("{}/v2/transcript/{}", self.base_url, transcript.id);

		loop {
			match transcript.status {
				Status::Completed => break,
				Status::Error => {
					return Err(Error::Failed(transcript.error.unwrap_or_default()));
				}
				Status::Queued | Status::Processing => {
					tokio::time::sleep(self.poll_interval).await;
					transcript = self.send(self.client.get(&url)).await?;
				}
			}
		}

		let text = transcript.text.unwrap_or_default();

		if text.trim().is_empty() {
			return Err(Error::Empty);
		}

		Ok(text)
	}
}

#[cfg(test)]
mod test {
	use std::time::Duration;

	use serde_json::json;
	use wiremock::{
		matchers::{body_bytes, body_json, header, method, path},
		Mock, MockServer, ResponseTemplate,
	};

	use super::{AssemblyAi, Error, Transcriber};

	const KEY: &str = "test-key";
	const AUDIO: &[u8] = b"ID3 audio";

	async fn audio() -> tempfile::NamedTempFile {
		let file = tempfile::NamedTempFile::new().unwrap();

		tokio::fs::write(file.path(), AUDIO).await.unwrap();
		file
	}

	async fn mount_upload(server: &MockServer) {
		Mock::given(method("POST"))
			.and(path("/v2/upload"))
			.and(header("authorization", KEY))
			.and(body_bytes(AUDIO.to_vec()))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(json!({ "upload_url": "https://cdn.example/abc" })),
			)
			.mount(server)
			.await;

		Mock::given(method("POST"))
			.and(path("/v2/transcript"))
			.and(body_json(json!({ "audio_url": "https://cdn.example/abc" })))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({ "id": "t1", "status": "queued" })),
			)
			.mount(server)
			.await;
	}

	#[tokio::test]
	async fn test_transcribe_polls_until_completed() {
		let server = MockServer::start().await;
		mount_upload(&server).await;

		Mock::given(method("GET"))
			.and(path("/v2/transcript/t1"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"id": "t1",
				"status": "completed",
				"text": "hello and welcome to the channel",
			})))
			.expect(1)
			.mount(&server)
			.await;

		let file = audio().await;
		let client = AssemblyAi::new(KEY, server.uri(), Duration::ZERO);

		assert_eq!(
			client.transcribe(file.path()).await.unwrap(),
			"hello and welcome to the channel"
		);
	}

	#[tokio::test]
	async fn test_transcribe_provider_error() {
		let server = MockServer::start().await;
		mount_upload(&server).await;

		Mock::given(method("GET"))
			.and(path("/v2/transcript/t1"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"id": "t1",
				"status": "error",
				"error": "audio has no speech",
			})))
			.mount(&server)
			.await;

		let file = audio().await;
		let client = AssemblyAi::new(KEY, server.uri(), Duration::ZERO);

		match client.transcribe(file.path()).await {
			Err(Error::Failed(message)) => assert_eq!(message, "audio has no speech"),
			other => panic!("expected a failed transcript, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_transcribe_rejected_key() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(path("/v2/upload"))
			.respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
			.mount(&server)
			.await;

		let file = audio().await;
		let client = AssemblyAi::new("wrong", server.uri(), Duration::ZERO);

		match client.transcribe(file.path()).await {
			Err(Error::Api { status, body }) => {
				assert_eq!(status, 401);
				assert_eq!(body, "invalid api key");
			}
			other => panic!("expected an api error, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_transcribe_empty_text() {
		let server = MockServer::start().await;
		mount_upload(&server).await;

		Mock::given(method("GET"))
			.and(path("/v2/transcript/t1"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"id": "t1",
				"status": "completed",
				"text": "  ",
			})))
			.mount(&server)
			.await;

		let file = audio().await;
		let client = AssemblyAi::new(KEY, server.uri(), Duration::ZERO);

		assert!(matches!(
			client.transcribe(file.path()).await,
			Err(Error::Empty)
		));
	}
}
