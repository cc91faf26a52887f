//! Turns a video link into a blog article.
//!
//! Each stage is a trait so the providers can be swapped out, which is
//! how the route tests run without network access.

pub mod article;
pub mod transcribe;
pub mod video;

use std::{sync::Arc, time::Instant};

use tempfile::TempPath;

pub use article::{ArticleWriter, OpenAi};
pub use transcribe::{AssemblyAi, Transcriber};
pub use video::{VideoSource, YtDlp};

use crate::config::Config;

/// The stage of the pipeline that failed, along with its cause.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to fetch video: {0}")]
	Video(#[from] video::Error),
	#[error("failed to transcribe audio: {0}")]
	Transcription(#[from] transcribe::Error),
	#[error("failed to generate article: {0}")]
	Generation(#[from] article::Error),
}

/// The result of a successful run.
#[derive(Debug)]
pub struct Article {
	pub title: String,
	pub content: String,
}

#[derive(Clone)]
pub struct Pipeline {
	video: Arc<dyn VideoSource>,
	transcriber: Arc<dyn Transcriber>,
	writer: Arc<dyn ArticleWriter>,
}

/// Records how long a stage took as a metric.
fn record_stage(stage: &'static str, started: Instant) {
	let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

	tracing::info!(histogram.pipeline_stage_ms = elapsed, stage, "stage finished");
}

impl Pipeline {
	pub fn new(
		video: impl VideoSource + 'static,
		transcriber: impl Transcriber + 'static,
		writer: impl ArticleWriter + 'static,
	) -> Self {
		Self {
			video: Arc::new(video),
			transcriber: Arc::new(transcriber),
			writer: Arc::new(writer),
		}
	}

	/// Creates the production pipeline from the process configuration.
	pub fn from_config(config: &Config) -> Self {
		Self::new(
			YtDlp::new(&config.yt_dlp_path, &config.media_root),
			AssemblyAi::new(
				&config.assemblyai_api_key,
				&config.assemblyai_base_url,
				config.transcript_poll_interval(),
			),
			OpenAi::new(
				&config.openai_api_key,
				&config.openai_base_url,
				&config.openai_model,
				config.openai_max_tokens,
			),
		)
	}

	/// Runs every stage in order for a single link.
	///
	/// The downloaded audio is removed once transcription is over,
	/// whether or not it succeeded, and when the returned future is
	/// dropped before that.
	#[tracing::instrument(skip(self))]
	pub async fn run(&self, link: &str) -> Result<Article, Error> {
		let started = Instant::now();
		let title = self.video.title(link).await?;
		let audio = TempPath::from_path(self.video.download_audio(link).await?);
		record_stage("video", started);

		let started = Instant::now();
		let transcript = self.transcriber.transcribe(&audio).await;
		video::remove_audio(audio);

		let transcript = transcript?;
		if transcript.trim().is_empty() {
			return Err(transcribe::Error::Empty.into());
		}
		record_stage("transcription", started);

		let started = Instant::now();
		let content = self.writer.write(&transcript).await?;
		let content = content.trim();
		if content.is_empty() {
			return Err(article::Error::Empty.into());
		}
		record_stage("generation", started);

		Ok(Article {
			title,
			content: content.to_owned(),
		})
	}
}
