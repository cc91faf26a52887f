use std::{
	net::{IpAddr, Ipv4Addr},
	path::PathBuf,
	time::Duration,
};

use serde::Deserialize;

fn default_host() -> IpAddr {
	IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
	3000
}

fn default_assemblyai_base_url() -> String {
	"https://api.assemblyai.com".into()
}

fn default_poll_interval_ms() -> u64 {
	3000
}

fn default_openai_base_url() -> String {
	"https://api.openai.com".into()
}

fn default_openai_model() -> String {
	"gpt-3.5-turbo-instruct".into()
}

fn default_openai_max_tokens() -> u32 {
	1000
}

fn default_media_root() -> PathBuf {
	"media".into()
}

fn default_yt_dlp_path() -> String {
	"yt-dlp".into()
}

/// Process configuration, read once from the environment at startup.
///
/// Each field maps to the upper-case environment variable of the same name,
/// e.g. `openai_api_key` is read from `OPENAI_API_KEY`.
#[derive(Deserialize)]
pub struct Config {
	pub database_url: String,
	#[serde(default = "default_host")]
	pub host: IpAddr,
	#[serde(default = "default_port")]
	pub port: u16,
	/// gRPC endpoint of an OpenTelemetry collector. Export is disabled when unset.
	pub otlp_endpoint: Option<String>,

	pub assemblyai_api_key: String,
	#[serde(default = "default_assemblyai_base_url")]
	pub assemblyai_base_url: String,
	#[serde(default = "default_poll_interval_ms")]
	pub transcript_poll_interval_ms: u64,

	pub openai_api_key: String,
	#[serde(default = "default_openai_base_url")]
	pub openai_base_url: String,
	#[serde(default = "default_openai_model")]
	pub openai_model: String,
	#[serde(default = "default_openai_max_tokens")]
	pub openai_max_tokens: u32,

	/// Directory the downloaded audio is written to.
	#[serde(default = "default_media_root")]
	pub media_root: PathBuf,
	#[serde(default = "default_yt_dlp_path")]
	pub yt_dlp_path: String,
}

impl Config {
	/// Reads the configuration from the environment, after loading
	/// a `.env` file if one exists.
	pub fn from_env() -> Result<Self, envy::Error> {
		dotenvy::dotenv().ok();
		envy::from_env()
	}

	pub fn transcript_poll_interval(&self) -> Duration {
		Duration::from_millis(self.transcript_poll_interval_ms)
	}
}
