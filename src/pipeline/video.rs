use std::{
	path::{Path, PathBuf},
	process::Stdio,
};

use tempfile::TempPath;
use tokio::process::Command;
use uuid::Uuid;

/// Extension of the audio files produced by [`YtDlp::download_audio`].
pub const AUDIO_EXTENSION: &str = "mp3";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to run yt-dlp: {0}")]
	Io(#[from] std::io::Error),
	#[error("yt-dlp exited with {status}: {stderr}")]
	Command { status: String, stderr: String },
	#[error("video has no title")]
	MissingTitle,
	#[error("expected audio file at {0}")]
	MissingAudio(PathBuf),
}

/// Resolves a video's metadata and downloads its audio track.
#[axum::async_trait]
pub trait VideoSource: Send + Sync {
	/// Returns the human-readable title of the video.
	async fn title(&self, link: &str) -> Result<String, Error>;

	/// Downloads the audio track of the video, returning the path to the audio file.
	async fn download_audio(&self, link: &str) -> Result<PathBuf, Error>;
}

/// A [`VideoSource`] backed by the `yt-dlp` command line tool.
///
/// Audio is converted to mp3 by yt-dlp itself, which requires `ffmpeg`
/// to be installed next to it.
pub struct YtDlp {
	program: String,
	media_root: PathBuf,
}

impl YtDlp {
	pub fn new(program: impl Into<String>, media_root: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			media_root: media_root.into(),
		}
	}

	/// Runs yt-dlp with `args`, returning its stdout.
	///
	/// The link is always passed after `--` so it can never be read as an option.
	async fn run(&self, args: &[&str], link: &str) -> Result<String, Error> {
		let output = Command::new(&self.program)
			.args(args)
			.arg("--")
			.arg(link)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.output()
			.await?;

		if !output.status.success() {
			return Err(Error::Command {
				status: output.status.to_string(),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
			});
		}

		Ok(String::from_utf8_lossy(&output.stdout).into_owned())
	}

	fn audio_path(&self, id: Uuid) -> PathBuf {
		self.media_root
			.join(id.to_string())
			.with_extension(AUDIO_EXTENSION)
	}
}

#[axum::async_trait]
impl VideoSource for YtDlp {
	#[tracing::instrument(skip(self))]
	async fn title(&self, link: &str) -> Result<String, Error> {
		let stdout = self
			.run(
				&["--no-playlist", "--skip-download", "--print", "title"],
				link,
			)
			.await?;

		let title = stdout.lines().next().unwrap_or_default().trim();

		if title.is_empty() {
			return Err(Error::MissingTitle);
		}

		Ok(title.to_owned())
	}

	#[tracing::instrument(skip(self))]
	async fn download_audio(&self, link: &str) -> Result<PathBuf, Error> {
		tokio::fs::create_dir_all(&self.media_root).await?;

		let id = Uuid::new_v4();
		let template = self.media_root.join(format!("{id}.%(ext)s"));
		let template = template.to_string_lossy();
		let mut partial = PartialDownload::new(&self.media_root, id);

		self.run(
			&[
				"--no-playlist",
				"--quiet",
				"--format",
				"bestaudio",
				"--extract-audio",
				"--audio-format",
				AUDIO_EXTENSION,
				"--output",
				&template,
			],
			link,
		)
		.await?;

		let path = self.audio_path(id);

		if !tokio::fs::try_exists(&path).await? {
			return Err(Error::MissingAudio(path));
		}

		partial.completed = true;

		tracing::debug!(path = %path.display(), "downloaded audio");

		Ok(path)
	}
}

/// Removes a downloaded audio file, logging instead of failing.
pub fn remove_audio(audio: TempPath) {
	let path = audio.to_path_buf();

	if let Err(error) = audio.close() {
		tracing::warn!(path = %path.display(), %error, "failed to remove audio file");
	}
}

/// Removes the `<id>.*` files of a download when dropped, unless it completed.
///
/// yt-dlp leaves `.part` and intermediate files behind when it fails or is killed.
struct PartialDownload<'a> {
	media_root: &'a Path,
	prefix: String,
	completed: bool,
}

impl<'a> PartialDownload<'a> {
	fn new(media_root: &'a Path, id: Uuid) -> Self {
		Self {
			media_root,
			prefix: format!("{id}."),
			completed: false,
		}
	}
}

impl Drop for PartialDownload<'_> {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		let Ok(entries) = std::fs::read_dir(self.media_root) else {
			return;
		};

		for entry in entries.filter_map(Result::ok) {
			if !entry.file_name().to_string_lossy().starts_with(&self.prefix) {
				continue;
			}

			if let Err(error) = std::fs::remove_file(entry.path()) {
				tracing::warn!(path = %entry.path().display(), %error, "failed to remove partial download");
			}
		}
	}
}

#[cfg(all(test, unix))]
mod test {
	use std::{os::unix::fs::PermissionsExt, path::Path};

	use super::{Error, VideoSource, YtDlp};

	/// Behaves like yt-dlp for the arguments the wrapper passes.
	const STUB: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
	case "$1" in
		--print) echo "Never Gonna Give You Up"; exit 0 ;;
		--output) out="$2"; shift ;;
		--) break ;;
	esac
	shift
done
touch "$(echo "$out" | sed 's/%(ext)s/mp3/')"
"#;

	const FAILING: &str = "#!/bin/sh\necho 'ERROR: Unsupported URL' >&2\nexit 1\n";

	/// Starts writing the download, then dies like an interrupted yt-dlp.
	const INTERRUPTED: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
	case "$1" in
		--output) out="$2"; shift ;;
		--) break ;;
	esac
	shift
done
touch "$(echo "$out" | sed 's/%(ext)s/webm.part/')"
touch "$(echo "$out" | sed 's/%(ext)s/webm/')"
exit 1
"#;

	fn script(dir: &Path, name: &str, body: &str) -> String {
		let path = dir.join(name);

		std::fs::write(&path, body).unwrap();
		std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

		path.to_string_lossy().into_owned()
	}

	#[tokio::test]
	async fn test_yt_dlp() {
		let dir = tempfile::tempdir().unwrap();
		let stub = script(dir.path(), "yt-dlp", STUB);
		let failing = script(dir.path(), "yt-dlp-failing", FAILING);
		let media = dir.path().join("media");

		let source = YtDlp::new(stub, &media);
		let link = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

		assert_eq!(
			source.title(link).await.unwrap(),
			"Never Gonna Give You Up"
		);

		let audio = source.download_audio(link).await.unwrap();

		assert!(audio.starts_with(&media));
		assert_eq!(audio.extension().unwrap(), "mp3");
		assert!(audio.exists());

		let source = YtDlp::new(failing, &media);

		match source.title("https://example.com/nothing").await {
			Err(Error::Command { stderr, .. }) => assert_eq!(stderr, "ERROR: Unsupported URL"),
			other => panic!("expected a command error, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_failed_download_leaves_no_files() {
		let dir = tempfile::tempdir().unwrap();
		let interrupted = script(dir.path(), "yt-dlp", INTERRUPTED);
		let media = dir.path().join("media");

		let source = YtDlp::new(interrupted, &media);

		assert!(matches!(
			source.download_audio("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await,
			Err(Error::Command { .. })
		));
		assert_eq!(std::fs::read_dir(&media).unwrap().count(), 0);
	}
}
