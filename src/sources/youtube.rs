use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use songbird::input::{HttpRequest, Input};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::{is_direct_link, MediaResolver, ResolvedTrack, StreamOptions, StreamQuality};
use crate::error::SourceError;

/// Resolver backed by the `yt-dlp` executable.
///
/// Metadata and searches go through `--dump-json`; streams are opened by
/// asking yt-dlp for the direct audio URL (`--get-url`) and handing it to
/// songbird as a lazy HTTP input.
pub struct YtDlpResolver {
    program: String,
    timeout: Duration,
    http: reqwest::Client,
    // Limitar procesos yt-dlp concurrentes
    rate_limiter: Semaphore,
}

/// Subset of the yt-dlp info JSON used by the bot.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: String,
    webpage_url: Option<String>,
    original_url: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
}

impl YtDlpResolver {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            http: reqwest::Client::new(),
            rate_limiter: Semaphore::new(3),
        }
    }

    /// Runs yt-dlp with the given arguments and returns its stdout.
    async fn run(&self, args: &[String]) -> Result<String, SourceError> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| SourceError::Failed(e.to_string()))?;

        debug!("🔧 {} {}", self.program, args.join(" "));

        let mut command = Command::new(&self.program);
        command.args(args).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))?
            .map_err(|e| SourceError::Failed(format!("could not run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Failed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn lookup(&self, url: &str) -> Result<ResolvedTrack, SourceError> {
        debug!("📊 Obteniendo info de: {}", url);
        let stdout = self.run(&metadata_args(url)).await?;
        first_track(&stdout, url).ok_or_else(|| SourceError::NotFound(url.to_string()))
    }

    async fn search(&self, query: &str) -> Result<ResolvedTrack, SourceError> {
        info!("🔍 Buscando: {}", query);
        let stdout = self.run(&search_args(query)).await?;
        first_track(&stdout, query).ok_or_else(|| SourceError::NotFound(query.to_string()))
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    type Stream = Input;

    async fn resolve(&self, query: &str) -> Result<ResolvedTrack, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SourceError::NotFound(String::new()));
        }

        if is_direct_link(query) {
            self.lookup(query).await
        } else {
            self.search(query).await
        }
    }

    async fn open_stream(
        &self,
        source_url: &str,
        options: StreamOptions,
    ) -> Result<Input, SourceError> {
        debug!("🎵 Obteniendo URL de stream ({:?}) para: {}", options.quality, source_url);

        let stdout = self.run(&stream_args(source_url, options)).await?;
        let stream_url = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| SourceError::Failed(format!("no stream url for {}", source_url)))?;

        let request = HttpRequest::new(self.http.clone(), stream_url.to_string());
        Ok(Input::from(request))
    }
}

fn metadata_args(url: &str) -> Vec<String> {
    vec![
        "--no-playlist".into(),
        "--dump-json".into(),
        "--no-warnings".into(),
        url.into(),
    ]
}

fn search_args(query: &str) -> Vec<String> {
    vec![
        "--no-playlist".into(),
        "--dump-json".into(),
        "--no-warnings".into(),
        format!("ytsearch1:{}", query),
    ]
}

fn stream_args(url: &str, options: StreamOptions) -> Vec<String> {
    let mut args: Vec<String> = vec!["--no-playlist".into(), "--no-warnings".into()];
    if options.quality == StreamQuality::Best {
        args.push("-f".into());
        args.push("bestaudio[ext=webm]/bestaudio[ext=m4a]/bestaudio".into());
    }
    args.push("--get-url".into());
    args.push(url.into());
    args
}

/// Takes the first parseable info line; `fallback_url` is used when yt-dlp
/// omits the page URL (generic extractor on direct files).
fn first_track(stdout: &str, fallback_url: &str) -> Option<ResolvedTrack> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<YtDlpInfo>(line).ok())
        .next()
        .map(|info| {
            let url = info
                .webpage_url
                .or(info.original_url)
                .unwrap_or_else(|| fallback_url.to_string());
            let mut track = ResolvedTrack::new(info.title, url);
            if let Some(secs) = info.duration.filter(|d| d.is_finite() && *d >= 0.0) {
                track = track.with_duration(Duration::from_secs_f64(secs));
            }
            if let Some(thumbnail) = info.thumbnail {
                track = track.with_thumbnail(thumbnail);
            }
            track
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_track_parses_info_json() {
        let stdout = r#"{"title":"Song A","webpage_url":"https://www.youtube.com/watch?v=a","duration":212.0,"thumbnail":"https://i.ytimg.com/a.jpg"}
{"title":"Song B","webpage_url":"https://www.youtube.com/watch?v=b"}"#;

        let track = first_track(stdout, "song").unwrap();
        assert_eq!(track.title, "Song A");
        assert_eq!(track.url, "https://www.youtube.com/watch?v=a");
        assert_eq!(track.duration, Some(Duration::from_secs(212)));
        assert_eq!(track.thumbnail.as_deref(), Some("https://i.ytimg.com/a.jpg"));
    }

    #[test]
    fn test_first_track_skips_garbage_and_uses_fallback_url() {
        let stdout = "WARNING: something\n{\"title\":\"file.mp3\"}\n";
        let track = first_track(stdout, "https://example.com/file.mp3").unwrap();
        assert_eq!(track.url, "https://example.com/file.mp3");
        assert_eq!(track.duration, None);

        assert!(first_track("", "x").is_none());
    }

    #[test]
    fn test_stream_args_by_quality() {
        let best = stream_args("https://youtu.be/a", StreamOptions::preferred());
        assert!(best.contains(&"-f".to_string()));
        assert_eq!(best.last().map(String::as_str), Some("https://youtu.be/a"));

        let default = stream_args("https://youtu.be/a", StreamOptions::fallback());
        assert!(!default.contains(&"-f".to_string()));
        assert!(default.contains(&"--get-url".to_string()));
    }

    #[test]
    fn test_search_args_take_top_result() {
        let args = search_args("daft punk");
        assert_eq!(args.last().map(String::as_str), Some("ytsearch1:daft punk"));
    }
}
