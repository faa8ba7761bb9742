//! # Sources Module
//!
//! Media resolution for the bot: turns a URL or a free-text query into a
//! playable track reference, and a track reference into an audio stream.
//!
//! The queue manager only sees the [`MediaResolver`] trait. The production
//! implementation, [`YtDlpResolver`], drives the `yt-dlp` executable and hands
//! songbird an HTTP input for the extracted audio URL.

pub mod youtube;

use async_trait::async_trait;
use std::time::Duration;

pub use youtube::YtDlpResolver;

use crate::error::SourceError;

/// Metadata for a track found by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub title: String,
    pub url: String,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
}

impl ResolvedTrack {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            duration: None,
            thumbnail: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: String) -> Self {
        self.thumbnail = Some(thumbnail);
        self
    }
}

/// Audio quality requested when opening a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamQuality {
    /// Best audio-only format available.
    Best,
    /// Whatever the extractor picks by default.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub quality: StreamQuality,
}

impl StreamOptions {
    /// Options used for the first attempt at opening a stream.
    pub const fn preferred() -> Self {
        Self {
            quality: StreamQuality::Best,
        }
    }

    /// Degraded options used when the preferred attempt fails.
    pub const fn fallback() -> Self {
        Self {
            quality: StreamQuality::Default,
        }
    }
}

/// Resolves user input into tracks and tracks into streams.
#[async_trait]
pub trait MediaResolver: Send + Sync + 'static {
    /// Playable stream handed to the voice player.
    type Stream: Send + 'static;

    /// Direct links resolve metadata only; anything else is searched and the
    /// top result is returned.
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack, SourceError>;

    /// Opens an audio stream for a previously resolved track URL.
    async fn open_stream(
        &self,
        source_url: &str,
        options: StreamOptions,
    ) -> Result<Self::Stream, SourceError>;
}

/// Whether the input is a link to resolve directly rather than a search term.
pub fn is_direct_link(query: &str) -> bool {
    match url::Url::parse(query.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_link_detection() {
        assert!(is_direct_link("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_direct_link("http://example.com/song.mp3"));
        assert!(is_direct_link("  https://youtu.be/dQw4w9WgXcQ  "));
        assert!(!is_direct_link("never gonna give you up"));
        assert!(!is_direct_link("ftp://example.com/song.mp3"));
        assert!(!is_direct_link("httpbin"));
    }

    #[test]
    fn test_stream_options_presets() {
        assert_eq!(StreamOptions::preferred().quality, StreamQuality::Best);
        assert_eq!(StreamOptions::fallback().quality, StreamQuality::Default);
        assert_ne!(StreamOptions::preferred(), StreamOptions::fallback());
    }
}
