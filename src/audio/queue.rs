use chrono::{DateTime, Utc};
use serenity::model::id::ChannelId;
use std::{collections::VecDeque, time::Duration};

use crate::sources::ResolvedTrack;

/// A queued song. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    pub url: String,
    pub requested_by: String,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl Track {
    pub fn new(resolved: ResolvedTrack, requested_by: impl Into<String>) -> Self {
        Self {
            title: resolved.title,
            url: resolved.url,
            requested_by: requested_by.into(),
            duration: resolved.duration,
            thumbnail: resolved.thumbnail,
            added_at: Utc::now(),
        }
    }
}

/// Where the head of the queue is in its playback lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A stream is being opened for the head; nothing is handed to the player.
    Loading,
    /// The head has been handed to the player.
    Playing,
}

/// Playback state for one guild.
///
/// Owns the voice session for its whole lifetime; dropping a queue out of the
/// store is the only way to release the session.
pub struct Queue<S, P> {
    pub(crate) pending: VecDeque<Track>,
    pub(crate) voice_channel: ChannelId,
    pub(crate) text_channel: ChannelId,
    pub(crate) session: S,
    pub(crate) player: P,
    pub(crate) epoch: u64,
    pub(crate) phase: Phase,
    pub(crate) paused: bool,
    pub(crate) skip_requested: bool,
}

impl<S, P> Queue<S, P> {
    pub fn new(
        voice_channel: ChannelId,
        text_channel: ChannelId,
        session: S,
        player: P,
        epoch: u64,
    ) -> Self {
        Self {
            pending: VecDeque::new(),
            voice_channel,
            text_channel,
            session,
            player,
            epoch,
            phase: Phase::Loading,
            paused: false,
            skip_requested: false,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn now_playing(&self) -> Option<&Track> {
        self.pending.front()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tracks: self.pending.iter().cloned().collect(),
            voice_channel: self.voice_channel,
            paused: self.paused,
            loading: self.phase == Phase::Loading,
        }
    }
}

/// Read-only view of a queue for "now playing / up next" displays.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    /// Head first; the head is the current track.
    pub tracks: Vec<Track>,
    pub voice_channel: ChannelId,
    pub paused: bool,
    pub loading: bool,
}

impl QueueSnapshot {
    pub fn current(&self) -> Option<&Track> {
        self.tracks.first()
    }

    pub fn up_next(&self) -> &[Track] {
        self.tracks.get(1..).unwrap_or(&[])
    }

    pub fn total_duration(&self) -> Duration {
        self.tracks.iter().filter_map(|t| t.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn track(title: &str, secs: Option<u64>) -> Track {
        let mut resolved = ResolvedTrack::new(title, format!("https://example.com/{}", title));
        if let Some(secs) = secs {
            resolved = resolved.with_duration(Duration::from_secs(secs));
        }
        Track::new(resolved, "alice")
    }

    #[test]
    fn test_snapshot_splits_current_and_up_next() {
        let mut queue = Queue::new(ChannelId::new(1), ChannelId::new(2), (), (), 7);
        queue.pending.push_back(track("a", Some(60)));
        queue.pending.push_back(track("b", None));
        queue.pending.push_back(track("c", Some(30)));

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.current().map(|t| t.title.as_str()), Some("a"));
        let next: Vec<_> = snapshot.up_next().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(next, vec!["b", "c"]);
        assert_eq!(snapshot.total_duration(), Duration::from_secs(90));
        assert!(snapshot.loading);
        assert!(!snapshot.paused);
    }

    #[test]
    fn test_empty_snapshot() {
        let queue: Queue<(), ()> = Queue::new(ChannelId::new(1), ChannelId::new(2), (), (), 1);
        let snapshot = queue.snapshot();
        assert!(snapshot.current().is_none());
        assert!(snapshot.up_next().is_empty());
        assert_eq!(snapshot.voice_channel, ChannelId::new(1));
        assert_eq!(queue.len(), 0);
    }
}
