//! # Audio Module
//!
//! Per-guild playback queues and the voice plumbing underneath them.
//!
//! ## Architecture
//!
//! ### [`manager`] - Queue Manager
//! - Owns every queue and is the only component that mutates one
//! - Serializes all transitions for a guild behind a per-guild lock
//! - Advances on player idle/error, dropping tracks whose stream cannot be
//!   opened after one degraded retry
//! - Tears the queue down and leaves voice once nothing is left to play
//!
//! ### [`store`] / [`queue`] - Queue State
//! - `QueueStore` maps a guild to at most one live `Queue`
//! - A `Queue` holds the pending tracks (head = now playing), the voice
//!   session it owns and the player bound to that session
//!
//! ### [`transport`] / [`songbird_transport`] - Voice Transport
//! - Trait seam between the manager and the voice library
//! - Songbird implementation: one `Call` per guild, one track at a time,
//!   end/error reported back as [`transport::PlayerEvent`] messages
//!
//! ## Invariants
//!
//! - At most one queue per guild
//! - A queue exists iff the bot holds a voice session for that guild
//! - A queue's pending list is never empty while the queue is stored
//! - Each `Idle` notification advances at most one track
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let manager = Arc::new(QueueManager::new(resolver, transport, events_tx, 1000));
//!
//! let enqueued = manager
//!     .enqueue(EnqueueRequest {
//!         guild_id,
//!         requested_by: "alice".into(),
//!         query: "never gonna give you up".into(),
//!         voice_channel: Some(voice_channel),
//!         text_channel,
//!     })
//!     .await?;
//!
//! manager.pause(guild_id).await?;
//! manager.skip(guild_id).await?;
//! manager.stop(guild_id).await?;
//! ```

pub mod manager;
pub mod queue;
pub mod songbird_transport;
pub mod store;
pub mod transport;

pub use manager::{EnqueueRequest, Enqueued, QueueEvent, QueueEventReceiver, QueueManager};
pub use queue::{QueueSnapshot, Track};
pub use songbird_transport::SongbirdTransport;

use crate::sources::YtDlpResolver;

/// The manager as wired in production.
pub type MusicQueues = QueueManager<YtDlpResolver, SongbirdTransport>;
