use dashmap::{
    mapref::{
        entry::Entry,
        one::{Ref, RefMut},
    },
    DashMap,
};
use serenity::model::id::{ChannelId, GuildId};

use super::queue::Queue;
use crate::error::QueueError;

/// Registry of live queues, one per guild.
///
/// The map itself is concurrency-safe; ordering of mutations for a single
/// guild is the manager's responsibility. Returned references lock a map
/// shard and must never be held across an `.await`.
pub struct QueueStore<S, P> {
    queues: DashMap<GuildId, Queue<S, P>>,
}

impl<S, P> QueueStore<S, P> {
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
        }
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Ref<'_, GuildId, Queue<S, P>>> {
        self.queues.get(&guild_id)
    }

    pub fn get_mut(&self, guild_id: GuildId) -> Option<RefMut<'_, GuildId, Queue<S, P>>> {
        self.queues.get_mut(&guild_id)
    }

    /// Inserts a new queue. A guild that already has one keeps it, and the
    /// session is handed back with the error so the caller can destroy it.
    pub fn create(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
        session: S,
        player: P,
        epoch: u64,
    ) -> Result<RefMut<'_, GuildId, Queue<S, P>>, (QueueError, S)> {
        match self.queues.entry(guild_id) {
            Entry::Occupied(_) => Err((QueueError::AlreadyExists(guild_id), session)),
            Entry::Vacant(entry) => Ok(entry.insert(Queue::new(
                voice_channel,
                text_channel,
                session,
                player,
                epoch,
            ))),
        }
    }

    /// Idempotent; returns the removed queue so its session can be destroyed.
    pub fn remove(&self, guild_id: GuildId) -> Option<Queue<S, P>> {
        self.queues.remove(&guild_id).map(|(_, queue)| queue)
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.queues.contains_key(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }
}

impl<S, P> Default for QueueStore<S, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> QueueStore<(), ()> {
        QueueStore::new()
    }

    #[test]
    fn test_create_rejects_duplicates() {
        let store = store();
        let guild = GuildId::new(10);
        let voice = ChannelId::new(1);
        let text = ChannelId::new(2);

        assert!(store.create(guild, voice, text, (), (), 1).is_ok());
        match store.create(guild, voice, text, (), (), 2) {
            Err((QueueError::AlreadyExists(id), ())) => assert_eq!(id, guild),
            Err((other, _)) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("duplicate queue created"),
        }
        assert_eq!(store.get(guild).map(|q| q.epoch), Some(1));
    }

    #[test]
    fn test_rejected_create_returns_the_session() {
        let store: QueueStore<&str, ()> = QueueStore::new();
        let guild = GuildId::new(10);
        let voice = ChannelId::new(1);
        let text = ChannelId::new(2);

        drop(store.create(guild, voice, text, "first", (), 1));
        let Err((err, session)) = store.create(guild, voice, text, "second", (), 2) else {
            panic!("duplicate queue created");
        };

        assert_eq!(err, QueueError::AlreadyExists(guild));
        assert_eq!(session, "second");
        assert_eq!(store.get(guild).map(|q| q.session), Some("first"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = store();
        let guild = GuildId::new(10);
        drop(store.create(guild, ChannelId::new(1), ChannelId::new(2), (), (), 1));

        assert!(store.remove(guild).is_some());
        assert!(store.remove(guild).is_none());
        assert!(!store.contains(guild));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_guilds_are_independent() {
        let store = store();
        drop(store.create(GuildId::new(1), ChannelId::new(1), ChannelId::new(1), (), (), 1));
        drop(store.create(GuildId::new(2), ChannelId::new(2), ChannelId::new(2), (), (), 2));

        store.remove(GuildId::new(1));
        assert!(store.contains(GuildId::new(2)));
        assert_eq!(store.len(), 1);
    }
}
