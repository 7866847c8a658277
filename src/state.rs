use std::collections::HashMap;

use crate::api::{Channel, ChannelUnread, Message, Reaction};
use crate::poller::SyncUpdate;

/// Outcome of reconciling one poller update.
#[derive(Debug, PartialEq)]
pub enum Applied {
    /// Local state for the resource now equals the server snapshot.
    Replaced,
    /// Unread map replaced; carries the channels whose count rose.
    Unread { rises: Vec<ChannelUnread> },
    /// Snapshot was keyed to a view that is no longer open; dropped.
    Stale,
    /// A poller hit a 401; the session is gone.
    SessionExpired,
}

/// The collections the pollers reconcile into and the views read from.
///
/// Message order is kept exactly as the server sends it: channel messages
/// newest first, thread replies oldest first.
#[derive(Debug, Default)]
pub struct SyncState {
    pub channels: Vec<Channel>,
    pub unread: HashMap<i64, u32>,
    pub open_channel: Option<i64>,
    pub open_thread: Option<i64>,
    pub messages: Vec<Message>,
    pub replies: Vec<Message>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile one update: full replace, never a merge. Snapshots keyed to
    /// a channel/thread that is no longer open are discarded on arrival.
    pub fn apply(&mut self, update: SyncUpdate) -> Applied {
        match update {
            SyncUpdate::Channels(channels) => {
                self.channels = channels;
                Applied::Replaced
            }
            SyncUpdate::UnreadCounts(counts) => {
                let mut rises = Vec::new();
                let mut map = HashMap::with_capacity(counts.len());
                for entry in counts {
                    let prior = self.unread.get(&entry.channel_id).copied().unwrap_or(0);
                    if entry.unread_count > prior {
                        rises.push(entry.clone());
                    }
                    map.insert(entry.channel_id, entry.unread_count);
                }
                self.unread = map;
                Applied::Unread { rises }
            }
            SyncUpdate::Messages {
                channel_id,
                messages,
            } => {
                if self.open_channel != Some(channel_id) {
                    return Applied::Stale;
                }
                self.messages = messages;
                Applied::Replaced
            }
            SyncUpdate::Replies {
                message_id,
                replies,
            } => {
                if self.open_thread != Some(message_id) {
                    return Applied::Stale;
                }
                self.replies = replies;
                Applied::Replaced
            }
            SyncUpdate::SessionExpired => Applied::SessionExpired,
        }
    }

    // View lifecycle

    pub fn open_channel(&mut self, channel_id: i64) {
        self.open_channel = Some(channel_id);
        self.open_thread = None;
        self.messages.clear();
        self.replies.clear();
        // Zeroed locally on entry; the next unread poll confirms.
        self.unread.insert(channel_id, 0);
    }

    pub fn close_channel(&mut self) {
        self.open_channel = None;
        self.open_thread = None;
        self.messages.clear();
        self.replies.clear();
    }

    pub fn open_thread(&mut self, message_id: i64) {
        self.open_thread = Some(message_id);
        self.replies.clear();
    }

    pub fn close_thread(&mut self) {
        self.open_thread = None;
        self.replies.clear();
    }

    pub fn channel_name(&self, channel_id: i64) -> Option<&str> {
        self.channels
            .iter()
            .find(|c| c.id == channel_id)
            .map(|c| c.name.as_str())
    }

    pub fn unread_for(&self, channel_id: i64) -> u32 {
        self.unread.get(&channel_id).copied().unwrap_or(0)
    }

    // Optimistic merges from the mutators. The next poll tick overwrites
    // these with the authoritative server snapshot.

    pub fn add_channel(&mut self, channel: Channel) {
        self.channels.push(channel);
    }

    pub fn apply_rename(&mut self, updated: &Channel) {
        if let Some(channel) = self.channels.iter_mut().find(|c| c.id == updated.id) {
            channel.name = updated.name.clone();
        }
    }

    /// Drop a deleted channel. Returns true when the open view was showing it.
    pub fn remove_channel(&mut self, channel_id: i64) -> bool {
        self.channels.retain(|c| c.id != channel_id);
        self.unread.remove(&channel_id);
        if self.open_channel == Some(channel_id) {
            self.close_channel();
            true
        } else {
            false
        }
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.insert(0, message);
    }

    pub fn push_reply(&mut self, reply: Message) {
        if let Some(parent) = reply
            .replies_to
            .and_then(|pid| self.messages.iter_mut().find(|m| m.id == pid))
        {
            parent.reply_count = parent.reply_count.saturating_add(1);
        }
        self.replies.push(reply);
    }

    /// Replace a message's reaction set with the server-returned one.
    pub fn set_reactions(&mut self, message_id: i64, reactions: Vec<Reaction>) {
        if let Some(reply) = self.replies.iter_mut().find(|m| m.id == message_id) {
            reply.reactions = reactions.clone();
        }
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) {
            message.reactions = reactions;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: i64, name: &str) -> Channel {
        Channel {
            id,
            name: name.to_string(),
        }
    }

    fn message(id: i64, channel_id: i64, content: &str) -> Message {
        Message {
            id,
            channel_id,
            user_id: 1,
            username: "alice".to_string(),
            content: content.to_string(),
            created_at: "2024-03-01 12:00:00".to_string(),
            replies_to: None,
            reply_count: 0,
            reactions: Vec::new(),
        }
    }

    fn unread(channel_id: i64, count: u32) -> ChannelUnread {
        ChannelUnread {
            channel_id,
            channel_name: format!("chan-{}", channel_id),
            unread_count: count,
        }
    }

    #[test]
    fn test_channel_snapshot_replaces_wholesale() {
        let mut state = SyncState::new();
        state.apply(SyncUpdate::Channels(vec![channel(3, "random")]));

        let applied = state.apply(SyncUpdate::Channels(vec![channel(7, "general")]));
        assert_eq!(applied, Applied::Replaced);
        assert_eq!(state.channels, vec![channel(7, "general")]);
    }

    #[test]
    fn test_unread_map_replaces_and_reports_rises() {
        let mut state = SyncState::new();
        state.apply(SyncUpdate::UnreadCounts(vec![unread(1, 2), unread(2, 0)]));

        let applied = state.apply(SyncUpdate::UnreadCounts(vec![unread(1, 5), unread(3, 1)]));
        match applied {
            Applied::Unread { rises } => {
                let ids: Vec<i64> = rises.iter().map(|r| r.channel_id).collect();
                assert_eq!(ids, vec![1, 3]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // Channel 2 vanished from the snapshot and from local state with it.
        assert_eq!(state.unread_for(2), 0);
        assert!(!state.unread.contains_key(&2));
        assert_eq!(state.unread_for(1), 5);
    }

    #[test]
    fn test_message_snapshot_for_closed_channel_is_discarded() {
        let mut state = SyncState::new();
        state.open_channel(7);
        state.apply(SyncUpdate::Messages {
            channel_id: 7,
            messages: vec![message(1, 7, "hi")],
        });
        assert_eq!(state.messages.len(), 1);

        // The view moved on; a late snapshot for 7 must not land.
        state.open_channel(9);
        let applied = state.apply(SyncUpdate::Messages {
            channel_id: 7,
            messages: vec![message(2, 7, "late")],
        });
        assert_eq!(applied, Applied::Stale);
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_reply_snapshot_after_thread_close_is_discarded() {
        let mut state = SyncState::new();
        state.open_channel(7);
        state.open_thread(42);
        state.apply(SyncUpdate::Replies {
            message_id: 42,
            replies: vec![message(43, 7, "reply")],
        });
        assert_eq!(state.replies.len(), 1);

        state.close_thread();
        let applied = state.apply(SyncUpdate::Replies {
            message_id: 42,
            replies: vec![message(44, 7, "late reply")],
        });
        assert_eq!(applied, Applied::Stale);
        assert!(state.replies.is_empty());
    }

    #[test]
    fn test_open_channel_zeroes_unread() {
        let mut state = SyncState::new();
        state.apply(SyncUpdate::UnreadCounts(vec![unread(7, 4)]));
        state.open_channel(7);
        assert_eq!(state.unread_for(7), 0);
    }

    #[test]
    fn test_set_reactions_replaces_not_merges() {
        let mut state = SyncState::new();
        state.open_channel(7);
        let mut msg = message(1, 7, "hi");
        msg.reactions = vec![Reaction {
            emoji: "👍".to_string(),
            count: 1,
            users: vec!["alice".to_string()],
        }];
        state.apply(SyncUpdate::Messages {
            channel_id: 7,
            messages: vec![msg],
        });

        // Server says the set is now a single 🎉 — the 👍 must not survive.
        state.set_reactions(
            1,
            vec![Reaction {
                emoji: "🎉".to_string(),
                count: 2,
                users: vec!["alice".to_string(), "bob".to_string()],
            }],
        );
        assert_eq!(state.messages[0].reactions.len(), 1);
        assert_eq!(state.messages[0].reactions[0].emoji, "🎉");
        assert_eq!(state.messages[0].reactions[0].count, 2);
    }

    #[test]
    fn test_push_reply_bumps_parent_count() {
        let mut state = SyncState::new();
        state.open_channel(7);
        state.apply(SyncUpdate::Messages {
            channel_id: 7,
            messages: vec![message(1, 7, "parent")],
        });
        state.open_thread(1);

        let mut reply = message(2, 7, "child");
        reply.replies_to = Some(1);
        state.push_reply(reply);

        assert_eq!(state.messages[0].reply_count, 1);
        assert_eq!(state.replies.len(), 1);
    }

    #[test]
    fn test_remove_channel_closes_open_view() {
        let mut state = SyncState::new();
        state.apply(SyncUpdate::Channels(vec![channel(7, "general")]));
        state.open_channel(7);
        state.open_thread(1);

        assert!(state.remove_channel(7));
        assert!(state.channels.is_empty());
        assert_eq!(state.open_channel, None);
        assert_eq!(state.open_thread, None);
    }

    #[test]
    fn test_session_expiry_passes_through() {
        let mut state = SyncState::new();
        assert_eq!(state.apply(SyncUpdate::SessionExpired), Applied::SessionExpired);
    }
}
