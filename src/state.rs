//! Membership tracking: channels, users, and their message buffers.
//!
//! Channels and users live in id-keyed tables inside [`Tracker`] rather
//! than behind weak pointers: a channel's `users` set and a user's
//! `channels` set store nicks/names,
//! not handles, so dropping an entry from its owning table is enough to
//! make every cross-reference to it dangle-free. [`Tracker`] is always
//! accessed through a single `tokio::sync::Mutex` (see [`crate::supervisor`]).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::prefix::Prefix;

/// Number of recent messages retained per channel/user buffer.
pub const BUFFER_CAPACITY: usize = 10;

/// One retained message, either seen in a channel or addressed to/from a user.
#[derive(Debug, Clone)]
pub struct BufferedMessage {
    pub sender: String,
    pub channel: Option<String>,
    pub message: String,
}

/// A ring buffer holding at most [`BUFFER_CAPACITY`] messages.
#[derive(Debug, Clone, Default)]
pub struct MessageBuffer(VecDeque<BufferedMessage>);

impl MessageBuffer {
    fn push(&mut self, msg: BufferedMessage) {
        if self.0.len() == BUFFER_CAPACITY {
            self.0.pop_front();
        }
        self.0.push_back(msg);
    }

    pub fn iter(&self) -> impl Iterator<Item = &BufferedMessage> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A channel we currently have joined.
#[derive(Debug, Clone, Default)]
pub struct Channel {
    pub name: String,
    pub users: HashSet<String>,
    pub buffer: MessageBuffer,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A user known to the tracker, keyed by current nick.
#[derive(Debug, Clone, Default)]
pub struct User {
    pub nick: String,
    pub user_name: String,
    pub hostmask: String,
    pub channels: HashSet<String>,
    pub buffer: MessageBuffer,
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.nick)
    }
}

/// A sender seen on the wire but not present in the user table: same
/// shape as [`User`] but with no membership or buffer, and never
/// inserted into the tracker.
#[derive(Debug, Clone)]
pub struct TransientUser {
    pub nick: String,
    pub user_name: String,
    pub hostmask: String,
}

impl std::fmt::Display for TransientUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.nick)
    }
}

/// The resolved sender of a message: either a tracked [`User`] or a
/// one-off [`TransientUser`] built from the wire prefix.
#[derive(Debug, Clone)]
pub enum Sender {
    Tracked(User),
    Transient(TransientUser),
}

impl Sender {
    pub fn nick(&self) -> &str {
        match self {
            Sender::Tracked(u) => &u.nick,
            Sender::Transient(u) => &u.nick,
        }
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self, Sender::Tracked(_))
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.nick())
    }
}

/// Summary counts over every buffer, per the API's `get_stats()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub buffer_count: usize,
    pub total_buffer_containment: usize,
}

/// Owns the channel and user tables. Mutated only by the built-in state
/// tracker extension's raw-hook callbacks.
#[derive(Debug, Default)]
pub struct Tracker {
    channels: HashMap<String, Channel>,
    users: HashMap<String, User>,
}

impl Tracker {
    pub fn new() -> Tracker {
        Tracker::default()
    }

    pub fn channels(&self) -> &HashMap<String, Channel> {
        &self.channels
    }

    pub fn users(&self) -> &HashMap<String, User> {
        &self.users
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn user(&self, nick: &str) -> Option<&User> {
        self.users.get(nick)
    }

    /// Resolve a wire prefix to a [`Sender`], falling back to a
    /// [`TransientUser`] built from the prefix itself when the nick is
    /// not tracked.
    pub fn resolve_sender(&self, prefix: &Prefix) -> Sender {
        let nick = prefix.nick().unwrap_or_default();
        match self.users.get(nick) {
            Some(user) => Sender::Tracked(user.clone()),
            None => Sender::Transient(TransientUser {
                nick: nick.to_string(),
                user_name: prefix.user.clone().unwrap_or_else(|| "(unknown)".into()),
                hostmask: prefix.host.clone().unwrap_or_else(|| "(unknown)".into()),
            }),
        }
    }

    /// Create a channel entry (self-JOIN). Overwrites any stale entry.
    pub fn create_channel(&mut self, name: &str) {
        self.channels.insert(
            name.to_string(),
            Channel {
                name: name.to_string(),
                ..Default::default()
            },
        );
    }

    /// Delete a channel entry outright (self-PART / self-KICK).
    pub fn remove_channel(&mut self, name: &str) {
        self.channels.remove(name);
    }

    /// Look up a user by nick, inserting a fresh entry with the given
    /// identity fields if absent.
    pub fn ensure_user(&mut self, nick: &str, user_name: &str, hostmask: &str) {
        self.users.entry(nick.to_string()).or_insert_with(|| User {
            nick: nick.to_string(),
            user_name: user_name.to_string(),
            hostmask: hostmask.to_string(),
            ..Default::default()
        });
    }

    /// Refresh a tracked user's user/host fields from a freshly observed
    /// prefix. A no-op if the nick is not tracked.
    pub fn update_identity(&mut self, nick: &str, user_name: &str, hostmask: &str) {
        if let Some(user) = self.users.get_mut(nick) {
            user.user_name = user_name.to_string();
            user.hostmask = hostmask.to_string();
        }
    }

    /// Add `nick` to `channel`'s membership set, and vice versa. Returns
    /// `false` (and logs nothing itself, the caller does) if the channel
    /// is not tracked.
    pub fn add_membership(&mut self, channel: &str, nick: &str) -> bool {
        if !self.channels.contains_key(channel) {
            return false;
        }
        self.channels.get_mut(channel).unwrap().users.insert(nick.to_string());
        if let Some(user) = self.users.get_mut(nick) {
            user.channels.insert(channel.to_string());
        }
        true
    }

    /// Remove `nick` from `channel`'s membership set, and vice versa.
    /// Returns `false` if the channel is not tracked.
    pub fn remove_membership(&mut self, channel: &str, nick: &str) -> bool {
        if let Some(c) = self.channels.get_mut(channel) {
            c.users.remove(nick);
        } else {
            return false;
        }
        if let Some(user) = self.users.get_mut(nick) {
            user.channels.remove(channel);
        }
        true
    }

    /// Remove `nick` from every channel's membership set (QUIT). A
    /// missing user is a silent no-op.
    pub fn remove_user_everywhere(&mut self, nick: &str) {
        let Some(user) = self.users.remove(nick) else {
            return;
        };
        for channel in &user.channels {
            if let Some(c) = self.channels.get_mut(channel) {
                c.users.remove(nick);
            }
        }
    }

    /// Re-key a user's table entry under a new nick (NICK change).
    /// A missing user is a silent no-op.
    pub fn rename_user(&mut self, old_nick: &str, new_nick: &str) {
        let Some(mut user) = self.users.remove(old_nick) else {
            return;
        };
        user.nick = new_nick.to_string();
        for channel in &user.channels {
            if let Some(c) = self.channels.get_mut(channel) {
                c.users.remove(old_nick);
                c.users.insert(new_nick.to_string());
            }
        }
        self.users.insert(new_nick.to_string(), user);
    }

    pub fn push_channel_message(&mut self, channel: &str, sender: &str, message: &str) {
        if let Some(c) = self.channels.get_mut(channel) {
            c.buffer.push(BufferedMessage {
                sender: sender.to_string(),
                channel: Some(channel.to_string()),
                message: message.to_string(),
            });
        }
    }

    pub fn push_user_message(&mut self, nick: &str, channel: Option<&str>, sender: &str, message: &str) {
        if let Some(u) = self.users.get_mut(nick) {
            u.buffer.push(BufferedMessage {
                sender: sender.to_string(),
                channel: channel.map(str::to_string),
                message: message.to_string(),
            });
        }
    }

    pub fn stats(&self) -> Stats {
        let mut buffer_count = 0;
        let mut total_buffer_containment = 0;
        for user in self.users.values() {
            buffer_count += 1;
            total_buffer_containment += user.buffer.len();
        }
        for channel in self.channels.values() {
            buffer_count += 1;
            total_buffer_containment += channel.buffer.len();
        }
        Stats {
            buffer_count,
            total_buffer_containment,
        }
    }
}

/// Context a [`PrivateMessage`] was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Channel,
    Private,
}

/// Bitmask over [`Context`] used by command-hook registration.
pub mod context_mask {
    pub const CHANNEL: u8 = 0b01;
    pub const PRIVATE: u8 = 0b10;
    pub const BOTH: u8 = CHANNEL | PRIVATE;
}

impl Context {
    pub fn mask(self) -> u8 {
        match self {
            Context::Channel => context_mask::CHANNEL,
            Context::Private => context_mask::PRIVATE,
        }
    }
}

/// A resolved, higher-level PRIVMSG dispatched to command hooks.
#[derive(Debug, Clone)]
pub struct PrivateMessage {
    pub sender: Sender,
    pub channel: Option<Channel>,
    pub context: Context,
    pub message: String,
    pub raw_message: String,
}
