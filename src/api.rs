//! The handle extensions hold: sends, raw/command hook registration, and
//! live views of tracked channels and users.
//!
//! `hook_command`/`unhook_command` have no built-in implementation here;
//! the API module only owns raw hooks, sends, and views, keeping them
//! separate from the state tracker that actually maintains command hooks.
//! The state tracker extension installs the real implementation
//! at construction time through [`Api::install_command_hooks`], mirroring
//! the original's `api.hook_command = self.hook_privcommand` monkey-patch
//! with a `OnceLock`-guarded indirection instead of reassigning a method.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tokio::sync::{mpsc, Mutex as AsyncMutex, RwLock};
use tracing::warn;

use crate::dispatch::{always_true, BoxFuture, Observers, Predicate, RawCallback};
use crate::state::{PrivateMessage, Stats, Tracker};

pub type CommandPredicate = Arc<dyn Fn(&PrivateMessage) -> bool + Send + Sync>;
pub type CommandCallback = Arc<dyn Fn(PrivateMessage) -> BoxFuture + Send + Sync>;

pub fn always_true_msg(_: &PrivateMessage) -> bool {
    true
}

/// Implemented by whatever installs command-hook storage (the built-in
/// state tracker extension, in practice).
pub trait CommandHooks: Send + Sync {
    fn hook(&self, context_mask: u8, callback: CommandCallback, predicate: CommandPredicate);
    fn unhook(&self, context_mask: u8, callback: &CommandCallback);
}

struct Inner {
    nick: RwLock<String>,
    outbound: AsyncMutex<mpsc::Sender<String>>,
    observers: Arc<Observers>,
    tracker: Arc<AsyncMutex<Tracker>>,
    command_hooks: OnceLock<Arc<dyn CommandHooks>>,
}

/// Cheaply-cloneable handle passed to every extension.
#[derive(Clone)]
pub struct Api {
    inner: Arc<Inner>,
}

impl Api {
    pub fn new(
        nick: String,
        outbound: mpsc::Sender<String>,
        observers: Arc<Observers>,
        tracker: Arc<AsyncMutex<Tracker>>,
    ) -> Api {
        Api {
            inner: Arc::new(Inner {
                nick: RwLock::new(nick),
                outbound: AsyncMutex::new(outbound),
                observers,
                tracker,
                command_hooks: OnceLock::new(),
            }),
        }
    }

    /// Swap in a fresh outbound sender after a reconnect.
    pub async fn rebind_outbound(&self, outbound: mpsc::Sender<String>) {
        *self.inner.outbound.lock().await = outbound;
    }

    /// Install the command-hook implementation. Called once, by the
    /// built-in state tracker extension, at startup.
    pub fn install_command_hooks(&self, hooks: Arc<dyn CommandHooks>) {
        let _ = self.inner.command_hooks.set(hooks);
    }

    pub fn tracker(&self) -> Arc<AsyncMutex<Tracker>> {
        self.inner.tracker.clone()
    }

    pub async fn nick(&self) -> String {
        self.inner.nick.read().await.clone()
    }

    pub async fn set_nick(&self, nick: String) {
        *self.inner.nick.write().await = nick;
    }

    pub async fn get_stats(&self) -> Stats {
        self.inner.tracker.lock().await.stats()
    }

    /// Live snapshot of tracked channels, keyed by name.
    pub async fn channels(&self) -> HashMap<String, crate::state::Channel> {
        self.inner.tracker.lock().await.channels().clone()
    }

    /// Live snapshot of tracked users, keyed by nick.
    pub async fn users(&self) -> HashMap<String, crate::state::User> {
        self.inner.tracker.lock().await.users().clone()
    }

    /// Register a raw-protocol observer for `kind` (a verb or numeric).
    pub fn hook_raw(&self, kind: &str, callback: RawCallback) {
        self.hook_raw_if(kind, callback, Arc::new(always_true));
    }

    pub fn hook_raw_if(&self, kind: &str, callback: RawCallback, predicate: Predicate) {
        self.inner.observers.register(kind, callback, predicate);
    }

    pub fn hook_command(&self, context_mask: u8, callback: CommandCallback) {
        self.hook_command_if(context_mask, callback, Arc::new(always_true_msg));
    }

    pub fn hook_command_if(
        &self,
        context_mask: u8,
        callback: CommandCallback,
        predicate: CommandPredicate,
    ) {
        match self.inner.command_hooks.get() {
            Some(hooks) => hooks.hook(context_mask, callback, predicate),
            None => warn!("hook_command called before command-hook storage was installed"),
        }
    }

    pub fn unhook_command(&self, context_mask: u8, callback: &CommandCallback) {
        match self.inner.command_hooks.get() {
            Some(hooks) => hooks.unhook(context_mask, callback),
            None => warn!("unhook_command called before command-hook storage was installed"),
        }
    }

    /// Enqueue a raw line. The caller does not append CRLF.
    pub async fn send_raw(&self, line: impl Into<String>) {
        let line = line.into();
        if self.inner.outbound.lock().await.send(line).await.is_err() {
            warn!("network worker not connected, dropping outbound line");
        }
    }

    pub async fn join(&self, channel: &str) {
        self.send_raw(format!("JOIN {channel}")).await;
    }

    pub async fn leave(&self, channel: &str, message: &str) {
        self.send_raw(format!("PART {channel} :{message}")).await;
    }

    pub async fn kick(&self, channel: &str, user: &str, reason: &str) {
        self.send_raw(format!("KICK {channel} {user} :{reason}")).await;
    }

    pub async fn mode(&self, target: &str, mode: &str, args: &str) {
        self.send_raw(format!("MODE {target} {mode} {args}").trim_end().to_string())
            .await;
    }

    pub async fn away(&self, message: &str) {
        self.send_raw(format!("AWAY {message}")).await;
    }

    pub async fn invite(&self, user: &str, channel: &str) {
        self.send_raw(format!("INVITE {user} {channel}")).await;
    }

    pub async fn privmsg(&self, target: &str, message: &str) {
        self.send_raw(format!("PRIVMSG {target} :{message}")).await;
    }

    pub async fn action(&self, target: &str, message: &str) {
        self.send_raw(format!("PRIVMSG {target} :{}", crate::ctcp::wrap_action(message)))
            .await;
    }

    pub async fn notice(&self, target: &str, message: &str) {
        self.send_raw(format!("NOTICE {target} :{message}")).await;
    }

    pub async fn voice(&self, channel: &str, nick: &str) {
        self.mode(channel, "+v", nick).await;
    }
    pub async fn devoice(&self, channel: &str, nick: &str) {
        self.mode(channel, "-v", nick).await;
    }
    pub async fn hop(&self, channel: &str, nick: &str) {
        self.mode(channel, "+h", nick).await;
    }
    pub async fn dehop(&self, channel: &str, nick: &str) {
        self.mode(channel, "-h", nick).await;
    }
    pub async fn op(&self, channel: &str, nick: &str) {
        self.mode(channel, "+o", nick).await;
    }
    pub async fn deop(&self, channel: &str, nick: &str) {
        self.mode(channel, "-o", nick).await;
    }
    pub async fn protect(&self, channel: &str, nick: &str) {
        self.mode(channel, "+a", nick).await;
    }
    pub async fn deprotect(&self, channel: &str, nick: &str) {
        self.mode(channel, "-a", nick).await;
    }
    pub async fn owner(&self, channel: &str, nick: &str) {
        self.mode(channel, "+q", nick).await;
    }
    pub async fn deowner(&self, channel: &str, nick: &str) {
        self.mode(channel, "-q", nick).await;
    }

    pub async fn ban(&self, channel: &str, nick: &str) {
        self.mode(channel, "+b", &format!("{nick}!*@*")).await;
    }
    pub async fn unban(&self, channel: &str, nick: &str) {
        self.mode(channel, "-b", &format!("{nick}!*@*")).await;
    }
    pub async fn ban_by_mask(&self, channel: &str, mask: &str) {
        self.mode(channel, "+b", mask).await;
    }
    pub async fn unban_by_mask(&self, channel: &str, mask: &str) {
        self.mode(channel, "-b", mask).await;
    }

    pub async fn kickban(&self, channel: &str, nick: &str, reason: &str) {
        self.ban(channel, nick).await;
        self.kick(channel, nick, reason).await;
    }
}
