//! The built-in state-tracker extension.
//!
//! A direct port of `midori/base_exts/irc_base.py`'s `IRCBase`: a
//! privileged, dependency-free extension that installs the raw hooks
//! every other extension implicitly relies on (membership tracking) and
//! supplies the `hook_command`/`unhook_command` implementation the API
//! only stubs out (see [`crate::api::Api::install_command_hooks`]).

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::api::{Api, CommandCallback, CommandHooks, CommandPredicate};
use crate::colors::strip_controls;
use crate::command::Command;
use crate::config::Config;
use crate::ctcp::{is_version_query, wrap_version_reply};
use crate::dispatch::{BoxFuture, RawCallback};
use crate::extloader::{Extension, ExtensionFactory};
use crate::mode::ModeDelta;
use crate::state::{context_mask, Context, PrivateMessage, Sender};

const VERSION_REPLY: &str = "perch (a modular IRC bot core)";

fn raw_cb<F>(f: F) -> RawCallback
where
    F: Fn(Command) -> BoxFuture + Send + Sync + 'static,
{
    Arc::new(f)
}

struct CommandHookEntry {
    context_mask: u8,
    callback: CommandCallback,
    predicate: CommandPredicate,
}

struct CoreState {
    api: Api,
    hooks: Mutex<Vec<CommandHookEntry>>,
    waiting_for_mode_r: AtomicBool,
    modes: String,
    nickserv: String,
    nickserv_password: Option<String>,
    channels: Vec<String>,
}

impl CommandHooks for CoreState {
    fn hook(&self, context_mask: u8, callback: CommandCallback, predicate: CommandPredicate) {
        self.hooks.lock().unwrap().push(CommandHookEntry {
            context_mask,
            callback,
            predicate,
        });
    }

    fn unhook(&self, context_mask: u8, callback: &CommandCallback) {
        let mut hooks = self.hooks.lock().unwrap();
        if let Some(i) = hooks
            .iter()
            .position(|h| h.context_mask == context_mask && Arc::ptr_eq(&h.callback, callback))
        {
            info!("removing command hook in context {context_mask}");
            hooks.remove(i);
        }
    }
}

/// Holds no behavior of its own past construction; its job is keeping
/// the `Arc<CoreState>` (and therefore its hook registrations) alive.
pub struct CoreExtension(#[allow(dead_code)] Arc<CoreState>);

impl Extension for CoreExtension {}

pub struct CoreExtensionFactory;

impl ExtensionFactory for CoreExtensionFactory {
    fn identifier(&self) -> &'static str {
        "core.irc_base"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    /// `options` is the *whole* configuration document, not a
    /// per-extension slice: this extension reads global server-identity
    /// keys (`modes`, `nickserv`, `channels`) the same way the original
    /// `IRCBase` reached past its own options into `Midori.config()`.
    fn construct(&self, api: &Api, options: &Config) -> Box<dyn Extension> {
        let state = Arc::new(CoreState {
            api: api.clone(),
            hooks: Mutex::new(Vec::new()),
            waiting_for_mode_r: AtomicBool::new(false),
            modes: options.get("modes", "+wpsC".to_string()),
            nickserv: options.get("nickserv", "NickServ".to_string()),
            nickserv_password: options.get_opt("nickserv_password"),
            channels: options.get("channels", Vec::new()),
        });

        api.install_command_hooks(state.clone() as Arc<dyn CommandHooks>);

        install_raw_hooks(&state);
        install_ctcp_version_hook(&state);

        info!("core hooks installed");
        Box::new(CoreExtension(state))
    }
}

fn install_raw_hooks(state: &Arc<CoreState>) {
    let api = &state.api;

    api.hook_raw("PING", {
        let api = api.clone();
        raw_cb(move |cmd| {
            let api = api.clone();
            Box::pin(async move { on_ping(&api, cmd).await })
        })
    });

    api.hook_raw("001", {
        let state = state.clone();
        raw_cb(move |cmd| {
            let state = state.clone();
            Box::pin(async move { on_ready(&state, cmd).await })
        })
    });

    api.hook_raw("PRIVMSG", {
        let state = state.clone();
        raw_cb(move |cmd| {
            let state = state.clone();
            Box::pin(async move { on_privmsg(&state, cmd).await })
        })
    });

    api.hook_raw("JOIN", {
        let state = state.clone();
        raw_cb(move |cmd| {
            let state = state.clone();
            Box::pin(async move { on_join(&state, cmd).await })
        })
    });

    api.hook_raw("PART", {
        let state = state.clone();
        raw_cb(move |cmd| {
            let state = state.clone();
            Box::pin(async move { on_part(&state, cmd).await })
        })
    });

    api.hook_raw("KICK", {
        let state = state.clone();
        raw_cb(move |cmd| {
            let state = state.clone();
            Box::pin(async move { on_kick(&state, cmd).await })
        })
    });

    api.hook_raw("QUIT", {
        let state = state.clone();
        raw_cb(move |cmd| {
            let state = state.clone();
            Box::pin(async move { on_quit(&state, cmd).await })
        })
    });

    api.hook_raw("353", {
        let state = state.clone();
        raw_cb(move |cmd| {
            let state = state.clone();
            Box::pin(async move { on_names(&state, cmd).await })
        })
    });

    api.hook_raw("MODE", {
        let state = state.clone();
        raw_cb(move |cmd| {
            let state = state.clone();
            Box::pin(async move { on_mode(&state, cmd).await })
        })
    });

    api.hook_raw("NICK", {
        let state = state.clone();
        raw_cb(move |cmd| {
            let state = state.clone();
            Box::pin(async move { on_nick(&state, cmd).await })
        })
    });
}

fn install_ctcp_version_hook(state: &Arc<CoreState>) {
    let api = state.api.clone();
    let callback: CommandCallback = Arc::new(move |msg: PrivateMessage| {
        let api = api.clone();
        Box::pin(async move {
            api.notice(msg.sender.nick(), &wrap_version_reply(VERSION_REPLY)).await;
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let predicate: CommandPredicate = Arc::new(|msg: &PrivateMessage| is_version_query(&msg.message));
    state.api.hook_command_if(context_mask::PRIVATE, callback, predicate);
}

async fn on_ping(api: &Api, cmd: Command) {
    if let Some(message) = &cmd.message {
        api.send_raw(format!("PONG :{message}")).await;
    }
}

async fn on_ready(state: &Arc<CoreState>, _cmd: Command) {
    let api = &state.api;
    let my_nick = api.nick().await;
    if !state.modes.is_empty() {
        api.mode(&my_nick, &state.modes, "").await;
    }

    if let Some(password) = &state.nickserv_password {
        state.waiting_for_mode_r.store(true, Ordering::SeqCst);
        api.privmsg(&state.nickserv, &format!("IDENTIFY {password}")).await;
    } else {
        state.waiting_for_mode_r.store(false, Ordering::SeqCst);
        for channel in &state.channels {
            api.join(channel).await;
        }
    }
}

async fn on_privmsg(state: &Arc<CoreState>, cmd: Command) {
    let Some(prefix) = &cmd.prefix else {
        return;
    };
    let Some(target) = cmd.args.first() else {
        return;
    };
    let my_nick = state.api.nick().await;
    let raw_message = cmd.message.clone().unwrap_or_default();

    let (sender, channel, context) = {
        let tracker_handle = state.api.tracker();
        let mut tracker = tracker_handle.lock().await;
        let sender = tracker.resolve_sender(prefix);
        if let Sender::Tracked(_) = &sender {
            tracker.update_identity(
                sender.nick(),
                prefix.user.as_deref().unwrap_or("(unknown)"),
                prefix.host.as_deref().unwrap_or("(unknown)"),
            );
        }

        let (context, channel) = if target == &my_nick {
            (Context::Private, None)
        } else {
            tracker.push_channel_message(target, sender.nick(), &raw_message);
            (Context::Channel, tracker.channel(target).cloned())
        };

        if let Sender::Tracked(_) = &sender {
            let msg_channel = if context == Context::Channel { Some(target.as_str()) } else { None };
            tracker.push_user_message(sender.nick(), msg_channel, sender.nick(), &raw_message);
        }

        (sender, channel, context)
    };

    let message = PrivateMessage {
        sender,
        channel,
        context,
        message: strip_controls(&raw_message),
        raw_message,
    };

    let matching: Vec<CommandCallback> = {
        let hooks = state.hooks.lock().unwrap();
        hooks
            .iter()
            .filter(|h| h.context_mask & message.context.mask() != 0)
            .filter(|h| (h.predicate)(&message))
            .map(|h| h.callback.clone())
            .collect()
    };
    for callback in matching {
        callback(message.clone()).await;
    }
}

async fn on_join(state: &Arc<CoreState>, cmd: Command) {
    let Some(prefix) = &cmd.prefix else {
        return;
    };
    let Some(joiner) = prefix.nick() else {
        return;
    };
    let cname = cmd
        .message
        .clone()
        .or_else(|| cmd.args.first().cloned())
        .unwrap_or_default();
    let my_nick = state.api.nick().await;

    let tracker_handle = state.api.tracker();
    let mut tracker = tracker_handle.lock().await;
    if joiner == my_nick {
        tracker.create_channel(&cname);
    } else {
        tracker.ensure_user(
            joiner,
            prefix.user.as_deref().unwrap_or("(unknown)"),
            prefix.host.as_deref().unwrap_or("(unknown)"),
        );
        if !tracker.add_membership(&cname, joiner) {
            warn!("JOIN message dropped because we aren't subscribed to the target channel.");
        }
    }
}

async fn on_part(state: &Arc<CoreState>, cmd: Command) {
    let Some(prefix) = &cmd.prefix else {
        return;
    };
    let Some(nick) = prefix.nick() else {
        return;
    };
    let Some(channel) = cmd.args.first() else {
        return;
    };

    let tracker_handle = state.api.tracker();
    let mut tracker = tracker_handle.lock().await;
    if tracker.user(nick).is_none() {
        return;
    }
    if !tracker.remove_membership(channel, nick) {
        warn!("PART message dropped because we aren't subscribed to the target channel.");
    }
}

async fn on_kick(state: &Arc<CoreState>, cmd: Command) {
    let (Some(channel), Some(kicked)) = (cmd.args.first(), cmd.args.get(1)) else {
        return;
    };
    let my_nick = state.api.nick().await;
    let tracker_handle = state.api.tracker();
    let mut tracker = tracker_handle.lock().await;

    if kicked == &my_nick {
        tracker.remove_channel(channel);
    } else {
        if tracker.user(kicked).is_none() {
            return;
        }
        if !tracker.remove_membership(channel, kicked) {
            warn!("KICK message dropped because we aren't subscribed to the target channel.");
        }
    }
}

async fn on_quit(state: &Arc<CoreState>, cmd: Command) {
    let Some(prefix) = &cmd.prefix else {
        return;
    };
    let Some(nick) = prefix.nick() else {
        return;
    };
    state.api.tracker().lock().await.remove_user_everywhere(nick);
}

async fn on_names(state: &Arc<CoreState>, cmd: Command) {
    let Some(channel) = cmd.args.get(2) else {
        return;
    };
    let Some(names) = &cmd.message else {
        return;
    };
    let my_nick = state.api.nick().await;
    let tracker_handle = state.api.tracker();
    let mut tracker = tracker_handle.lock().await;

    for raw_name in names.split(' ').filter(|s| !s.is_empty()) {
        let name = raw_name.trim_start_matches(['!', '~', '&', '@', '%', '+']);
        if name == my_nick {
            continue;
        }
        tracker.ensure_user(name, "(unknown)", "(unknown)");
        if !tracker.add_membership(channel, name) {
            warn!("NAMES message dropped because we aren't subscribed to the target channel.");
        }
    }
}

async fn on_nick(state: &Arc<CoreState>, cmd: Command) {
    let Some(prefix) = &cmd.prefix else {
        return;
    };
    let Some(old_nick) = prefix.nick() else {
        return;
    };
    let new_nick = cmd
        .message
        .clone()
        .or_else(|| cmd.args.first().cloned())
        .unwrap_or_default();
    let my_nick = state.api.nick().await;

    if old_nick == my_nick {
        state.api.set_nick(new_nick).await;
    } else {
        state.api.tracker().lock().await.rename_user(old_nick, &new_nick);
    }
}

async fn on_mode(state: &Arc<CoreState>, cmd: Command) {
    if !state.waiting_for_mode_r.load(Ordering::SeqCst) {
        return;
    }
    let my_nick = state.api.nick().await;
    if cmd.args.first().map(String::as_str) != Some(my_nick.as_str()) {
        return;
    }
    let delta = ModeDelta::parse(cmd.message.as_deref().unwrap_or(""));
    if delta.added.contains(&'r') {
        for channel in &state.channels {
            state.api.join(channel).await;
        }
        state.waiting_for_mode_r.store(false, Ordering::SeqCst);
    }
}
