//! Configuration, lifecycle, reconnect loop, and signal handling: the glue
//! holding the network worker, worker pool, dispatcher, state tracker, and
//! extension loader together.
//!
//! The outer loop is the `{DISCONNECTED -> HANDSHAKE -> READY -> DRAINING
//! -> DISCONNECTED}` state machine from the original's nested
//! `while 1` / `while net_thread.is_alive()` loops (`midori/core.py`'s
//! `Midori.run`), rewritten as an explicit `Flow` outcome per connection
//! attempt.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::api::Api;
use crate::config::Config;
use crate::dispatch::Observers;
use crate::error::ConfigError;
use crate::ext::core::CoreExtensionFactory;
use crate::extloader::{Extension, ExtensionFactory, ExtensionLoader};
use crate::net;
use crate::pool::WorkerPool;
use crate::state::Tracker;

/// Idle period before the supervisor proactively pings for liveness.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);
/// Fixed, deliberately coarse reconnect backoff. No jitter.
const RECONNECT_DELAY: Duration = Duration::from_secs(360);

enum Flow {
    Reconnect,
    Shutdown,
}

pub struct Supervisor {
    nick: String,
    user: String,
    real_name: String,
    host: String,
    port: u16,
    use_tls: bool,
    bind_addr: String,
    password: Option<String>,
    config: Config,
    api: Api,
    observers: Arc<Observers>,
    pool: WorkerPool,
    loader: ExtensionLoader,
    extensions: Vec<Box<dyn ExtensionFactory>>,
    loaded_extensions: HashMap<String, Box<dyn Extension>>,
}

impl Supervisor {
    /// Validate the required configuration keys and wire up the core
    /// components. `extensions` are caller-supplied candidates alongside
    /// the built-in state tracker.
    pub fn new(
        config: Config,
        extensions: Vec<Box<dyn ExtensionFactory>>,
    ) -> Result<Supervisor, ConfigError> {
        let nick: String = config.require("identity.nick")?;
        let user: String = config.require("identity.user")?;
        let real_name: String = config.require("identity.real_name")?;
        let host: String = config.require("server.host")?;
        let port: u16 = config.require("server.port")?;
        let use_ssl: i64 = config.require("server.use_ssl")?;
        if use_ssl != 0 && use_ssl != 1 {
            return Err(ConfigError::MissingKey("server.use_ssl".to_string()));
        }

        let bind_addr = config.get("bind_addr", "0.0.0.0".to_string());
        let password = config.get_opt("server.password");
        let workers_size: usize = config.get("workers_size", 2);
        let blacklist: Vec<String> = config.get("extension_blacklist", Vec::new());

        let observers = Arc::new(Observers::new());
        let tracker = Arc::new(Mutex::new(Tracker::new()));
        let (placeholder_tx, _placeholder_rx) = mpsc::channel(1);
        let api = Api::new(nick.clone(), placeholder_tx, observers.clone(), tracker);

        Ok(Supervisor {
            nick,
            user,
            real_name,
            host,
            port,
            use_tls: use_ssl == 1,
            bind_addr,
            password,
            config,
            api,
            observers,
            pool: WorkerPool::new(workers_size),
            loader: ExtensionLoader::new(blacklist),
            extensions,
            loaded_extensions: HashMap::new(),
        })
    }

    /// A handle callers can use before or alongside [`Supervisor::run`],
    /// e.g. a caller-supplied extension that wants to register hooks
    /// outside the registry.
    pub fn api(&self) -> Api {
        self.api.clone()
    }

    fn load_extensions(&mut self) -> Result<(), crate::error::DependencyError> {
        let mut candidates: Vec<Box<dyn ExtensionFactory>> = vec![Box::new(CoreExtensionFactory)];
        candidates.extend(std::mem::take(&mut self.extensions));

        let config = self.config.clone();
        let loaded = self.loader.load_all(candidates, &self.api, &move |factory| {
            if factory.identifier() == "core.irc_base" {
                config.raw().clone()
            } else {
                config
                    .raw()
                    .get("extension")
                    .and_then(|exts| exts.get(factory.identifier()))
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Default::default()))
            }
        })?;
        info!(count = loaded.len(), "extensions ready");
        self.loaded_extensions = loaded;
        Ok(())
    }

    /// Run the reconnect loop until a shutdown signal arrives.
    pub async fn run(mut self) -> std::io::Result<()> {
        if self.loaded_extensions.is_empty() {
            if let Err(e) = self.load_extensions() {
                error!("extension loader aborted: {e}");
            }
        }

        loop {
            match self.connect_and_serve().await {
                Flow::Shutdown => return Ok(()),
                Flow::Reconnect => {
                    error!("disconnected from IRC, trying again in {RECONNECT_DELAY:?}");
                    tokio::select! {
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                        _ = tokio::signal::ctrl_c() => return Ok(()),
                    }
                }
            }
        }
    }

    async fn connect_and_serve(&mut self) -> Flow {
        let (handle, mut inbound) = match net::spawn(&self.host, self.port, &self.bind_addr, self.use_tls).await {
            Ok(pair) => pair,
            Err(e) => {
                error!("failed to connect to {}:{}: {e}", self.host, self.port);
                return Flow::Reconnect;
            }
        };
        self.api.rebind_outbound(handle.outbound_sender()).await;
        self.handshake().await;

        loop {
            tokio::select! {
                biased;

                _ = tokio::signal::ctrl_c() => {
                    info!("received shutdown signal");
                    handle.stop().await;
                    return Flow::Shutdown;
                }

                received = inbound.recv() => {
                    match received {
                        None | Some(None) => {
                            return Flow::Reconnect;
                        }
                        Some(Some(command)) => self.dispatch(command).await,
                    }
                }

                _ = tokio::time::sleep(IDLE_TIMEOUT) => {
                    let nick = self.api.nick().await;
                    self.api.send_raw(format!("PING :{nick}")).await;
                }
            }
        }
    }

    async fn handshake(&self) {
        if let Some(password) = &self.password {
            self.api.send_raw(format!("PASS {password}")).await;
        }
        self.api.send_raw(format!("NICK {}", self.nick)).await;
        self.api
            .send_raw(format!("USER {} * 8 :{}", self.user, self.real_name))
            .await;
    }

    async fn dispatch(&self, command: crate::command::Command) {
        for callback in self.observers.matching(&command) {
            let command = command.clone();
            self.pool.dispatch(async move { callback(command).await }).await;
        }
    }
}

/// Consumes the pool and every held extension; used for the final,
/// caller-initiated shutdown path (not currently exercised by `run`,
/// which exits on `ctrl_c` without a separate drain call, kept for
/// callers embedding `Supervisor` in a larger process).
impl Supervisor {
    pub async fn shutdown(self) {
        warn!("shutting down, bye bye!");
        self.pool.stop().await;
    }
}
