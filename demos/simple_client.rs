//! A minimal custom extension, run alongside the built-in state tracker.
//!
//! Demonstrates the shape every embedder writes: implement
//! [`ExtensionFactory`], register a command hook at construction time, and
//! hand the factory to [`Supervisor::new`] alongside its configuration.
//! Run with `cargo run --example simple_client -- config.json`.

use std::sync::Arc;

use perch::api::Api;
use perch::config::Config;
use perch::extloader::{Extension, ExtensionFactory};
use perch::state::context_mask;
use perch::supervisor::Supervisor;

struct Greeter;
impl Extension for Greeter {}

struct GreeterFactory;

impl ExtensionFactory for GreeterFactory {
    fn identifier(&self) -> &'static str {
        "demo.greeter"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn construct(&self, api: &Api, _options: &Config) -> Box<dyn Extension> {
        let api_handle = api.clone();
        api.hook_command_if(
            context_mask::BOTH,
            Arc::new(move |msg| {
                let api = api_handle.clone();
                Box::pin(async move {
                    if msg.message.to_lowercase().contains("hello") {
                        let target = msg.channel.as_ref().map(|c| c.name.clone()).unwrap_or_else(|| msg.sender.nick().to_string());
                        api.privmsg(&target, &format!("hello, {}!", msg.sender.nick())).await;
                    }
                })
            }),
            Arc::new(|_msg| true),
        );
        Box::new(Greeter)
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    perch::logging::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = Config::load(&std::path::PathBuf::from(config_path)).expect("failed to load configuration");

    let extensions: Vec<Box<dyn ExtensionFactory>> = vec![Box::new(GreeterFactory)];
    let supervisor = Supervisor::new(config, extensions).expect("invalid configuration");
    supervisor.run().await
}
