//! The raw-hook observer table.
//!
//! Predicates run synchronously on the dispatch task (the supervisor's
//! read loop) and must be fast; matching callbacks are handed to the
//! [`crate::pool::WorkerPool`] for execution. Kept as its own type,
//! shared by `Arc` between [`crate::api::Api`] (which registers hooks)
//! and [`crate::supervisor::Supervisor`] (which dispatches against it),
//! so the observer table outlives any one connection's network worker.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::command::Command;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type Predicate = Arc<dyn Fn(&Command) -> bool + Send + Sync>;
pub type RawCallback = Arc<dyn Fn(Command) -> BoxFuture + Send + Sync>;

/// Always-true predicate, the default for [`Observers::register`].
pub fn always_true(_: &Command) -> bool {
    true
}

struct Observer {
    callback: RawCallback,
    predicate: Predicate,
}

/// `kind -> Vec<Observer>`, guarded by a plain (non-async) mutex since
/// both registration and matching are synchronous, non-blocking
/// operations.
#[derive(Default)]
pub struct Observers(Mutex<HashMap<String, Vec<Observer>>>);

impl Observers {
    pub fn new() -> Observers {
        Observers::default()
    }

    /// Register a raw observer under `kind` (a verb or numeric).
    pub fn register(&self, kind: &str, callback: RawCallback, predicate: Predicate) {
        self.0
            .lock()
            .unwrap()
            .entry(kind.to_string())
            .or_default()
            .push(Observer { callback, predicate });
    }

    /// Evaluate every observer registered under `command.kind`, returning
    /// the callbacks whose predicate accepted it, in registration order.
    pub fn matching(&self, command: &Command) -> Vec<RawCallback> {
        let table = self.0.lock().unwrap();
        let Some(observers) = table.get(&command.kind) else {
            return Vec::new();
        };
        observers
            .iter()
            .filter(|o| (o.predicate)(command))
            .map(|o| o.callback.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn cmd(kind: &str) -> Command {
        Command {
            prefix: None,
            kind: kind.to_string(),
            args: Vec::new(),
            message: None,
            raw: kind.to_string(),
        }
    }

    #[test]
    fn matches_only_registered_kind() {
        let observers = Observers::new();
        observers.register(
            "PING",
            Arc::new(|_| Box::pin(async {})),
            Arc::new(always_true),
        );
        assert_eq!(observers.matching(&cmd("PING")).len(), 1);
        assert_eq!(observers.matching(&cmd("PONG")).len(), 0);
    }

    #[test]
    fn predicate_filters_out_non_matching() {
        let observers = Observers::new();
        observers.register(
            "PRIVMSG",
            Arc::new(|_| Box::pin(async {})),
            Arc::new(|c: &Command| c.args.first().map(String::as_str) == Some("#a")),
        );
        let mut a = cmd("PRIVMSG");
        a.args.push("#a".to_string());
        let mut b = cmd("PRIVMSG");
        b.args.push("#b".to_string());
        assert_eq!(observers.matching(&a).len(), 1);
        assert_eq!(observers.matching(&b).len(), 0);
    }

    #[tokio::test]
    async fn multiple_observers_all_invoked_in_order() {
        let observers = Observers::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            observers.register(
                "PING",
                Arc::new(move |_| {
                    let order = order.clone();
                    Box::pin(async move { order.lock().unwrap().push(i) })
                }),
                Arc::new(always_true),
            );
        }
        let matched = observers.matching(&cmd("PING"));
        assert_eq!(matched.len(), 3);
        for callback in matched {
            callback(cmd("PING")).await;
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}
