//! Extension discovery, dependency resolution, and construction.
//!
//! The original loads extensions by scanning directories for source files
//! at runtime. A reimplementation with no dynamic loading replaces
//! "discover" with a caller-supplied registry of
//! [`ExtensionFactory`] trait objects; validation, blacklist filtering,
//! duplicate-skip, and the depth-15 dependency resolution are ports of
//! `midori/extloader.py`'s `load_with_dependencies`/`load_extensions`.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{info, warn};

use crate::api::Api;
use crate::config::Config;
use crate::error::{DependencyError, LoadError};

/// Guard against cycles and pathological dependency chains; a direct port
/// of the original's recursion-depth cutoff.
pub const MAX_DEPENDENCY_DEPTH: usize = 15;

/// An extension instance. The core keeps it alive for the process
/// lifetime purely to hold its hook registrations; there is no further
/// required behavior after construction.
pub trait Extension: Send + Sync {}

/// A compiled-in extension candidate, standing in for a loadable module.
pub trait ExtensionFactory: Send + Sync {
    /// Unique identifier other extensions depend on by name.
    fn identifier(&self) -> &'static str;
    /// Identifiers that must be constructed before this one.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }
    /// Free-form version string, informational only.
    fn version(&self) -> &'static str;
    /// Build the extension. `options` is this extension's slice of the
    /// `extension` config map (or, for the built-in state tracker, the
    /// whole document, see [`crate::supervisor`]).
    fn construct(&self, api: &Api, options: &Config) -> Box<dyn Extension>;
}

/// Resolves a set of [`ExtensionFactory`] candidates into constructed
/// extensions, honoring a blacklist and dependency ordering.
pub struct ExtensionLoader {
    blacklist: HashSet<String>,
}

impl ExtensionLoader {
    pub fn new(blacklist: Vec<String>) -> ExtensionLoader {
        ExtensionLoader {
            blacklist: blacklist.into_iter().collect(),
        }
    }

    /// Validate, filter, and construct every candidate along with its
    /// transitive dependencies, in topological order. `options_for` maps
    /// a factory to the `Config` slice passed to its constructor.
    pub fn load_all(
        &self,
        candidates: Vec<Box<dyn ExtensionFactory>>,
        api: &Api,
        options_for: &dyn Fn(&dyn ExtensionFactory) -> Value,
    ) -> Result<HashMap<String, Box<dyn Extension>>, DependencyError> {
        let mut by_id: HashMap<String, Box<dyn ExtensionFactory>> = HashMap::new();
        for factory in candidates {
            if let Err(e) = validate(factory.as_ref()) {
                warn!("{e}");
                continue;
            }
            let id = factory.identifier().to_string();
            if self.blacklist.contains(&id) {
                warn!("extension candidate '{id}' is on the blacklist, skipping");
                continue;
            }
            if by_id.contains_key(&id) {
                warn!("there is already an extension with identifier '{id}', skipping");
                continue;
            }
            by_id.insert(id, factory);
        }

        let mut loaded: HashMap<String, Box<dyn Extension>> = HashMap::new();
        let ids: Vec<String> = by_id.keys().cloned().collect();
        for id in ids {
            if loaded.contains_key(&id) {
                continue;
            }
            let factory = by_id.get(&id).expect("id came from by_id's own keys");
            load_with_dependencies(factory.as_ref(), &by_id, &mut loaded, api, options_for, 0)?;
        }
        info!(count = loaded.len(), "extensions loaded");
        Ok(loaded)
    }
}

fn validate(factory: &dyn ExtensionFactory) -> Result<(), LoadError> {
    if factory.identifier().is_empty() {
        return Err(LoadError::MissingMetadata {
            identifier: String::new(),
            attribute: "identifier",
        });
    }
    if factory.version().is_empty() {
        return Err(LoadError::MissingMetadata {
            identifier: factory.identifier().to_string(),
            attribute: "version",
        });
    }
    Ok(())
}

fn load_with_dependencies(
    factory: &dyn ExtensionFactory,
    by_id: &HashMap<String, Box<dyn ExtensionFactory>>,
    loaded: &mut HashMap<String, Box<dyn Extension>>,
    api: &Api,
    options_for: &dyn Fn(&dyn ExtensionFactory) -> Value,
    depth: usize,
) -> Result<(), DependencyError> {
    if depth > MAX_DEPENDENCY_DEPTH {
        return Err(DependencyError::DepthExceeded(factory.identifier().to_string()));
    }
    if loaded.contains_key(factory.identifier()) {
        return Ok(());
    }
    for dependency in factory.dependencies() {
        if loaded.contains_key(*dependency) {
            continue;
        }
        match by_id.get(*dependency) {
            Some(dep_factory) => load_with_dependencies(
                dep_factory.as_ref(),
                by_id,
                loaded,
                api,
                options_for,
                depth + 1,
            )?,
            None => {
                return Err(DependencyError::Unsatisfied {
                    requirer: factory.identifier().to_string(),
                    dependency: (*dependency).to_string(),
                })
            }
        }
    }
    let options = Config::from_value(options_for(factory));
    let extension = factory.construct(api, &options);
    loaded.insert(factory.identifier().to_string(), extension);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Observers;
    use crate::state::Tracker;
    use std::sync::Arc;
    use tokio::sync::{mpsc, Mutex};

    struct Noop;
    impl Extension for Noop {}

    struct Factory {
        id: &'static str,
        deps: &'static [&'static str],
    }

    impl ExtensionFactory for Factory {
        fn identifier(&self) -> &'static str {
            self.id
        }
        fn dependencies(&self) -> &[&'static str] {
            self.deps
        }
        fn version(&self) -> &'static str {
            "1.0.0"
        }
        fn construct(&self, _api: &Api, _options: &Config) -> Box<dyn Extension> {
            Box::new(Noop)
        }
    }

    fn test_api() -> Api {
        let (tx, _rx) = mpsc::channel(8);
        Api::new(
            "bot".to_string(),
            tx,
            Arc::new(Observers::new()),
            Arc::new(Mutex::new(Tracker::new())),
        )
    }

    #[test]
    fn resolves_dependency_order() {
        let api = test_api();
        let loader = ExtensionLoader::new(vec![]);
        let candidates: Vec<Box<dyn ExtensionFactory>> = vec![
            Box::new(Factory { id: "a", deps: &["b"] }),
            Box::new(Factory { id: "b", deps: &[] }),
        ];
        let loaded = loader
            .load_all(candidates, &api, &|_| Value::Object(Default::default()))
            .unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn missing_dependency_fails() {
        let api = test_api();
        let loader = ExtensionLoader::new(vec![]);
        let candidates: Vec<Box<dyn ExtensionFactory>> =
            vec![Box::new(Factory { id: "a", deps: &["ghost"] })];
        let result = loader.load_all(candidates, &api, &|_| Value::Object(Default::default()));
        assert!(matches!(result, Err(DependencyError::Unsatisfied { .. })));
    }

    #[test]
    fn cycle_trips_depth_guard() {
        let api = test_api();
        let loader = ExtensionLoader::new(vec![]);
        let candidates: Vec<Box<dyn ExtensionFactory>> = vec![
            Box::new(Factory { id: "a", deps: &["b"] }),
            Box::new(Factory { id: "b", deps: &["a"] }),
        ];
        let result = loader.load_all(candidates, &api, &|_| Value::Object(Default::default()));
        assert!(matches!(result, Err(DependencyError::DepthExceeded(_))));
    }

    #[test]
    fn blacklisted_identifier_is_skipped() {
        let api = test_api();
        let loader = ExtensionLoader::new(vec!["a".to_string()]);
        let candidates: Vec<Box<dyn ExtensionFactory>> =
            vec![Box::new(Factory { id: "a", deps: &[] })];
        let loaded = loader
            .load_all(candidates, &api, &|_| Value::Object(Default::default()))
            .unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn duplicate_identifier_keeps_first() {
        let api = test_api();
        let loader = ExtensionLoader::new(vec![]);
        let candidates: Vec<Box<dyn ExtensionFactory>> = vec![
            Box::new(Factory { id: "a", deps: &[] }),
            Box::new(Factory { id: "a", deps: &[] }),
        ];
        let loaded = loader
            .load_all(candidates, &api, &|_| Value::Object(Default::default()))
            .unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
