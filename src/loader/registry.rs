//! Typed component initializer registry
//!
//! Components register their initializer once at startup instead of
//! being discovered through a runtime naming convention. A missing
//! registration is not an error: the fragment still mounts, it just
//! has no behavior wired to it.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Hook run after a component's fragment has been mounted
pub trait ComponentInit: Send + Sync {
    /// Component name this initializer belongs to
    fn name(&self) -> &'static str;

    /// Wire the component's behavior against its mounted container
    fn init(&self, container_id: &str) -> Result<()>;
}

/// name → initializer table, populated at a single startup site
#[derive(Clone, Default)]
pub struct InitRegistry {
    inits: HashMap<&'static str, Arc<dyn ComponentInit>>,
}

impl InitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an initializer; a later registration for the same name
    /// replaces the earlier one
    pub fn register(&mut self, init: Arc<dyn ComponentInit>) {
        self.inits.insert(init.name(), init);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ComponentInit>> {
        self.inits.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.inits.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingInit {
        calls: AtomicUsize,
    }

    impl ComponentInit for CountingInit {
        fn name(&self) -> &'static str {
            "navbar"
        }

        fn init(&self, _container_id: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = InitRegistry::new();
        let init = Arc::new(CountingInit {
            calls: AtomicUsize::new(0),
        });
        registry.register(init.clone());

        assert!(registry.get("navbar").is_some());
        assert!(registry.get("discussion").is_none());
        assert_eq!(registry.names(), vec!["navbar"]);

        registry.get("navbar").unwrap().init("navbar-container").unwrap();
        assert_eq!(init.calls.load(Ordering::SeqCst), 1);
    }
}
