//! Module registry
//!
//! Holds the full set of installation modules. Registration happens once
//! at startup from an explicit list; the registry is immutable afterwards
//! and shared behind an `Arc`, so concurrent reads need no locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::application::error::{AppError, Result};
use crate::modules::KioskModule;

#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<&'static str, Arc<dyn KioskModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module under its descriptor name. Duplicate names are a
    /// startup configuration error.
    pub fn register(&mut self, module: Arc<dyn KioskModule>) -> Result<()> {
        let name = module.name();
        if self.modules.contains_key(name) {
            return Err(AppError::Conflict(format!(
                "module '{}' is already registered",
                name
            )));
        }
        self.modules.insert(name, module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn KioskModule>> {
        self.modules.get(name).cloned()
    }

    /// Like `get`, but unknown names surface as a not-found error.
    pub fn require(&self, name: &str) -> Result<Arc<dyn KioskModule>> {
        self.get(name)
            .ok_or_else(|| AppError::NotFound(format!("Unknown module: {}", name)))
    }

    /// All modules sorted by `order` ascending, name ascending on ties.
    /// Display order only; dependency order is enforced by the gate.
    pub fn list_ordered(&self) -> Vec<Arc<dyn KioskModule>> {
        let mut modules: Vec<_> = self.modules.values().cloned().collect();
        modules.sort_by_key(|m| (m.descriptor().order, m.name()));
        modules
    }

    pub fn names(&self) -> HashSet<&'static str> {
        self.modules.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Reject dependency references to unregistered names. Run once after
    /// registration; a bad reference is a programming error, not a runtime
    /// condition.
    pub fn validate(&self) -> Result<()> {
        for module in self.modules.values() {
            for dep in module.descriptor().dependencies {
                if !self.modules.contains_key(dep) {
                    return Err(AppError::NotFound(format!(
                        "module '{}' depends on unknown module '{}'",
                        module.name(),
                        dep
                    )));
                }
            }
        }
        Ok(())
    }
}
