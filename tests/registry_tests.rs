//! Unit tests for the module registry
//!
//! Covers `src/services/registry.rs`: registration, duplicate rejection,
//! ordered listing, name lookups and dependency validation.

mod common;
use common::ScriptedModule;

use std::sync::Arc;

use kioskd::error::AppError;
use kioskd::modules::KioskModule;
use kioskd::services::ModuleRegistry;

fn module(name: &'static str, order: u32, deps: &'static [&'static str]) -> Arc<dyn KioskModule> {
    Arc::new(ScriptedModule::succeeding(name, order, deps))
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn register_and_get_round_trip() {
    let mut registry = ModuleRegistry::new();
    registry.register(module("network", 10, &[])).unwrap();

    let found = registry.get("network").expect("module should be registered");
    assert_eq!(found.name(), "network");
    assert!(registry.get("display").is_none());
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = ModuleRegistry::new();
    registry.register(module("network", 10, &[])).unwrap();

    let err = registry
        .register(module("network", 20, &[]))
        .expect_err("duplicate name must be rejected");
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(err.to_string().contains("already registered"));
}

#[test]
fn require_unknown_module_is_not_found() {
    let registry = ModuleRegistry::new();
    let err = registry.require("ghost").expect_err("unknown module");
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// Ordered listing
// ============================================================================

#[test]
fn list_ordered_sorts_by_order_ascending() {
    let mut registry = ModuleRegistry::new();
    registry.register(module("display", 40, &[])).unwrap();
    registry.register(module("network", 10, &[])).unwrap();
    registry.register(module("docker", 30, &[])).unwrap();

    let names: Vec<_> = registry.list_ordered().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["network", "docker", "display"]);
}

#[test]
fn equal_order_breaks_ties_by_name() {
    let mut registry = ModuleRegistry::new();
    registry.register(module("zeta", 10, &[])).unwrap();
    registry.register(module("alpha", 10, &[])).unwrap();
    registry.register(module("mid", 10, &[])).unwrap();

    let names: Vec<_> = registry.list_ordered().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn list_ordered_is_deterministic_across_calls() {
    let mut registry = ModuleRegistry::new();
    registry.register(module("b", 10, &[])).unwrap();
    registry.register(module("a", 10, &[])).unwrap();
    registry.register(module("c", 5, &[])).unwrap();

    let first: Vec<_> = registry.list_ordered().iter().map(|m| m.name()).collect();
    for _ in 0..10 {
        let again: Vec<_> = registry.list_ordered().iter().map(|m| m.name()).collect();
        assert_eq!(again, first, "ordering must be stable across calls");
    }
}

#[test]
fn names_returns_all_registered_names() {
    let mut registry = ModuleRegistry::new();
    registry.register(module("network", 10, &[])).unwrap();
    registry.register(module("docker", 30, &["network"])).unwrap();

    let names = registry.names();
    assert_eq!(names.len(), 2);
    assert!(names.contains("network"));
    assert!(names.contains("docker"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn validate_accepts_known_dependencies() {
    let mut registry = ModuleRegistry::new();
    registry.register(module("network", 10, &[])).unwrap();
    registry.register(module("docker", 30, &["network"])).unwrap();

    assert!(registry.validate().is_ok());
}

#[test]
fn validate_rejects_unknown_dependency() {
    let mut registry = ModuleRegistry::new();
    registry.register(module("docker", 30, &["network"])).unwrap();

    let err = registry.validate().expect_err("unknown dependency");
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(err.to_string().contains("network"));
    assert!(err.to_string().contains("docker"));
}
