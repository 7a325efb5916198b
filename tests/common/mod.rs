//! Test helpers and utilities for unit and integration testing.
//!
//! Provides scripted modules with closure-driven install routines, a
//! deterministic fingerprint provider, temp-backed settings stores and a
//! ready-made orchestrator builder.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use kioskd::application::error::Result;
use kioskd::modules::{InstallOutcome, KioskModule, ModuleContext, ModuleDescriptor};
use kioskd::services::{
    EnrollmentClient, FingerprintProvider, InstallOrchestrator, ModuleRegistry, SettingsStore,
    ShellRunner,
};

type InstallScript = Box<
    dyn Fn() -> Pin<Box<dyn Future<Output = anyhow::Result<InstallOutcome>> + Send>>
        + Send
        + Sync,
>;

/// A module whose install routine is a test-supplied closure.
pub struct ScriptedModule {
    descriptor: ModuleDescriptor,
    prereq_failure: Option<String>,
    script: InstallScript,
    recheck_flag: Option<Arc<AtomicBool>>,
    pub install_calls: Arc<AtomicUsize>,
    pub recheck_calls: Arc<AtomicUsize>,
}

impl std::fmt::Debug for ScriptedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedModule")
            .field("descriptor", &self.descriptor)
            .field("prereq_failure", &self.prereq_failure)
            .finish_non_exhaustive()
    }
}

impl ScriptedModule {
    pub fn new<F, Fut>(
        name: &'static str,
        order: u32,
        dependencies: &'static [&'static str],
        script: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<InstallOutcome>> + Send + 'static,
    {
        Self {
            descriptor: ModuleDescriptor {
                name,
                display_name: name,
                description: "test module",
                order,
                dependencies,
            },
            prereq_failure: None,
            script: Box::new(move || Box::pin(script())),
            recheck_flag: None,
            install_calls: Arc::new(AtomicUsize::new(0)),
            recheck_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A module that installs instantly and successfully.
    pub fn succeeding(
        name: &'static str,
        order: u32,
        dependencies: &'static [&'static str],
    ) -> Self {
        Self::new(name, order, dependencies, || async {
            Ok(InstallOutcome::Completed("done".to_string()))
        })
    }

    pub fn with_prereq_failure(mut self, reason: &str) -> Self {
        self.prereq_failure = Some(reason.to_string());
        self
    }

    /// Give the module a recheck hook that reports the flag's value.
    pub fn with_recheck(mut self, flag: Arc<AtomicBool>) -> Self {
        self.recheck_flag = Some(flag);
        self
    }
}

#[async_trait]
impl KioskModule for ScriptedModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    async fn check_prerequisites(&self, _ctx: &ModuleContext) -> std::result::Result<(), String> {
        match &self.prereq_failure {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    async fn install(&self, _ctx: &ModuleContext) -> anyhow::Result<InstallOutcome> {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        (self.script)().await
    }

    async fn recheck(&self, _ctx: &ModuleContext) -> Option<bool> {
        self.recheck_calls.fetch_add(1, Ordering::SeqCst);
        self.recheck_flag
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
    }
}

/// Fingerprint provider returning a fixed value.
pub struct StaticFingerprint(pub String);

impl FingerprintProvider for StaticFingerprint {
    fn fingerprint(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Settings store backed by a temp directory. Keep the `TempDir` alive for
/// the duration of the test.
pub fn temp_settings() -> (SettingsStore, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store =
        SettingsStore::load(dir.path().join("settings.json")).expect("load empty settings store");
    (store, dir)
}

/// Module context wired to test collaborators. The enrollment client is
/// unconfigured; scripted modules never call it.
pub fn test_context(settings: &SettingsStore) -> ModuleContext {
    ModuleContext {
        settings: settings.clone(),
        shell: ShellRunner,
        enrollment: EnrollmentClient::new(""),
        fingerprint: Arc::new(StaticFingerprint("test-fingerprint".to_string())),
    }
}

/// Registry + orchestrator over the given modules, backed by a temp store.
pub fn build_orchestrator(
    modules: Vec<Arc<dyn KioskModule>>,
) -> (InstallOrchestrator, SettingsStore, TempDir) {
    let (settings, dir) = temp_settings();
    let mut registry = ModuleRegistry::new();
    for module in modules {
        registry.register(module).expect("register test module");
    }
    registry.validate().expect("validate test registry");

    let ctx = test_context(&settings);
    let orchestrator = InstallOrchestrator::new(Arc::new(registry), settings.clone(), ctx);
    (orchestrator, settings, dir)
}
