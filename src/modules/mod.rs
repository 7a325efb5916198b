//! Kiosk installation modules
//!
//! A module is a named, independently installable unit of system
//! configuration with declared dependencies. Modules implement the
//! [`KioskModule`] capability trait; the built-in set is registered by
//! [`builtin_registry`] as an explicit list at startup.

pub mod display;
pub mod docker;
pub mod hardening;
pub mod network;
pub mod nvidia_driver;
pub mod tailscale;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::error::Result;
use crate::services::command::ShellRunner;
use crate::services::enrollment::EnrollmentClient;
use crate::services::fingerprint::FingerprintProvider;
use crate::services::registry::ModuleRegistry;
use crate::services::settings::SettingsStore;

/// Static identity of a module: stable name, presentation fields, display
/// order and the names of modules that must be `completed` first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Sort key for presentation only; execution order comes from
    /// `dependencies`.
    pub order: u32,
    pub dependencies: &'static [&'static str],
}

/// Persisted per-module status, keyed by module name under `modules.<name>`
/// in the settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Pending,
    Installing,
    Completed,
    Failed,
    MokPending,
    RebootRequired,
}

impl ModuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Pending => "pending",
            ModuleStatus::Installing => "installing",
            ModuleStatus::Completed => "completed",
            ModuleStatus::Failed => "failed",
            ModuleStatus::MokPending => "mok_pending",
            ModuleStatus::RebootRequired => "reboot_required",
        }
    }

    /// Only `completed` satisfies a dependency requirement.
    pub fn satisfies_dependency(&self) -> bool {
        matches!(self, ModuleStatus::Completed)
    }

    /// Statuses the startup reconciliation pass re-evaluates via the
    /// module's `recheck` hook.
    pub fn needs_recheck(&self) -> bool {
        matches!(self, ModuleStatus::MokPending | ModuleStatus::RebootRequired)
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ModuleStatus::Pending),
            "installing" => Ok(ModuleStatus::Installing),
            "completed" => Ok(ModuleStatus::Completed),
            "failed" => Ok(ModuleStatus::Failed),
            "mok_pending" => Ok(ModuleStatus::MokPending),
            "reboot_required" => Ok(ModuleStatus::RebootRequired),
            other => Err(format!("unknown module status '{}'", other)),
        }
    }
}

/// What an install routine reports back to the orchestrator.
///
/// `MokPending` and `RebootRequired` mean "neither fully done nor failed -
/// needs a reboot or external action before re-evaluation" and take
/// precedence over plain success/failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Completed(String),
    Failed(String),
    MokPending(String),
    RebootRequired(String),
}

impl InstallOutcome {
    pub fn status(&self) -> ModuleStatus {
        match self {
            InstallOutcome::Completed(_) => ModuleStatus::Completed,
            InstallOutcome::Failed(_) => ModuleStatus::Failed,
            InstallOutcome::MokPending(_) => ModuleStatus::MokPending,
            InstallOutcome::RebootRequired(_) => ModuleStatus::RebootRequired,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            InstallOutcome::Completed(msg)
            | InstallOutcome::Failed(msg)
            | InstallOutcome::MokPending(msg)
            | InstallOutcome::RebootRequired(msg) => msg,
        }
    }
}

/// Shared collaborators handed to every module routine.
#[derive(Clone)]
pub struct ModuleContext {
    pub settings: SettingsStore,
    pub shell: ShellRunner,
    pub enrollment: EnrollmentClient,
    pub fingerprint: Arc<dyn FingerprintProvider>,
}

/// Capability interface for installation modules.
///
/// Routines report failures through `InstallOutcome::Failed` and reserve
/// `Err` for truly unexpected conditions; the orchestrator converts those
/// faults to a recorded failure at its boundary.
#[async_trait]
pub trait KioskModule: Send + Sync + fmt::Debug {
    fn descriptor(&self) -> &ModuleDescriptor;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Module-specific prerequisite check, evaluated by the gate after
    /// identity and dependency checks pass. `Err` carries the
    /// human-readable reason, propagated verbatim.
    async fn check_prerequisites(&self, _ctx: &ModuleContext) -> std::result::Result<(), String> {
        Ok(())
    }

    async fn install(&self, ctx: &ModuleContext) -> anyhow::Result<InstallOutcome>;

    /// Idempotent post-reboot re-check for modules that can end an attempt
    /// in `mok_pending` or `reboot_required`. `None` means the module has
    /// no such hook; `Some(true)` means the underlying condition is now
    /// satisfied. Must not re-run install side effects.
    async fn recheck(&self, _ctx: &ModuleContext) -> Option<bool> {
        None
    }
}

/// The built-in module set, in display order.
pub fn builtin_modules() -> Vec<Arc<dyn KioskModule>> {
    vec![
        Arc::new(network::NetworkModule),
        Arc::new(nvidia_driver::NvidiaDriverModule),
        Arc::new(docker::DockerModule),
        Arc::new(display::DisplayModule),
        Arc::new(tailscale::TailscaleModule),
        Arc::new(hardening::HardeningModule),
    ]
}

/// Build and validate the registry of built-in modules.
pub fn builtin_registry() -> Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    for module in builtin_modules() {
        registry.register(module)?;
    }
    registry.validate()?;
    Ok(registry)
}
