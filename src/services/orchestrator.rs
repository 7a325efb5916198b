//! Install orchestrator
//!
//! Drives one module's install attempt to a terminal status. Each module
//! has its own mutual-exclusion lock, acquired with a non-blocking attempt:
//! "someone is already installing this module" is a normal,
//! immediately-reportable condition, not contention to wait out. Status
//! transitions are persisted before the lock is released, so a query
//! immediately after a routine returns always sees a terminal status.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;

use crate::application::error::Result;
use crate::modules::{InstallOutcome, ModuleContext, ModuleStatus};
use crate::services::gate::{self, GateDecision, REASON_IN_PROGRESS};
use crate::services::registry::ModuleRegistry;
use crate::services::settings::SettingsStore;

/// Final report of one install attempt.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InstallReport {
    pub module: String,
    pub status: ModuleStatus,
    pub message: String,
}

/// Result of `request_install`: either the gate (or the per-module lock)
/// denied the attempt, or the routine ran to a terminal status.
#[derive(Debug, Clone)]
pub enum InstallAttempt {
    Denied { reason: String },
    Finished(InstallReport),
}

#[derive(Clone)]
pub struct InstallOrchestrator {
    inner: Arc<OrchestratorInner>,
}

struct OrchestratorInner {
    registry: Arc<ModuleRegistry>,
    settings: SettingsStore,
    ctx: ModuleContext,
    locks: parking_lot::Mutex<HashMap<&'static str, Arc<AsyncMutex<()>>>>,
}

impl InstallOrchestrator {
    pub fn new(registry: Arc<ModuleRegistry>, settings: SettingsStore, ctx: ModuleContext) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                registry,
                settings,
                ctx,
                locks: parking_lot::Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.inner.registry
    }

    /// Snapshot of the status map for every registered module.
    pub fn status_map(&self) -> HashMap<String, ModuleStatus> {
        self.inner.settings.module_statuses(self.inner.registry.names())
    }

    pub fn get_status(&self, name: &str) -> Result<ModuleStatus> {
        let module = self.inner.registry.require(name)?;
        Ok(self.inner.settings.module_status(module.name()))
    }

    /// Fresh gate evaluation for one module.
    pub async fn can_install(&self, name: &str) -> Result<GateDecision> {
        let module = self.inner.registry.require(name)?;
        let statuses = self.status_map();
        Ok(gate::evaluate(module.as_ref(), &statuses, &self.inner.ctx).await)
    }

    /// Names of all modules the gate currently allows, in display order.
    pub async fn list_installable(&self) -> Vec<String> {
        let statuses = self.status_map();
        let mut installable = Vec::new();
        for module in self.inner.registry.list_ordered() {
            let decision = gate::evaluate(module.as_ref(), &statuses, &self.inner.ctx).await;
            if decision.allowed {
                installable.push(module.name().to_string());
            }
        }
        installable
    }

    /// Run one install attempt for `name` to completion.
    ///
    /// The per-module lock closes the race window between the gate's
    /// status read and the actual start; the gate is re-evaluated under
    /// the lock. The routine runs on its own task so a panic inside it is
    /// contained and converted to a recorded failure.
    pub async fn request_install(&self, name: &str) -> Result<InstallAttempt> {
        let module = self.inner.registry.require(name)?;
        let mod_name = module.name();

        let guard = match self.lock_for(mod_name).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                return Ok(InstallAttempt::Denied {
                    reason: REASON_IN_PROGRESS.to_string(),
                })
            }
        };

        let statuses = self.status_map();
        let decision = gate::evaluate(module.as_ref(), &statuses, &self.inner.ctx).await;
        if !decision.allowed {
            return Ok(InstallAttempt::Denied {
                reason: decision.reason,
            });
        }

        self.transition(mod_name, ModuleStatus::Installing, "install started")?;

        let outcome = {
            let module = module.clone();
            let ctx = self.inner.ctx.clone();
            let handle = tokio::spawn(async move { module.install(&ctx).await });
            match handle.await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(fault)) => {
                    tracing::error!(module = mod_name, error = %fault, "install routine fault");
                    InstallOutcome::Failed(fault.to_string())
                }
                Err(join_err) => {
                    tracing::error!(module = mod_name, error = %join_err, "install routine aborted");
                    InstallOutcome::Failed(format!("install routine aborted: {}", join_err))
                }
            }
        };

        let status = outcome.status();
        let message = outcome.message().to_string();
        self.transition(mod_name, status, &message)?;
        drop(guard);

        Ok(InstallAttempt::Finished(InstallReport {
            module: mod_name.to_string(),
            status,
            message,
        }))
    }

    /// Startup reconciliation: for every module left in `mok_pending` or
    /// `reboot_required`, ask its recheck hook whether the underlying
    /// condition is now satisfied and promote to `completed` if so.
    /// Safe to call any number of times. Returns how many modules were
    /// promoted.
    pub async fn reconcile(&self) -> Result<usize> {
        let mut recovered = 0;
        for module in self.inner.registry.list_ordered() {
            let name = module.name();
            let status = self.inner.settings.module_status(name);
            if !status.needs_recheck() {
                continue;
            }

            match module.recheck(&self.inner.ctx).await {
                Some(true) => {
                    self.transition(name, ModuleStatus::Completed, "recheck condition satisfied")?;
                    recovered += 1;
                }
                Some(false) => {
                    tracing::debug!(module = name, status = %status, "recheck condition not yet satisfied");
                }
                None => {
                    tracing::warn!(module = name, status = %status, "module has no recheck hook");
                }
            }
        }
        Ok(recovered)
    }

    fn lock_for(&self, name: &'static str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.locks.lock();
        locks
            .entry(name)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Record a status transition and persist it immediately.
    fn transition(&self, name: &'static str, to: ModuleStatus, message: &str) -> Result<()> {
        let settings = &self.inner.settings;
        let from = settings.module_status(name);
        let now = Utc::now().to_rfc3339();

        settings.set(&format!("modules.{}", name), to.as_str());
        settings.set(&format!("modules_meta.{}.message", name), message);
        if to == ModuleStatus::Installing {
            settings.set(&format!("modules_meta.{}.started_at", name), now);
        } else {
            settings.set(&format!("modules_meta.{}.finished_at", name), now);
        }
        settings.persist()?;

        tracing::info!(module = name, from = %from, to = %to, "module status transition");
        Ok(())
    }
}
