//! Installability gate
//!
//! Pure decision logic for whether a module may begin installation right
//! now, evaluated fresh on every call. Check order is load-bearing:
//! identity and in-progress checks short-circuit before dependency checks,
//! which short-circuit before the module's own prerequisite hook, so
//! reasons are deterministic and cheap checks run before expensive ones.

use std::collections::HashMap;

use crate::modules::{KioskModule, ModuleContext, ModuleStatus};

pub const REASON_ALREADY_INSTALLED: &str = "already installed";
pub const REASON_IN_PROGRESS: &str = "install in progress";

/// Outcome of a gate evaluation. A denial is a normal negative result with
/// a human-readable reason, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub allowed: bool,
    pub reason: String,
}

impl GateDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Decide whether `module` may install given the current status map.
///
/// Unknown names in `statuses` read as `pending`. The first unmet
/// dependency, in declared order, determines the reported reason.
pub async fn evaluate(
    module: &dyn KioskModule,
    statuses: &HashMap<String, ModuleStatus>,
    ctx: &ModuleContext,
) -> GateDecision {
    let descriptor = module.descriptor();
    let own_status = statuses
        .get(descriptor.name)
        .copied()
        .unwrap_or(ModuleStatus::Pending);

    match own_status {
        ModuleStatus::Completed => return GateDecision::deny(REASON_ALREADY_INSTALLED),
        ModuleStatus::Installing => return GateDecision::deny(REASON_IN_PROGRESS),
        _ => {}
    }

    for dep in descriptor.dependencies {
        let dep_status = statuses
            .get(*dep)
            .copied()
            .unwrap_or(ModuleStatus::Pending);
        if !dep_status.satisfies_dependency() {
            return GateDecision::deny(format!("dependency not met: {}", dep));
        }
    }

    if let Err(reason) = module.check_prerequisites(ctx).await {
        return GateDecision::deny(reason);
    }

    GateDecision::allow()
}
