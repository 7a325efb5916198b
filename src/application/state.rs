use std::sync::Arc;

use crate::application::config::Config;
use crate::services::enrollment::EnrollmentClient;
use crate::services::fingerprint::FingerprintProvider;
use crate::services::orchestrator::InstallOrchestrator;
use crate::services::registry::ModuleRegistry;
use crate::services::settings::SettingsStore;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub settings: SettingsStore,
    pub registry: Arc<ModuleRegistry>,
    pub orchestrator: InstallOrchestrator,
    pub enrollment: EnrollmentClient,
    pub fingerprint: Arc<dyn FingerprintProvider>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        settings: SettingsStore,
        registry: Arc<ModuleRegistry>,
        orchestrator: InstallOrchestrator,
        enrollment: EnrollmentClient,
        fingerprint: Arc<dyn FingerprintProvider>,
    ) -> Self {
        Self {
            config,
            settings,
            registry,
            orchestrator,
            enrollment,
            fingerprint,
        }
    }
}
