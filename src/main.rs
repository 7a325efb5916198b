use std::sync::Arc;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kioskd::config::Config;
use kioskd::endpoints;
use kioskd::modules::{self, ModuleContext};
use kioskd::services::{
    EnrollmentClient, FingerprintProvider, InstallOrchestrator, MachineFingerprint, SettingsStore,
    ShellRunner,
};
use kioskd::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "kioskd={},tower_http=info",
                    config.log_level
                ))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting kioskd v{}", env!("CARGO_PKG_VERSION"));

    // Load the settings store
    let settings = SettingsStore::load(&config.settings_path)?;
    tracing::info!(path = %settings.path().display(), "settings store loaded");

    // Shared collaborators for module routines
    let enrollment = EnrollmentClient::new(config.enrollment_url.clone());
    if !enrollment.is_configured() {
        tracing::warn!("enrollment server not configured; VPN enrollment will be unavailable");
    }
    let fingerprint: Arc<dyn FingerprintProvider> = Arc::new(MachineFingerprint::new());
    let ctx = ModuleContext {
        settings: settings.clone(),
        shell: ShellRunner,
        enrollment: enrollment.clone(),
        fingerprint: fingerprint.clone(),
    };

    // Build the module registry and orchestrator
    let registry = Arc::new(modules::builtin_registry()?);
    tracing::info!(modules = registry.len(), "module registry built");

    let orchestrator = InstallOrchestrator::new(registry.clone(), settings.clone(), ctx);

    // Promote modules whose reboot-gated condition is now satisfied
    let recovered = orchestrator.reconcile().await?;
    if recovered > 0 {
        tracing::info!(recovered, "modules reconciled after reboot");
    }

    // Create app state
    let state = AppState::new(
        config.clone(),
        settings,
        registry,
        orchestrator,
        enrollment,
        fingerprint,
    );

    // Build the application
    let app = create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("Listening on {}:{}", config.host, config.port);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the main application router
fn create_app(state: AppState) -> Router {
    // CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
