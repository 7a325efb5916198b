pub mod command;
pub mod enrollment;
pub mod fingerprint;
pub mod gate;
pub mod orchestrator;
pub mod registry;
pub mod settings;

pub use command::ShellRunner;
pub use enrollment::EnrollmentClient;
pub use fingerprint::{FingerprintProvider, MachineFingerprint};
pub use gate::GateDecision;
pub use orchestrator::InstallOrchestrator;
pub use registry::ModuleRegistry;
pub use settings::SettingsStore;
