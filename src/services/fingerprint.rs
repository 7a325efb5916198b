//! Hardware fingerprinting
//!
//! Produces the stable identifier the enrollment service keys records by:
//! a SHA-256 over the machine's durable hardware identifiers, hex-encoded.

use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::application::error::{AppError, Result};

pub trait FingerprintProvider: Send + Sync {
    fn fingerprint(&self) -> Result<String>;
}

/// Default provider reading machine-id and DMI identifiers from the
/// filesystem. `root` exists so tests can point it at a staged tree.
pub struct MachineFingerprint {
    root: PathBuf,
}

// Identifier sources, relative to `root`. Absent files are skipped; at
// least one must be present.
const SOURCES: &[&str] = &[
    "etc/machine-id",
    "sys/class/dmi/id/product_uuid",
    "sys/class/dmi/id/board_serial",
];

impl MachineFingerprint {
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for MachineFingerprint {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintProvider for MachineFingerprint {
    fn fingerprint(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        let mut found = 0usize;

        for source in SOURCES {
            match std::fs::read_to_string(self.root.join(source)) {
                Ok(raw) => {
                    let value = raw.trim();
                    if !value.is_empty() {
                        hasher.update(source.as_bytes());
                        hasher.update(b":");
                        hasher.update(value.as_bytes());
                        hasher.update(b"\n");
                        found += 1;
                    }
                }
                Err(_) => continue,
            }
        }

        if found == 0 {
            return Err(AppError::Internal(
                "no hardware identifiers available for fingerprinting".to_string(),
            ));
        }

        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged_root(machine_id: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        std::fs::write(dir.path().join("etc/machine-id"), machine_id).unwrap();
        dir
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let dir = staged_root("8f2c9a1e304b4a52\n");
        let provider = MachineFingerprint::with_root(dir.path());
        let first = provider.fingerprint().unwrap();
        let second = provider.fingerprint().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64, "expected hex-encoded sha256");
    }

    #[test]
    fn fingerprint_changes_with_hardware_identity() {
        let a = staged_root("machine-a");
        let b = staged_root("machine-b");
        let fp_a = MachineFingerprint::with_root(a.path()).fingerprint().unwrap();
        let fp_b = MachineFingerprint::with_root(b.path()).fingerprint().unwrap();
        assert_ne!(fp_a, fp_b);
    }

    #[test]
    fn fingerprint_fails_without_any_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MachineFingerprint::with_root(dir.path());
        assert!(provider.fingerprint().is_err());
    }

    #[test]
    fn whitespace_only_identifiers_are_skipped() {
        let dir = staged_root("   \n");
        let provider = MachineFingerprint::with_root(dir.path());
        assert!(provider.fingerprint().is_err());
    }
}
