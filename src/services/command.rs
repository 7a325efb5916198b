//! Shell command runner
//!
//! All module install payloads shell out through this one helper, which
//! captures output and converts a nonzero exit into an error carrying
//! stderr.

use tokio::process::Command;

#[derive(Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    /// Run a program and return its stdout. Nonzero exit becomes an error
    /// with stderr attached.
    pub async fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<String> {
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run {}: {}", program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed: {}", program, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Probe variant: true when the program runs and exits zero.
    pub async fn run_ok(&self, program: &str, args: &[&str]) -> bool {
        Command::new(program)
            .args(args)
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}
