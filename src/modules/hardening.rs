//! Hardening module
//!
//! Locks the kiosk down: firewall defaults and kernel lockdown via the
//! boot command line. The grub change only takes effect after a reboot,
//! so the attempt ends in `reboot_required`; the recheck hook inspects
//! the running kernel's command line.

use async_trait::async_trait;

use crate::modules::{InstallOutcome, KioskModule, ModuleContext, ModuleDescriptor};

const DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    name: "hardening",
    display_name: "System Hardening",
    description: "Firewall defaults and kernel lockdown",
    order: 60,
    dependencies: &[],
};

const LOCKDOWN_FLAG: &str = "lockdown=integrity";
const CMDLINE_PATH: &str = "/proc/cmdline";
const GRUB_DEFAULT_PATH: &str = "/etc/default/grub";

#[derive(Debug)]
pub struct HardeningModule;

impl HardeningModule {
    /// Add the lockdown flag to GRUB_CMDLINE_LINUX_DEFAULT, preserving the
    /// rest of the file. Returns None when the flag is already present.
    fn amend_grub_config(contents: &str) -> Option<String> {
        if contents.contains(LOCKDOWN_FLAG) {
            return None;
        }

        let mut amended = Vec::new();
        let mut patched = false;
        for line in contents.lines() {
            if !patched && line.trim_start().starts_with("GRUB_CMDLINE_LINUX_DEFAULT=") {
                if let Some(closing) = line.rfind('"') {
                    let (head, tail) = line.split_at(closing);
                    let separator = if head.ends_with('"') { "" } else { " " };
                    amended.push(format!("{}{}{}{}", head, separator, LOCKDOWN_FLAG, tail));
                    patched = true;
                    continue;
                }
            }
            amended.push(line.to_string());
        }

        if !patched {
            amended.push(format!("GRUB_CMDLINE_LINUX_DEFAULT=\"{}\"", LOCKDOWN_FLAG));
        }

        Some(amended.join("\n") + "\n")
    }

    async fn lockdown_active(cmdline_path: &str) -> bool {
        tokio::fs::read_to_string(cmdline_path)
            .await
            .map(|cmdline| cmdline.contains(LOCKDOWN_FLAG))
            .unwrap_or(false)
    }
}

#[async_trait]
impl KioskModule for HardeningModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &DESCRIPTOR
    }

    async fn install(&self, ctx: &ModuleContext) -> anyhow::Result<InstallOutcome> {
        if let Err(err) = ctx.shell.run("ufw", &["default", "deny", "incoming"]).await {
            return Ok(InstallOutcome::Failed(format!(
                "firewall default policy failed: {}",
                err
            )));
        }
        if let Err(err) = ctx.shell.run("ufw", &["--force", "enable"]).await {
            return Ok(InstallOutcome::Failed(format!(
                "firewall enable failed: {}",
                err
            )));
        }

        if Self::lockdown_active(CMDLINE_PATH).await {
            return Ok(InstallOutcome::Completed(
                "firewall enabled; kernel lockdown already active".to_string(),
            ));
        }

        let grub = match tokio::fs::read_to_string(GRUB_DEFAULT_PATH).await {
            Ok(contents) => contents,
            Err(err) => {
                return Ok(InstallOutcome::Failed(format!(
                    "cannot read grub configuration: {}",
                    err
                )))
            }
        };

        if let Some(amended) = Self::amend_grub_config(&grub) {
            if let Err(err) = tokio::fs::write(GRUB_DEFAULT_PATH, amended).await {
                return Ok(InstallOutcome::Failed(format!(
                    "cannot write grub configuration: {}",
                    err
                )));
            }
            if let Err(err) = ctx.shell.run("update-grub", &[]).await {
                return Ok(InstallOutcome::Failed(format!(
                    "update-grub failed: {}",
                    err
                )));
            }
        }

        Ok(InstallOutcome::RebootRequired(
            "kernel lockdown enabled; reboot to apply".to_string(),
        ))
    }

    async fn recheck(&self, _ctx: &ModuleContext) -> Option<bool> {
        Some(Self::lockdown_active(CMDLINE_PATH).await)
    }
}
