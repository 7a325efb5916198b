//! NVIDIA driver module
//!
//! Installs the proprietary display driver. On Secure Boot machines the
//! freshly signed kernel module cannot load until the MOK key is enrolled
//! at the next boot, so the attempt ends in `mok_pending`; otherwise a
//! reboot is still needed before the module loads. The recheck hook
//! probes the driver after the reboot.

use async_trait::async_trait;

use crate::modules::{InstallOutcome, KioskModule, ModuleContext, ModuleDescriptor};

const DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    name: "nvidia_driver",
    display_name: "NVIDIA Driver",
    description: "Proprietary display driver for the kiosk GPU",
    order: 20,
    dependencies: &[],
};

const DRIVER_PACKAGE: &str = "nvidia-driver-535";

#[derive(Debug)]
pub struct NvidiaDriverModule;

impl NvidiaDriverModule {
    async fn secure_boot_enabled(ctx: &ModuleContext) -> bool {
        // mokutil missing or failing reads as Secure Boot disabled.
        match ctx.shell.run("mokutil", &["--sb-state"]).await {
            Ok(out) => out.contains("SecureBoot enabled"),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl KioskModule for NvidiaDriverModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &DESCRIPTOR
    }

    async fn install(&self, ctx: &ModuleContext) -> anyhow::Result<InstallOutcome> {
        let package = ctx
            .settings
            .get_str_or("drivers.nvidia_package", DRIVER_PACKAGE);

        if let Err(err) = ctx.shell.run("apt-get", &["update"]).await {
            return Ok(InstallOutcome::Failed(format!(
                "package index refresh failed: {}",
                err
            )));
        }

        if let Err(err) = ctx
            .shell
            .run("apt-get", &["install", "-y", package.as_str()])
            .await
        {
            return Ok(InstallOutcome::Failed(format!(
                "driver package install failed: {}",
                err
            )));
        }

        if Self::secure_boot_enabled(ctx).await {
            return Ok(InstallOutcome::MokPending(
                "Secure Boot is enabled; enroll the MOK key at the next boot to finish the driver install".to_string(),
            ));
        }

        if ctx.shell.run_ok("nvidia-smi", &[]).await {
            Ok(InstallOutcome::Completed(format!(
                "{} installed and loaded",
                package
            )))
        } else {
            Ok(InstallOutcome::RebootRequired(format!(
                "{} installed; reboot to load the kernel module",
                package
            )))
        }
    }

    async fn recheck(&self, ctx: &ModuleContext) -> Option<bool> {
        Some(ctx.shell.run_ok("nvidia-smi", &[]).await)
    }
}
