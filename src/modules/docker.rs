//! Container runtime module
//!
//! Installs and enables Docker for the kiosk's containerized workloads.

use async_trait::async_trait;

use crate::modules::{InstallOutcome, KioskModule, ModuleContext, ModuleDescriptor};

const DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    name: "docker",
    display_name: "Container Runtime",
    description: "Docker engine for kiosk application containers",
    order: 30,
    dependencies: &["network"],
};

#[derive(Debug)]
pub struct DockerModule;

#[async_trait]
impl KioskModule for DockerModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &DESCRIPTOR
    }

    async fn check_prerequisites(&self, ctx: &ModuleContext) -> Result<(), String> {
        let probe_host = ctx
            .settings
            .get_str_or("network.probe_host", "deb.debian.org");
        if ctx
            .shell
            .run_ok("ping", &["-c", "1", "-W", "2", probe_host.as_str()])
            .await
        {
            Ok(())
        } else {
            Err(format!("internet unreachable (cannot resolve {})", probe_host))
        }
    }

    async fn install(&self, ctx: &ModuleContext) -> anyhow::Result<InstallOutcome> {
        if let Err(err) = ctx
            .shell
            .run("apt-get", &["install", "-y", "docker.io"])
            .await
        {
            return Ok(InstallOutcome::Failed(format!(
                "docker package install failed: {}",
                err
            )));
        }

        if let Err(err) = ctx
            .shell
            .run("systemctl", &["enable", "--now", "docker"])
            .await
        {
            return Ok(InstallOutcome::Failed(format!(
                "failed to enable docker service: {}",
                err
            )));
        }

        if ctx.shell.run_ok("docker", &["info"]).await {
            Ok(InstallOutcome::Completed(
                "docker engine installed and running".to_string(),
            ))
        } else {
            Ok(InstallOutcome::Failed(
                "docker daemon did not come up after enable".to_string(),
            ))
        }
    }
}
