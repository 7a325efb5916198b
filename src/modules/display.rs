//! Display module
//!
//! Sets up the kiosk browser session: a systemd unit that launches the
//! browser full-screen against the configured kiosk URL.

use async_trait::async_trait;

use crate::modules::{InstallOutcome, KioskModule, ModuleContext, ModuleDescriptor};

const DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    name: "display",
    display_name: "Kiosk Display",
    description: "Browser session pinned to the kiosk URL",
    order: 40,
    dependencies: &["nvidia_driver"],
};

const UNIT_PATH: &str = "/etc/systemd/system/kiosk-session.service";

#[derive(Debug)]
pub struct DisplayModule;

impl DisplayModule {
    fn render_unit(url: &str) -> String {
        format!(
            "[Unit]\n\
             Description=Kiosk browser session\n\
             After=graphical.target\n\n\
             [Service]\n\
             ExecStart=/usr/bin/chromium --kiosk --noerrdialogs --disable-infobars {}\n\
             Restart=always\n\n\
             [Install]\n\
             WantedBy=graphical.target\n",
            url
        )
    }
}

#[async_trait]
impl KioskModule for DisplayModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &DESCRIPTOR
    }

    async fn check_prerequisites(&self, ctx: &ModuleContext) -> Result<(), String> {
        if ctx.settings.get_str("kiosk.url").is_some() {
            Ok(())
        } else {
            Err("kiosk URL not configured".to_string())
        }
    }

    async fn install(&self, ctx: &ModuleContext) -> anyhow::Result<InstallOutcome> {
        let url = match ctx.settings.get_str("kiosk.url") {
            Some(url) => url,
            None => {
                return Ok(InstallOutcome::Failed(
                    "kiosk URL not configured".to_string(),
                ))
            }
        };

        if let Err(err) = ctx
            .shell
            .run("apt-get", &["install", "-y", "chromium"])
            .await
        {
            return Ok(InstallOutcome::Failed(format!(
                "browser install failed: {}",
                err
            )));
        }

        if let Err(err) = tokio::fs::write(UNIT_PATH, Self::render_unit(&url)).await {
            return Ok(InstallOutcome::Failed(format!(
                "failed to write kiosk session unit: {}",
                err
            )));
        }

        if let Err(err) = ctx.shell.run("systemctl", &["daemon-reload"]).await {
            return Ok(InstallOutcome::Failed(format!(
                "daemon-reload failed: {}",
                err
            )));
        }

        if let Err(err) = ctx
            .shell
            .run("systemctl", &["enable", "kiosk-session.service"])
            .await
        {
            return Ok(InstallOutcome::Failed(format!(
                "failed to enable kiosk session: {}",
                err
            )));
        }

        Ok(InstallOutcome::Completed(format!(
            "kiosk session configured for {}",
            url
        )))
    }
}
