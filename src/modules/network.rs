//! Network module
//!
//! Writes the kiosk's network profile and brings up systemd-networkd.
//! Interface and addressing come from the settings store so the panel can
//! adjust them before installation.

use async_trait::async_trait;

use crate::modules::{InstallOutcome, KioskModule, ModuleContext, ModuleDescriptor};

const DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    name: "network",
    display_name: "Network",
    description: "Kiosk network profile and connectivity",
    order: 10,
    dependencies: &[],
};

const PROFILE_PATH: &str = "/etc/systemd/network/10-kiosk.network";

#[derive(Debug)]
pub struct NetworkModule;

impl NetworkModule {
    fn render_profile(interface: &str, static_address: Option<&str>) -> String {
        match static_address {
            Some(address) => format!(
                "[Match]\nName={}\n\n[Network]\nAddress={}\n",
                interface, address
            ),
            None => format!("[Match]\nName={}\n\n[Network]\nDHCP=yes\n", interface),
        }
    }
}

#[async_trait]
impl KioskModule for NetworkModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &DESCRIPTOR
    }

    async fn install(&self, ctx: &ModuleContext) -> anyhow::Result<InstallOutcome> {
        let interface = ctx.settings.get_str_or("network.interface", "eth0");
        let static_address = ctx.settings.get_str("network.static_address");
        let profile = Self::render_profile(&interface, static_address.as_deref());

        if let Err(err) = tokio::fs::write(PROFILE_PATH, &profile).await {
            return Ok(InstallOutcome::Failed(format!(
                "failed to write network profile: {}",
                err
            )));
        }

        if let Err(err) = ctx
            .shell
            .run("systemctl", &["enable", "--now", "systemd-networkd"])
            .await
        {
            return Ok(InstallOutcome::Failed(format!(
                "failed to enable systemd-networkd: {}",
                err
            )));
        }

        if let Err(err) = ctx
            .shell
            .run("networkctl", &["reload"])
            .await
        {
            return Ok(InstallOutcome::Failed(format!(
                "failed to reload network configuration: {}",
                err
            )));
        }

        Ok(InstallOutcome::Completed(format!(
            "network profile applied to {}",
            interface
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dhcp_profile_by_default() {
        let profile = NetworkModule::render_profile("eth0", None);
        assert!(profile.contains("Name=eth0"));
        assert!(profile.contains("DHCP=yes"));
    }

    #[test]
    fn static_address_overrides_dhcp() {
        let profile = NetworkModule::render_profile("enp3s0", Some("192.168.7.20/24"));
        assert!(profile.contains("Address=192.168.7.20/24"));
        assert!(!profile.contains("DHCP"));
    }
}
