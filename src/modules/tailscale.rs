//! Tailscale module
//!
//! Joins the kiosk to the private network. The join credential comes from
//! the remote enrollment service: submit this machine's hardware
//! fingerprint, wait for an administrator to approve it, then bring the
//! tunnel up with the issued auth key.

use std::time::Duration;

use async_trait::async_trait;

use crate::modules::{InstallOutcome, KioskModule, ModuleContext, ModuleDescriptor};
use crate::services::enrollment::{
    await_approval, ApprovalOutcome, EnrollmentApi, EnrollmentError, EnrollmentMetadata,
    DEFAULT_APPROVAL_TIMEOUT, DEFAULT_POLL_INTERVAL,
};

const DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    name: "tailscale",
    display_name: "Tailscale VPN",
    description: "Private network membership via enrollment approval",
    order: 50,
    dependencies: &["network"],
};

#[derive(Debug)]
pub struct TailscaleModule;

impl TailscaleModule {
    async fn join(ctx: &ModuleContext, auth_key: &str) -> anyhow::Result<InstallOutcome> {
        if let Err(err) = ctx
            .shell
            .run("apt-get", &["install", "-y", "tailscale"])
            .await
        {
            return Ok(InstallOutcome::Failed(format!(
                "tailscale package install failed: {}",
                err
            )));
        }

        if let Err(err) = ctx
            .shell
            .run("tailscale", &["up", "--auth-key", auth_key])
            .await
        {
            return Ok(InstallOutcome::Failed(format!(
                "tailscale join failed: {}",
                err
            )));
        }

        Ok(InstallOutcome::Completed(
            "kiosk joined the private network".to_string(),
        ))
    }
}

#[async_trait]
impl KioskModule for TailscaleModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &DESCRIPTOR
    }

    async fn check_prerequisites(&self, ctx: &ModuleContext) -> Result<(), String> {
        if ctx.enrollment.is_configured() {
            Ok(())
        } else {
            Err("enrollment server not configured".to_string())
        }
    }

    async fn install(&self, ctx: &ModuleContext) -> anyhow::Result<InstallOutcome> {
        let fingerprint = ctx.fingerprint.fingerprint()?;
        let metadata = EnrollmentMetadata::collect(&ctx.settings);

        let ack = match ctx.enrollment.submit(&fingerprint, &metadata).await {
            Ok(ack) => ack,
            Err(EnrollmentError::Denied(detail)) => {
                return Ok(InstallOutcome::Failed(format!(
                    "enrollment submission rejected: {}",
                    detail
                )))
            }
            Err(err) => {
                return Ok(InstallOutcome::Failed(format!(
                    "could not reach enrollment service: {}",
                    err
                )))
            }
        };

        // Pre-approved records answer with the credential right away.
        if let Some(auth_key) = ack.credential {
            return Self::join(ctx, &auth_key).await;
        }

        let timeout = Duration::from_secs(ctx.settings.get_u64_or(
            "enrollment.approval_timeout_secs",
            DEFAULT_APPROVAL_TIMEOUT.as_secs(),
        ));
        let interval = Duration::from_secs(ctx.settings.get_u64_or(
            "enrollment.poll_interval_secs",
            DEFAULT_POLL_INTERVAL.as_secs(),
        ));

        match await_approval(&ctx.enrollment, &fingerprint, timeout, interval).await {
            ApprovalOutcome::Approved(auth_key) => Self::join(ctx, &auth_key).await,
            ApprovalOutcome::Rejected { reason } => Ok(InstallOutcome::Failed(match reason {
                Some(reason) => format!("enrollment rejected: {}", reason),
                None => "enrollment rejected".to_string(),
            })),
            ApprovalOutcome::MissingCredential => Ok(InstallOutcome::Failed(
                "enrollment approved but no credential was issued".to_string(),
            )),
            ApprovalOutcome::TimedOut => Ok(InstallOutcome::Failed(
                "timed out waiting for enrollment approval".to_string(),
            )),
        }
    }
}
