//! Event dispatch
//!
//! [`ServerEventHandler`] is the interface the controllers call into: one
//! entry point per event kind. [`Reconciler`] is stateless; everything it needs
//! comes from the event payload and its read-only config, so calls for
//! different Servers can run concurrently.

use crate::config::OperatorConfig;
use crate::crds::{Server, ServerDescriptor, CORRELATION_LABEL};
use crate::error::Result;
use crate::initializer::RemoteInitializer;
use crate::platform::Platform;
use crate::provisioner::Provisioner;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::sync::Arc;
use strum::EnumString;
use tracing::{info, instrument, trace};

/// Pod lifecycle phase as reported in `status.phase`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// Phase of `pod`, or `None` if it has not been reported yet.
    /// Unrecognised values read as `Unknown`.
    pub fn of(pod: &Pod) -> Option<Self> {
        let phase = pod.status.as_ref()?.phase.as_deref()?;
        Some(phase.parse().unwrap_or(PodPhase::Unknown))
    }
}

/// A pod whose phase changed between two observations.
#[derive(Clone, Debug)]
pub struct PhaseChange {
    pub pod: Pod,
    pub old: Option<PodPhase>,
    pub new: Option<PodPhase>,
}

impl PhaseChange {
    /// True only for a correlated pod moving from exactly `Pending` to
    /// exactly `Running` in this change.
    pub fn starts_server(&self) -> bool {
        self.pod.labels().contains_key(CORRELATION_LABEL)
            && self.old == Some(PodPhase::Pending)
            && self.new == Some(PodPhase::Running)
    }
}

#[async_trait]
pub trait ServerEventHandler: Send + Sync {
    /// A Server was created: provision its claim, pod and service.
    async fn on_resource_created(&self, server: &Server) -> Result<()>;

    /// A pod changed phase. Returns whether the initializer ran.
    async fn on_pod_phase_changed(&self, change: &PhaseChange) -> Result<bool>;
}

pub struct Reconciler {
    platform: Arc<dyn Platform>,
    config: OperatorConfig,
}

impl Reconciler {
    pub fn new(platform: Arc<dyn Platform>, config: OperatorConfig) -> Self {
        Self { platform, config }
    }
}

#[async_trait]
impl ServerEventHandler for Reconciler {
    #[instrument(skip_all, fields(name = %server.name_any()))]
    async fn on_resource_created(&self, server: &Server) -> Result<()> {
        let server = ServerDescriptor::try_from(server)?;
        let provisioner = Provisioner::new(self.platform.as_ref(), &self.config);

        // The pod mounts the claim, so storage goes first.
        provisioner.provision_storage(&server).await?;
        provisioner.provision_compute(&server).await?;
        provisioner.provision_network(&server).await?;

        info!(version = %server.version, "Provisioned Server");
        Ok(())
    }

    #[instrument(skip_all, fields(pod = %change.pod.name_any()))]
    async fn on_pod_phase_changed(&self, change: &PhaseChange) -> Result<bool> {
        if !change.starts_server() {
            trace!(old = ?change.old, new = ?change.new, "Ignoring phase change");
            return Ok(false);
        }

        let name = change.pod.name_any();
        let namespace = change.pod.namespace().unwrap_or_default();
        info!("Server pod is running, sending init commands");
        RemoteInitializer::new(
            self.platform.as_ref(),
            &namespace,
            &name,
            self.config.attach_timeout,
        )
        .run()
        .await?;
        Ok(true)
    }
}
