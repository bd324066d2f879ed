//! Provisioner
//!
//! Creates the claim, pod and service backing a Server. Every call is a
//! single create; nothing is updated, retried or rolled back. Cleanup is left
//! to owner-reference garbage collection when the Server is deleted.

use crate::config::OperatorConfig;
use crate::crds::ServerDescriptor;
use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::resources::{build_pod, build_service, build_volume};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
use tracing::{debug, instrument};

pub struct Provisioner<'a> {
    platform: &'a dyn Platform,
    config: &'a OperatorConfig,
}

impl<'a> Provisioner<'a> {
    pub fn new(platform: &'a dyn Platform, config: &'a OperatorConfig) -> Self {
        Self { platform, config }
    }

    /// Create the single-writer 1Gi claim mounted as the server's config dir.
    #[instrument(skip_all, fields(name = %server.name))]
    pub async fn provision_storage(
        &self,
        server: &ServerDescriptor,
    ) -> Result<PersistentVolumeClaim> {
        let pvc = self
            .platform
            .create_volume(&build_volume(server))
            .await
            .map_err(|source| Error::Provision {
                kind: "PersistentVolumeClaim",
                name: server.name.clone(),
                source,
            })?;
        debug!("Created PersistentVolumeClaim");
        Ok(pvc)
    }

    /// Create the pod that installs and runs release `server.version`.
    #[instrument(skip_all, fields(name = %server.name, version = %server.version))]
    pub async fn provision_compute(&self, server: &ServerDescriptor) -> Result<Pod> {
        let pod = self
            .platform
            .create_pod(&build_pod(server, self.config))
            .await
            .map_err(|source| Error::Provision {
                kind: "Pod",
                name: server.name.clone(),
                source,
            })?;
        debug!("Created Pod");
        Ok(pod)
    }

    /// Create the service forwarding the external port to the pod.
    #[instrument(skip_all, fields(name = %server.name, port = server.external_port))]
    pub async fn provision_network(&self, server: &ServerDescriptor) -> Result<Service> {
        let service = self
            .platform
            .create_service(&build_service(server))
            .await
            .map_err(|source| Error::Provision {
                kind: "Service",
                name: server.name.clone(),
                source,
            })?;
        debug!("Created Service");
        Ok(service)
    }
}
