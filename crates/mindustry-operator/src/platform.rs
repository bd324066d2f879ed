//! Orchestration platform seam
//!
//! The handful of API server calls the operator makes, behind a trait so the
//! provisioner and initializer can be driven against a mock in tests.

use crate::error::AttachError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Api, AttachParams, AttachedProcess, PostParams},
    Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt, time::Duration};
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[cfg(test)]
use mockall::automock;

/// Write half of an interactive stream to a container's stdin.
pub struct AttachSession {
    stdin: Box<dyn AsyncWrite + Send + Unpin>,
    process: Option<AttachedProcess>,
}

impl AttachSession {
    /// Session backed by any writer, with no remote process behind it.
    pub fn from_writer(stdin: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            stdin: Box::new(stdin),
            process: None,
        }
    }

    pub fn stdin(&mut self) -> &mut (dyn AsyncWrite + Send + Unpin) {
        self.stdin.as_mut()
    }

    /// Shuts stdin down and waits up to `timeout` for the stream to forward
    /// what was written and close. Nothing is read back. The connection is
    /// aborted if it does not finish in time.
    pub async fn close(self, timeout: Duration) -> Result<(), AttachError> {
        let Self { mut stdin, process } = self;
        stdin.shutdown().await?;
        drop(stdin);

        let Some(mut process) = process else {
            return Ok(());
        };
        if let Some(finished) = process.take_status() {
            if tokio::time::timeout(timeout, finished).await.is_err() {
                process.abort();
                return Err(AttachError::Timeout(timeout));
            }
        }
        process
            .join()
            .await
            .map_err(|e| AttachError::Stream(Box::new(e)))
    }
}

impl fmt::Debug for AttachSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachSession")
            .field("remote", &self.process.is_some())
            .finish()
    }
}

/// Platform operations used by the operator.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Platform: Send + Sync {
    /// Create a claim in its own namespace.
    async fn create_volume(
        &self,
        pvc: &PersistentVolumeClaim,
    ) -> Result<PersistentVolumeClaim, kube::Error>;

    /// Create a pod in its own namespace.
    async fn create_pod(&self, pod: &Pod) -> Result<Pod, kube::Error>;

    /// Create a service in its own namespace.
    async fn create_service(&self, service: &Service) -> Result<Service, kube::Error>;

    /// Attach to the stdin of a running container.
    async fn attach(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<AttachSession, AttachError>;
}

/// [`Platform`] backed by a live cluster.
#[derive(Clone)]
pub struct KubePlatform {
    client: Client,
}

impl KubePlatform {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn create<K>(&self, obj: &K) -> Result<K, kube::Error>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Serialize
            + fmt::Debug,
    {
        let namespace = obj.namespace().unwrap_or_default();
        Api::<K>::namespaced(self.client.clone(), &namespace)
            .create(&PostParams::default(), obj)
            .await
    }
}

#[async_trait]
impl Platform for KubePlatform {
    async fn create_volume(
        &self,
        pvc: &PersistentVolumeClaim,
    ) -> Result<PersistentVolumeClaim, kube::Error> {
        self.create(pvc).await
    }

    async fn create_pod(&self, pod: &Pod) -> Result<Pod, kube::Error> {
        self.create(pod).await
    }

    async fn create_service(&self, service: &Service) -> Result<Service, kube::Error> {
        self.create(service).await
    }

    async fn attach(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<AttachSession, AttachError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = AttachParams::default()
            .container(container)
            .stdin(true)
            .stdout(false)
            .stderr(false)
            .tty(false);

        let mut process = api.attach(pod, &params).await.map_err(AttachError::Kube)?;
        let stdin = process.stdin().ok_or(AttachError::StdinUnavailable)?;
        Ok(AttachSession {
            stdin: Box::new(stdin),
            process: Some(process),
        })
    }
}
