//! Server CRD
//!
//! Defines the Server custom resource for a single managed Mindustry instance,
//! and the validated record the reconciler works from.

use crate::error::{Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{CustomResource, Resource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label carried by every object provisioned for a Server, valued with its name.
pub const CORRELATION_LABEL: &str = "mindustry.io/server";

/// Server declares one game-server instance.
///
/// None of the fields are required by the CRD schema; presence is checked
/// when the object is decoded into a [`ServerDescriptor`].
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "mindustry.io",
    version = "v1",
    kind = "Server",
    plural = "servers",
    shortname = "mds",
    namespaced,
    printcolumn = r#"{"name":"Version", "type":"string", "jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Port", "type":"integer", "jsonPath":".spec.externalPort"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ServerSpec {
    /// Release tag to install, e.g. `v141`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Addresses the game ports are exposed on.
    #[serde(
        default,
        rename = "externalIPs",
        skip_serializing_if = "Option::is_none"
    )]
    pub external_ips: Option<Vec<String>>,

    /// Port exposed on every external address, for both TCP and UDP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_port: Option<i64>,
}

/// A Server decoded once at the boundary, with every field the
/// provisioner needs present and checked.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerDescriptor {
    pub name: String,
    pub namespace: String,
    pub version: String,
    pub external_ips: Vec<String>,
    pub external_port: i32,
    /// Controller reference back to the Server.
    pub owner: OwnerReference,
}

impl TryFrom<&Server> for ServerDescriptor {
    type Error = Error;

    fn try_from(server: &Server) -> Result<Self> {
        let name = server.name_any();
        let namespace = server
            .namespace()
            .ok_or_else(|| Error::validation(&name, "metadata.namespace is missing"))?;
        let owner = server
            .controller_owner_ref(&())
            .ok_or_else(|| Error::validation(&name, "metadata.name or metadata.uid is missing"))?;

        let spec = &server.spec;
        let version = match spec.version.as_deref() {
            Some(v) if !v.trim().is_empty() => v.to_string(),
            Some(_) => return Err(Error::validation(&name, "spec.version is empty")),
            None => return Err(Error::validation(&name, "spec.version is required")),
        };
        let external_ips = match &spec.external_ips {
            Some(ips) if !ips.is_empty() => ips.clone(),
            Some(_) => return Err(Error::validation(&name, "spec.externalIPs is empty")),
            None => return Err(Error::validation(&name, "spec.externalIPs is required")),
        };
        let external_port = match spec.external_port {
            Some(port @ 1..=65535) => port as i32,
            Some(port) => {
                return Err(Error::validation(
                    &name,
                    format!("spec.externalPort {port} is out of range"),
                ))
            }
            None => return Err(Error::validation(&name, "spec.externalPort is required")),
        };

        Ok(Self {
            name,
            namespace,
            version,
            external_ips,
            external_port,
            owner,
        })
    }
}
