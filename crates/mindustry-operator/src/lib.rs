//! Mindustry Operator Library
//!
//! Kubernetes operator for Mindustry game servers. A `Server` custom resource
//! gets a config volume, a pod running the requested release and a service on
//! its external addresses, all owned by the Server so deleting it cleans up.
//! When the pod first starts running, the operator types the console commands
//! that open the admin socket and start hosting.

pub mod config;
pub mod controllers;
pub mod crds;
pub mod error;
pub mod initializer;
pub mod platform;
pub mod provisioner;
pub mod reconciler;
pub mod resources;
pub mod telemetry;

pub use crds::{Server, ServerDescriptor, ServerSpec};
pub use error::{Error, Result};
pub use reconciler::{Reconciler, ServerEventHandler};
