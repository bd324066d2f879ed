//! Custom Resource Definitions

pub mod server;

pub use server::{Server, ServerDescriptor, ServerSpec, CORRELATION_LABEL};
