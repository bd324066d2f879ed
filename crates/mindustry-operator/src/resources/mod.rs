//! Dependent resources
//!
//! Pure builders for the objects backing one Server. Nothing here talks to
//! the API server; the provisioner creates what these functions return.

mod ownership;
mod pod;
mod service;
mod volume;

pub use ownership::with_ownership;
pub use pod::{
    build_pod, ADMIN_PORT, ADMIN_PORT_NAME, GAME_PORT, SERVER_CONTAINER, TCP_PORT_NAME,
    UDP_PORT_NAME,
};
pub use service::build_service;
pub use volume::build_volume;
