//! Kubernetes controllers
//!
//! Event loops that watch Servers and their pods and hand each event to the
//! [`ServerEventHandler`](crate::reconciler::ServerEventHandler) on its own task.
//! Failures are logged and not retried.

mod context;
mod pod;
mod server;

pub use context::Context;
pub use pod::{PhaseTracker, PodController};
pub use server::{CreationTracker, ServerController};

use crate::error::Error;
use tracing::{error, warn};

fn report(err: &Error) {
    if err.is_conflict() {
        warn!(error = %err, "Resource already exists");
    } else {
        error!(error = %err, "Handler failed");
    }
}
