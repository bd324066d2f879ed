//! Shared controller context

use crate::reconciler::ServerEventHandler;
use std::sync::Arc;

/// Shared context for all controllers.
pub struct Context {
    pub handler: Arc<dyn ServerEventHandler>,
}

impl Context {
    pub fn new(handler: impl ServerEventHandler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}
