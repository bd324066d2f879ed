//! Operator error types

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A declared Server field is missing or malformed.
    #[error("invalid Server {name}: {reason}")]
    Validation { name: String, reason: String },

    /// The platform rejected a create call.
    #[error("failed to create {kind} {name}: {source}")]
    Provision {
        kind: &'static str,
        name: String,
        #[source]
        source: kube::Error,
    },

    /// The interactive stream to a server pod could not be used.
    #[error("failed to attach to pod {pod}: {source}")]
    Attach {
        pod: String,
        #[source]
        source: AttachError,
    },
}

#[derive(Debug, Error)]
pub enum AttachError {
    #[error("stream timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Kubernetes error: {0}")]
    Kube(#[source] kube::Error),
    #[error("stdin is not attached")]
    StdinUnavailable,
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stream failed: {0}")]
    Stream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn validation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True when the platform refused a create because the object already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::Provision {
                source: kube::Error::Api(response),
                ..
            } if response.code == 409
        )
    }
}
