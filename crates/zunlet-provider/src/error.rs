//! Provider error types.

use thiserror::Error;
use zunlet_capsule::CapsuleError;
use zunlet_core::QuantityError;

/// Errors raised while translating between pods and capsules.
///
/// Translation never touches the network, so these always describe bad
/// input: a pod the engine cannot run, or a capsule zunlet cannot read.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("pod {0} has no containers")]
    NoContainers(String),

    #[error("pod is missing {0}")]
    InvalidPod(&'static str),

    #[error("container {container:?}: {reason}")]
    InvalidContainer { container: String, reason: String },

    #[error("container {container:?} {resource} limit: {source}")]
    Quantity {
        container: String,
        resource: &'static str,
        #[source]
        source: QuantityError,
    },

    #[error("capsule is missing correlation label {0}")]
    MissingLabel(&'static str),

    #[error("capsule container {container:?} reports invalid memory {value:?}")]
    InvalidMemory { container: String, value: String },
}

/// Errors surfaced by [`crate::Provider`] operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Remote(#[from] CapsuleError),

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

impl ProviderError {
    /// Whether the remote engine reported the capsule as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Remote(e) if e.is_not_found())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
