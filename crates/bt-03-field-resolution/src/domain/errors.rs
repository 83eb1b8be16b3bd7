use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The basket entry and the existing record name different containers.
    #[error("Basket uid {found} does not match container {expected}")]
    UidMismatch { expected: String, found: String },
}
