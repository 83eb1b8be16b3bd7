use bt_01_container_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("Route not found: {route_id}")]
    RouteNotFound { route_id: String },

    #[error("Product {product_id} is not on route {route_id}")]
    UnknownProduct { route_id: String, product_id: String },

    #[error("Route store error: {0}")]
    Store(#[from] StoreError),
}

pub type CompletionResult<T> = Result<T, CompletionError>;
