pub mod errors;
pub mod payload;
pub mod resolution;

pub use errors::ResolutionError;
pub use payload::{BasketUpdate, BulkUpdateRequest, CommonData, UpdateType};
pub use resolution::{
    resolve_batch, resolve_update, MissingPolicy, Resolution, ResolutionWarning, ResolvedBatch,
    StatusSource,
};
