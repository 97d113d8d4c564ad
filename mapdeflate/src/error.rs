//! Error types.

use thiserror::Error;

use crate::layer::LayerId;

/// Errors returned by layer-store and deflate-layer operations.
///
/// Most failure modes in this domain are logical and deliberately silent
/// (double add, idempotent remove, shapes without a bounding box); the only
/// hard error is addressing a layer id the store has never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayerError {
    /// The given id does not refer to any layer in the store.
    #[error("unknown layer id {0}")]
    UnknownLayer(LayerId),
}
