//! Storage-layer error types.

use crate::entity::Entity;

/// Errors that can occur during component store operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity is not in the live set — it was destroyed, never admitted,
    /// or belongs to another world. Callers racing a destroy against a
    /// mutation get this as a recoverable failure, not a crash.
    #[error("unknown entity: {0}")]
    UnknownEntity(Entity),
}
