//! Engine-layer error types.

/// Errors that can occur during system attachment and scheduling.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A system with this name is already attached to the engine.
    #[error("system '{0}' is already attached")]
    DuplicateAttach(String),

    /// No attached system has this name.
    #[error("no attached system named '{0}'")]
    UnknownSystem(String),
}
