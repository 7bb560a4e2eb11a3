use thiserror::Error;

/// Unified error across the engine's internal plumbing.
///
/// Component-level and flow-level failures are not represented here: per
/// the executor's failure policy, those are captured into
/// `FlowStatus.error` rather than surfaced as Rust errors. This type is
/// for failures in the scaffolding around the flow (registry parsing,
/// config loading, HTTP plumbing).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("registry root {path} does not exist")]
    RegistryRootMissing { path: String },

    #[error("failed to parse registry.json at {path}: {reason}")]
    RegistryParse { path: String, reason: String },

    #[error("unknown component registration: {name}")]
    UnknownRegistration { name: String },

    #[error("failed to load component {name}: {reason}")]
    LoadFailure { name: String, reason: String },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    #[error("remote endpoint rejected: {reason}")]
    RemoteEndpoint { reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
