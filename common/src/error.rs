use thiserror::Error;

/// Input that can never succeed as given. Never retried; the caller or the
/// operator has to fix the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid port {0:?}: expected <number> or <number>/<tcp|udp>")]
    InvalidPort(String),

    #[error("invalid protocol {0:?}: expected tcp or udp")]
    InvalidProtocol(String),

    #[error("invalid registry address {0:?}: expected <ipv4> or <ipv4>:<port>")]
    InvalidAddress(String),

    #[error("invalid service name {0:?}")]
    InvalidServiceName(String),

    #[error("watch interval must be greater than zero")]
    ZeroInterval,

    #[error("watch interval must not exceed {max_secs} seconds")]
    IntervalTooLong { max_secs: u64 },

    #[error("invalid lookup path {0:?}: must start with '/' and differ from the health endpoint")]
    InvalidLookupPath(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Failure reported by a container inventory backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The backend has no container with the given identifier.
    #[error("no such container: {0}")]
    NotFound(String),

    /// The backend could not be reached or answered with an error.
    /// Safe to retry with backoff; never retried automatically.
    #[error("container inventory unavailable: {0}")]
    Transport(String),
}
