//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while routing, maintaining or operating the ring.
///
/// Routing and maintenance failures are recovered locally wherever possible
/// (see `maintenance` and `lookup`); only [`Error::InvalidInput`] and
/// [`Error::DocumentNotFound`] are meant to surface all the way to an
/// operator.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Bad node id, duplicate id, or an out-of-range request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A node id that is already present in the ring directory.
    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    /// An RPC timed out or the peer reported itself dead; the caller should
    /// already have fallen back (next successor, cleared predecessor, …)
    /// before this is returned.
    #[error("node unavailable: {0}")]
    NodeUnavailable(String),

    /// `find_successor` exceeded its hop bound even after one retry.
    #[error("lookup diverged after exceeding hop bound")]
    LookupDiverged,

    /// The responsible node was reached but holds no matching document.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// Wire-level version mismatch or malformed payload from a peer.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Irrecoverable invariant violation or allocation failure. Fatal: the
    /// caller should abort rather than retry.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl From<crate::rpc::RpcError> for Error {
    fn from(err: crate::rpc::RpcError) -> Self {
        match err {
            crate::rpc::RpcError::Timeout => Error::NodeUnavailable("rpc timed out".into()),
            crate::rpc::RpcError::LookupDiverged => Error::LookupDiverged,
            crate::rpc::RpcError::NotFound => {
                Error::NodeUnavailable("target node not in directory".into())
            }
            crate::rpc::RpcError::Protocol(msg) => Error::ProtocolError(msg),
        }
    }
}
