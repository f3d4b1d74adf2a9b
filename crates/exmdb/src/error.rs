//! Aggregate error type for the exmdb client crate (spec.md §7).

use exmdb_proto::response_code::ResponseCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// DNS resolution, connect timeout, send/recv failure, unexpected
    /// close, or a short read. Fatal for the call; the connection is
    /// marked closed.
    #[error("connection error: {0}")]
    Connection(String),

    /// A non-zero server status byte. `DISPATCH_ERROR` triggers one
    /// silent reconnect when `AUTO_RECONNECT` is set, then is
    /// re-raised as this variant.
    #[error("protocol error: {0}")]
    Protocol(ResponseCode),

    /// The server sent a status byte this build doesn't recognize.
    #[error("protocol error: unknown status code {0:#04x}")]
    UnknownProtocol(u8),

    #[error(transparent)]
    Proto(#[from] exmdb_proto::ProtoError),

    #[error(transparent)]
    Dtyp(#[from] exmdb_dtyp::DtypError),

    /// `send`/`reconnect` attempted before a successful `connect`.
    #[error("not connected")]
    NotConnected,
}

impl Error {
    pub fn is_dispatch_error(&self) -> bool {
        matches!(self, Error::Protocol(code) if *code == ResponseCode::DispatchError)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
