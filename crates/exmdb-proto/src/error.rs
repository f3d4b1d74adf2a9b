//! Error taxonomy for the wire protocol layer (spec.md §7: Serialization,
//! InvalidType, Short; UnsupportedType is a Serialization sub-case with
//! its own variant for a clearer message).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    /// An `IoBuffer::pop*` read ran past the end of the buffer.
    #[error("short read: needed {needed} bytes, {available} available")]
    Short { needed: usize, available: usize },

    /// A typed propval constructor's value didn't match the tag's
    /// declared/expected type.
    #[error("invalid type: expected {expected:?}, got {actual:?}")]
    InvalidType {
        expected: crate::propval_type::PropvalType,
        actual: crate::propval_type::PropvalType,
    },

    /// A propval type code with no known wire representation.
    #[error("unsupported propval type code {0:#06x}")]
    UnsupportedType(u16),

    /// A restriction or propval failed to serialize because of a
    /// structural limit (oversize chain/COMMENT list, invalid
    /// SizedXid size, unknown restriction type code).
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Dtyp(#[from] exmdb_dtyp::DtypError),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
