//! Error type shared by the small fixed-shape structures in this crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DtypError {
    #[error("invalid GUID string: {0}")]
    InvalidGuid(String),

    #[error("invalid SizedXid size {0}, must be in 17..=24")]
    InvalidXidSize(u8),
}

pub type Result<T> = std::result::Result<T, DtypError>;
