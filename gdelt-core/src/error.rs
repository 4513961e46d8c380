//! Low-level errors shared by every crate that depends on `gdelt-core`.

use thiserror::Error;

/// Errors that can arise decoding/encoding the primitives in this crate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid date_added encoding: {0}")]
    InvalidDateAddedEncoding(i64),

    #[error("invalid country code: {0}")]
    InvalidCountryCode(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
