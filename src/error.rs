use std::io;

use thiserror::Error;

use crate::image::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Image validation failed: {}", _0)]
    Validation(#[from] ValidationError),

    #[error("Refusing to pack an image that failed validation: {}", _0)]
    PreconditionViolated(ValidationError),

    #[error("Image size of {} bytes is not a multiple of the 4-byte word size", _0)]
    MisalignedSize(usize),

    #[error("Flash image is too short to hold the 4-byte length header")]
    TruncatedHeader,

    #[error("Flash image declares {declared} payload bytes but only {actual} are present")]
    TruncatedPayload { declared: usize, actual: usize },

    #[error("Invalid memory image word on line {line}: {content:?}")]
    InvalidMemLine { line: usize, content: String },

    #[error("I/O error: {}", _0)]
    IoError(#[from] io::Error),
}
