//! Error types for EXR I/O operations.
//!
//! Provides unified error handling for reading, writing and codec lookup.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::PixelFormat;

/// EXR operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file failed the EXR magic-number probe.
    #[error("{} is not an EXR file", path.display())]
    NotAnImageFile {
        /// Path of the rejected file.
        path: PathBuf,
    },

    /// A numeric compression code outside the known set.
    #[error("unknown EXR codec code {code}, expected one of: {known}")]
    InvalidCodecCode {
        /// The rejected code.
        code: i32,
        /// Sorted list of legal codes.
        known: String,
    },

    /// A codec name outside the known set.
    #[error("unknown EXR codec name {name:?}, expected one of: {known}")]
    InvalidCodecName {
        /// The rejected name.
        name: String,
        /// Sorted list of legal names.
        known: String,
    },

    /// EXR only stores 16-bit and 32-bit float samples.
    #[error("EXR cannot be saved with pixel format {format}")]
    UnsupportedDtype {
        /// The offending pixel format.
        format: PixelFormat,
    },

    /// Decoding error.
    #[error("decode error: {0}")]
    Decode(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    Encode(String),
}

/// Result type for EXR operations.
pub type IoResult<T> = Result<T, IoError>;
