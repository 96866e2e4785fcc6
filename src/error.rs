//! Error types returned by the compression entry points.
//!
//! Every failure carries a [`ErrorCode`] so callers that only care about the
//! numeric status (`0` on success, small negative numbers for the named
//! failure kinds) can keep doing so.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Numeric status codes exposed at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    FileNotOpen = -1,
    FileNotWriteable = -2,
    CodecError = -3,
    /// Generic failure reported by the archive library.
    Failure = 1,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Error)]
pub enum CompressError {
    /// The file to compress does not exist.
    #[error("cannot find file to compress: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Source or destination could not be opened.
    #[error("cannot open {}: {source}", .path.display())]
    FileNotOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the GZIP frame to the destination failed.
    #[error("cannot write to {}: {source}", .path.display())]
    FileNotWriteable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Deflate failure, invalid level, or a short read/write in the copy loop.
    #[error("codec error: {0}")]
    Codec(String),

    /// Failure reported by the archive library, with its diagnostic text.
    #[error("archive error: {0}")]
    Archive(String),
}

impl CompressError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CompressError::SourceMissing(_) | CompressError::FileNotOpen { .. } => {
                ErrorCode::FileNotOpen
            }
            CompressError::FileNotWriteable { .. } => ErrorCode::FileNotWriteable,
            CompressError::Codec(_) => ErrorCode::CodecError,
            CompressError::Archive(_) => ErrorCode::Failure,
        }
    }

    /// Flatten an archive library error, keeping the whole context chain.
    pub(crate) fn archive(err: anyhow::Error) -> Self {
        CompressError::Archive(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;

/// Map an operation result to the integer status convention (`0` on success).
pub fn status_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => e.code().as_i32(),
    }
}
