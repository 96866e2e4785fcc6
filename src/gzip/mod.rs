//! GZIP compression of single files.
//!
//! The GZIP member framing is written by hand ([`frame`]) around a raw
//! deflate stream produced by the streaming engine ([`engine`]).

mod engine;
mod frame;

pub use engine::{
    BUFFER_SIZE, DEFAULT_LEVEL, DeflateStream, GzipStreamState, Step, check_level,
    compress_gzip_file, mtime_seconds, write_gzip,
};
pub use frame::{GzipFooter, GzipHeader, OS_CODE, byte_at, write_footer, write_header};
