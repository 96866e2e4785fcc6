//! # fcompress
//!
//! Compress a single file into a GZIP or ZIP container, and extract the files
//! of a ZIP archive back into a directory.
//!
//! GZIP output is produced by a streaming engine that reads the source in
//! fixed-size chunks, so memory use does not grow with the file size. The
//! GZIP header and trailer are written by hand around a raw deflate stream.
//!
//! ## Features
//!
//! - GZIP compression of arbitrarily large files with bounded memory
//! - Single-entry ZIP archives with a sanitized entry name
//! - Flat ZIP extraction (directory structure is dropped)
//! - Integer status codes compatible with existing callers via [`status_code`]
//!
//! ## Partial output
//!
//! Source and destination handles are always closed. When an operation fails
//! after its destination file was created, that file is deleted, so a
//! destination that exists after an error was not produced by the failed
//! call. Extraction stops at the first failing entry; files already
//! extracted from earlier entries are kept.
//!
//! ## Example
//!
//! ```no_run
//! use fcompress::{Algorithm, CompressionRequest, uncompress_zip_file};
//!
//! fn main() -> Result<(), fcompress::CompressError> {
//!     CompressionRequest::new("server.log", "/var/log", Algorithm::Gzip)
//!         .destination("/tmp")
//!         .level(9)
//!         .execute()?;
//!
//!     uncompress_zip_file("/tmp/bundle.zip", "/tmp/out")?;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod archive;
pub mod cli;
pub mod compressor;
pub mod error;
pub mod gzip;
pub mod io;
pub mod naming;

pub use adapter::{ENTRY_COMMENT, compress_zip_file, uncompress_zip_file};
pub use cli::Cli;
pub use compressor::{CompressionRequest, file_compress, file_compress_to};
pub use error::{CompressError, ErrorCode, Result, status_code};
pub use gzip::{DEFAULT_LEVEL, compress_gzip_file};
pub use naming::{Algorithm, compressed_filename, join_path};
