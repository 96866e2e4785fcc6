//! ZIP archive reading and writing.
//!
//! This module is the archive library the adapter drives: it can open an
//! archive for reading, enumerate its entries and extract one entry to a
//! path, and it can create a new archive, add files to it and finalize it.
//!
//! ## Architecture
//!
//! - [`structures`]: ZIP format records (EOCD, file headers, DOS timestamps)
//! - [`parser`]: locating and decoding the Central Directory
//! - [`extractor`]: streaming entry data out, with CRC32 verification
//! - [`writer`]: streaming files into a new archive
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions when reading
//! - STORED and DEFLATE compression methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - The writer refuses archives that would need ZIP64

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::ArchiveWriter;
