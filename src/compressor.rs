//! Compression entry points.

use std::path::PathBuf;

use crate::adapter::compress_zip_file;
use crate::error::{CompressError, Result};
use crate::gzip::{DEFAULT_LEVEL, compress_gzip_file};
use crate::naming::{Algorithm, compressed_filename};

/// One file to compress, where to put it, and how.
///
/// Nothing is checked until [`execute`](Self::execute) runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    pub file_name: String,
    pub src_dir: String,
    /// `None` means the working directory at execution time.
    pub dst_dir: Option<String>,
    pub algorithm: Algorithm,
    pub level: u32,
}

impl CompressionRequest {
    pub fn new(
        file_name: impl Into<String>,
        src_dir: impl Into<String>,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            src_dir: src_dir.into(),
            dst_dir: None,
            algorithm,
            level: DEFAULT_LEVEL,
        }
    }

    pub fn destination(mut self, dst_dir: impl Into<String>) -> Self {
        self.dst_dir = Some(dst_dir.into());
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Name of the file this request produces.
    pub fn output_name(&self) -> String {
        compressed_filename(&self.file_name, self.algorithm)
    }

    /// Gzip goes through the streaming engine, everything else through the
    /// ZIP adapter.
    pub fn execute(&self) -> Result<()> {
        let dst_dir = match &self.dst_dir {
            Some(dir) => dir.clone(),
            None => working_dir()?,
        };

        match self.algorithm {
            Algorithm::Gzip => {
                compress_gzip_file(&self.file_name, &self.src_dir, &dst_dir, self.level)
            }
            Algorithm::Zip | Algorithm::None => {
                compress_zip_file(&self.file_name, &self.src_dir, &dst_dir, self.level)
            }
        }
    }
}

fn working_dir() -> Result<String> {
    let cwd = std::env::current_dir().map_err(|source| CompressError::FileNotOpen {
        path: PathBuf::from("."),
        source,
    })?;
    Ok(cwd.to_string_lossy().into_owned())
}

/// Compress `src_dir/file_name` into the current working directory.
pub fn file_compress(file_name: &str, src_dir: &str, algo: Algorithm, level: u32) -> Result<()> {
    CompressionRequest::new(file_name, src_dir, algo)
        .level(level)
        .execute()
}

/// Compress `src_dir/file_name` into `dst_dir`, which must already exist.
pub fn file_compress_to(
    file_name: &str,
    src_dir: &str,
    dst_dir: &str,
    algo: Algorithm,
    level: u32,
) -> Result<()> {
    CompressionRequest::new(file_name, src_dir, algo)
        .destination(dst_dir)
        .level(level)
        .execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn request_defaults() {
        let req = CompressionRequest::new("a.log", "/var/log", Algorithm::Gzip);
        assert_eq!(req.level, DEFAULT_LEVEL);
        assert_eq!(req.dst_dir, None);
        assert_eq!(req.output_name(), "a.log.gz");

        let req = req.destination("/tmp").level(9);
        assert_eq!(req.dst_dir.as_deref(), Some("/tmp"));
        assert_eq!(req.level, 9);
    }

    #[test]
    fn dispatches_by_algorithm() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path().to_str().unwrap();
        std::fs::write(dir.path().join("x.txt"), b"xyz").unwrap();

        file_compress_to("x.txt", d, d, Algorithm::Gzip, 6).unwrap();
        assert!(dir.path().join("x.txt.gz").is_file());

        file_compress_to("x.txt", d, d, Algorithm::Zip, 6).unwrap();
        assert!(dir.path().join("x.txt.zip").is_file());
    }

    #[test]
    fn none_falls_through_to_zip() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path().to_str().unwrap();
        std::fs::write(dir.path().join("y.txt"), b"xyz").unwrap();

        file_compress_to("y.txt", d, d, Algorithm::None, 6).unwrap();
        assert!(dir.path().join("y.txt.zip").is_file());
    }

    #[test]
    fn validation_is_lazy() {
        let req = CompressionRequest::new("missing.bin", "/definitely/not/here", Algorithm::Gzip)
            .destination("/definitely/not/here");
        let err = req.execute().unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileNotOpen);
    }
}
