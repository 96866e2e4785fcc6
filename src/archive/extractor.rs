use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::CrcWriter;
use flate2::read::DeflateDecoder;

use crate::io::{LocalFileReader, RangeReader, ReadAt, remove_partial_output};
use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl ZipExtractor<LocalFileReader> {
    /// Open an archive on disk for reading
    pub fn open(path: &Path) -> Result<Self> {
        let reader = LocalFileReader::new(path)
            .with_context(|| format!("cannot open archive {}", path.display()))?;
        Ok(Self::new(reader))
    }
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    pub fn entry_count(&self) -> Result<u64> {
        self.parser.entry_count()
    }

    /// List all files in the archive
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Stream the decompressed contents of `entry` into `out`.
    ///
    /// The CRC32 and uncompressed size recorded in the archive are verified.
    /// Returns the number of bytes written.
    pub fn read_entry<W: Write>(&self, entry: &ZipFileEntry, out: &mut W) -> Result<u64> {
        if entry.is_encrypted() {
            bail!("{}: encrypted entries are not supported", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry)?;
        let raw = RangeReader::new(self.parser.reader(), data_offset, entry.compressed_size);
        let mut writer = CrcWriter::new(out);

        let written = match entry.compression_method {
            CompressionMethod::Stored => io::copy(&mut { raw }, &mut writer),
            CompressionMethod::Deflate => io::copy(&mut DeflateDecoder::new(raw), &mut writer),
            CompressionMethod::Unknown(method) => {
                bail!("{}: unsupported compression method {}", entry.file_name, method)
            }
        }
        .with_context(|| format!("{}: failed to read entry data", entry.file_name))?;

        if written != entry.uncompressed_size {
            bail!(
                "{}: size mismatch (expected {}, got {})",
                entry.file_name,
                entry.uncompressed_size,
                written
            );
        }
        let crc = writer.crc().sum();
        if crc != entry.crc32 {
            bail!(
                "{}: CRC32 mismatch (expected {:08x}, got {:08x})",
                entry.file_name,
                entry.crc32,
                crc
            );
        }

        Ok(written)
    }

    /// Extract file to disk, replacing any existing file at `output_path`
    pub fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let CompressionMethod::Unknown(method) = entry.compression_method {
            bail!("{}: unsupported compression method {}", entry.file_name, method);
        }

        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(output_path)
            .with_context(|| format!("cannot create {}", output_path.display()))?;
        let mut out = BufWriter::new(file);

        let result = self
            .read_entry(entry, &mut out)
            .and_then(|_| out.flush().map_err(Into::into));
        drop(out);

        if result.is_err() {
            remove_partial_output(output_path);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(entries: &[(&str, &[u8], bool)]) -> Vec<u8> {
        let mut writer = ::zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        for (name, data, deflate) in entries {
            let method = if *deflate {
                ::zip::CompressionMethod::Deflated
            } else {
                ::zip::CompressionMethod::Stored
            };
            let options = ::zip::write::SimpleFileOptions::default().compression_method(method);
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn open(dir: &Path, bytes: Vec<u8>) -> ZipExtractor<LocalFileReader> {
        let path = dir.join("test.zip");
        fs::write(&path, bytes).unwrap();
        ZipExtractor::open(&path).unwrap()
    }

    #[test]
    fn reads_stored_and_deflated_entries() {
        let dir = tempfile::tempdir().unwrap();
        let text = b"hello hello hello hello hello".repeat(50);
        let extractor = open(
            dir.path(),
            build(&[("plain.txt", &b"stored bytes"[..], false), ("packed.txt", &text[..], true)]),
        );

        let entries = extractor.list_files().unwrap();
        assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
        assert_eq!(entries[1].compression_method, CompressionMethod::Deflate);

        let mut out = Vec::new();
        extractor.read_entry(&entries[0], &mut out).unwrap();
        assert_eq!(out, b"stored bytes");

        let mut out = Vec::new();
        let n = extractor.read_entry(&entries[1], &mut out).unwrap();
        assert_eq!(n, text.len() as u64);
        assert_eq!(out, text);
    }

    #[test]
    fn detects_crc_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = open(dir.path(), build(&[("a.txt", &b"payload"[..], false)]));

        let mut entry = extractor.list_files().unwrap().remove(0);
        entry.crc32 ^= 1;
        let err = extractor.read_entry(&entry, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("CRC32 mismatch"));
    }

    #[test]
    fn failed_extraction_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = open(dir.path(), build(&[("a.txt", &b"payload"[..], false)]));

        let mut entry = extractor.list_files().unwrap().remove(0);
        entry.uncompressed_size += 1;
        let target = dir.path().join("out").join("a.txt");
        assert!(extractor.extract_to_file(&entry, &target).is_err());
        assert!(!target.exists());
    }

    #[test]
    fn extract_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = open(dir.path(), build(&[("a.txt", &b"new"[..], true)]));
        let target = dir.path().join("a.txt");
        fs::write(&target, b"old contents").unwrap();

        let entry = extractor.list_files().unwrap().remove(0);
        extractor.extract_to_file(&entry, &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn unknown_method_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = open(dir.path(), build(&[("a.txt", &b"x"[..], false)]));

        let mut entry = extractor.list_files().unwrap().remove(0);
        entry.compression_method = CompressionMethod::Unknown(12);
        let target = dir.path().join("a.out");
        assert!(extractor.extract_to_file(&entry, &target).is_err());
        assert!(!target.exists());
    }
}
