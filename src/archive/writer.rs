//! ZIP archive writer.
//!
//! Entries are streamed straight from their source files. Each Local File
//! Header is written with a zero CRC and sizes, the payload is copied (stored
//! or deflated), then the header fields are patched in place. The Central
//! Directory and EOCD are appended by [`ArchiveWriter::finalize`].

use std::fs::{File, Metadata};
use std::io::{self, BufWriter, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use flate2::write::DeflateEncoder;
use flate2::{Compression, CrcReader};

use anyhow::{Context, Result, bail};

use super::structures::*;

/// Writer for a new archive on disk
pub struct ArchiveWriter {
    out: BufWriter<File>,
    path: PathBuf,
    entries: Vec<EntryRecord>,
    offset: u64,
}

impl ArchiveWriter {
    /// Create (or truncate) the archive at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("cannot create archive {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
            path: path.to_path_buf(),
            entries: Vec::new(),
            offset: 0,
        })
    }

    /// Add the contents of `source` as `entry_name`.
    ///
    /// Level 0 stores the data, 1..=9 deflates it.
    pub fn add_file(
        &mut self,
        entry_name: &str,
        source: &Path,
        comment: &str,
        level: u32,
    ) -> Result<()> {
        if level > 9 {
            bail!("invalid compression level {level}");
        }
        if entry_name.is_empty() || entry_name.len() > u16::MAX as usize {
            bail!("invalid entry name length: {}", entry_name.len());
        }
        if comment.len() > u16::MAX as usize {
            bail!("entry comment too long");
        }
        if self.entries.len() >= u16::MAX as usize {
            bail!("too many entries for an archive without ZIP64");
        }
        let Ok(lfh_offset) = u32::try_from(self.offset) else {
            bail!("archive too large without ZIP64");
        };

        let mut src = File::open(source)
            .with_context(|| format!("cannot open {}", source.display()))?;
        let metadata = src.metadata()?;

        let method = if level == 0 {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflate
        };

        let mut record = EntryRecord {
            name: entry_name.to_string(),
            comment: comment.to_string(),
            method,
            flags: if entry_name.is_ascii() && comment.is_ascii() { 0 } else { FLAG_UTF8 },
            modified: modified_time(&metadata),
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            external_attrs: external_attrs(&metadata),
            lfh_offset,
        };

        record.write_local_header(&mut self.out)?;
        let data_start = self.offset + LFH_SIZE as u64 + entry_name.len() as u64;

        let mut reader = CrcReader::new(&mut src);
        let uncompressed = match method {
            CompressionMethod::Deflate => {
                let mut encoder = DeflateEncoder::new(&mut self.out, Compression::new(level));
                let n = io::copy(&mut reader, &mut encoder)?;
                encoder.finish()?;
                n
            }
            _ => io::copy(&mut reader, &mut self.out)?,
        };
        let crc32 = reader.crc().sum();

        let data_end = self.out.stream_position()?;
        let compressed = data_end - data_start;
        if uncompressed > u32::MAX as u64 || compressed > u32::MAX as u64 {
            bail!("{} is too large for an archive without ZIP64", source.display());
        }

        record.crc32 = crc32;
        record.compressed_size = compressed as u32;
        record.uncompressed_size = uncompressed as u32;

        self.out
            .seek(SeekFrom::Start(lfh_offset as u64 + LFH_CRC_OFFSET))?;
        record.write_sizes(&mut self.out)?;
        self.out.seek(SeekFrom::Start(data_end))?;

        self.offset = data_end;
        self.entries.push(record);
        Ok(())
    }

    /// Write the Central Directory and EOCD, then flush and close the file
    pub fn finalize(mut self) -> Result<()> {
        let Ok(cd_offset) = u32::try_from(self.offset) else {
            bail!("archive too large without ZIP64");
        };

        for record in &self.entries {
            record.write_central_header(&mut self.out)?;
        }
        let cd_end = self.out.stream_position()?;
        let Ok(cd_size) = u32::try_from(cd_end - self.offset) else {
            bail!("central directory too large without ZIP64");
        };

        EndOfCentralDirectory::new(self.entries.len() as u16, cd_size, cd_offset)
            .write_to(&mut self.out)?;

        let file = self.out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
            .with_context(|| format!("cannot sync {}", self.path.display()))?;
        Ok(())
    }
}

fn modified_time(metadata: &Metadata) -> DosDateTime {
    metadata
        .modified()
        .map(|t| DosDateTime::from_datetime(&DateTime::<Local>::from(t).naive_local()))
        .unwrap_or(DosDateTime::EPOCH)
}

#[cfg(unix)]
fn external_attrs(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() << 16
}

#[cfg(not(unix))]
fn external_attrs(_metadata: &Metadata) -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_back(path: &Path) -> Vec<(String, Vec<u8>, String)> {
        let mut archive = ::zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut out = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            out.push((entry.name().to_string(), data, entry.comment().to_string()));
        }
        out
    }

    #[test]
    fn written_archive_opens_in_independent_reader() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"alpha alpha alpha alpha").unwrap();
        std::fs::write(&b, (0..=255u8).cycle().take(70_000).collect::<Vec<_>>()).unwrap();

        let zip_path = dir.path().join("out.zip");
        let mut writer = ArchiveWriter::create(&zip_path).unwrap();
        writer.add_file("a.txt", &a, "first", 6).unwrap();
        writer.add_file("b.bin", &b, "second", 0).unwrap();
        writer.finalize().unwrap();

        let entries = read_back(&zip_path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "a.txt");
        assert_eq!(entries[0].1, std::fs::read(&a).unwrap());
        assert_eq!(entries[0].2, "first");
        assert_eq!(entries[1].1, std::fs::read(&b).unwrap());
    }

    #[test]
    fn level_selects_method() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, b"x".repeat(1000)).unwrap();

        let zip_path = dir.path().join("out.zip");
        let mut writer = ArchiveWriter::create(&zip_path).unwrap();
        writer.add_file("stored", &src, "", 0).unwrap();
        writer.add_file("deflated", &src, "", 9).unwrap();
        writer.finalize().unwrap();

        let mut archive = ::zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let stored = archive.by_index(0).unwrap();
        assert_eq!(stored.compression(), ::zip::CompressionMethod::Stored);
        assert_eq!(stored.compressed_size(), 1000);
        drop(stored);
        let deflated = archive.by_index(1).unwrap();
        assert_eq!(deflated.compression(), ::zip::CompressionMethod::Deflated);
        assert!(deflated.compressed_size() < 100);
    }

    #[test]
    fn empty_archive_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("empty.zip");
        ArchiveWriter::create(&zip_path).unwrap().finalize().unwrap();

        assert_eq!(std::fs::metadata(&zip_path).unwrap().len(), EndOfCentralDirectory::SIZE as u64);
        assert!(read_back(&zip_path).is_empty());
    }

    #[test]
    fn missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArchiveWriter::create(&dir.path().join("out.zip")).unwrap();
        let err = writer
            .add_file("x", &dir.path().join("absent"), "", 6)
            .unwrap_err();
        assert!(err.to_string().contains("cannot open"));
    }

    #[test]
    fn rejects_invalid_level() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, b"x").unwrap();
        let mut writer = ArchiveWriter::create(&dir.path().join("out.zip")).unwrap();
        assert!(writer.add_file("a.txt", &src, "", 10).is_err());
    }
}
