//! Single-file ZIP compression and flat ZIP extraction.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::archive::{ArchiveWriter, ZipExtractor};
use crate::error::{CompressError, Result};
use crate::gzip::check_level;
use crate::io::remove_partial_output;
use crate::naming::{Algorithm, compressed_filename, join_path, sanitize_entry_name};

/// Comment stored on every entry written by [`compress_zip_file`].
pub const ENTRY_COMMENT: &str = "Compressed with fcompress. Invalid chars replaced with _";

/// Compress `src_dir/file_name` into a single-entry archive `dst_dir/<sanitized name>.zip`.
///
/// The entry is named after `file_name` with `\`, `/` and `:` replaced by `_`.
/// A partially written archive is removed if adding the file or finalizing fails.
pub fn compress_zip_file(file_name: &str, src_dir: &str, dst_dir: &str, level: u32) -> Result<()> {
    info!("Compressing (ZIP) file {}", file_name);

    let dst_name = compressed_filename(file_name, Algorithm::Zip);
    let dst_path = PathBuf::from(join_path(dst_dir, &dst_name));
    let src_path = PathBuf::from(join_path(src_dir, file_name));

    if !src_path.exists() {
        error!("Cannot find file to compress: {}", src_path.display());
        return Err(CompressError::SourceMissing(src_path));
    }
    check_level(level)?;

    let writer = ArchiveWriter::create(&dst_path).map_err(|e| {
        error!("{:#}", e);
        CompressError::archive(e)
    })?;

    let entry_name = sanitize_entry_name(file_name);
    write_single_entry(writer, &entry_name, &src_path, level).map_err(|e| {
        error!("Error while writing zip archive {}: {:#}", dst_path.display(), e);
        remove_partial_output(&dst_path);
        CompressError::archive(e)
    })
}

fn write_single_entry(
    mut writer: ArchiveWriter,
    entry_name: &str,
    src_path: &Path,
    level: u32,
) -> anyhow::Result<()> {
    writer
        .add_file(entry_name, src_path, ENTRY_COMMENT, level)
        .with_context(|| format!("adding {} to archive", src_path.display()))?;
    writer.finalize().context("finalizing archive")
}

/// Extract every file entry of `archive_path` directly into `dest_dir`.
///
/// Directory structure stored in the archive is dropped: each file lands in
/// `dest_dir` (or `.` when empty) under its base name, and directory entries
/// are skipped. Entries sharing a base name overwrite each other in archive
/// order. The first failing entry aborts the extraction.
pub fn uncompress_zip_file(archive_path: &str, dest_dir: &str) -> Result<()> {
    info!("Uncompressing (ZIP) file {}", archive_path);

    let log_failure = |e: anyhow::Error| {
        error!("Error while extracting from {}: {:#}", archive_path, e);
        CompressError::archive(e)
    };

    let extractor = ZipExtractor::open(Path::new(archive_path)).map_err(log_failure)?;
    if extractor.entry_count().map_err(log_failure)? == 0 {
        return Ok(());
    }

    let dest = if dest_dir.is_empty() { "." } else { dest_dir };

    for entry in extractor.list_files().map_err(log_failure)? {
        if entry.is_directory {
            debug!("Skipping directory {}", entry.file_name);
            continue;
        }

        let name = entry.base_name();
        if name.is_empty() || name == "." || name == ".." {
            warn!("Skipping entry with unusable name {:?}", entry.file_name);
            continue;
        }

        let target = PathBuf::from(join_path(dest, name));
        debug!("Extracting {} to {}", entry.file_name, target.display());
        extractor
            .extract_to_file(&entry, &target)
            .map_err(log_failure)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::fs::{self, File};
    use std::io::{Read, Write};

    fn dir_str(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn single_entry_archive_round_trip() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let data = b"line of text\n".repeat(1000);
        fs::write(src.path().join("notes.txt"), &data).unwrap();

        compress_zip_file("notes.txt", dir_str(src.path()), dir_str(dst.path()), 6).unwrap();

        let archive_path = dst.path().join("notes.txt.zip");
        let mut archive = ::zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "notes.txt");
        assert_eq!(entry.comment(), ENTRY_COMMENT);
        let mut out = Vec::new();
        entry.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn missing_source_is_file_not_open() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir_str(dir.path());
        let err = compress_zip_file("ghost.txt", d, d, 6).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileNotOpen);
        assert!(!dir.path().join("ghost.txt.zip").exists());
    }

    #[test]
    fn unwritable_destination_is_generic_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        let missing = dir.path().join("no").join("such").join("dir");

        let err = compress_zip_file("a.txt", dir_str(dir.path()), dir_str(&missing), 6)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Failure);
    }

    #[test]
    fn extraction_flattens_and_last_entry_wins() {
        let work = tempfile::tempdir().unwrap();
        let archive_path = work.path().join("mixed.zip");
        {
            let mut writer = ::zip::ZipWriter::new(File::create(&archive_path).unwrap());
            let options = ::zip::write::SimpleFileOptions::default();
            writer.add_directory("docs/", options).unwrap();
            writer.start_file("docs/readme.txt", options).unwrap();
            writer.write_all(b"first").unwrap();
            writer.start_file("other/deep/readme.txt", options).unwrap();
            writer.write_all(b"second").unwrap();
            writer.finish().unwrap();
        }

        let out = work.path().join("out");
        fs::create_dir(&out).unwrap();
        uncompress_zip_file(archive_path.to_str().unwrap(), dir_str(&out)).unwrap();

        let names: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["readme.txt"]);
        assert_eq!(fs::read(out.join("readme.txt")).unwrap(), b"second");
        assert!(!out.join("docs").exists());
    }

    #[test]
    fn empty_archive_is_a_no_op() {
        let work = tempfile::tempdir().unwrap();
        let archive_path = work.path().join("empty.zip");
        ::zip::ZipWriter::new(File::create(&archive_path).unwrap())
            .finish()
            .unwrap();

        let out = work.path().join("out");
        fs::create_dir(&out).unwrap();
        uncompress_zip_file(archive_path.to_str().unwrap(), dir_str(&out)).unwrap();
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn corrupt_archive_is_generic_failure() {
        let work = tempfile::tempdir().unwrap();
        let archive_path = work.path().join("bad.zip");
        fs::write(&archive_path, b"this is not an archive at all").unwrap();

        let err = uncompress_zip_file(archive_path.to_str().unwrap(), dir_str(work.path()))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Failure);

        let err = uncompress_zip_file(
            work.path().join("absent.zip").to_str().unwrap(),
            dir_str(work.path()),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Failure);
    }
}
