//! Low-level ZIP archive parser.
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header to locate its data

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser over any [`ReadAt`] source.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: R,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: R) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record and its offset in the file. Archives with a
    /// trailing comment are handled by searching backwards for the signature.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        // Common case first: no archive comment
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_exact_at(offset, &mut buf)?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf)?;

        // Search backwards for EOCD signature (PK\x05\x06)
        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length must account for every trailing byte
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// Read the ZIP64 End of Central Directory record that precedes the
    /// regular EOCD at `eocd_offset`.
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .context("ZIP64 locator missing")?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader.read_exact_at(locator_offset, &mut locator_buf)?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// Number of entries recorded in the central directory.
    pub fn entry_count(&self) -> Result<u64> {
        let (eocd, eocd_offset) = self.find_eocd()?;
        if eocd.is_zip64() {
            Ok(self.read_zip64_eocd(eocd_offset)?.total_entries)
        } else {
            Ok(eocd.total_entries as u64)
        }
    }

    /// List all entries of the archive, in central directory order.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.saturating_add(cd_size) > self.size {
            bail!("Central Directory extends past end of file");
        }

        // Read the entire Central Directory at once
        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader
            .read_exact_at(cd_offset, &mut cd_data)
            .context("reading Central Directory")?;

        let mut entries = Vec::with_capacity(total_entries.min(u16::MAX as u64) as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..total_entries {
            let entry = self.parse_cdfh(&mut cursor)?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        // Read and verify the signature (PK\x01\x02)
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            bail!("Invalid Central Directory File Header");
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Lossy conversion keeps non-UTF8 (CP437) names usable
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        // Directory entries end with '/'
        let is_directory = file_name.ends_with('/');

        // ZIP64 extended information lives in extra field 0x0001
        let extra_field_end = cursor.position() + extra_field_length as u64;

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;
            let field_end = cursor.position() + field_size as u64;

            if header_id == 0x0001 {
                // Present only for header fields saturated at 0xFFFFFFFF, in this order
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>()?;
                }
            }
            cursor.set_position(field_end);
        }

        cursor.set_position(extra_field_end);

        let mut comment_bytes = vec![0u8; file_comment_length as usize];
        cursor.read_exact(&mut comment_bytes)?;
        let comment = String::from_utf8_lossy(&comment_bytes).to_string();

        Ok(ZipFileEntry {
            file_name,
            comment,
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            is_directory,
        })
    }

    /// Offset where the entry's (possibly compressed) data begins.
    ///
    /// The Local File Header's name and extra field lengths may differ from
    /// the Central Directory's, so the LFH itself is read.
    pub fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh_buf)?;

        // Verify LFH signature (PK\x03\x04)
        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header for {}", entry.file_name);
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct Mem(Vec<u8>);

    impl ReadAt for Mem {
        fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
            let start = (offset as usize).min(self.0.len());
            let n = buf.len().min(self.0.len() - start);
            buf[..n].copy_from_slice(&self.0[start..start + n]);
            Ok(n)
        }

        fn size(&self) -> u64 {
            self.0.len() as u64
        }
    }

    fn record(name: &str, comment: &str, offset: u32) -> EntryRecord {
        EntryRecord {
            name: name.to_string(),
            comment: comment.to_string(),
            method: CompressionMethod::Stored,
            flags: 0,
            modified: DosDateTime::EPOCH,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            external_attrs: 0,
            lfh_offset: offset,
        }
    }

    /// Archive of empty stored entries, optionally with a trailing archive comment.
    fn archive(names: &[&str], archive_comment: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        let mut records = Vec::new();
        for name in names {
            let r = record(name, "note", data.len() as u32);
            r.write_local_header(&mut data).unwrap();
            records.push(r);
        }
        let cd_offset = data.len() as u32;
        for r in &records {
            r.write_central_header(&mut data).unwrap();
        }
        let cd_size = data.len() as u32 - cd_offset;
        EndOfCentralDirectory::new(records.len() as u16, cd_size, cd_offset)
            .write_to(&mut data)
            .unwrap();

        if !archive_comment.is_empty() {
            let len = data.len();
            data[len - 2..].copy_from_slice(&(archive_comment.len() as u16).to_le_bytes());
            data.extend_from_slice(archive_comment);
        }
        data
    }

    #[test]
    fn lists_entries_in_order() {
        let parser = ZipParser::new(Mem(archive(&["a.txt", "dir/", "dir/b.txt"], b"")));
        let entries = parser.list_files().unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["a.txt", "dir/", "dir/b.txt"]);
        assert!(entries[1].is_directory);
        assert!(!entries[2].is_directory);
        assert_eq!(entries[0].comment, "note");
        assert_eq!(parser.entry_count().unwrap(), 3);
    }

    #[test]
    fn finds_eocd_behind_archive_comment() {
        let parser = ZipParser::new(Mem(archive(&["a.txt"], b"archive comment")));
        let entries = parser.list_files().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "a.txt");
    }

    #[test]
    fn data_offset_skips_local_header() {
        let parser = ZipParser::new(Mem(archive(&["a.txt", "bb.txt"], b"")));
        let entries = parser.list_files().unwrap();
        assert_eq!(parser.get_data_offset(&entries[0]).unwrap(), (LFH_SIZE + 5) as u64);
        assert_eq!(
            parser.get_data_offset(&entries[1]).unwrap(),
            (2 * LFH_SIZE + 5 + 6) as u64
        );
    }

    #[test]
    fn empty_archive_has_no_entries() {
        let parser = ZipParser::new(Mem(archive(&[], b"")));
        assert_eq!(parser.entry_count().unwrap(), 0);
        assert!(parser.list_files().unwrap().is_empty());
    }

    #[test]
    fn rejects_non_zip_data() {
        let junk = Mem(b"definitely not a zip archive".to_vec());
        assert!(ZipParser::new(junk).list_files().is_err());
        assert!(ZipParser::new(Mem(Vec::new())).list_files().is_err());
    }
}
