use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io::{Cursor, Write};

use anyhow::{Result, bail};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// General purpose flag: entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 1 << 0;
/// General purpose flag: name and comment are UTF-8.
pub const FLAG_UTF8: u16 = 1 << 11;

/// Version needed to extract a deflated entry (2.0).
pub const VERSION_NEEDED: u16 = 20;

/// Host system recorded in "version made by".
#[cfg(windows)]
pub const HOST_SYSTEM: u8 = 0;
#[cfg(not(windows))]
pub const HOST_SYSTEM: u8 = 3;

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Single-disk EOCD for `entries` records stored at `cd_offset`.
    pub fn new(entries: u16, cd_size: u32, cd_offset: u32) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            bail!("Invalid End of Central Directory");
        }

        // Verify signature
        if &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Write the record. The archive comment is always empty.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(self.disk_number)?;
        out.write_u16::<LittleEndian>(self.disk_with_cd)?;
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(0)?;
        Ok(())
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub eocd64_offset: u64,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 format");
        }

        let mut cursor = Cursor::new(&data[8..]);
        let eocd64_offset = cursor.read_u64::<LittleEndian>()?;
        let total_disks = cursor.read_u32::<LittleEndian>()?;
        if total_disks > 1 {
            bail!("multi-disk archives are not supported ({total_disks} disks)");
        }

        Ok(Self { eocd64_offset })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 format");
        }

        // record size, versions, disk numbers and the per-disk count precede these
        let mut cursor = Cursor::new(&data[32..]);

        Ok(Self {
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Offset of the CRC32 field inside a Local File Header.
pub const LFH_CRC_OFFSET: u64 = 14;

/// DOS (FAT) packed time and date, 2 second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable value.
    pub const EPOCH: Self = Self {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// Pack `dt`, clamping to the 1980..=2107 range DOS dates can hold.
    pub fn from_datetime(dt: &NaiveDateTime) -> Self {
        let year = dt.year();
        if year < 1980 {
            return Self::EPOCH;
        }
        if year > 2107 {
            return Self {
                time: (23 << 11) | (59 << 5) | 29,
                date: (127 << 9) | (12 << 5) | 31,
            };
        }

        let hour = dt.hour() as u16;
        let minute = dt.minute() as u16;
        let second = dt.second() as u16;
        let year = (year - 1980) as u16;
        Self {
            time: (hour << 11) | (minute << 5) | (second / 2),
            date: (year << 9) | ((dt.month() as u16) << 5) | dt.day() as u16,
        }
    }
}

/// Everything needed to write the headers of one archive entry.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub name: String,
    pub comment: String,
    pub method: CompressionMethod,
    pub flags: u16,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub external_attrs: u32,
    pub lfh_offset: u32,
}

impl EntryRecord {
    pub fn write_local_header<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(LFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.method.as_u16())?;
        out.write_u16::<LittleEndian>(self.modified.time)?;
        out.write_u16::<LittleEndian>(self.modified.date)?;
        self.write_sizes(out)?;
        out.write_u16::<LittleEndian>(self.name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.write_all(self.name.as_bytes())?;
        Ok(())
    }

    /// CRC32, compressed and uncompressed size, as laid out in both headers.
    pub fn write_sizes<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        Ok(())
    }

    pub fn write_central_header<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(CDFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(((HOST_SYSTEM as u16) << 8) | VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.method.as_u16())?;
        out.write_u16::<LittleEndian>(self.modified.time)?;
        out.write_u16::<LittleEndian>(self.modified.date)?;
        self.write_sizes(out)?;
        out.write_u16::<LittleEndian>(self.name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.write_u16::<LittleEndian>(self.comment.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // disk number start
        out.write_u16::<LittleEndian>(0)?; // internal attributes
        out.write_u32::<LittleEndian>(self.external_attrs)?;
        out.write_u32::<LittleEndian>(self.lfh_offset)?;
        out.write_all(self.name.as_bytes())?;
        out.write_all(self.comment.as_bytes())?;
        Ok(())
    }
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub comment: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Last path component of the stored name
    pub fn base_name(&self) -> &str {
        self.file_name
            .trim_end_matches('/')
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}
