//! GZIP member framing (RFC 1952 §2.3).
//!
//! ```text
//! +---+---+---+---+---+---+---+---+---+---+========//========+---+---+---+---+---+---+---+---+
//! |ID1|ID2|CM |FLG|     MTIME     |XFL|OS | compressed data |     CRC32     |     ISIZE     |
//! +---+---+---+---+---+---+---+---+---+---+========//========+---+---+---+---+---+---+---+---+
//! ```
//!
//! The header is fixed at 10 bytes (no optional fields), the footer is the
//! CRC32 of the uncompressed data followed by its size modulo 2^32.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Write};

use anyhow::{Result, bail};

pub const ID1: u8 = 0x1f;
pub const ID2: u8 = 0x8b;
/// Compression method: deflate.
pub const CM_DEFLATE: u8 = 8;

/// OS byte written into the header: 0 for FAT/Windows, 3 for Unix.
#[cfg(windows)]
pub const OS_CODE: u8 = 0;
#[cfg(not(windows))]
pub const OS_CODE: u8 = 3;

/// Byte `index` (0 = least significant) of `value`.
pub fn byte_at(value: u32, index: u8) -> u8 {
    let shift = match index {
        1 => 8,
        2 => 16,
        3 => 24,
        _ => 0,
    };
    ((value >> shift) & 0xff) as u8
}

fn le_bytes(value: u32) -> [u8; 4] {
    [
        byte_at(value, 0),
        byte_at(value, 1),
        byte_at(value, 2),
        byte_at(value, 3),
    ]
}

/// Fixed 10 byte GZIP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipHeader {
    pub mtime: u32,
    pub os: u8,
}

impl GzipHeader {
    pub const SIZE: usize = 10;

    pub fn new(mtime: u32) -> Self {
        Self { mtime, os: OS_CODE }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mtime = le_bytes(self.mtime);
        [
            ID1, ID2, CM_DEFLATE, 0, // FLG: no optional fields
            mtime[0], mtime[1], mtime[2], mtime[3], 0, // XFL
            self.os,
        ]
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            bail!("GZIP header too short");
        }
        if data[0] != ID1 || data[1] != ID2 {
            bail!("Not a GZIP stream");
        }
        if data[2] != CM_DEFLATE {
            bail!("Unsupported GZIP compression method: {}", data[2]);
        }

        let mut cursor = Cursor::new(&data[4..8]);
        Ok(Self {
            mtime: cursor.read_u32::<LittleEndian>()?,
            os: data[9],
        })
    }
}

/// 8 byte GZIP trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipFooter {
    pub crc32: u32,
    /// Uncompressed size modulo 2^32.
    pub size: u32,
}

impl GzipFooter {
    pub const SIZE: usize = 8;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let crc = le_bytes(self.crc32);
        let size = le_bytes(self.size);
        [
            crc[0], crc[1], crc[2], crc[3], size[0], size[1], size[2], size[3],
        ]
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            bail!("GZIP footer too short");
        }
        let mut cursor = Cursor::new(data);
        Ok(Self {
            crc32: cursor.read_u32::<LittleEndian>()?,
            size: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// Append the GZIP header for a payload last modified at `mtime` (Unix seconds).
pub fn write_header<W: Write>(out: &mut W, mtime: u32) -> std::io::Result<()> {
    out.write_all(&GzipHeader::new(mtime).to_bytes())
}

/// Append the GZIP footer. Must follow the final deflate block.
pub fn write_footer<W: Write>(out: &mut W, crc32: u32, size: u32) -> std::io::Result<()> {
    out.write_all(&GzipFooter { crc32, size }.to_bytes())
}
