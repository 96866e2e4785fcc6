//! Bounded-memory GZIP compression of a single file.
//!
//! The source is read in chunks of at most [`BUFFER_SIZE`] bytes into a fixed
//! input buffer, fed through a raw deflate stream into a fixed output buffer,
//! and the output buffer is flushed to the destination whenever it fills up or
//! the stream ends. The CRC32 is accumulated over exactly the bytes read from
//! the source, so memory use stays at two buffers no matter how large the file
//! is.

use std::fs::{File, Metadata};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use flate2::{Compress, Compression, Crc, FlushCompress, Status};
use tracing::{debug, error, info};

use super::frame::{GzipFooter, write_footer, write_header};
use crate::error::{CompressError, Result};
use crate::io::remove_partial_output;
use crate::naming::{Algorithm, compressed_filename, join_path};

/// Capacity of each of the input and output buffers.
pub const BUFFER_SIZE: usize = 1024 * 1024;

/// Compression level used when the caller does not pick one.
pub const DEFAULT_LEVEL: u32 = 6;

/// Validate a 0..=9 compression level.
pub fn check_level(level: u32) -> Result<Compression> {
    if level > 9 {
        return Err(CompressError::Codec(format!(
            "invalid compression level {level} (expected 0..=9)"
        )));
    }
    Ok(Compression::new(level))
}

/// Outcome of one [`DeflateStream::step`].
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub consumed: usize,
    pub produced: usize,
    pub status: Status,
}

/// Raw deflate encoder (no zlib or gzip wrapper of its own).
///
/// The native state is released when the stream is dropped, so every early
/// return frees it. [`release`](Self::release) is the checked way to end a
/// stream that was driven to completion.
pub struct DeflateStream {
    inner: Compress,
    finished: bool,
}

impl DeflateStream {
    pub fn new(level: Compression) -> Self {
        Self {
            inner: Compress::new(level, false),
            finished: false,
        }
    }

    /// Run one compression step over `input`, writing into `output`.
    ///
    /// With `finish` set the encoder is asked to terminate the stream once
    /// `input` is drained.
    pub fn step(&mut self, input: &[u8], output: &mut [u8], finish: bool) -> Result<Step> {
        let flush = if finish {
            FlushCompress::Finish
        } else {
            FlushCompress::None
        };

        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();

        let status = self
            .inner
            .compress(input, output, flush)
            .map_err(|e| CompressError::Codec(format!("deflate() failed: {e}")))?;

        if status == Status::StreamEnd {
            self.finished = true;
        }

        Ok(Step {
            consumed: (self.inner.total_in() - before_in) as usize,
            produced: (self.inner.total_out() - before_out) as usize,
            status,
        })
    }

    pub fn total_out(&self) -> u64 {
        self.inner.total_out()
    }

    /// End the stream. Fails if the encoder never signalled end of stream.
    pub fn release(self) -> Result<()> {
        if !self.finished {
            return Err(CompressError::Codec(
                "deflate stream released before reaching end of stream".to_string(),
            ));
        }
        Ok(())
    }
}

/// Buffers and codec state owned by one compression call.
pub struct GzipStreamState {
    input: Vec<u8>,
    in_pos: usize,
    in_len: usize,
    output: Vec<u8>,
    out_len: usize,
    stream: DeflateStream,
    crc: Crc,
    remaining: u64,
}

impl GzipStreamState {
    pub fn new(level: Compression, capacity: usize, size: u64) -> Self {
        Self {
            input: vec![0u8; capacity],
            in_pos: 0,
            in_len: 0,
            output: vec![0u8; capacity],
            out_len: 0,
            stream: DeflateStream::new(level),
            crc: Crc::new(),
            remaining: size,
        }
    }

    /// Compress `size` bytes of `src` into `dst` as a raw deflate stream.
    fn run<R: Read, W: Write>(&mut self, src: &mut R, dst: &mut W) -> Result<()> {
        loop {
            if self.in_pos == self.in_len {
                let n = self.remaining.min(self.input.len() as u64) as usize;

                src.read_exact(&mut self.input[..n]).map_err(|e| {
                    CompressError::Codec(format!("failed reading from input file: {e}"))
                })?;
                self.crc.update(&self.input[..n]);

                self.in_pos = 0;
                self.in_len = n;
                self.remaining -= n as u64;
                if n > 0 {
                    debug!(remaining = self.remaining, "input bytes remaining");
                }
            }

            let step = self.stream.step(
                &self.input[self.in_pos..self.in_len],
                &mut self.output[self.out_len..],
                self.remaining == 0,
            )?;
            self.in_pos += step.consumed;
            self.out_len += step.produced;

            if step.status == Status::StreamEnd || self.out_len == self.output.len() {
                dst.write_all(&self.output[..self.out_len]).map_err(|e| {
                    CompressError::Codec(format!("failed writing to output file: {e}"))
                })?;
                self.out_len = 0;
            }

            match step.status {
                Status::StreamEnd => return Ok(()),
                Status::Ok => {}
                Status::BufError => {
                    return Err(CompressError::Codec(
                        "deflate() made no progress".to_string(),
                    ));
                }
            }
        }
    }

    /// Release the codec and return the accumulated CRC32.
    fn finish(self) -> Result<u32> {
        let crc = self.crc.sum();
        self.stream.release()?;
        Ok(crc)
    }
}

/// Write a complete GZIP member for `size` bytes read from `src`.
///
/// `dst_path` only labels errors. The footer size is `size` modulo 2^32, as
/// captured by the caller before the copy starts.
pub fn write_gzip<R: Read, W: Write>(
    src: &mut R,
    dst: &mut W,
    dst_path: &Path,
    size: u64,
    mtime: u32,
    level: u32,
    capacity: usize,
) -> Result<GzipFooter> {
    let level = check_level(level)?;
    if capacity == 0 {
        return Err(CompressError::Codec("buffer capacity must be non-zero".to_string()));
    }

    let not_writeable = |source: io::Error| CompressError::FileNotWriteable {
        path: dst_path.to_path_buf(),
        source,
    };

    write_header(dst, mtime).map_err(not_writeable)?;

    let mut state = GzipStreamState::new(level, capacity, size);
    state.run(src, dst)?;
    let crc32 = state.finish()?;

    let footer = GzipFooter {
        crc32,
        size: size as u32,
    };
    write_footer(dst, footer.crc32, footer.size).map_err(not_writeable)?;

    Ok(footer)
}

/// Modification time in Unix seconds, truncated to 32 bits; 0 when unknown.
pub fn mtime_seconds(metadata: &Metadata) -> u32 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Compress `src_dir/file_name` into `dst_dir/file_name.gz`.
///
/// The destination directory must already exist. If compression fails after
/// the destination was created, the partial `.gz` file is removed.
pub fn compress_gzip_file(file_name: &str, src_dir: &str, dst_dir: &str, level: u32) -> Result<()> {
    info!("Compressing (GZIP) file {}", file_name);

    let dst_name = compressed_filename(file_name, Algorithm::Gzip);
    let dst_path = PathBuf::from(join_path(dst_dir, &dst_name));
    let src_path = PathBuf::from(join_path(src_dir, file_name));

    if !src_path.exists() {
        error!("Cannot find file to compress: {}", src_path.display());
        return Err(CompressError::SourceMissing(src_path));
    }

    let not_open = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| CompressError::FileNotOpen { path, source }
    };

    let mut src = File::open(&src_path).map_err(not_open(&src_path))?;
    let metadata = src.metadata().map_err(not_open(&src_path))?;
    if !metadata.is_file() {
        return Err(CompressError::FileNotOpen {
            path: src_path,
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }

    let mut dst = File::create(&dst_path).map_err(not_open(&dst_path))?;

    let result = write_gzip(
        &mut src,
        &mut dst,
        &dst_path,
        metadata.len(),
        mtime_seconds(&metadata),
        level,
        BUFFER_SIZE,
    );
    drop(dst);

    match result {
        Ok(footer) => {
            debug!(crc32 = footer.crc32, size = footer.size, "wrote {}", dst_path.display());
            Ok(())
        }
        Err(e) => {
            error!("GZIP compression of {} failed: {}", src_path.display(), e);
            remove_partial_output(&dst_path);
            Err(e)
        }
    }
}
