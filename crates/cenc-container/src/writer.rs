//! Streaming write channel: buffers one chunk of plaintext, seals, appends
//!
//! The header is emitted lazily on the first flush with a zero size field;
//! `close` flushes the final partial chunk, back-patches the real size at
//! offset 10 on the same handle and fsyncs. A crash before `close` leaves the
//! size field at zero, which the read side detects and rejects.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};
use zeroize::Zeroize;

use cenc_core::{CencError, CencResult};
use cenc_crypto::Keyset;

use crate::format::{self, SIZE_FIELD_OFFSET};

/// Largest forward-seek gap filled with zeros (sparse-write emulation)
const MAX_SEEK_GAP: u64 = 10 * 1024 * 1024;

const ZERO_FILL_SLICE: usize = 8192;

/// Append-only sealed byte channel.
///
/// Owns its file handle exclusively from creation to close. Not safe for
/// concurrent use from multiple threads; the embedder serializes access per
/// instance.
pub struct ChunkedWriteChannel {
    file: File,
    name: String,
    keyset: Arc<Keyset>,
    chunk_size: u32,
    buffer: Vec<u8>,
    chunk_index: u32,
    total_plaintext: u64,
    header_emitted: bool,
    open: bool,
}

impl ChunkedWriteChannel {
    /// Create (or truncate) the container at `path`, sealing chunks under
    /// `keyset` with the logical `name` bound into every chunk's AAD.
    pub fn create(
        path: &Path,
        name: &str,
        keyset: Arc<Keyset>,
        chunk_size: u32,
    ) -> CencResult<Self> {
        if chunk_size == 0 {
            return Err(CencError::InvalidArgument(
                "chunk_size must be positive".into(),
            ));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        debug!(name, chunk_size, "write channel created");

        Ok(Self {
            file,
            name: name.to_string(),
            keyset,
            chunk_size,
            buffer: Vec::with_capacity(chunk_size as usize),
            chunk_index: 0,
            total_plaintext: 0,
            header_emitted: false,
            open: true,
        })
    }

    /// Append `src` to the container. Returns the number of bytes consumed,
    /// which is `src.len()` unless a flush fails mid-copy; a failed flush
    /// closes the channel.
    pub fn write(&mut self, src: &[u8]) -> CencResult<usize> {
        self.ensure_open()?;

        let mut remaining = src;
        let mut written = 0usize;

        while !remaining.is_empty() {
            let space = self.chunk_size as usize - self.buffer.len();
            let take = remaining.len().min(space);
            self.buffer.extend_from_slice(&remaining[..take]);
            remaining = &remaining[take..];
            written += take;
            self.total_plaintext += take as u64;

            if self.buffer.len() == self.chunk_size as usize {
                if let Err(e) = self.flush_chunk(false) {
                    self.open = false;
                    if written > 0 {
                        warn!(name = %self.name, error = %e, "short write, channel closed");
                        return Ok(written);
                    }
                    return Err(e);
                }
            }
        }

        Ok(written)
    }

    /// Total plaintext bytes accepted so far.
    pub fn position(&self) -> u64 {
        self.total_plaintext
    }

    /// Current logical size (same as [`position`](Self::position) for an
    /// append-only channel).
    pub fn size(&self) -> u64 {
        self.total_plaintext
    }

    /// Seeks are append-only: the current position is a no-op, a bounded
    /// forward gap is filled with zeros through the normal write path, and
    /// everything else is refused.
    pub fn set_position(&mut self, pos: u64) -> CencResult<()> {
        self.ensure_open()?;

        if pos == self.total_plaintext {
            return Ok(());
        }
        if pos < self.total_plaintext {
            return Err(CencError::Seek("no backward seek".into()));
        }

        let gap = pos - self.total_plaintext;
        if gap > MAX_SEEK_GAP {
            return Err(CencError::Seek(format!(
                "seek gap too large: {gap} bytes (limit {MAX_SEEK_GAP})"
            )));
        }

        debug!(name = %self.name, gap, "forward seek, zero-filling");
        let zeros = [0u8; ZERO_FILL_SLICE];
        let mut left = gap;
        while left > 0 {
            let n = left.min(ZERO_FILL_SLICE as u64) as usize;
            let wrote = self.write(&zeros[..n])?;
            left -= wrote as u64;
        }
        Ok(())
    }

    /// Growing truncates are a no-op; shrinking would mean rewriting sealed
    /// chunks and is refused.
    pub fn truncate(&mut self, size: u64) -> CencResult<()> {
        self.ensure_open()?;

        if size >= self.total_plaintext {
            return Ok(());
        }
        Err(CencError::Truncate(format!(
            "cannot shrink sealed container to {size} (current {})",
            self.total_plaintext
        )))
    }

    /// Flush the final partial chunk, finalize the header and fsync.
    /// Idempotent; an empty channel still produces a valid 32-byte container.
    pub fn close(&mut self) -> CencResult<()> {
        if !self.open {
            return Ok(());
        }
        let result = self.finalize();
        self.open = false;
        result
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn finalize(&mut self) -> CencResult<()> {
        self.flush_chunk(true)?;

        self.file.seek(SeekFrom::Start(SIZE_FIELD_OFFSET))?;
        self.file.write_all(&self.total_plaintext.to_be_bytes())?;
        self.file.sync_all()?;

        info!(
            name = %self.name,
            bytes = self.total_plaintext,
            chunks = self.chunk_index,
            "container finalized"
        );
        Ok(())
    }

    fn flush_chunk(&mut self, is_final: bool) -> CencResult<()> {
        if self.buffer.is_empty() && !is_final {
            return Ok(());
        }

        if !self.header_emitted {
            format::write_header(&mut self.file, self.chunk_size, 0)?;
            self.header_emitted = true;
        }

        if !self.buffer.is_empty() {
            let aad = format::chunk_aad(&self.name, self.chunk_index as u64);
            let sealed = self.keyset.seal(&self.buffer, &aad)?;
            let record = format::encode_chunk(&sealed);
            self.file.write_all(&record)?;

            debug!(
                name = %self.name,
                index = self.chunk_index,
                plaintext = self.buffer.len(),
                sealed = sealed.len(),
                "chunk flushed"
            );
            self.chunk_index += 1;
        }

        // Scrub plaintext from the buffer
        self.buffer.zeroize();
        Ok(())
    }

    fn ensure_open(&self) -> CencResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(CencError::Closed)
        }
    }
}

impl Drop for ChunkedWriteChannel {
    fn drop(&mut self) {
        self.buffer.zeroize();
    }
}
