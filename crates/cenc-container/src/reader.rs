//! Random-access read channel: at most one decrypted chunk in memory
//!
//! Reads resolve the target chunk from the position, walk the length
//! prefixes to it, decrypt it with its positional AAD and copy out of the
//! cached plaintext. The cache holds a single chunk and is zeroized on every
//! eviction, on close and on drop.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use zeroize::Zeroize;

use cenc_core::{CencError, CencResult};
use cenc_crypto::Keyset;

use crate::format::{self, FileHeader, HEADER_SIZE};

/// Outcome of a read call.
///
/// End-of-file is a distinguished value because the host protocol treats a
/// zero-byte read as "retry later"; `Data(0)` occurs only for an empty
/// destination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Data(usize),
    Eof,
}

/// Read-only sealed byte channel with random access.
///
/// Owns an independent seekable handle; multiple channels over the same
/// container are safe. A single instance is not safe for concurrent use.
pub struct ChunkedReadChannel {
    file: File,
    name: String,
    keyset: Arc<Keyset>,
    header: FileHeader,
    cached_index: Option<u64>,
    cached_plaintext: Vec<u8>,
    position: u64,
    open: bool,
}

impl ChunkedReadChannel {
    /// Open the container at `path` and parse its header. A header whose
    /// size field is zero while chunk data follows marks a writer that never
    /// finalized; such containers are rejected.
    pub fn open(path: &Path, name: &str, keyset: Arc<Keyset>) -> CencResult<Self> {
        let mut file = File::open(path)?;

        let mut header_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                CencError::Format("container too short for header".into())
            } else {
                CencError::Storage(e)
            }
        })?;
        let header = format::parse_header(&header_buf)?;

        if header.original_size == 0 && file.metadata()?.len() > HEADER_SIZE as u64 {
            return Err(CencError::Format("unfinalized container".into()));
        }

        debug!(
            name,
            size = header.original_size,
            chunks = header.total_chunks(),
            "read channel opened"
        );

        Ok(Self {
            file,
            name: name.to_string(),
            keyset,
            header,
            cached_index: None,
            cached_plaintext: Vec::new(),
            position: 0,
            open: true,
        })
    }

    /// Copy plaintext into `dst`, crossing chunk boundaries as needed.
    ///
    /// Returns [`ReadOutcome::Eof`] once the position has reached the
    /// original size. If an error strikes after some bytes were already
    /// copied, the short count is returned and the error surfaces on the
    /// next call.
    pub fn read(&mut self, dst: &mut [u8]) -> CencResult<ReadOutcome> {
        self.ensure_open()?;

        if self.position >= self.header.original_size {
            return Ok(ReadOutcome::Eof);
        }
        if dst.is_empty() {
            return Ok(ReadOutcome::Data(0));
        }

        let chunk_size = self.header.chunk_size as u64;
        let mut copied = 0usize;

        while copied < dst.len() && self.position < self.header.original_size {
            let index = self.position / chunk_size;
            let offset = (self.position % chunk_size) as usize;

            if self.cached_index != Some(index) {
                if let Err(e) = self.load_chunk(index) {
                    if copied > 0 {
                        warn!(name = %self.name, error = %e, "short read before error");
                        return Ok(ReadOutcome::Data(copied));
                    }
                    return Err(e);
                }
            }

            let available = self.cached_plaintext.len().saturating_sub(offset);
            let left_in_file = (self.header.original_size - self.position) as usize;
            let take = (dst.len() - copied).min(available).min(left_in_file);

            if take == 0 {
                // Cached chunk ran out before original_size said it should;
                // the header stays authoritative for the read bound.
                break;
            }

            dst[copied..copied + take]
                .copy_from_slice(&self.cached_plaintext[offset..offset + take]);
            copied += take;
            self.position += take as u64;
        }

        if copied == 0 {
            return Err(CencError::Format(format!(
                "no data available at position {} of {}",
                self.position, self.header.original_size
            )));
        }
        Ok(ReadOutcome::Data(copied))
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Seek to any position; positions past the end are permitted and make
    /// subsequent reads report end-of-file.
    pub fn set_position(&mut self, pos: u64) -> CencResult<()> {
        self.ensure_open()?;
        self.position = pos;
        Ok(())
    }

    /// Total plaintext length of the container.
    pub fn size(&self) -> u64 {
        self.header.original_size
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Zeroize the cached plaintext and release the handle. Idempotent.
    pub fn close(&mut self) -> CencResult<()> {
        if self.open {
            self.evict_cache();
            self.open = false;
            debug!(name = %self.name, "read channel closed");
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn evict_cache(&mut self) {
        self.cached_plaintext.zeroize();
        self.cached_index = None;
    }

    fn load_chunk(&mut self, index: u64) -> CencResult<()> {
        let total = self.header.total_chunks();
        if index >= total {
            return Err(CencError::Format(format!(
                "chunk index {index} out of range ({total} chunks)"
            )));
        }

        self.evict_cache();

        let record_start = format::locate_chunk(&mut self.file, &self.header, index)?;
        self.file.seek(SeekFrom::Start(record_start))?;
        let sealed_len = format::read_chunk_len(&mut self.file, &self.header, index)?;

        let mut sealed = vec![0u8; sealed_len as usize];
        self.file.read_exact(&mut sealed).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                CencError::Format(format!("container truncated inside chunk {index}"))
            } else {
                CencError::Storage(e)
            }
        })?;

        let aad = format::chunk_aad(&self.name, index);
        let plaintext = self.keyset.open(&sealed, &aad)?;

        if index == total - 1 {
            let expected = self.header.last_chunk_len();
            if plaintext.len() as u64 != expected {
                // Tolerated: original_size bounds every read
                warn!(
                    name = %self.name,
                    index,
                    expected,
                    actual = plaintext.len(),
                    "last chunk length mismatch"
                );
            }
        }

        debug!(name = %self.name, index, bytes = plaintext.len(), "chunk decrypted");
        self.cached_plaintext = plaintext;
        self.cached_index = Some(index);
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

impl Drop for ChunkedReadChannel {
    fn drop(&mut self) {
        self.cached_plaintext.zeroize();
    }
}
