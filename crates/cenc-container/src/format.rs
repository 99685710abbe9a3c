//! On-disk container layout
//!
//! ```text
//! offset  size  field
//! 0       4     magic "CENC"
//! 4       2     version (u16 BE) = 1
//! 6       4     chunk_size (u32 BE, > 0)
//! 10      8     original_size (u64 BE; 0 until finalization)
//! 18      14    reserved (random padding, not authenticated)
//! 32      -     chunk records: [u32 BE length][sealed bytes]
//! ```
//!
//! All integers are big-endian. Chunk records are append-only; random access
//! walks the length prefixes because sealed chunk sizes are not uniform
//! enough to index arithmetically (the final chunk is shorter).

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use rand::RngCore;

use cenc_core::{CencError, CencResult};

pub const MAGIC: [u8; 4] = *b"CENC";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 32;

/// File offset of the `original_size` field, back-patched at finalization
pub const SIZE_FIELD_OFFSET: u64 = 10;

/// Upper bound on per-chunk AEAD expansion accepted by the parser. Anything
/// larger than `chunk_size + MAX_AEAD_OVERHEAD` in a length prefix marks a
/// corrupt or foreign file.
pub const MAX_AEAD_OVERHEAD: u32 = 128;

/// Parsed container header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u16,
    pub chunk_size: u32,
    pub original_size: u64,
}

impl FileHeader {
    /// Number of chunk records in a finalized container.
    pub fn total_chunks(&self) -> u64 {
        self.original_size.div_ceil(self.chunk_size as u64)
    }

    /// Plaintext length of the final chunk, in `(0, chunk_size]`.
    pub fn last_chunk_len(&self) -> u64 {
        if self.original_size == 0 {
            return 0;
        }
        let rem = self.original_size % self.chunk_size as u64;
        if rem == 0 {
            self.chunk_size as u64
        } else {
            rem
        }
    }

    /// Largest sealed chunk length the parser will accept.
    pub fn max_sealed_len(&self) -> u32 {
        self.chunk_size.saturating_add(MAX_AEAD_OVERHEAD)
    }
}

/// Associated data binding chunk `index` to the logical name of its file.
pub fn chunk_aad(name: &str, index: u64) -> Vec<u8> {
    format!("{name}:chunk:{index}").into_bytes()
}

/// Emit the 32-byte header. The reserved region is filled with random bytes;
/// it is alignment padding and is never authenticated or parsed.
pub fn write_header<W: Write>(sink: &mut W, chunk_size: u32, original_size: u64) -> CencResult<()> {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0..4].copy_from_slice(&MAGIC);
    buf[4..6].copy_from_slice(&FORMAT_VERSION.to_be_bytes());
    buf[6..10].copy_from_slice(&chunk_size.to_be_bytes());
    buf[10..18].copy_from_slice(&original_size.to_be_bytes());
    rand::thread_rng().fill_bytes(&mut buf[18..HEADER_SIZE]);
    sink.write_all(&buf)?;
    Ok(())
}

/// Parse and validate the 32-byte header.
pub fn parse_header(buf: &[u8]) -> CencResult<FileHeader> {
    if buf.len() < HEADER_SIZE {
        return Err(CencError::Format(format!(
            "header too short: {} bytes (need {HEADER_SIZE})",
            buf.len()
        )));
    }
    if buf[0..4] != MAGIC {
        return Err(CencError::Format("bad magic".into()));
    }

    let version = u16::from_be_bytes([buf[4], buf[5]]);
    if version != FORMAT_VERSION {
        return Err(CencError::Format(format!("unsupported version: {version}")));
    }

    let chunk_size = u32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]]);
    if chunk_size == 0 {
        return Err(CencError::Format("chunk size must be positive".into()));
    }

    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&buf[10..18]);
    let original_size = u64::from_be_bytes(size_bytes);

    Ok(FileHeader {
        version,
        chunk_size,
        original_size,
    })
}

/// Length-prefix a sealed chunk: `[u32 BE length][sealed bytes]`.
pub fn encode_chunk(sealed: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(4 + sealed.len());
    record.extend_from_slice(&(sealed.len() as u32).to_be_bytes());
    record.extend_from_slice(sealed);
    record
}

/// Read one chunk length prefix at the handle's current position.
pub(crate) fn read_chunk_len<R: Read>(
    handle: &mut R,
    header: &FileHeader,
    index: u64,
) -> CencResult<u32> {
    let mut len_buf = [0u8; 4];
    handle.read_exact(&mut len_buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            CencError::Format(format!("unexpected end of file at chunk {index} length"))
        } else {
            CencError::Storage(e)
        }
    })?;

    let len = u32::from_be_bytes(len_buf);
    if len == 0 || len > header.max_sealed_len() {
        return Err(CencError::Format(format!(
            "invalid sealed length {len} at chunk {index} (limit {})",
            header.max_sealed_len()
        )));
    }
    Ok(len)
}

/// File offset of chunk `index`'s length prefix, found by walking the
/// prefixes of chunks `0..index` from the end of the header.
pub fn locate_chunk<H: Read + Seek>(
    handle: &mut H,
    header: &FileHeader,
    index: u64,
) -> CencResult<u64> {
    let mut pos = HEADER_SIZE as u64;
    for i in 0..index {
        handle.seek(SeekFrom::Start(pos))?;
        let len = read_chunk_len(handle, header, i)?;
        pos += 4 + len as u64;
    }
    Ok(pos)
}

/// Read only the header of a container on disk, for metadata queries that
/// need no decryption.
pub fn inspect(path: &Path) -> CencResult<FileHeader> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = [0u8; HEADER_SIZE];
    file.read_exact(&mut buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            CencError::Format("container too short for header".into())
        } else {
            CencError::Storage(e)
        }
    })?;
    parse_header(&buf)
}
