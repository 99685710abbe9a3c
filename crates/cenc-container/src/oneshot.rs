//! One-shot sealing helpers built on the streaming channels
//!
//! Convenience for embedders that hold the whole payload in memory; the
//! channels remain the primary surface for streamed traffic.

use std::path::Path;
use std::sync::Arc;

use cenc_core::{CencError, CencResult};
use cenc_crypto::Keyset;

use crate::reader::{ChunkedReadChannel, ReadOutcome};
use crate::writer::ChunkedWriteChannel;

/// Seal `plaintext` into a finalized container at `path` under the logical
/// `name`.
pub fn write_container(
    path: &Path,
    name: &str,
    plaintext: &[u8],
    keyset: Arc<Keyset>,
    chunk_size: u32,
) -> CencResult<()> {
    let mut chan = ChunkedWriteChannel::create(path, name, keyset, chunk_size)?;
    chan.write(plaintext)?;
    chan.close()
}

/// Decrypt an entire container, verifying that the decrypted length matches
/// the header's size field.
pub fn read_container(path: &Path, name: &str, keyset: Arc<Keyset>) -> CencResult<Vec<u8>> {
    let mut chan = ChunkedReadChannel::open(path, name, keyset)?;

    let size = chan.size() as usize;
    let mut out = vec![0u8; size];
    let mut filled = 0usize;

    while filled < size {
        match chan.read(&mut out[filled..])? {
            ReadOutcome::Data(n) => filled += n,
            ReadOutcome::Eof => break,
        }
    }

    if filled != size {
        return Err(CencError::Format(format!(
            "size mismatch: header says {size}, decrypted {filled}"
        )));
    }

    chan.close()?;
    Ok(out)
}
