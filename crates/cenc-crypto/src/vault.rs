//! Keyset vault: load-or-create the sealed keyset file
//!
//! First run generates a fresh keyset, seals it under the master key and
//! writes it atomically (temp sibling, then rename) so a crash never leaves
//! a partial keyset on disk. Every later start reads and unwraps the same
//! blob. Rotation is not supported: an existing keyset file is never
//! rewritten.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use cenc_core::CencResult;

use crate::keyset::{unwrap_keyset, wrap_keyset, Keyset};
use crate::master::MasterKey;

/// Load the sealed keyset at `path`, creating it on first run.
///
/// Failures are startup-fatal for the embedder: a master key error means the
/// blob exists but does not unwrap (wrong master key or tampering), a format
/// error means the unwrapped record is malformed or version-drifted, and
/// storage errors are surfaced I/O failures.
pub fn load_or_create(path: &Path, master: &MasterKey) -> CencResult<Arc<Keyset>> {
    if path.exists() {
        let blob = std::fs::read(path)?;
        let keyset = unwrap_keyset(master, &blob)?;
        debug!(path = %path.display(), "keyset loaded");
        return Ok(Arc::new(keyset));
    }

    let keyset = Keyset::generate();
    let blob = wrap_keyset(master, &keyset)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Atomic write: temp sibling, then rename
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, &blob)?;
    std::fs::rename(&tmp_path, path)?;

    info!(path = %path.display(), "new keyset created");
    Ok(Arc::new(keyset))
}
