use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CencError, CencResult};

/// Default plaintext chunk granularity: 64 KiB
pub const DEFAULT_CHUNK_SIZE: u32 = 64 * 1024;

/// How logical filenames map onto physical container files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionMode {
    /// Physical name equals the logical name (encrypted content, same path)
    #[default]
    Transparent,
    /// Physical file is the logical name plus a ".enc" suffix
    Suffixed,
}

/// Encryption layer configuration (loaded from cenc.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CencConfig {
    /// Plaintext chunk granularity in bytes (default: 65536, recommended 16 KiB - 1 MiB)
    pub chunk_size: u32,
    /// Logical-to-physical name mapping (default: transparent)
    pub extension_mode: ExtensionMode,
    /// Location of the sealed keyset; created on first run
    pub keyset_path: PathBuf,
    /// Opaque master key source handed through to the embedder
    pub master_key_source: Option<String>,
    /// Root directory served to the file-transfer host (not interpreted here)
    pub storage_root: PathBuf,
}

impl Default for CencConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            extension_mode: ExtensionMode::default(),
            keyset_path: PathBuf::from("keyset.sealed"),
            master_key_source: None,
            storage_root: PathBuf::from("."),
        }
    }
}

impl CencConfig {
    /// Reject option values the channels cannot operate with.
    pub fn validate(&self) -> CencResult<()> {
        if self.chunk_size == 0 {
            return Err(CencError::InvalidArgument(
                "chunk_size must be positive".into(),
            ));
        }
        Ok(())
    }
}
