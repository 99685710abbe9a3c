//! Keyset: the long-lived data-encryption key and its sealed serialization
//!
//! Cleartext form is a small versioned JSON record
//! (`{"version":1,"key":"<base64>"}`). It only ever touches disk sealed
//! under the master key with empty AAD; [`wrap_keyset`] / [`unwrap_keyset`]
//! perform that translation. A version other than 1 is rejected as a format
//! error, never as a generic crypto failure.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use cenc_core::{CencError, CencResult};

use crate::aead::{self, DataKey};
use crate::master::MasterKey;
use crate::KEY_SIZE;

/// Keyset serialization version
pub const KEYSET_VERSION: u16 = 1;

/// The data-encryption key handle shared by every channel.
///
/// Immutable after construction; `seal`/`open` are safe to call from
/// multiple threads concurrently.
pub struct Keyset {
    key: DataKey,
}

impl std::fmt::Debug for Keyset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyset").field("key", &self.key).finish()
    }
}

#[derive(Serialize, Deserialize)]
struct KeysetRecord {
    version: u16,
    /// The 256-bit data key (base64)
    key: String,
}

impl Keyset {
    /// Generate a keyset with a fresh random data key.
    pub fn generate() -> Self {
        Self {
            key: aead::generate_data_key(),
        }
    }

    pub fn from_data_key(key: DataKey) -> Self {
        Self { key }
    }

    /// Seal `plaintext` under the data key, binding `aad`.
    pub fn seal(&self, plaintext: &[u8], aad: &[u8]) -> CencResult<Vec<u8>> {
        aead::seal(&self.key, plaintext, aad)
    }

    /// Open a sealed payload under the data key, verifying the tag and `aad`.
    pub fn open(&self, sealed: &[u8], aad: &[u8]) -> CencResult<Vec<u8>> {
        aead::open(&self.key, sealed, aad)
    }

    /// Serialize to the cleartext JSON record. Callers must zeroize the
    /// result once it has been sealed.
    fn to_bytes(&self) -> CencResult<Vec<u8>> {
        let mut record = KeysetRecord {
            version: KEYSET_VERSION,
            key: base64_encode(self.key.as_bytes()),
        };
        let bytes = serde_json::to_vec(&record)
            .map_err(|e| CencError::Format(format!("keyset serialization: {e}")))?;
        record.key.zeroize();
        Ok(bytes)
    }

    /// Parse the cleartext JSON record, enforcing the serialization version.
    fn from_bytes(data: &[u8]) -> CencResult<Self> {
        let mut record: KeysetRecord = serde_json::from_slice(data)
            .map_err(|e| CencError::Format(format!("keyset deserialization: {e}")))?;

        if record.version != KEYSET_VERSION {
            record.key.zeroize();
            return Err(CencError::Format(format!(
                "unsupported keyset version: {}",
                record.version
            )));
        }

        let mut decoded = base64_decode(&record.key)?;
        record.key.zeroize();

        if decoded.len() != KEY_SIZE {
            decoded.zeroize();
            return Err(CencError::Format(format!(
                "keyset key has wrong size: {} bytes (expected {KEY_SIZE})",
                decoded.len()
            )));
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(&decoded);
        decoded.zeroize();

        Ok(Self {
            key: DataKey::from_bytes(key_bytes),
        })
    }
}

/// Wrap (seal) a keyset under the master key with empty AAD.
pub fn wrap_keyset(master: &MasterKey, keyset: &Keyset) -> CencResult<Vec<u8>> {
    let master_key = DataKey::from_bytes(*master.as_bytes());
    let mut cleartext = keyset.to_bytes()?;
    let sealed = aead::seal(&master_key, &cleartext, &[]);
    cleartext.zeroize();
    sealed
}

/// Unwrap (open and parse) a sealed keyset blob.
///
/// An authentication failure means a wrong master key or a tampered blob and
/// surfaces as a master key error; a malformed or version-drifted cleartext
/// record surfaces as a format error.
pub fn unwrap_keyset(master: &MasterKey, blob: &[u8]) -> CencResult<Keyset> {
    let master_key = DataKey::from_bytes(*master.as_bytes());
    let mut cleartext = aead::open(&master_key, blob, &[]).map_err(|_| {
        CencError::MasterKey("keyset unwrap failed: wrong master key or corrupted keyset".into())
    })?;

    let keyset = Keyset::from_bytes(&cleartext);
    cleartext.zeroize();
    keyset
}

fn base64_encode(data: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.encode(data)
}

fn base64_decode(s: &str) -> CencResult<Vec<u8>> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD
        .decode(s)
        .map_err(|e| CencError::Format(format!("keyset base64 decode: {e}")))
}
