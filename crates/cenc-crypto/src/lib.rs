//! cenc-crypto: keyset-protected AEAD sealing for container chunks
//!
//! Two-tier key model:
//! ```text
//! Master Key (256-bit, embedder-provisioned; optionally Argon2id from passphrase)
//!   └── Keyset (one 256-bit data key, wrapped by the master key, persisted sealed)
//!         └── Chunk AEAD: AES-256-GCM (nonce=random_96bit, AAD=name:chunk:index)
//! ```
//!
//! The master key only ever wraps the keyset; all chunk traffic is sealed
//! under the keyset's data key.

pub mod aead;
pub mod keyset;
pub mod master;
pub mod vault;

pub use aead::{generate_data_key, open, seal, DataKey};
pub use keyset::{unwrap_keyset, wrap_keyset, Keyset};
pub use master::{derive_master_key, KdfParams, MasterKey};
pub use vault::load_or_create;

/// Size of a key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
