pub mod config;
pub mod error;

pub use config::{CencConfig, ExtensionMode, DEFAULT_CHUNK_SIZE};
pub use error::{CencError, CencResult};
