//! cenc-container: chunked authenticated file container
//!
//! Application data is written in the clear through a byte-channel surface
//! and stored as an authenticated, chunk-addressable ciphertext container:
//!
//! ```text
//! [32-byte header][len][sealed chunk 0][len][sealed chunk 1]...
//! ```
//!
//! Write path: plaintext is buffered up to one chunk, sealed under the
//! keyset with an AAD of `name:chunk:index`, and appended with a length
//! prefix; closing back-patches the total plaintext size into the header.
//! Read path: the header is parsed once, then reads decrypt at most one
//! chunk at a time with random access by walking the length prefixes.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cenc_crypto::Keyset;
//! use cenc_container::{ChunkedReadChannel, ChunkedWriteChannel, ReadOutcome};
//!
//! let keyset = Arc::new(Keyset::generate());
//!
//! let mut writer = ChunkedWriteChannel::create(
//!     "hello.txt".as_ref(), "hello.txt", keyset.clone(), 65536,
//! ).unwrap();
//! writer.write(b"hello world").unwrap();
//! writer.close().unwrap();
//!
//! let mut reader = ChunkedReadChannel::open(
//!     "hello.txt".as_ref(), "hello.txt", keyset,
//! ).unwrap();
//! let mut buf = [0u8; 16];
//! match reader.read(&mut buf).unwrap() {
//!     ReadOutcome::Data(n) => assert_eq!(&buf[..n], b"hello world"),
//!     ReadOutcome::Eof => unreachable!(),
//! }
//! ```

pub mod accessor;
pub mod format;
pub mod oneshot;
pub mod reader;
pub mod writer;

pub use accessor::{Accessor, Channel, OpenMode};
pub use format::{inspect, FileHeader, HEADER_SIZE, MAX_AEAD_OVERHEAD};
pub use oneshot::{read_container, write_container};
pub use reader::{ChunkedReadChannel, ReadOutcome};
pub use writer::ChunkedWriteChannel;
