//! Filesystem accessor: maps logical names to physical container files and
//! opens the channel matching the host's requested mode.
//!
//! The host's read-write open resolves to a read channel when the physical
//! file exists and to a write channel otherwise, mirroring the open
//! semantics file-transfer protocols expect for download-or-upload handles.
//! The two channel types stay distinct; [`Channel`] carries whichever was
//! opened and implements only the surface both support, so hosts branch on
//! the variant instead of hitting runtime-refused operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use cenc_core::{CencConfig, CencError, CencResult, ExtensionMode};
use cenc_crypto::Keyset;

use crate::reader::ChunkedReadChannel;
use crate::writer::ChunkedWriteChannel;

const ENC_SUFFIX: &str = ".enc";

/// Open mode requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    /// Resolves to `Read` if the physical file exists, else `Write`
    ReadWrite,
}

/// An opened sealed byte channel, read or write.
pub enum Channel {
    Read(ChunkedReadChannel),
    Write(ChunkedWriteChannel),
}

impl Channel {
    pub fn position(&self) -> u64 {
        match self {
            Channel::Read(c) => c.position(),
            Channel::Write(c) => c.position(),
        }
    }

    pub fn set_position(&mut self, pos: u64) -> CencResult<()> {
        match self {
            Channel::Read(c) => c.set_position(pos),
            Channel::Write(c) => c.set_position(pos),
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Channel::Read(c) => c.size(),
            Channel::Write(c) => c.size(),
        }
    }

    pub fn close(&mut self) -> CencResult<()> {
        match self {
            Channel::Read(c) => c.close(),
            Channel::Write(c) => c.close(),
        }
    }

    pub fn is_open(&self) -> bool {
        match self {
            Channel::Read(c) => c.is_open(),
            Channel::Write(c) => c.is_open(),
        }
    }

    pub fn as_reader(&mut self) -> Option<&mut ChunkedReadChannel> {
        match self {
            Channel::Read(c) => Some(c),
            Channel::Write(_) => None,
        }
    }

    pub fn as_writer(&mut self) -> Option<&mut ChunkedWriteChannel> {
        match self {
            Channel::Read(_) => None,
            Channel::Write(c) => Some(c),
        }
    }
}

/// Opens sealed channels for the file-transfer host.
///
/// Holds the shared keyset handle, the chunk granularity for new containers
/// and the logical-to-physical name mapping mode.
pub struct Accessor {
    keyset: Arc<Keyset>,
    chunk_size: u32,
    extension_mode: ExtensionMode,
}

impl Accessor {
    pub fn new(
        keyset: Arc<Keyset>,
        chunk_size: u32,
        extension_mode: ExtensionMode,
    ) -> CencResult<Self> {
        if chunk_size == 0 {
            return Err(CencError::InvalidArgument(
                "chunk_size must be positive".into(),
            ));
        }
        debug!(chunk_size, ?extension_mode, "accessor initialized");
        Ok(Self {
            keyset,
            chunk_size,
            extension_mode,
        })
    }

    /// Build an accessor from the recognized configuration options.
    pub fn from_config(keyset: Arc<Keyset>, config: &CencConfig) -> CencResult<Self> {
        config.validate()?;
        Self::new(keyset, config.chunk_size, config.extension_mode)
    }

    /// Open a channel for `path` in the requested mode. The logical name
    /// bound into chunk AAD is derived from the file name, with the `.enc`
    /// suffix stripped in suffixed mode.
    pub fn open(&self, path: &Path, mode: OpenMode) -> CencResult<Channel> {
        let (logical, physical) = self.resolve(path)?;

        let mode = match mode {
            OpenMode::ReadWrite => {
                if physical.exists() {
                    OpenMode::Read
                } else {
                    OpenMode::Write
                }
            }
            other => other,
        };

        debug!(
            logical = %logical,
            physical = %physical.display(),
            ?mode,
            "opening sealed channel"
        );

        match mode {
            OpenMode::Read => Ok(Channel::Read(ChunkedReadChannel::open(
                &physical,
                &logical,
                self.keyset.clone(),
            )?)),
            OpenMode::Write => Ok(Channel::Write(ChunkedWriteChannel::create(
                &physical,
                &logical,
                self.keyset.clone(),
                self.chunk_size,
            )?)),
            OpenMode::ReadWrite => unreachable!("resolved above"),
        }
    }

    /// Logical name and physical path for `path` under the current mapping.
    fn resolve(&self, path: &Path) -> CencResult<(String, PathBuf)> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CencError::InvalidArgument(format!("no filename in {path:?}")))?;

        match self.extension_mode {
            ExtensionMode::Transparent => Ok((filename.to_string(), path.to_path_buf())),
            ExtensionMode::Suffixed => match filename.strip_suffix(ENC_SUFFIX) {
                Some(stripped) => Ok((stripped.to_string(), path.to_path_buf())),
                None => Ok((
                    filename.to_string(),
                    path.with_file_name(format!("{filename}{ENC_SUFFIX}")),
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accessor(mode: ExtensionMode) -> Accessor {
        Accessor::new(Arc::new(Keyset::generate()), 64, mode).unwrap()
    }

    #[test]
    fn test_transparent_mapping() {
        let acc = accessor(ExtensionMode::Transparent);
        let (logical, physical) = acc.resolve(Path::new("/data/report.pdf")).unwrap();
        assert_eq!(logical, "report.pdf");
        assert_eq!(physical, PathBuf::from("/data/report.pdf"));
    }

    #[test]
    fn test_suffixed_mapping_appends() {
        let acc = accessor(ExtensionMode::Suffixed);
        let (logical, physical) = acc.resolve(Path::new("/data/report.pdf")).unwrap();
        assert_eq!(logical, "report.pdf");
        assert_eq!(physical, PathBuf::from("/data/report.pdf.enc"));
    }

    #[test]
    fn test_suffixed_mapping_strips_existing() {
        let acc = accessor(ExtensionMode::Suffixed);
        let (logical, physical) = acc.resolve(Path::new("/data/report.pdf.enc")).unwrap();
        assert_eq!(logical, "report.pdf");
        assert_eq!(physical, PathBuf::from("/data/report.pdf.enc"));
    }

    #[test]
    fn test_from_config() {
        let config = CencConfig {
            chunk_size: 128,
            extension_mode: ExtensionMode::Suffixed,
            ..CencConfig::default()
        };
        let acc = Accessor::from_config(Arc::new(Keyset::generate()), &config).unwrap();
        let (_, physical) = acc.resolve(Path::new("x.txt")).unwrap();
        assert_eq!(physical, PathBuf::from("x.txt.enc"));

        let bad = CencConfig {
            chunk_size: 0,
            ..CencConfig::default()
        };
        assert!(Accessor::from_config(Arc::new(Keyset::generate()), &bad).is_err());
    }

    #[test]
    fn test_zero_chunk_size_refused() {
        let result = Accessor::new(
            Arc::new(Keyset::generate()),
            0,
            ExtensionMode::Transparent,
        );
        assert!(matches!(result, Err(CencError::InvalidArgument(_))));
    }
}
