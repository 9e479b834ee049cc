//! Byte sources and text decoding

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::VastrowError;

/// Default read size for index scans and window loads
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Where the bytes live. Cheap to clone; handed to the execution channel on init.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SourceHandle {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

impl SourceHandle {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SourceHandle::Memory(Arc::from(bytes.into()))
    }

    /// Total size in bytes
    pub fn len(&self) -> io::Result<u64> {
        match self {
            SourceHandle::File(path) => Ok(std::fs::metadata(path)?.len()),
            SourceHandle::Memory(bytes) => Ok(bytes.len() as u64),
        }
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Reader over `[start, end)`
    pub fn open_range(&self, start: u64, end: u64) -> io::Result<Box<dyn Read + Send>> {
        if end < start {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                VastrowError::InvalidRange { start, end },
            ));
        }
        match self {
            SourceHandle::File(path) => {
                let mut file = File::open(path)?;
                file.seek(SeekFrom::Start(start))?;
                Ok(Box::new(file.take(end - start)))
            }
            SourceHandle::Memory(bytes) => {
                let mut cursor = Cursor::new(Arc::clone(bytes));
                cursor.set_position(start);
                Ok(Box::new(cursor.take(end - start)))
            }
        }
    }

    /// Reader over the whole source
    pub fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        match self {
            SourceHandle::File(path) => Ok(Box::new(File::open(path)?)),
            SourceHandle::Memory(bytes) => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
        }
    }

    /// Short name for logs and status messages
    pub fn display_name(&self) -> String {
        match self {
            SourceHandle::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            SourceHandle::Memory(bytes) => format!("<memory: {} bytes>", bytes.len()),
        }
    }
}

/// Text encodings understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    /// Malformed sequences become U+FFFD
    #[default]
    Utf8,
    /// ISO-8859-1: every byte is one code point
    Latin1,
}

impl Encoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }

    /// Decode a header line: drops a UTF-8 byte order mark and a trailing `\r`
    pub fn decode_header(self, bytes: &[u8]) -> String {
        let bytes = match self {
            Encoding::Utf8 => bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes),
            Encoding::Latin1 => bytes,
        };
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        self.decode(bytes)
    }
}

impl FromStr for Encoding {
    type Err = VastrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            other => Err(VastrowError::Decode(format!("unsupported encoding '{}'", other))),
        }
    }
}
