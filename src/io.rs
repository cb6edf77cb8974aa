// File-level I/O helpers for appinfo decoding.
//
// The decoder needs random access (the v29 string table lives at the end of
// the file), so input is always materialized into one contiguous buffer
// before decoding starts. Reading is the only step that can block or fail
// for reasons outside the format itself.

use std::io::{self, BufReader, Read};
use std::path::Path;

use log::debug;

use crate::appinfo::{DecodeError, DecodeOptions, Decoder, Document, Version};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `decode_file()` and `decode_reader()`.
#[derive(Debug, Clone)]
pub struct DecodeStats {
    /// Input size in bytes.
    pub input_size: u64,
    /// Number of app records decoded.
    pub apps: u64,
    /// Revision named by the magic.
    pub version: Version,
}

impl DecodeStats {
    fn new(input_size: usize, doc: &Document) -> Self {
        Self {
            input_size: input_size as u64,
            apps: doc.len() as u64,
            version: doc.version(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// I/O error while reading the input (open, read, stream failure).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The input was read but is not a valid appinfo document.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

// ---------------------------------------------------------------------------
// Default buffer size
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Materialization
// ---------------------------------------------------------------------------

/// Read a stream to its end into a single buffer.
pub fn read_all<R: Read>(reader: R) -> Result<Vec<u8>, IoError> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, reader);
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(data)
}

/// Read a whole file into memory.
pub fn read_file(path: &Path) -> Result<Vec<u8>, IoError> {
    let data = std::fs::read(path)?;
    debug!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Read and decode an appinfo.vdf file.
pub fn decode_file(path: &Path, opts: &DecodeOptions) -> Result<(Document, DecodeStats), IoError> {
    let data = read_file(path)?;
    let doc = Decoder::new(opts.clone()).decode(&data)?;
    let stats = DecodeStats::new(data.len(), &doc);
    Ok((doc, stats))
}

/// Drain `reader` (a pipe, stdin, an open file) and decode the result.
pub fn decode_reader<R: Read>(
    reader: R,
    opts: &DecodeOptions,
) -> Result<(Document, DecodeStats), IoError> {
    let data = read_all(reader)?;
    debug!("read {} bytes from stream", data.len());
    let doc = Decoder::new(opts.clone()).decode(&data)?;
    let stats = DecodeStats::new(data.len(), &doc);
    Ok((doc, stats))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
