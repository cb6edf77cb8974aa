// Top-level appinfo.vdf decoder.
//
// Reads the header, dispatches on the revision, loads the v29 string table
// through a detour read, then walks the record stream. Any error abandons the
// whole document: once one offset is wrong, nothing after it can be trusted.

use log::debug;

use super::cursor::Cursor;
use super::entry::{EntryTreeDecoder, KeyEncoding};
use super::header::{Header, Version};
use super::record::{AppInfoRecord, AppRecordReader};
use super::string_pool::StringPool;

// ---------------------------------------------------------------------------
// Decoder error
// ---------------------------------------------------------------------------

/// Fatal decode failure. Offsets are absolute byte positions in the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The first four bytes are not a known revision.
    #[error("unknown magic header: {magic:#010X}")]
    UnknownMagic { magic: u32 },

    /// A tag byte inside an entry tree is not 0x00, 0x01, 0x02 or 0x08.
    #[error("unknown entry type {tag:#04X} at offset {offset:#010X}")]
    UnknownEntryType { tag: u8, offset: usize },

    /// A record's declared size does not match what its fields consumed.
    #[error("expected byte offset {expected:#010X}, but got {actual:#010X}")]
    OffsetMismatch { expected: usize, actual: usize },

    /// A read of `len` bytes at `offset` runs past the end of the buffer.
    #[error(
        "read of {len} bytes at offset {offset:#010X} exceeds buffer length {buffer_len:#010X}"
    )]
    OutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },

    /// A v29 key index does not name a string table entry.
    #[error(
        "string index {index} at offset {offset:#010X} out of range for pool of {pool_len}"
    )]
    InvalidStringIndex {
        index: u32,
        pool_len: usize,
        offset: usize,
    },

    /// The header's string table offset is negative or past the end.
    #[error("string table offset {offset:#X} outside the buffer")]
    InvalidStringTableOffset { offset: i64 },

    /// Entry trees nest deeper than [`DecodeOptions::max_depth`].
    #[error("entry tree nested deeper than {limit} levels at offset {offset:#010X}")]
    DepthLimitExceeded { limit: usize, offset: usize },
}

impl DecodeError {
    /// True for every out-of-bounds access: plain reads past the end, string
    /// table lookups past the pool, and a detour seek outside the buffer.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. }
                | Self::InvalidStringIndex { .. }
                | Self::InvalidStringTableOffset { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Default bound on entry tree nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Decoder configuration.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Maximum number of nested levels below a record's root entry tree.
    /// `None` disables the check, leaving recursion bounded only by the input.
    pub max_depth: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A decoded appinfo.vdf file: its header and records in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    pub header: Header,
    /// Number of strings in the v29 string table (0 for inline-key files).
    pub string_pool_len: usize,
    pub apps: Vec<AppInfoRecord>,
}

impl Document {
    pub fn version(&self) -> Version {
        self.header.version
    }

    pub fn apps(&self) -> &[AppInfoRecord] {
        &self.apps
    }

    pub fn into_apps(self) -> Vec<AppInfoRecord> {
        self.apps
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AppInfoRecord> {
        self.apps.iter()
    }

    /// First record with the given appid.
    pub fn find(&self, appid: u32) -> Option<&AppInfoRecord> {
        self.apps.iter().find(|app| app.appid == appid)
    }
}

impl<'d> IntoIterator for &'d Document {
    type Item = &'d AppInfoRecord;
    type IntoIter = std::slice::Iter<'d, AppInfoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.apps.iter()
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decodes whole appinfo.vdf buffers.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    opts: DecodeOptions,
}

impl Decoder {
    pub fn new(opts: DecodeOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.opts
    }

    pub fn decode(&self, data: &[u8]) -> Result<Document, DecodeError> {
        let mut cursor = Cursor::new(data);
        let header = Header::decode(&mut cursor)?;

        let pool = match header.string_table_offset {
            Some(offset) => StringPool::load(&mut cursor, offset)?,
            None => StringPool::empty(),
        };

        let keys = if header.version.has_string_pool() {
            KeyEncoding::Pooled(&pool)
        } else {
            KeyEncoding::Inline
        };
        let entries = EntryTreeDecoder::new(keys, self.opts.max_depth);
        let apps = AppRecordReader::new(header.version, entries).read_all(&mut cursor)?;

        debug!(
            "decoded {} apps ({}, {} bytes, stream ends at {:#010X})",
            apps.len(),
            header.version,
            data.len(),
            cursor.position()
        );

        Ok(Document {
            header,
            string_pool_len: pool.len(),
            apps,
        })
    }
}

/// Decode a complete appinfo.vdf buffer with default options.
pub fn decode(data: &[u8]) -> Result<Document, DecodeError> {
    Decoder::default().decode(data)
}

/// Decode a complete appinfo.vdf buffer with explicit options.
pub fn decode_with(data: &[u8], opts: &DecodeOptions) -> Result<Document, DecodeError> {
    Decoder::new(opts.clone()).decode(data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appinfo::entry::{EntryValue, TAG_END, TAG_NESTED, TAG_STRING};
    use crate::appinfo::header::{HASH_LEN, MAGIC_V27, MAGIC_V28, MAGIC_V29};

    /// Fixed record fields for v28+ (everything after `size`, before entries).
    fn fixed_fields(change_number: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&1u32.to_le_bytes()); // info_state
        out.extend_from_slice(&0u32.to_le_bytes()); // last_updated
        out.extend_from_slice(&0u64.to_le_bytes()); // token
        out.extend_from_slice(&[0u8; HASH_LEN]);
        out.extend_from_slice(&change_number.to_le_bytes());
        out.extend_from_slice(&[0u8; HASH_LEN]);
        out
    }

    /// The worked example: one v29 record `{ "Name": "Foo" }`.
    fn single_v29_record() -> Vec<u8> {
        let mut body = fixed_fields(1);
        body.push(TAG_STRING);
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(b"Foo\0");
        body.push(TAG_END);

        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC_V29.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        let offset_at = data.len();
        data.extend_from_slice(&0i64.to_le_bytes());
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend(body);
        data.extend_from_slice(&0u32.to_le_bytes());

        let table_offset = data.len() as i64;
        data[offset_at..offset_at + 8].copy_from_slice(&table_offset.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(b"Name\0");
        data
    }

    #[test]
    fn decodes_single_v29_record() {
        let doc = decode(&single_v29_record()).unwrap();
        assert_eq!(doc.version(), Version::V29);
        assert_eq!(doc.header.universe, 1);
        assert_eq!(doc.string_pool_len, 1);
        assert_eq!(doc.len(), 1);

        let app = doc.find(100).unwrap();
        assert_eq!(app.info_state, 1);
        assert_eq!(app.change_number, 1);
        assert_eq!(app.entries.len(), 1);
        assert_eq!(app.entries.get("Name"), Some(&EntryValue::Text("Foo".into())));
    }

    #[test]
    fn empty_v27_document() {
        let mut data = MAGIC_V27.to_le_bytes().to_vec();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        let doc = decode(&data).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.header.string_table_offset, None);
        assert_eq!(doc.string_pool_len, 0);
    }

    #[test]
    fn unknown_magic() {
        let err = decode(&[0x26, 0x44, 0x56, 0x07, 1, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownMagic { magic: 0x0756_4426 });
    }

    #[test]
    fn empty_input_is_out_of_bounds() {
        assert!(matches!(
            decode(&[]).unwrap_err(),
            DecodeError::OutOfBounds { offset: 0, .. }
        ));
    }

    #[test]
    fn string_table_offset_past_end() {
        let mut data = single_v29_record();
        let bogus = (data.len() as i64 + 1).to_le_bytes();
        data[8..16].copy_from_slice(&bogus);
        assert!(matches!(
            decode(&data).unwrap_err(),
            DecodeError::InvalidStringTableOffset { .. }
        ));
    }

    #[test]
    fn depth_limit_from_options() {
        let mut body = fixed_fields(1);
        body.push(TAG_NESTED);
        body.extend_from_slice(&0u32.to_le_bytes());
        body.push(TAG_NESTED);
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&[TAG_END, TAG_END, TAG_END]);

        let mut data = MAGIC_V29.to_le_bytes().to_vec();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&0i64.to_le_bytes());
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend(body);
        data.extend_from_slice(&0u32.to_le_bytes());
        let table_offset = data.len() as i64;
        data[8..16].copy_from_slice(&table_offset.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(b"k\0");

        assert!(decode(&data).is_ok());
        let shallow = DecodeOptions { max_depth: Some(1) };
        assert!(matches!(
            decode_with(&data, &shallow).unwrap_err(),
            DecodeError::DepthLimitExceeded { limit: 1, .. }
        ));
        let unbounded = DecodeOptions { max_depth: None };
        let doc = decode_with(&data, &unbounded).unwrap();
        assert!(doc.apps[0].entries.get_path(&["k", "k"]).is_some());
    }

    #[test]
    fn pool_index_past_end_is_out_of_bounds() {
        let mut data = single_v29_record();
        // Key index of the only entry, just after the tag byte.
        let key_at = 4 + 4 + 8 + 4 + 4 + 4 + 4 + 8 + HASH_LEN + 4 + HASH_LEN + 1;
        data[key_at..key_at + 4].copy_from_slice(&5u32.to_le_bytes());

        let err = decode(&data).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidStringIndex {
                index: 5,
                pool_len: 1,
                offset: key_at
            }
        );
        assert!(err.is_out_of_bounds());
    }

    #[test]
    fn out_of_bounds_classification() {
        let table = DecodeError::InvalidStringTableOffset { offset: -8 };
        assert!(table.is_out_of_bounds());
        let read = DecodeError::OutOfBounds {
            offset: 4,
            len: 4,
            buffer_len: 6,
        };
        assert!(read.is_out_of_bounds());
        assert!(!DecodeError::UnknownMagic { magic: 0 }.is_out_of_bounds());
        assert!(
            !DecodeError::OffsetMismatch {
                expected: 1,
                actual: 2
            }
            .is_out_of_bounds()
        );
    }

    #[test]
    fn latin1_text_survives_whole_document() {
        let mut body = fixed_fields(3);
        body.push(TAG_STRING);
        body.extend_from_slice(b"name\0Caf\xE9\0");
        body.push(TAG_END);

        let mut data = MAGIC_V28.to_le_bytes().to_vec();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&570u32.to_le_bytes());
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend(body);
        data.extend_from_slice(&0u32.to_le_bytes());

        let doc = decode(&data).unwrap();
        let app = doc.find(570).unwrap();
        assert_eq!(app.entries.get("name").and_then(EntryValue::as_str), Some("Caf\u{FFFD}"));
    }

    #[test]
    fn error_messages_use_hex_offsets() {
        let err = DecodeError::OffsetMismatch {
            expected: 0x40,
            actual: 0x3C,
        };
        assert_eq!(
            err.to_string(),
            "expected byte offset 0x00000040, but got 0x0000003C"
        );
        let err = DecodeError::UnknownEntryType {
            tag: 0xFF,
            offset: 0x1A,
        };
        assert_eq!(err.to_string(), "unknown entry type 0xFF at offset 0x0000001A");
    }
}
