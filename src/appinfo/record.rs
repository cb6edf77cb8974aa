// Per-application records and the size-checked reader that walks them.
//
// Record layout (all little-endian):
//
//   appid u32            0 terminates the record stream
//   size u32             bytes from here to the end of the entry tree
//   info_state u32
//   last_updated u32     seconds since the Unix epoch
//   token u64
//   hash [20]
//   change_number u32
//   binary_data_hash [20]   v28 and later
//   entry tree

use std::time::{Duration, SystemTime};

use log::trace;

use super::cursor::Cursor;
use super::decoder::DecodeError;
use super::entry::{EntryTree, EntryTreeDecoder, EntryValue};
use super::header::{HASH_LEN, Version};

/// One application's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub struct AppInfoRecord {
    pub appid: u32,
    pub info_state: u32,
    pub last_updated: u32,
    pub token: u64,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_digest"))]
    pub hash: [u8; HASH_LEN],
    pub change_number: u32,
    #[cfg_attr(
        feature = "serde",
        serde(
            serialize_with = "serialize_opt_digest",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub binary_data_hash: Option<[u8; HASH_LEN]>,
    pub entries: EntryTree,
}

impl AppInfoRecord {
    /// `common/name`, when the record carries one.
    pub fn name(&self) -> Option<&str> {
        self.entries
            .get_path(&["common", "name"])
            .and_then(EntryValue::as_str)
    }

    pub fn last_updated_time(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(u64::from(self.last_updated))
    }
}

#[cfg(feature = "serde")]
fn serialize_digest<S: serde::Serializer>(
    digest: &[u8; HASH_LEN],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(digest))
}

#[cfg(feature = "serde")]
fn serialize_opt_digest<S: serde::Serializer>(
    digest: &Option<[u8; HASH_LEN]>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match digest {
        Some(d) => serialize_digest(d, serializer),
        None => serializer.serialize_none(),
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Reads the record stream that follows the header.
#[derive(Debug, Clone, Copy)]
pub struct AppRecordReader<'p, 'a> {
    version: Version,
    entries: EntryTreeDecoder<'p, 'a>,
}

impl<'p, 'a> AppRecordReader<'p, 'a> {
    pub fn new(version: Version, entries: EntryTreeDecoder<'p, 'a>) -> Self {
        Self { version, entries }
    }

    /// Read one record. Returns `None` on the zero appid terminator, leaving
    /// the cursor just past it; nothing after the terminator is touched.
    pub fn read_next(&self, cursor: &mut Cursor<'a>) -> Result<Option<AppInfoRecord>, DecodeError> {
        let appid = cursor.read_u32()?;
        if appid == 0 {
            return Ok(None);
        }

        let size = cursor.read_u32()?;
        let expected_end = cursor.position().saturating_add(size as usize);

        let info_state = cursor.read_u32()?;
        let last_updated = cursor.read_u32()?;
        let token = cursor.read_u64()?;
        let hash = cursor.read_array()?;
        let change_number = cursor.read_u32()?;
        let binary_data_hash = if self.version.has_binary_data_hash() {
            Some(cursor.read_array()?)
        } else {
            None
        };

        let entries = self.entries.decode(cursor)?;

        let actual = cursor.position();
        if actual != expected_end {
            return Err(DecodeError::OffsetMismatch {
                expected: expected_end,
                actual,
            });
        }

        trace!("app {appid}: {size} bytes, change {change_number}, {} keys", entries.len());

        Ok(Some(AppInfoRecord {
            appid,
            info_state,
            last_updated,
            token,
            hash,
            change_number,
            binary_data_hash,
            entries,
        }))
    }

    /// Read records up to and including the terminator, in on-disk order.
    pub fn read_all(&self, cursor: &mut Cursor<'a>) -> Result<Vec<AppInfoRecord>, DecodeError> {
        let mut apps = Vec::new();
        while let Some(app) = self.read_next(cursor)? {
            apps.push(app);
        }
        Ok(apps)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
