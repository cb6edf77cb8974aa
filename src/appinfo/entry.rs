// Tagged key-value trees carried by each app record.
//
// Wire shape of one level:
//
//   { tag(u8) key value }*  0x08
//
// The key is an inline NUL-terminated string (v27/v28) or a u32 index into the
// string table (v29). The value depends on the tag: 0x00 nested level,
// 0x01 NUL-terminated string, 0x02 little-endian u32.

use std::borrow::Cow;

use super::cursor::Cursor;
use super::decoder::DecodeError;
use super::string_pool::StringPool;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

pub const TAG_NESTED: u8 = 0x00;
pub const TAG_STRING: u8 = 0x01;
pub const TAG_INT32: u8 = 0x02;
/// Terminates one tree level.
pub const TAG_END: u8 = 0x08;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A decoded entry value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum EntryValue {
    Nested(EntryTree),
    Text(String),
    Number(u32),
}

impl EntryValue {
    pub fn as_tree(&self) -> Option<&EntryTree> {
        match self {
            Self::Nested(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// One level of an entry tree.
///
/// Keys are unique; inserting an existing key replaces its value in place, so
/// iteration follows first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryTree {
    entries: Vec<(String, EntryValue)>,
}

impl EntryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: EntryValue) -> Option<EntryValue> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&EntryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Walk nested levels, e.g. `["common", "name"]`.
    pub fn get_path(&self, path: &[&str]) -> Option<&EntryValue> {
        let (last, parents) = path.split_last()?;
        let mut level = self;
        for key in parents {
            level = level.get(key)?.as_tree()?;
        }
        level.get(last)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, EntryValue)> for EntryTree {
    fn from_iter<I: IntoIterator<Item = (K, EntryValue)>>(iter: I) -> Self {
        let mut tree = Self::new();
        for (k, v) in iter {
            tree.insert(k, v);
        }
        tree
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EntryTree {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// How keys are stored, fixed per document by its revision.
#[derive(Debug, Clone, Copy)]
pub enum KeyEncoding<'p, 'a> {
    /// NUL-terminated string before the value (v27/v28).
    Inline,
    /// u32 index into the string table (v29).
    Pooled(&'p StringPool<'a>),
}

/// Recursive decoder for one entry tree.
#[derive(Debug, Clone, Copy)]
pub struct EntryTreeDecoder<'p, 'a> {
    keys: KeyEncoding<'p, 'a>,
    max_depth: Option<usize>,
}

impl<'p, 'a> EntryTreeDecoder<'p, 'a> {
    /// `max_depth` bounds how many nested levels may sit below the root;
    /// `None` leaves recursion bounded only by the input.
    pub fn new(keys: KeyEncoding<'p, 'a>, max_depth: Option<usize>) -> Self {
        Self { keys, max_depth }
    }

    /// Decode levels until the root's terminator, leaving the cursor just
    /// past it.
    pub fn decode(&self, cursor: &mut Cursor<'a>) -> Result<EntryTree, DecodeError> {
        self.decode_level(cursor, 0)
    }

    fn decode_level(
        &self,
        cursor: &mut Cursor<'a>,
        depth: usize,
    ) -> Result<EntryTree, DecodeError> {
        let mut tree = EntryTree::new();
        loop {
            let tag_offset = cursor.position();
            let tag = cursor.read_u8()?;
            if tag == TAG_END {
                return Ok(tree);
            }

            let key = self.read_key(cursor)?;
            let value = match tag {
                TAG_NESTED => {
                    if let Some(limit) = self.max_depth
                        && depth >= limit
                    {
                        return Err(DecodeError::DepthLimitExceeded {
                            limit,
                            offset: tag_offset,
                        });
                    }
                    EntryValue::Nested(self.decode_level(cursor, depth + 1)?)
                }
                TAG_STRING => EntryValue::Text(cursor.read_cstr()?.into_owned()),
                TAG_INT32 => EntryValue::Number(cursor.read_u32()?),
                _ => {
                    return Err(DecodeError::UnknownEntryType {
                        tag,
                        offset: tag_offset,
                    });
                }
            };
            tree.insert(key, value);
        }
    }

    fn read_key(&self, cursor: &mut Cursor<'a>) -> Result<Cow<'p, str>, DecodeError> {
        match self.keys {
            KeyEncoding::Inline => cursor.read_cstr(),
            KeyEncoding::Pooled(pool) => {
                let offset = cursor.position();
                let index = cursor.read_u32()?;
                pool.resolve(index, offset).map(Cow::Borrowed)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
