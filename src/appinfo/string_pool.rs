// v29 string table: the key strings referenced by index from entry trees.
//
// The table sits elsewhere in the file (normally at the very end), so it is
// read as a detour: save the cursor, seek, read, restore.

use std::borrow::Cow;

use log::debug;

use super::cursor::Cursor;
use super::decoder::DecodeError;

/// Ordered key strings for one document, indexed from 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringPool<'a> {
    strings: Vec<Cow<'a, str>>,
}

impl<'a> StringPool<'a> {
    /// An empty pool, used for revisions with inline keys.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table at absolute `offset`: a u32 count followed by that many
    /// NUL-terminated strings.
    ///
    /// The cursor is restored to its entry position on success. On error the
    /// whole decode is abandoned, so its position no longer matters.
    pub fn load(cursor: &mut Cursor<'a>, offset: i64) -> Result<Self, DecodeError> {
        let target = usize::try_from(offset)
            .ok()
            .filter(|&off| off <= cursor.buffer_len())
            .ok_or(DecodeError::InvalidStringTableOffset { offset })?;

        let mark = cursor.save();
        cursor.seek(target)?;

        let count = cursor.read_u32()?;
        // Every string takes at least its terminator byte.
        let mut strings = Vec::with_capacity((count as usize).min(cursor.remaining()));
        for _ in 0..count {
            strings.push(cursor.read_cstr()?);
        }

        cursor.restore(mark);
        debug!("string table at {target:#010X}: {count} strings");

        Ok(Self { strings })
    }

    /// Resolve a key index. `offset` is where the index was read, for the
    /// error report.
    pub fn resolve(&self, index: u32, offset: usize) -> Result<&str, DecodeError> {
        self.strings
            .get(index as usize)
            .map(|s| &**s)
            .ok_or(DecodeError::InvalidStringIndex {
                index,
                pool_len: self.strings.len(),
                offset,
            })
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(|s| &**s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
