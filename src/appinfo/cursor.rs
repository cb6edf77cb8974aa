// Position-tracking reader over a fully materialized appinfo buffer.
//
// All integers are little-endian. Every read is bounds-checked against the
// whole buffer and reports the absolute offset at which it failed, so the
// cursor position doubles as the "current file offset" used for record size
// verification and diagnostics.

use std::borrow::Cow;

use super::decoder::DecodeError;

/// Saved cursor position, produced by [`Cursor::save`].
///
/// Restoring it puts the cursor back exactly where it was, which is how the
/// string table detour read leaves the main record stream undisturbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pos: usize,
}

impl Mark {
    /// The absolute offset captured by this mark.
    pub fn offset(&self) -> usize {
        self.pos
    }
}

/// Sequential little-endian reader over a byte slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current absolute offset into the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Total length of the underlying buffer, independent of the position.
    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    pub fn save(&self) -> Mark {
        Mark { pos: self.pos }
    }

    pub fn restore(&mut self, mark: Mark) {
        self.pos = mark.pos;
    }

    /// Move to an absolute offset. Seeking to exactly the end is allowed
    /// (any subsequent read fails); seeking past it is not.
    pub fn seek(&mut self, offset: usize) -> Result<(), DecodeError> {
        if offset > self.buf.len() {
            return Err(DecodeError::OutOfBounds {
                offset,
                len: 0,
                buffer_len: self.buf.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::OutOfBounds {
                offset: self.pos,
                len,
                buffer_len: self.buf.len(),
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Read exactly `N` bytes into an owned array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.read_array().map(u64::from_le_bytes)
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.read_array().map(i64::from_le_bytes)
    }

    /// Read a NUL-terminated string. The terminator is consumed but not part
    /// of the result.
    ///
    /// Bytes that are not valid UTF-8 become U+FFFD; the result only
    /// allocates in that case.
    pub fn read_cstr(&mut self) -> Result<Cow<'a, str>, DecodeError> {
        let start = self.pos;
        let rest: &'a [u8] = &self.buf[start..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::OutOfBounds {
                offset: self.buf.len(),
                len: 1,
                buffer_len: self.buf.len(),
            })?;
        let text = String::from_utf8_lossy(&rest[..nul]);
        self.pos = start + nul + 1;
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
