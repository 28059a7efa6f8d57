// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::stream::varsize_size_at;
use crate::{BoundsPolicy, MemBlock, ReadCursor, Result, StreamRead, StreamWrite, WriteCursor, varsize_stream_size};

/// A growable byte string stored in an owning [`MemBlock`].
///
/// The contents are arbitrary bytes; [`to_str()`][Self::to_str] interprets them as UTF-8 when
/// they are valid.
///
/// In a stream, a string is a varsize length marker followed by the raw bytes, without
/// terminator or padding.
///
/// # Example
///
/// ```
/// use memlink::BlockString;
///
/// let mut s = BlockString::from_bytes(b"world")?;
/// s.insert(0, b"hello ")?;
///
/// assert_eq!(s.to_str(), Some("hello world"));
/// # Ok::<(), memlink::Error>(())
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BlockString {
    block: MemBlock<'static>,
}

impl BlockString {
    /// Creates an empty string without allocating.
    #[must_use]
    pub const fn new() -> Self {
        Self { block: MemBlock::new() }
    }

    /// Creates a string holding a copy of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`][crate::Error::Alloc] if the memory cannot be allocated.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            block: MemBlock::from_slice(bytes)?,
        })
    }

    /// The number of bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.block.len()
    }

    /// Whether the string has no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// The bytes of the string.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.block.as_slice()
    }

    /// The string as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// Appends `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`][crate::Error::Alloc] if the string cannot grow.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.block.append(bytes)
    }

    /// Appends UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`][crate::Error::Alloc] if the string cannot grow.
    pub fn push_str(&mut self, text: &str) -> Result<()> {
        self.push_bytes(text.as_bytes())
    }

    /// Inserts `bytes` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`][crate::Error::Alloc] if the string cannot grow.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is greater than the length.
    pub fn insert(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        self.block.insert(offset, bytes.len())?;
        self.block.copy(offset, bytes)
    }

    /// Removes `n` bytes at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range is outside of the string.
    pub fn erase(&mut self, offset: usize, n: usize) {
        self.block
            .erase(offset, n)
            .expect("a string always owns its memory, so erasing never allocates");
    }

    /// Removes all bytes, keeping the capacity.
    pub fn clear(&mut self) {
        self.block.clear();
    }
}

impl AsRef<[u8]> for BlockString {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq<str> for BlockString {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for BlockString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl fmt::Display for BlockString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl StreamWrite for BlockString {
    fn stream_size(&self) -> usize {
        varsize_stream_size(self.len()) + self.len()
    }

    fn write_to<P: BoundsPolicy>(&self, w: &mut WriteCursor<'_, P>) -> Result<()> {
        w.verify_remaining("write", "BlockString", varsize_size_at(w.pos(), self.len()) + self.len())?;
        w.write_varsize(self.len())?;
        w.write(self.as_bytes())
    }
}

impl StreamRead for BlockString {
    fn read_from<P: BoundsPolicy>(&mut self, r: &mut ReadCursor<'_, P>) -> Result<()> {
        r.rewind_on_error(|r| {
            let len = r.read_varsize()?;
            let bytes = r.read_slice(len)?;
            self.block.assign(bytes)
        })
    }
}
