// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::type_name;
use std::marker::PhantomData;

use num_traits::FromBytes;

use crate::constants::{VARSIZE_U8_SENTINEL, VARSIZE_U16_SENTINEL};
use crate::{BoundsPolicy, CursorReader, DEFAULT_ALIGNMENT, DefaultPolicy, MemView, Result, align};

/// A position within a read-only view from which binary data is consumed front to back.
///
/// The cursor never owns the bytes it reads; every slice it hands out borrows from the
/// underlying memory with the lifetime `'a` of the view, not of the cursor.
///
/// What happens when an operation needs more bytes than remain is decided by the bounds policy
/// `P` (see [`BoundsPolicy`]). With [`Checked`][crate::Checked] the operation returns
/// [`Error::Bounds`][crate::Error::Bounds] and leaves the cursor where it was.
///
/// Fixed-width values are read in native byte order and must start at a position aligned to
/// the smaller of their size and [`DEFAULT_ALIGNMENT`]. Use [`align()`][Self::align] to skip
/// padding.
///
/// # Example
///
/// ```
/// use memlink::{Checked, ReadCursor};
///
/// let mut data = Vec::new();
/// data.extend_from_slice(&7_u32.to_ne_bytes());
/// data.extend_from_slice(b"hi\0");
///
/// let mut cursor = ReadCursor::<Checked>::new(data.as_slice());
/// assert_eq!(cursor.read_fixed::<u32>()?, 7);
/// assert_eq!(cursor.read_terminated_string()?, b"hi");
/// assert_eq!(cursor.remaining(), 0);
/// # Ok::<(), memlink::Error>(())
/// ```
#[derive(Debug)]
pub struct ReadCursor<'a, P: BoundsPolicy = DefaultPolicy> {
    view: MemView<'a>,
    pos: usize,

    _policy: PhantomData<P>,
}

impl<'a, P: BoundsPolicy> ReadCursor<'a, P> {
    /// Creates a cursor at the start of the provided view.
    #[must_use]
    pub fn new(view: impl Into<MemView<'a>>) -> Self {
        Self {
            view: view.into(),
            pos: 0,
            _policy: PhantomData,
        }
    }

    /// The offset of the next byte to be read.
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// The total length of the view.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.view.len()
    }

    /// Whether the view is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// The number of bytes between the cursor and the end of the view.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.view.len() - self.pos
    }

    /// The view the cursor reads from.
    #[must_use]
    pub const fn view(&self) -> MemView<'a> {
        self.view
    }

    /// The bytes that have not been read yet.
    #[must_use]
    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.view.as_slice()[self.pos..]
    }

    /// Checks that `n` more bytes can be read, without moving the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if fewer bytes remain and the policy
    /// reports violations.
    pub fn verify_remaining(&self, operation: &'static str, type_name: &'static str, n: usize) -> Result<()> {
        P::verify(operation, type_name, self.pos, n, self.remaining())
    }

    /// Moves the cursor to the absolute offset `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if `pos` is beyond the end of the view and
    /// the policy reports violations. Otherwise the cursor is clamped to the end of the view.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        P::verify("seek", "position", self.pos, pos, self.len())?;
        self.pos = pos.min(self.len());
        Ok(())
    }

    /// Moves the cursor forward by `n` bytes without reading them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if fewer than `n` bytes remain and the
    /// policy reports violations. Otherwise the cursor is clamped to the end of the view.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.verify_remaining("skip", "bytes", n)?;
        self.pos += n.min(self.remaining());
        Ok(())
    }

    /// Moves the cursor forward to the next multiple of `grain`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if the padding extends past the end of
    /// the view and the policy reports violations.
    ///
    /// # Panics
    ///
    /// Panics if `grain` is not a power of two.
    pub fn align(&mut self, grain: usize) -> Result<()> {
        assert!(grain.is_power_of_two(), "alignment grain must be a power of two");

        let padding = align::padding(self.pos, grain);
        self.verify_remaining("align", "padding", padding)?;
        self.pos += padding.min(self.remaining());
        Ok(())
    }

    /// Moves the cursor forward to the next multiple of [`DEFAULT_ALIGNMENT`].
    ///
    /// # Errors
    ///
    /// See [`align()`][Self::align].
    pub fn align_default(&mut self) -> Result<()> {
        self.align(DEFAULT_ALIGNMENT)
    }

    /// Whether the cursor is at a multiple of `grain`.
    #[must_use]
    pub fn aligned(&self, grain: usize) -> bool {
        align::is_aligned(self.pos, grain)
    }

    /// Fills `buffer` with the next bytes of the view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if fewer bytes remain than the buffer holds
    /// and the policy reports violations.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<()> {
        let bytes = self.read_slice(buffer.len())?;
        buffer.copy_from_slice(bytes);
        Ok(())
    }

    /// Returns the next `n` bytes of the view without copying them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if fewer than `n` bytes remain and the
    /// policy reports violations.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.verify_remaining("read", "bytes", n)?;

        let bytes = &self.remaining_slice()[..n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads a fixed-width value in native byte order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if fewer than `size_of::<T>()` bytes remain
    /// and the policy reports violations.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the cursor is not aligned to the smaller of the size of `T`
    /// and [`DEFAULT_ALIGNMENT`].
    pub fn read_fixed<T: FromBytes>(&mut self) -> Result<T>
    where
        T::Bytes: Default,
    {
        let value = self.peek_fixed::<T>()?;
        self.pos += size_of::<T>();
        Ok(value)
    }

    /// Reads a fixed-width value in native byte order without moving the cursor.
    ///
    /// # Errors
    ///
    /// See [`read_fixed()`][Self::read_fixed].
    ///
    /// # Panics
    ///
    /// See [`read_fixed()`][Self::read_fixed].
    pub fn peek_fixed<T: FromBytes>(&self) -> Result<T>
    where
        T::Bytes: Default,
    {
        let size = size_of::<T>();

        debug_assert!(
            self.aligned(size.min(DEFAULT_ALIGNMENT).next_power_of_two()),
            "read of {} at unaligned offset {}",
            type_name::<T>(),
            self.pos
        );
        self.verify_remaining("read", type_name::<T>(), size)?;

        let mut bytes = T::Bytes::default();
        bytes.as_mut().copy_from_slice(&self.remaining_slice()[..size]);
        Ok(T::from_ne_bytes(&bytes))
    }

    /// Reads bytes up to the next zero byte, consuming the zero byte as well.
    ///
    /// The returned slice does not include the terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if no terminator remains in the view and
    /// the policy reports violations. Otherwise all remaining bytes are returned.
    pub fn read_terminated_string(&mut self) -> Result<&'a [u8]> {
        let rest = self.remaining_slice();

        let Some(end) = rest.iter().position(|&b| b == 0) else {
            self.verify_remaining("read", "terminated string", rest.len() + 1)?;
            self.pos = self.len();
            return Ok(rest);
        };

        self.pos += end + 1;
        Ok(&rest[..end])
    }

    /// Reads a variable-size length marker written by
    /// [`WriteCursor::write_varsize()`][crate::WriteCursor::write_varsize].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if the marker is truncated and the policy
    /// reports violations. The cursor does not move in that case.
    pub fn read_varsize(&mut self) -> Result<usize> {
        self.rewind_on_error(Self::read_varsize_parts)
    }

    fn read_varsize_parts(&mut self) -> Result<usize> {
        let short = self.read_fixed::<u8>()?;
        if short != VARSIZE_U8_SENTINEL {
            return Ok(usize::from(short));
        }

        self.align(align_of::<u16>())?;
        let medium = self.read_fixed::<u16>()?;
        if medium != VARSIZE_U16_SENTINEL {
            return Ok(usize::from(medium));
        }

        self.align_default()?;
        self.read_fixed::<usize>()
    }

    /// An adapter implementing [`std::io::Read`] and [`std::io::BufRead`] over this cursor.
    pub const fn reader(&mut self) -> CursorReader<'_, 'a, P> {
        CursorReader::new(self)
    }

    /// Runs `read` over the cursor and moves the cursor back to where it was if `read` fails.
    pub(crate) fn rewind_on_error<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.pos;

        read(self).inspect_err(|_| self.pos = start)
    }

    pub(crate) const fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.pos += n;
    }
}

impl<P: BoundsPolicy> Clone for ReadCursor<'_, P> {
    fn clone(&self) -> Self {
        Self {
            view: self.view,
            pos: self.pos,
            _policy: PhantomData,
        }
    }
}
