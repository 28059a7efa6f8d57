// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::type_name;
use std::marker::PhantomData;

use num_traits::ToBytes;

use crate::constants::{VARSIZE_U8_SENTINEL, VARSIZE_U16_SENTINEL};
use crate::stream::varsize_size_at;
use crate::{BoundsPolicy, CursorWriter, DEFAULT_ALIGNMENT, DefaultPolicy, MemView, MemViewMut, Result, StreamWrite, align};

/// A position within a mutable view into which binary data is written front to back.
///
/// The cursor never allocates: it writes into the bytes of the view it was created over and
/// fails (or, depending on the bounds policy `P`, asserts) when they run out. Padding skipped
/// by [`align()`][Self::align] is left untouched.
///
/// # Example
///
/// ```
/// use memlink::{Checked, WriteCursor};
///
/// let mut buffer = [0_u8; 16];
/// let mut cursor = WriteCursor::<Checked>::new(&mut buffer);
///
/// cursor.write_fixed(0xABCD_u16)?;
/// cursor.write_terminated_string(b"ok")?;
/// assert_eq!(cursor.pos(), 5);
/// assert_eq!(cursor.written()[2..], *b"ok\0");
/// # Ok::<(), memlink::Error>(())
/// ```
#[derive(Debug)]
pub struct WriteCursor<'a, P: BoundsPolicy = DefaultPolicy> {
    view: MemViewMut<'a>,
    pos: usize,

    _policy: PhantomData<P>,
}

impl<'a, P: BoundsPolicy> WriteCursor<'a, P> {
    /// Creates a cursor at the start of the provided view.
    #[must_use]
    pub fn new(view: impl Into<MemViewMut<'a>>) -> Self {
        Self {
            view: view.into(),
            pos: 0,
            _policy: PhantomData,
        }
    }

    /// The offset of the next byte to be written.
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

    /// The bytes before the cursor.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.view.as_slice()[..self.pos]
    }

    /// Releases the view the cursor writes into.
    #[must_use]
    pub fn into_inner(self) -> MemViewMut<'a> {
        self.view
    }

    /// Checks that `n` more bytes can be written, without moving the cursor.
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

    /// Moves the cursor forward by `n` bytes, leaving them untouched.
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

    /// Moves the cursor forward to the next multiple of `grain`. The skipped bytes are not
    /// written.
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

    /// Copies `bytes` into the view at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if fewer bytes remain than `bytes` holds
    /// and the policy reports violations, or [`Error::ReadOnly`][crate::Error::ReadOnly] if the
    /// view is linked to immutable memory.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_typed("bytes", bytes)
    }

    /// Writes a fixed-width value in native byte order.
    ///
    /// # Errors
    ///
    /// See [`write()`][Self::write].
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the cursor is not aligned to the smaller of the size of `T`
    /// and [`DEFAULT_ALIGNMENT`].
    pub fn write_fixed<T: ToBytes>(&mut self, value: T) -> Result<()> {
        let size = size_of::<T>();

        debug_assert!(
            self.aligned(size.min(DEFAULT_ALIGNMENT).next_power_of_two()),
            "write of {} at unaligned offset {}",
            type_name::<T>(),
            self.pos
        );

        self.write_typed(type_name::<T>(), value.to_ne_bytes().as_ref())
    }

    /// Writes `bytes` followed by a zero byte.
    ///
    /// # Errors
    ///
    /// See [`write()`][Self::write]. Nothing is written unless the terminator fits as well.
    pub fn write_terminated_string(&mut self, bytes: &[u8]) -> Result<()> {
        debug_assert!(!bytes.contains(&0), "terminated string contains the terminator");

        self.verify_remaining("write", "terminated string", bytes.len() + 1)?;
        self.write(bytes)?;
        self.write(&[0])
    }

    /// Writes a variable-size length marker.
    ///
    /// Values below 255 take one byte. Larger values are introduced by the byte 255, followed,
    /// at the next 2-byte boundary, by a `u16`. If the value does not fit below `u16::MAX`, that
    /// `u16` is `u16::MAX` and is followed, at the next [`DEFAULT_ALIGNMENT`] boundary, by the
    /// value as a `usize`.
    ///
    /// # Errors
    ///
    /// See [`write()`][Self::write]. Nothing is written unless the whole marker fits.
    pub fn write_varsize(&mut self, value: usize) -> Result<()> {
        self.verify_remaining("write", "varsize", varsize_size_at(self.pos, value))?;

        if let Ok(short) = u8::try_from(value)
            && short != VARSIZE_U8_SENTINEL
        {
            return self.write_fixed(short);
        }

        self.write_fixed(VARSIZE_U8_SENTINEL)?;
        self.align(align_of::<u16>())?;

        if let Ok(medium) = u16::try_from(value)
            && medium != VARSIZE_U16_SENTINEL
        {
            return self.write_fixed(medium);
        }

        self.write_fixed(VARSIZE_U16_SENTINEL)?;
        self.align_default()?;
        self.write_fixed(value)
    }

    /// Writes a length-prefixed view (see [`StreamWrite`] for [`MemView`]).
    ///
    /// # Errors
    ///
    /// See [`write()`][Self::write]. Nothing is written unless the whole view fits.
    pub fn write_view(&mut self, view: MemView<'_>) -> Result<()> {
        view.write_to(self)
    }

    /// An adapter implementing [`std::io::Write`] over this cursor.
    pub const fn writer(&mut self) -> CursorWriter<'_, 'a, P> {
        CursorWriter::new(self)
    }

    fn write_typed(&mut self, type_name: &'static str, bytes: &[u8]) -> Result<()> {
        self.verify_remaining("write", type_name, bytes.len())?;
        self.view.copy(self.pos, bytes)?;
        self.pos += bytes.len();
        Ok(())
    }
}
