// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::slice;

use crate::{ByteHooks, Error, MemView, RegionHooks, Result};

/// A non-owning view over a range of bytes that may be mutated in place.
///
/// In addition to the read-only [`MemView`] it wraps, the view remembers whether the memory it
/// is linked to may be written. A view linked through [`link_const()`][Self::link_const] holds
/// no mutable pointer and every mutation through it fails with [`Error::ReadOnly`].
///
/// None of the mutations change the length of the view. [`insert()`][Self::insert] and
/// [`erase()`][Self::erase] rearrange the bytes already present; an owner that wants the view to
/// grow or shrink adjusts the storage first (see [`MemBlock`][crate::MemBlock]).
///
/// # Example
///
/// ```
/// use memlink::MemViewMut;
///
/// let mut storage = *b"abcdef";
/// let mut view = MemViewMut::from(&mut storage);
///
/// view.insert(1, 2)?;
/// assert_eq!(view.as_slice(), b"a\0\0bcd");
///
/// view.copy(1, b"XY")?;
/// assert_eq!(view.as_slice(), b"aXYbcd");
/// # Ok::<(), memlink::Error>(())
/// ```
pub struct MemViewMut<'a> {
    base: MemView<'a>,

    /// Equal to the pointer of `base` unless the view is linked to immutable memory or unlinked.
    mutable: Option<NonNull<u8>>,

    _source: PhantomData<&'a mut [u8]>,
}

impl<'a> MemViewMut<'a> {
    /// Creates a view that is not linked to any memory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base: MemView::new(),
            mutable: None,
            _source: PhantomData,
        }
    }

    /// Creates a view over immutable bytes. Every mutation through the view will fail.
    #[must_use]
    pub const fn from_const(data: &'a [u8]) -> Self {
        Self {
            base: MemView::from_slice(data),
            mutable: None,
            _source: PhantomData,
        }
    }

    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes for the lifetime `'a`, with no
    /// other access to that memory during the lifetime.
    pub(crate) const unsafe fn from_raw_parts_mut(ptr: NonNull<u8>, len: usize) -> Self {
        Self {
            // SAFETY: Forwarding the caller's guarantees, which are a superset of what is needed.
            base: unsafe { MemView::from_raw_parts(ptr.as_ptr(), len) },
            mutable: Some(ptr),
            _source: PhantomData,
        }
    }

    /// Re-points the view at the provided mutable bytes.
    pub fn link(&mut self, data: &'a mut [u8]) {
        let len = data.len();
        let ptr = NonNull::from(data).cast::<u8>();

        // SAFETY: The exclusive borrow guarantees validity and exclusivity for `'a`.
        *self = unsafe { Self::from_raw_parts_mut(ptr, len) };
    }

    /// Re-points the view at the provided immutable bytes.
    pub fn link_const(&mut self, data: &'a [u8]) {
        *self = Self::from_const(data);
    }

    /// Re-points the view at `len` mutable bytes starting at `ptr`.
    ///
    /// # Safety
    ///
    /// If `ptr` is not null, it must be valid for reads and writes of `len` bytes for the
    /// lifetime `'a` and the memory must not be accessed other than through this view during
    /// that lifetime.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` is null and `len` is nonzero.
    pub unsafe fn link_raw(&mut self, ptr: *mut u8, len: usize) {
        match NonNull::new(ptr) {
            // SAFETY: Forwarding the caller's guarantees.
            Some(ptr) => *self = unsafe { Self::from_raw_parts_mut(ptr, len) },
            None => {
                assert!(len == 0, "cannot link a null pointer with a nonzero length");
                self.unlink();
            }
        }
    }

    /// Detaches the view from its memory, leaving it empty. The memory is not freed.
    pub fn unlink(&mut self) {
        *self = Self::new();
    }

    /// The number of bytes in the view.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.base.len()
    }

    /// Whether the view covers zero bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Whether the view references any memory at all, even if zero bytes of it.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.base.is_linked()
    }

    /// Whether the view is linked to immutable memory.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.mutable.is_none() && self.base.is_linked()
    }

    /// The address of the first byte of the view, null if the view is not linked.
    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.base.as_ptr()
    }

    pub(crate) const fn mutable_ptr(&self) -> Option<NonNull<u8>> {
        self.mutable
    }

    /// The bytes covered by the view.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.base.as_slice()
    }

    /// The bytes covered by the view, if the view is linked to mutable memory.
    ///
    /// An unlinked view yields an empty slice; a view linked to immutable memory yields `None`.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        if !self.is_linked() {
            return Some(&mut []);
        }

        let len = self.len();

        // SAFETY: The linking functions guarantee that the mutable pointer is valid for reads
        // and writes of `len` bytes for `'a` and that we have exclusive access to it. The borrow
        // of `self` prevents handing out a second slice.
        self.mutable.map(|ptr| unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), len) })
    }

    /// A read-only view over the same bytes, borrowing from this one.
    #[must_use]
    pub fn as_view(&self) -> MemView<'_> {
        self.base
    }

    /// Converts into a read-only view over the same bytes.
    #[must_use]
    pub const fn into_view(self) -> MemView<'a> {
        self.base
    }

    /// Relabels the length of the view without touching memory.
    ///
    /// # Safety
    ///
    /// The memory must be valid for reads of `len` bytes for the lifetime `'a`, and for writes
    /// too if the view is linked to mutable memory.
    ///
    /// # Panics
    ///
    /// Panics if the view is not linked and `len` is nonzero.
    pub unsafe fn resize(&mut self, len: usize) {
        // SAFETY: Forwarding the caller's guarantees.
        unsafe {
            self.base.resize(len);
        }
    }

    /// Copies `source` into the view starting at `offset`.
    ///
    /// Does nothing if `source` already starts at the destination address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the view is linked to immutable memory.
    ///
    /// # Panics
    ///
    /// Panics if the destination range is outside the bounds of the view.
    pub fn copy(&mut self, offset: usize, source: &[u8]) -> Result<()> {
        let base = self.writable_ptr()?;
        assert!(
            offset.checked_add(source.len()).is_some_and(|end| end <= self.len()),
            "copy destination is outside the view"
        );

        // No mutable borrow may be formed over bytes the source already points at.
        if base.is_some_and(|base| ptr::eq(base.as_ptr().wrapping_add(offset).cast_const(), source.as_ptr())) {
            return Ok(());
        }

        self.writable()?[offset..][..source.len()].copy_from_slice(source);
        Ok(())
    }

    /// Writes `pattern` into the view `count` times back to back, starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the view is linked to immutable memory.
    ///
    /// # Panics
    ///
    /// Panics if the destination range is outside the bounds of the view.
    pub fn fill(&mut self, offset: usize, pattern: &[u8], count: usize) -> Result<()> {
        let total = pattern.len().checked_mul(count).expect("fill length overflows usize");
        let target = &mut self.writable()?[offset..][..total];

        if let [byte] = pattern {
            target.fill(*byte);
        } else if !pattern.is_empty() {
            for chunk in target.chunks_exact_mut(pattern.len()) {
                chunk.copy_from_slice(pattern);
            }
        }

        Ok(())
    }

    /// Copies `n` bytes from `source_offset` to `target_offset` within the view. The ranges
    /// may overlap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the view is linked to immutable memory.
    ///
    /// # Panics
    ///
    /// Panics if either range is outside the bounds of the view.
    pub fn copy_within(&mut self, source_offset: usize, target_offset: usize, n: usize) -> Result<()> {
        let bytes = self.writable()?;
        let source_end = source_offset.checked_add(n).expect("view range overflows usize");

        bytes.copy_within(source_offset..source_end, target_offset);
        Ok(())
    }

    /// Shifts the bytes from `offset` onwards right by `n`, opening a zeroed gap of `n` bytes
    /// at `offset`. The last `n` bytes of the view are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the view is linked to immutable memory.
    ///
    /// # Panics
    ///
    /// Panics if `offset + n` exceeds the length of the view.
    pub fn insert(&mut self, offset: usize, n: usize) -> Result<()> {
        let len = self.len();
        assert_range(offset, n, len);

        let Some(base) = self.writable_ptr()? else {
            return Ok(());
        };

        let tail = len - n;

        // SAFETY: The range check above keeps every address inside the linked memory.
        let vacated = unsafe { offset_ptr(base, tail) };
        // SAFETY: As above.
        let gap = unsafe { offset_ptr(base, offset) };

        // SAFETY: The range check above keeps every region inside the linked memory, which the
        // linking functions guarantee is valid for writes.
        unsafe {
            ByteHooks::destruct(vacated, n);
        }

        // SAFETY: As above.
        unsafe {
            shift_right(base, offset, n, tail - offset);
        }

        // SAFETY: As above.
        unsafe {
            ByteHooks::construct(gap, n);
        }

        Ok(())
    }

    /// Removes `n` bytes at `offset` by shifting the rest of the view left, zeroing the `n`
    /// bytes that open up at the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the view is linked to immutable memory.
    ///
    /// # Panics
    ///
    /// Panics if `offset + n` exceeds the length of the view.
    pub fn erase(&mut self, offset: usize, n: usize) -> Result<()> {
        let len = self.len();
        assert_range(offset, n, len);

        let Some(base) = self.writable_ptr()? else {
            return Ok(());
        };

        // SAFETY: The range check above keeps every address inside the linked memory.
        let removed = unsafe { offset_ptr(base, offset) };
        // SAFETY: As above.
        let vacated = unsafe { offset_ptr(base, len - n) };

        // SAFETY: The range check above keeps every region inside the linked memory, which the
        // linking functions guarantee is valid for writes.
        unsafe {
            ByteHooks::destruct(removed, n);
        }

        // SAFETY: As above.
        unsafe {
            shift_left(base, offset, n, len - offset - n);
        }

        // SAFETY: As above.
        unsafe {
            ByteHooks::construct(vacated, n);
        }

        Ok(())
    }

    fn writable(&mut self) -> Result<&mut [u8]> {
        self.as_mut_slice().ok_or(Error::ReadOnly)
    }

    /// `None` if the view is not linked, in which case it is also empty.
    fn writable_ptr(&self) -> Result<Option<NonNull<u8>>> {
        match self.mutable {
            Some(ptr) => Ok(Some(ptr)),
            None if self.is_linked() => Err(Error::ReadOnly),
            None => Ok(None),
        }
    }
}

fn assert_range(offset: usize, n: usize, len: usize) {
    assert!(
        offset.checked_add(n).is_some_and(|end| end <= len),
        "range of {n} bytes at offset {offset} is outside of a view of {len} bytes"
    );
}

/// The address `offset` bytes past `base`.
///
/// # Safety
///
/// The result must stay within the allocation `base` points into.
pub(crate) unsafe fn offset_ptr(base: NonNull<u8>, offset: usize) -> NonNull<u8> {
    // SAFETY: Forwarding the caller's guarantee.
    unsafe { base.add(offset) }
}

/// Moves `count` bytes starting at `offset` forward to `offset + n`.
///
/// # Safety
///
/// `base` must be valid for reads and writes of `offset + n + count` bytes.
pub(crate) unsafe fn shift_right(base: NonNull<u8>, offset: usize, n: usize, count: usize) {
    // SAFETY: Within the region the caller guarantees is valid.
    let source = unsafe { offset_ptr(base, offset) };
    // SAFETY: Within the region the caller guarantees is valid.
    let target = unsafe { offset_ptr(base, offset + n) };

    // SAFETY: Both ranges are within the region the caller guarantees is valid.
    // `ptr::copy` permits overlap.
    unsafe {
        ptr::copy(source.as_ptr(), target.as_ptr(), count);
    }
}

/// Moves `count` bytes starting at `offset + n` back to `offset`.
///
/// # Safety
///
/// `base` must be valid for reads and writes of `offset + n + count` bytes.
pub(crate) unsafe fn shift_left(base: NonNull<u8>, offset: usize, n: usize, count: usize) {
    // SAFETY: Within the region the caller guarantees is valid.
    let source = unsafe { offset_ptr(base, offset + n) };
    // SAFETY: Within the region the caller guarantees is valid.
    let target = unsafe { offset_ptr(base, offset) };

    // SAFETY: Both ranges are within the region the caller guarantees is valid.
    // `ptr::copy` permits overlap.
    unsafe {
        ptr::copy(source.as_ptr(), target.as_ptr(), count);
    }
}

impl Default for MemViewMut<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> From<&'a mut [u8]> for MemViewMut<'a> {
    fn from(value: &'a mut [u8]) -> Self {
        let mut view = Self::new();
        view.link(value);
        view
    }
}

impl<'a, const N: usize> From<&'a mut [u8; N]> for MemViewMut<'a> {
    fn from(value: &'a mut [u8; N]) -> Self {
        Self::from(value.as_mut_slice())
    }
}

impl<'a> From<MemViewMut<'a>> for MemView<'a> {
    fn from(value: MemViewMut<'a>) -> Self {
        value.into_view()
    }
}

impl PartialEq for MemViewMut<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}

impl Eq for MemViewMut<'_> {}

impl fmt::Debug for MemViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemViewMut")
            .field("ptr", &self.base.as_ptr())
            .field("len", &self.base.len())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
