// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::{ptr, slice};

use crate::{BoundsPolicy, DEFAULT_ALIGNMENT, Result, StreamWrite, WriteCursor, align, file};

/// A non-owning view over a range of immutable bytes.
///
/// The view is a `(pointer, length)` pair. It never owns the memory it references and never
/// frees it; the lifetime `'a` ties the view to the memory it was linked to. A view may be
/// re-pointed at different memory at any time via [`link()`][Self::link].
///
/// Views compare equal when they have the same length and either reference the same memory
/// or reference memory with the same contents.
///
/// # Serialization
///
/// A view can be written to a stream (see [`StreamWrite`]) but cannot be read from one: a view
/// has no storage of its own to materialize the bytes into. Use a [`MemBlock`][crate::MemBlock]
/// to read a length-prefixed byte range from a stream.
///
/// # Example
///
/// ```
/// use memlink::MemView;
///
/// let mut view = MemView::new();
/// assert!(view.is_empty());
///
/// view.link(b"ABCDE");
/// assert_eq!(view.len(), 5);
/// assert_eq!(view.as_slice()[2], b'C');
/// ```
#[derive(Clone, Copy)]
pub struct MemView<'a> {
    /// Null if and only if the view has never been linked or was unlinked.
    ptr: *const u8,
    len: usize,

    _source: PhantomData<&'a [u8]>,
}

impl<'a> MemView<'a> {
    /// Creates a view that is not linked to any memory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ptr: ptr::null(),
            len: 0,
            _source: PhantomData,
        }
    }

    /// Creates a view over the provided bytes.
    #[must_use]
    pub const fn from_slice(data: &'a [u8]) -> Self {
        Self {
            ptr: data.as_ptr(),
            len: data.len(),
            _source: PhantomData,
        }
    }

    /// # Safety
    ///
    /// Same as [`link_raw()`][Self::link_raw], and `ptr` must not be null if `len` is nonzero.
    pub(crate) const unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        Self {
            ptr,
            len,
            _source: PhantomData,
        }
    }

    /// Re-points the view at the provided bytes.
    pub fn link(&mut self, data: &'a [u8]) {
        *self = Self::from_slice(data);
    }

    /// Re-points the view at `len` bytes starting at `ptr`.
    ///
    /// # Safety
    ///
    /// If `len` is nonzero, `ptr` must be valid for reads of `len` bytes for the lifetime `'a`
    /// and the memory must not be mutated during that lifetime.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` is null and `len` is nonzero.
    pub unsafe fn link_raw(&mut self, ptr: *const u8, len: usize) {
        assert!(!ptr.is_null() || len == 0, "cannot link a null pointer with a nonzero length");

        self.ptr = ptr;
        self.len = if ptr.is_null() { 0 } else { len };
    }

    /// Detaches the view from its memory, leaving it empty. The memory is not freed.
    #[cfg_attr(test, mutants::skip)] // Generates no-op mutations, not useful.
    pub fn unlink(&mut self) {
        *self = Self::new();
    }

    /// The number of bytes in the view.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the view covers zero bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the view references any memory at all, even if zero bytes of it.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        !self.ptr.is_null()
    }

    /// The address of the first byte of the view, null if the view is not linked.
    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// The bytes covered by the view.
    #[must_use]
    pub fn as_slice(&self) -> &'a [u8] {
        if self.ptr.is_null() {
            return &[];
        }

        // SAFETY: The linking functions guarantee that a non-null `ptr` is valid for reads
        // of `len` bytes for the lifetime `'a`, with no mutation during that lifetime.
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Relabels the length of the view without touching memory.
    ///
    /// This is used by owners of the memory after they have separately adjusted the storage.
    ///
    /// # Safety
    ///
    /// The memory must be valid for reads of `len` bytes for the lifetime `'a`.
    ///
    /// # Panics
    ///
    /// Panics if the view is not linked and `len` is nonzero.
    pub unsafe fn resize(&mut self, len: usize) {
        assert!(!self.ptr.is_null() || len == 0, "cannot resize an unlinked view");
        self.len = len;
    }

    /// Returns a narrower view over `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range is outside the bounds of the view.
    #[must_use]
    pub fn subview(&self, offset: usize, len: usize) -> Self {
        let end = offset.checked_add(len).expect("view range overflows usize");
        Self::from_slice(&self.as_slice()[offset..end])
    }

    /// Writes the bytes of the view into a newly created or truncated file.
    ///
    /// No length prefix is written. On Unix, `mode` sets the permission bits of a newly created
    /// file; elsewhere it is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`][crate::Error::Io] if the file cannot be created or written.
    pub fn write_file(&self, path: impl AsRef<Path>, mode: Option<u32>) -> Result<()> {
        file::write_file(path, self.as_slice(), mode)
    }
}

impl Default for MemView<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> From<&'a [u8]> for MemView<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::from_slice(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for MemView<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Self::from_slice(value)
    }
}

impl<'a> From<&'a str> for MemView<'a> {
    fn from(value: &'a str) -> Self {
        Self::from_slice(value.as_bytes())
    }
}

impl PartialEq for MemView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && (ptr::eq(self.ptr, other.ptr) || self.as_slice() == other.as_slice())
    }
}

impl Eq for MemView<'_> {}

impl PartialEq<[u8]> for MemView<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl fmt::Debug for MemView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemView").field("ptr", &self.ptr).field("len", &self.len).finish()
    }
}

/// Written as a native-word length, the raw bytes and padding up to the next word boundary.
impl StreamWrite for MemView<'_> {
    fn stream_size(&self) -> usize {
        let unpadded = size_of::<usize>() + self.len;
        unpadded + align::padding(unpadded, DEFAULT_ALIGNMENT)
    }

    fn write_to<P: BoundsPolicy>(&self, w: &mut WriteCursor<'_, P>) -> Result<()> {
        let unpadded = size_of::<usize>() + self.len;
        let padding = align::padding(w.pos() + unpadded, DEFAULT_ALIGNMENT);
        w.verify_remaining("write", "MemView", unpadded + padding)?;
        w.write_fixed(self.len)?;
        w.write(self.as_slice())?;
        w.align_default()
    }
}
