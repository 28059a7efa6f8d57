// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::path::Path;
use std::ptr::{self, NonNull};

use tracing::{Level, event};

use crate::view_mut::{offset_ptr, shift_left, shift_right};
use crate::{
    ALLOCATION_GRANULE, BoundsPolicy, ByteHooks, DEFAULT_ALIGNMENT, Error, MemView, MemViewMut, ReadCursor, RegionHooks, Result, StreamRead,
    StreamWrite, WriteCursor, align, file,
};

/// A growable region of memory that is either owned by the block or linked to memory owned by
/// someone else.
///
/// An owning block holds a heap allocation of `capacity()` bytes, the first `len()` of which
/// form its logical region. The hook strategy `H` (see [`RegionHooks`]) is invoked on every
/// byte range that enters the logical region (growth, insertion) or leaves it (truncation,
/// erasure, deallocation). With the default [`ByteHooks`] the block is a plain byte buffer;
/// with [`TypedHooks<T>`][crate::TypedHooks] it is the storage of a typed container such as
/// [`BlockVec<T>`][crate::BlockVec].
///
/// A byte block may instead be linked to external memory for the lifetime `'a`
/// (see [`link()`][Self::link]). A linked block has a capacity of zero, never frees the memory
/// it is linked to and turns itself into an owning copy the first time it needs to grow or
/// shift its contents.
///
/// Growth is geometric: a non-exact [`reserve()`][Self::reserve] at least doubles the
/// capacity and rounds it up to a multiple of [`ALLOCATION_GRANULE`].
///
/// # Example
///
/// ```
/// use memlink::MemBlock;
///
/// let mut block: MemBlock = MemBlock::new();
/// block.append(b"hello")?;
/// block.insert(0, 2)?;
/// block.copy(0, b">>")?;
///
/// assert_eq!(&*block, b">>hello");
/// assert!(block.capacity() >= block.len());
/// # Ok::<(), memlink::Error>(())
/// ```
pub struct MemBlock<'a, H: RegionHooks = ByteHooks> {
    link: MemViewMut<'a>,

    /// Zero if the block is empty or linked to external memory.
    capacity: usize,

    _hooks: PhantomData<H>,
}

impl<'a, H: RegionHooks> MemBlock<'a, H> {
    /// Creates an empty block that owns no memory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            link: MemViewMut::new(),
            capacity: 0,
            _hooks: PhantomData,
        }
    }

    /// Creates a block with `len` bytes, exactly as much capacity and the whole region
    /// constructed by `H`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the memory cannot be allocated.
    pub fn with_len(len: usize) -> Result<Self> {
        let mut block = Self::new();
        block.resize(len, true)?;
        Ok(block)
    }

    /// The memory layout of a buffer of `bytes` bytes as allocated by this type of block.
    ///
    /// Memory adopted through [`manage()`][Self::manage] must be allocated with this layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityOverflow`] if no such layout exists.
    pub fn layout_for(bytes: usize) -> Result<Layout> {
        Layout::from_size_align(bytes, H::ALIGN).ok().ok_or(Error::CapacityOverflow)
    }

    /// The number of bytes in the logical region.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.link.len()
    }

    /// Whether the logical region is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.link.is_empty()
    }

    /// The number of bytes allocated by the block, zero if it owns no memory.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the block owns an allocation.
    #[must_use]
    pub const fn is_owning(&self) -> bool {
        self.capacity != 0
    }

    /// Whether the block is linked to memory it does not own.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.capacity == 0 && self.link.is_linked()
    }

    /// The address of the first byte of the logical region, null if the block holds no memory.
    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.link.as_ptr()
    }

    /// The allocation of an owning block, `None` otherwise.
    pub(crate) fn owned_ptr(&self) -> Option<NonNull<u8>> {
        if self.is_owning() { self.link.mutable_ptr() } else { None }
    }

    fn owned_ptr_or_panic(&self) -> NonNull<u8> {
        self.owned_ptr().expect("the block owns memory after a successful reservation")
    }

    /// # Safety
    ///
    /// The block must be owning.
    unsafe fn current_layout(&self) -> Layout {
        debug_assert!(self.is_owning());

        // SAFETY: The same size and alignment were accepted by `layout_for()` when the
        // allocation was made.
        unsafe { Layout::from_size_align_unchecked(self.capacity, H::ALIGN) }
    }

    /// Relabels the logical length.
    ///
    /// # Safety
    ///
    /// The block must hold at least `len` bytes of memory, and the caller takes responsibility
    /// for the elements that enter or leave the logical region.
    pub(crate) unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(!self.is_owning() || len <= self.capacity);

        // SAFETY: Forwarding the caller's guarantee.
        unsafe {
            self.link.resize(len);
        }
    }

    /// Ensures the block owns at least `new_capacity` bytes.
    ///
    /// Does nothing if the capacity already suffices. Otherwise, unless `exact` is set, the
    /// capacity is rounded up to a multiple of [`ALLOCATION_GRANULE`] and at least doubled. The
    /// logical region is preserved and the newly acquired bytes are primed by `H`. A linked
    /// block becomes an owning block holding a copy of the linked bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the allocator fails, or [`Error::CapacityOverflow`] if the
    /// size is not representable. The block is unchanged in both cases.
    pub fn reserve(&mut self, new_capacity: usize, exact: bool) -> Result<()> {
        if new_capacity <= self.capacity {
            return Ok(());
        }

        let len = self.len();
        let required = new_capacity.max(len);

        let target = if exact {
            required
        } else {
            align::align_up(required, ALLOCATION_GRANULE)
                .ok_or(Error::CapacityOverflow)?
                .max(self.capacity.saturating_mul(2))
        };

        let target = target
            .div_ceil(H::ELEMENT_SIZE)
            .checked_mul(H::ELEMENT_SIZE)
            .ok_or(Error::CapacityOverflow)?;

        let layout = Self::layout_for(target)?;

        let raw = if let Some(old) = self.owned_ptr() {
            // SAFETY: The block is owning.
            let old_layout = unsafe { self.current_layout() };

            // SAFETY: The allocation was made with the current layout and the target size is
            // nonzero and valid for the alignment, as `layout_for()` confirmed.
            unsafe { alloc::realloc(old.as_ptr(), old_layout, target) }
        } else {
            // SAFETY: The layout has a nonzero size because `target > capacity >= 0`.
            unsafe { alloc::alloc(layout) }
        };

        let Some(new_ptr) = NonNull::new(raw) else {
            event!(Level::DEBUG, message = "allocation failed", requested = target, capacity = self.capacity);
            return Err(Error::Alloc { requested: target });
        };

        let primed_from = if self.is_owning() {
            self.capacity
        } else {
            if len > 0 {
                // SAFETY: The linked memory is valid for reads of `len` bytes and cannot
                // overlap a fresh allocation of at least `len` bytes.
                unsafe {
                    ptr::copy_nonoverlapping(self.link.as_ptr(), new_ptr.as_ptr(), len);
                }
            }

            len
        };

        // SAFETY: `primed_from <= target`, inside the new allocation.
        let spare = unsafe { offset_ptr(new_ptr, primed_from) };

        // SAFETY: `[primed_from, target)` lies inside the new allocation and holds no elements.
        unsafe {
            H::prime_spare(spare, target - primed_from);
        }

        event!(Level::TRACE, message = "reserve", from = self.capacity, to = target, len);

        // SAFETY: The allocation is valid for `target >= len` bytes until this block frees it,
        // and references to it are only handed out through borrows of the block.
        self.link = unsafe { MemViewMut::from_raw_parts_mut(new_ptr, len) };
        self.capacity = target;

        Ok(())
    }

    /// Grows or shrinks the logical region to `new_len` bytes.
    ///
    /// Growth reserves memory (see [`reserve()`][Self::reserve]) and constructs the new bytes
    /// with `H`; shrinking destructs the bytes that leave the region. Capacity never shrinks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if growth fails to allocate. The block is unchanged.
    pub fn resize(&mut self, new_len: usize, exact: bool) -> Result<()> {
        let len = self.len();

        if new_len <= len {
            self.truncate(new_len);
            return Ok(());
        }

        self.reserve(new_len, exact)?;

        // SAFETY: The reservation made `[len, new_len)` part of the allocation.
        let grown = unsafe { offset_ptr(self.owned_ptr_or_panic(), len) };

        // SAFETY: The new bytes hold no elements. If construction panics the block keeps its
        // old length and the partially constructed elements are leaked.
        unsafe {
            H::construct(grown, new_len - len);
        }

        // SAFETY: Every byte up to `new_len` is now constructed.
        unsafe {
            self.set_len(new_len);
        }

        Ok(())
    }

    /// Shrinks the logical region to `new_len` bytes, destructing the bytes that leave it.
    ///
    /// Does nothing if the region is not longer than `new_len`. A linked block is only
    /// relabeled; the memory it is linked to is left untouched.
    pub fn truncate(&mut self, new_len: usize) {
        let len = self.len();
        if new_len >= len {
            return;
        }

        let owned = self.owned_ptr();

        // SAFETY: Shrinking always stays within the memory of the block. The length is lowered
        // before the destructors run, so a panicking destructor leaks instead of double-dropping.
        unsafe {
            self.set_len(new_len);
        }

        if let Some(base) = owned {
            // SAFETY: `new_len < len` is inside the allocation.
            let removed = unsafe { offset_ptr(base, new_len) };

            // SAFETY: The bytes held live elements and are no longer part of the region.
            unsafe {
                H::destruct(removed, len - new_len);
            }
        }
    }

    /// Empties the logical region, keeping the capacity.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Opens a gap of `n` constructed bytes at `offset`, shifting the rest of the region right.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the block cannot grow. The block is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is beyond the end of the logical region.
    pub fn insert(&mut self, offset: usize, n: usize) -> Result<()> {
        let len = self.len();
        assert!(offset <= len, "insertion offset {offset} is beyond the end of a block of {len} bytes");

        if n == 0 {
            return Ok(());
        }

        let new_len = len.checked_add(n).ok_or(Error::CapacityOverflow)?;
        self.reserve(new_len, false)?;
        let base = self.owned_ptr_or_panic();

        // SAFETY: `offset <= len` is inside the allocation.
        let gap = unsafe { offset_ptr(base, offset) };

        // SAFETY: Shrinking the length is always within the allocation. While the gap is being
        // constructed the length excludes everything from `offset`, so a panic leaks the
        // shifted elements instead of exposing the unconstructed gap.
        unsafe {
            self.set_len(offset);
        }

        // SAFETY: The reservation guarantees room for `len + n` bytes.
        unsafe {
            shift_right(base, offset, n, len - offset);
        }

        // SAFETY: The gap holds bitwise stale copies of elements that now live further right.
        unsafe {
            H::construct(gap, n);
        }

        // SAFETY: Every byte up to `new_len` holds a live element again.
        unsafe {
            self.set_len(new_len);
        }

        Ok(())
    }

    /// Removes `n` bytes at `offset`, destructing them and shifting the rest of the region left.
    ///
    /// A linked block is first turned into an owning copy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if a linked block cannot be copied. The block is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the range is outside of the logical region.
    pub fn erase(&mut self, offset: usize, n: usize) -> Result<()> {
        let len = self.len();
        assert!(
            offset.checked_add(n).is_some_and(|end| end <= len),
            "range of {n} bytes at offset {offset} is outside of a block of {len} bytes"
        );

        if n == 0 {
            return Ok(());
        }

        if !self.is_owning() {
            self.reserve(len, true)?;
        }

        let base = self.owned_ptr_or_panic();

        // SAFETY: Inside the logical region checked above.
        let removed = unsafe { offset_ptr(base, offset) };
        // SAFETY: Inside the logical region checked above.
        let vacated = unsafe { offset_ptr(base, len - n) };

        // SAFETY: Shrinking the length is always within the allocation. The length is lowered
        // before the destructors run, so a panic leaks the tail instead of double-dropping.
        unsafe {
            self.set_len(offset);
        }

        // SAFETY: The range held live elements that are no longer part of the region.
        unsafe {
            H::destruct(removed, n);
        }

        // SAFETY: Every range is inside the logical region checked above.
        unsafe {
            shift_left(base, offset, n, len - offset - n);
        }

        // SAFETY: The first `len - n` bytes hold live elements again.
        unsafe {
            self.set_len(len - n);
        }

        // SAFETY: The vacated tail holds bitwise stale copies of elements that now live
        // further left.
        unsafe {
            H::prime_spare(vacated, n);
        }

        Ok(())
    }

    /// Adopts `len` bytes of memory as if this block had allocated them.
    ///
    /// The whole range becomes both the capacity and the logical region, and is freed by the
    /// block when it is deallocated. Any memory the block was linked to is unlinked first.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by the global allocator with
    /// [`layout_for(len)`][Self::layout_for], must hold `len / H::ELEMENT_SIZE` constructed
    /// elements and must not be used by anyone else afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the block already owns memory or if `len` is zero.
    pub unsafe fn manage(&mut self, ptr: NonNull<u8>, len: usize) {
        assert!(!self.is_owning(), "cannot adopt memory into a block that already owns memory");
        assert!(len != 0, "cannot adopt an empty allocation");

        // SAFETY: Forwarding the caller's guarantees of validity and exclusivity.
        self.link = unsafe { MemViewMut::from_raw_parts_mut(ptr, len) };
        self.capacity = len;

        event!(Level::TRACE, message = "manage", len);
    }

    /// Destructs the logical region and frees the memory if the block owns it, then unlinks.
    pub fn deallocate(&mut self) {
        let Some(base) = self.owned_ptr() else {
            self.link.unlink();
            return;
        };

        let len = self.len();
        let capacity = self.capacity;

        let _free = FreeOnDrop {
            ptr: base,
            // SAFETY: We checked above that the block is owning.
            layout: unsafe { self.current_layout() },
        };

        self.link.unlink();
        self.capacity = 0;

        // SAFETY: The region held `len` live elements and the block no longer refers to them.
        // If a destructor panics, the guard still frees the allocation.
        unsafe {
            H::destruct(base, len);
        }

        event!(Level::TRACE, message = "deallocate", capacity, len);
    }

    /// Reallocates an owning block so that its capacity equals its length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the new buffer cannot be allocated. The block is unchanged.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        let Some(base) = self.owned_ptr() else {
            return Ok(());
        };

        let len = self.len();
        if len == self.capacity {
            return Ok(());
        }

        if len == 0 {
            self.deallocate();
            return Ok(());
        }

        let mut fresh = Self::new();
        fresh.reserve(len, true)?;
        let target = fresh.owned_ptr_or_panic();

        // SAFETY: The elements are moved bitwise into a distinct allocation of `len` bytes.
        unsafe {
            ptr::copy_nonoverlapping(base.as_ptr(), target.as_ptr(), len);
        }

        // SAFETY: The fresh block now holds the `len` elements.
        unsafe {
            fresh.set_len(len);
        }

        // SAFETY: The old block forgets about the moved elements before it is dropped, so they
        // are destructed only once.
        unsafe {
            self.set_len(0);
        }

        self.swap(&mut fresh);
        Ok(())
    }

    /// Exchanges the contents of two blocks without copying.
    pub const fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }
}

/// Frees an allocation when dropped, so that a panicking destructor cannot leak it.
struct FreeOnDrop {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Drop for FreeOnDrop {
    fn drop(&mut self) {
        // SAFETY: The guard is only created for an allocation made with this layout, which
        // nobody refers to anymore.
        unsafe {
            alloc::dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}

impl<'a> MemBlock<'a, ByteHooks> {
    /// Creates an owning block holding a copy of `bytes`, with exactly as much capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the memory cannot be allocated.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut block = Self::new();
        block.reserve(bytes.len(), true)?;
        block.append(bytes)?;
        Ok(block)
    }

    /// Creates a block linked to the provided mutable bytes.
    #[must_use]
    pub fn linked(data: &'a mut [u8]) -> Self {
        let mut block = Self::new();
        block.link(data);
        block
    }

    /// Creates a block linked to the provided immutable bytes.
    #[must_use]
    pub fn linked_const(data: &'a [u8]) -> Self {
        let mut block = Self::new();
        block.link_const(data);
        block
    }

    /// Releases any memory the block owns and links it to the provided mutable bytes.
    ///
    /// The bytes can be modified in place through the block until it needs to grow or shift
    /// them, at which point the block switches to an owning copy.
    pub fn link(&mut self, data: &'a mut [u8]) {
        self.deallocate();
        self.link.link(data);
    }

    /// Releases any memory the block owns and links it to the provided immutable bytes.
    pub fn link_const(&mut self, data: &'a [u8]) {
        self.deallocate();
        self.link.link_const(data);
    }

    /// Turns a linked block into an owning block holding a copy of the linked bytes.
    ///
    /// Does nothing if the block is not linked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the copy cannot be allocated. The block is unchanged.
    pub fn copy_link(&mut self) -> Result<()> {
        if !self.is_linked() {
            return Ok(());
        }

        if self.is_empty() {
            self.link.unlink();
            return Ok(());
        }

        self.reserve(self.len(), true)
    }

    /// Replaces the logical region with a copy of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the block cannot grow.
    pub fn assign(&mut self, bytes: &[u8]) -> Result<()> {
        self.clear();
        self.append(bytes)
    }

    /// Appends a copy of `bytes` to the logical region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the block cannot grow. The block is unchanged.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        let len = self.len();
        let new_len = len.checked_add(bytes.len()).ok_or(Error::CapacityOverflow)?;
        self.reserve(new_len, false)?;

        // SAFETY: The reservation made `[len, new_len)` part of the allocation.
        let tail = unsafe { offset_ptr(self.owned_ptr_or_panic(), len) };

        // SAFETY: The source is borrowed separately from `self`, so it cannot overlap the block.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), tail.as_ptr(), bytes.len());
        }

        // SAFETY: The appended bytes are initialized.
        unsafe {
            self.set_len(new_len);
        }

        Ok(())
    }

    /// The bytes of the logical region.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.link.as_slice()
    }

    /// The bytes of the logical region, unless the block is linked to immutable memory.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        self.link.as_mut_slice()
    }

    /// A read-only view over the logical region.
    #[must_use]
    pub fn as_view(&self) -> MemView<'_> {
        self.link.as_view()
    }

    /// A mutable view over the logical region, read-only if the block is linked to immutable
    /// memory.
    #[must_use]
    pub fn as_view_mut(&mut self) -> MemViewMut<'_> {
        match self.link.mutable_ptr() {
            // SAFETY: The exclusive borrow of the block guarantees exclusive access to its
            // memory for the lifetime of the returned view.
            Some(ptr) => unsafe { MemViewMut::from_raw_parts_mut(ptr, self.len()) },
            None => MemViewMut::from_const(self.as_slice()),
        }
    }

    /// Copies `source` into the logical region at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the block is linked to immutable memory.
    ///
    /// # Panics
    ///
    /// Panics if the destination range is outside of the logical region.
    pub fn copy(&mut self, offset: usize, source: &[u8]) -> Result<()> {
        self.link.copy(offset, source)
    }

    /// Writes `pattern` into the logical region `count` times back to back, starting at
    /// `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the block is linked to immutable memory.
    ///
    /// # Panics
    ///
    /// Panics if the destination range is outside of the logical region.
    pub fn fill(&mut self, offset: usize, pattern: &[u8], count: usize) -> Result<()> {
        self.link.fill(offset, pattern, count)
    }

    /// Writes the logical region into a newly created or truncated file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created or written.
    pub fn write_file(&self, path: impl AsRef<Path>, mode: Option<u32>) -> Result<()> {
        file::write_file(path, self.as_slice(), mode)
    }
}

impl MemBlock<'static, ByteHooks> {
    /// Reads a whole file into a new block sized exactly to the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened or read, or [`Error::Alloc`] if the
    /// memory for its contents cannot be allocated.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        file::read_file(path)
    }
}

impl<H: RegionHooks> Default for MemBlock<'_, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: RegionHooks> Drop for MemBlock<'_, H> {
    fn drop(&mut self) {
        self.deallocate();
    }
}

impl<H: RegionHooks> fmt::Debug for MemBlock<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemBlock")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("linked", &self.is_linked())
            .finish()
    }
}

impl Deref for MemBlock<'_, ByteHooks> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for MemBlock<'_, ByteHooks> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for MemBlock<'_, ByteHooks> {
    fn eq(&self, other: &Self) -> bool {
        self.as_view() == other.as_view()
    }
}

impl Eq for MemBlock<'_, ByteHooks> {}

impl PartialEq<[u8]> for MemBlock<'_, ByteHooks> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

/// Clones into an owning block, even if `self` is linked.
///
/// # Panics
///
/// Panics if the memory for the copy cannot be allocated.
impl Clone for MemBlock<'_, ByteHooks> {
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice()).expect("allocation failure while cloning a memory block")
    }
}

impl StreamWrite for MemBlock<'_, ByteHooks> {
    fn stream_size(&self) -> usize {
        self.as_view().stream_size()
    }

    fn write_to<P: BoundsPolicy>(&self, w: &mut WriteCursor<'_, P>) -> Result<()> {
        self.as_view().write_to(w)
    }
}

/// Reads a length-prefixed range into a fresh owning allocation of exactly that length,
/// dropping whatever the block held before. Nothing is consumed unless the whole range,
/// including trailing padding, is present.
impl StreamRead for MemBlock<'_, ByteHooks> {
    fn read_from<P: BoundsPolicy>(&mut self, r: &mut ReadCursor<'_, P>) -> Result<()> {
        let prefix = size_of::<usize>();
        let len = r.peek_fixed::<usize>()?;

        let start = r.pos();
        let total = prefix
            .checked_add(len)
            .and_then(|unpadded| unpadded.checked_add(start))
            .and_then(|end| align::align_up(end, DEFAULT_ALIGNMENT))
            .map_or(usize::MAX, |end| end - start);
        r.verify_remaining("read", "MemBlock", total)?;

        let end = prefix + len;
        *self = Self::from_slice(&r.remaining_slice()[prefix..end])?;

        r.skip(end)?;
        r.align_default()
    }
}
