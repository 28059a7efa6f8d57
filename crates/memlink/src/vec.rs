// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::type_name;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::{BoundsPolicy, DEFAULT_ALIGNMENT, Error, MemBlock, ReadCursor, Result, StreamRead, StreamWrite, TypedHooks, WriteCursor, align};

/// A growable array of `T` stored in a [`MemBlock`] with [`TypedHooks<T>`].
///
/// Every element that enters the block through growth or insertion is constructed with
/// `T::default()` (or moved in directly by [`push()`][Self::push]) and every element that
/// leaves it is dropped, so the live elements are always exactly the first [`len()`][Self::len]
/// slots of the block.
///
/// Operations that may allocate return [`Error::Alloc`] instead of aborting.
///
/// # Example
///
/// ```
/// use memlink::BlockVec;
///
/// let mut names = BlockVec::<String>::new();
/// names.push("b".to_string())?;
/// names.insert(0, "a".to_string())?;
/// names.resize(3)?;
///
/// assert_eq!(names.as_slice(), ["a", "b", ""]);
/// # Ok::<(), memlink::Error>(())
/// ```
pub struct BlockVec<T: Default> {
    block: MemBlock<'static, TypedHooks<T>>,
}

impl<T: Default> BlockVec<T> {
    /// Creates an empty vector without allocating.
    #[must_use]
    pub const fn new() -> Self {
        Self { block: MemBlock::new() }
    }

    /// Creates a vector of `len` default elements with exactly as much capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the memory cannot be allocated.
    pub fn with_len(len: usize) -> Result<Self> {
        Ok(Self {
            block: MemBlock::with_len(Self::bytes(len)?)?,
        })
    }

    fn bytes(count: usize) -> Result<usize> {
        count.checked_mul(size_of::<T>()).ok_or(Error::CapacityOverflow)
    }

    fn base(&self) -> Option<NonNull<T>> {
        self.block.owned_ptr().map(NonNull::cast)
    }

    /// The number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.block.len() / size_of::<T>()
    }

    /// Whether there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// The number of elements that fit without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.block.capacity() / size_of::<T>()
    }

    /// The elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self.base() {
            // SAFETY: The block holds `len` live elements, allocated with the alignment of `T`.
            Some(base) => unsafe { slice::from_raw_parts(base.as_ptr(), self.len()) },
            None => &[],
        }
    }

    /// The elements as a mutable slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len();

        match self.base() {
            // SAFETY: The block holds `len` live elements, allocated with the alignment of `T`,
            // and the exclusive borrow of `self` guarantees exclusive access.
            Some(base) => unsafe { slice::from_raw_parts_mut(base.as_ptr(), len) },
            None => &mut [],
        }
    }

    /// Ensures room for at least `additional` more elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the memory cannot be allocated. The vector is unchanged.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let required = self.len().checked_add(additional).ok_or(Error::CapacityOverflow)?;
        self.block.reserve(Self::bytes(required)?, false)
    }

    /// Grows the vector with default elements or drops elements off its end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the memory cannot be allocated. The vector is unchanged.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        self.block.resize(Self::bytes(new_len)?, false)
    }

    /// Drops the elements from `new_len` onwards.
    pub fn truncate(&mut self, new_len: usize) {
        if let Ok(bytes) = Self::bytes(new_len) {
            self.block.truncate(bytes);
        }
    }

    /// Drops all elements, keeping the capacity.
    pub fn clear(&mut self) {
        self.block.clear();
    }

    /// Appends an element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the memory cannot be allocated. The vector is unchanged and
    /// `value` is dropped.
    pub fn push(&mut self, value: T) -> Result<()> {
        let len = self.len();
        let new_bytes = Self::bytes(len + 1)?;

        self.block.reserve(new_bytes, false)?;
        let base = self.base().expect("the block owns memory after a successful reservation");

        // SAFETY: The reservation made room for `len + 1` elements.
        let slot = unsafe { base.add(len) };

        // SAFETY: The slot is past the logical region, so it holds no live element.
        unsafe {
            slot.write(value);
        }

        // SAFETY: The slot now holds a live element.
        unsafe {
            self.block.set_len(new_bytes);
        }

        Ok(())
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<T> {
        let last = self.len().checked_sub(1)?;
        let base = self.base()?;

        // SAFETY: The vector shrinks by one element, which is moved out below instead of
        // being dropped.
        unsafe {
            self.block.set_len(last * size_of::<T>());
        }

        // SAFETY: `last` is within the allocation.
        let slot = unsafe { base.add(last) };

        // SAFETY: The slot held a live element that is no longer part of the region.
        Some(unsafe { slot.read() })
    }

    /// Inserts an element at `index`, shifting the following elements right.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the memory cannot be allocated. The vector is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than the length.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        self.insert_default(index, 1)?;
        self.as_mut_slice()[index] = value;
        Ok(())
    }

    /// Inserts `count` default elements at `index`, shifting the following elements right.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the memory cannot be allocated. The vector is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than the length.
    pub fn insert_default(&mut self, index: usize, count: usize) -> Result<()> {
        self.block.insert(Self::bytes(index)?, Self::bytes(count)?)
    }

    /// Drops `count` elements starting at `index`, shifting the following elements left.
    ///
    /// # Panics
    ///
    /// Panics if the range is outside of the vector.
    pub fn erase(&mut self, index: usize, count: usize) {
        let offset = index.checked_mul(size_of::<T>()).expect("index overflows the vector");
        let bytes = count.checked_mul(size_of::<T>()).expect("count overflows the vector");

        self.block
            .erase(offset, bytes)
            .expect("a typed block always owns its memory, so erasing never allocates");
    }

    /// Removes and returns the element at `index`, shifting the following elements left.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> T {
        let value = std::mem::take(&mut self.as_mut_slice()[index]);
        self.erase(index, 1);
        value
    }

    /// Reallocates so that the capacity equals the length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the memory cannot be allocated. The vector is unchanged.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        self.block.shrink_to_fit()
    }
}

impl<T: Default> Default for BlockVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Deref for BlockVec<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: Default> DerefMut for BlockVec<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Default + fmt::Debug> fmt::Debug for BlockVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: Default + PartialEq> PartialEq for BlockVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Default + Eq> Eq for BlockVec<T> {}

/// # Panics
///
/// Panics if the memory for the copy cannot be allocated.
impl<T: Default + Clone> Clone for BlockVec<T> {
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        copy.block
            .reserve(self.block.len(), true)
            .expect("allocation failure while cloning a vector");

        for item in self.as_slice() {
            copy.push(item.clone()).expect("capacity was reserved up front");
        }

        copy
    }
}

/// Written as a native-word element count, the elements and padding up to the next word
/// boundary.
impl<T: Default + StreamWrite> StreamWrite for BlockVec<T> {
    fn stream_size(&self) -> usize {
        let unpadded = size_of::<usize>() + self.iter().map(StreamWrite::stream_size).sum::<usize>();
        unpadded + align::padding(unpadded, DEFAULT_ALIGNMENT)
    }

    fn write_to<P: BoundsPolicy>(&self, w: &mut WriteCursor<'_, P>) -> Result<()> {
        let unpadded = size_of::<usize>() + self.iter().map(StreamWrite::stream_size).sum::<usize>();
        let padding = align::padding(w.pos() + unpadded, DEFAULT_ALIGNMENT);
        w.verify_remaining("write", type_name::<Self>(), unpadded + padding)?;
        w.write_fixed(self.len())?;

        for item in self.as_slice() {
            item.write_to(w)?;
        }

        w.align_default()
    }
}

/// Replaces the contents with freshly constructed elements read from the stream.
impl<T: Default + StreamRead> StreamRead for BlockVec<T> {
    fn read_from<P: BoundsPolicy>(&mut self, r: &mut ReadCursor<'_, P>) -> Result<()> {
        let fresh = r.rewind_on_error(|r| {
            let count = r.read_fixed::<usize>()?;

            // Every element takes at least one byte, which bounds the allocation by the stream.
            r.verify_remaining("read", type_name::<Self>(), count)?;

            let mut fresh = Self::with_len(count)?;
            for item in fresh.as_mut_slice() {
                item.read_from(r)?;
            }

            r.align_default()?;
            Ok(fresh)
        })?;

        *self = fresh;
        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::Checked;
    use crate::testing::{Counted, CountedLedger};

    #[test]
    fn not_thread_safe() {
        assert_not_impl_any!(BlockVec<u32>: Send, Sync);
    }

    #[test]
    fn push_pop() {
        let mut vec = BlockVec::new();

        for i in 0..100_u64 {
            vec.push(i).unwrap();
        }

        assert_eq!(vec.len(), 100);
        assert!(vec.capacity() >= 100);
        assert_eq!(vec[42], 42);
        assert_eq!(vec.pop(), Some(99));
        assert_eq!(vec.len(), 99);
    }

    #[test]
    fn pop_empty() {
        let mut vec = BlockVec::<u8>::new();
        assert_eq!(vec.pop(), None);
    }

    #[test]
    fn growth_moves_non_trivial_elements() {
        let mut vec = BlockVec::new();

        for i in 0..200 {
            vec.push(format!("item {i}")).unwrap();
        }

        assert_eq!(vec[0], "item 0");
        assert_eq!(vec[199], "item 199");
    }

    #[test]
    fn insert_remove() {
        let mut vec = BlockVec::new();
        vec.push(1_u32).unwrap();
        vec.push(3).unwrap();

        vec.insert(1, 2).unwrap();
        vec.insert(3, 4).unwrap();
        assert_eq!(vec.as_slice(), [1, 2, 3, 4]);

        assert_eq!(vec.remove(0), 1);
        assert_eq!(vec.as_slice(), [2, 3, 4]);

        vec.erase(1, 2);
        assert_eq!(vec.as_slice(), [2]);
    }

    #[test]
    fn insert_default_and_resize() {
        let mut vec = BlockVec::<i16>::with_len(2).unwrap();
        vec.as_mut_slice().copy_from_slice(&[5, 6]);

        vec.insert_default(1, 2).unwrap();
        assert_eq!(vec.as_slice(), [5, 0, 0, 6]);

        vec.resize(6).unwrap();
        assert_eq!(vec.as_slice(), [5, 0, 0, 6, 0, 0]);

        vec.resize(1).unwrap();
        assert_eq!(vec.as_slice(), [5]);
    }

    #[test]
    fn hooks_pair_up_across_operations() {
        let ledger = CountedLedger::new();

        {
            let mut vec = BlockVec::<Counted>::new();
            vec.resize(10).unwrap();
            assert_eq!(ledger.live(), 10);

            vec.push(Counted::new(7)).unwrap();
            vec.insert(3, Counted::new(8)).unwrap();
            vec.insert_default(0, 4).unwrap();
            assert_eq!(ledger.live(), 16);

            vec.erase(2, 5);
            assert_eq!(ledger.live(), 11);

            let removed = vec.remove(0);
            drop(removed);
            vec.truncate(6);
            assert_eq!(ledger.live(), 6);

            let popped = vec.pop().unwrap();
            assert_eq!(ledger.live(), 6);
            drop(popped);

            vec.reserve(1000).unwrap();
            vec.shrink_to_fit().unwrap();
            assert_eq!(ledger.live(), 5);
            assert_eq!(vec.capacity(), 5);

            let copy = vec.clone();
            assert_eq!(copy, vec);
            assert_eq!(ledger.live(), 10);
        }

        assert_eq!(ledger.live(), 0);
        assert!(ledger.constructed() > 0);
        ledger.assert_balanced();
    }

    #[test]
    fn values_survive_reallocation() {
        let _ledger = CountedLedger::new();
        let mut vec = BlockVec::new();

        for i in 0..50 {
            vec.push(Counted::new(i)).unwrap();
        }

        assert!(vec.iter().enumerate().all(|(i, c)| c.value() == u32::try_from(i).unwrap()));
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut vec = BlockVec::<u8>::with_len(10).unwrap();
        vec.clear();

        assert!(vec.is_empty());
        assert_eq!(vec.capacity(), 10);
    }

    #[test]
    fn stream_round_trip() {
        let mut outer = BlockVec::<BlockVec<u16>>::new();
        for n in 0..3_u16 {
            let mut inner = BlockVec::new();
            for i in 0..n {
                inner.push(i * 10).unwrap();
            }
            outer.push(inner).unwrap();
        }

        let mut buffer = vec![0_u8; outer.stream_size()];
        let mut w = WriteCursor::<Checked>::new(buffer.as_mut_slice());
        outer.write_to(&mut w).unwrap();
        assert_eq!(w.remaining(), 0);

        let mut r = ReadCursor::<Checked>::new(buffer.as_slice());
        let mut copy = BlockVec::<BlockVec<u16>>::new();
        copy.read_from(&mut r).unwrap();

        assert_eq!(copy, outer);
        assert_eq!(copy[2].as_slice(), [0, 10]);
    }

    #[test]
    fn truncated_read_leaves_cursor_and_contents() {
        let mut bytes = 2_usize.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&7_u32.to_ne_bytes());

        let mut vec = BlockVec::<u32>::new();
        vec.push(1).unwrap();

        let mut r = ReadCursor::<Checked>::new(bytes.as_slice());
        let error = vec.read_from(&mut r).unwrap_err();

        assert!(matches!(error, Error::Bounds(_)));
        assert_eq!(r.pos(), 0);
        assert_eq!(vec.as_slice(), [1]);
    }

    #[test]
    fn absurd_count_fails_without_allocating() {
        let bytes = usize::MAX.to_ne_bytes();
        let mut r = ReadCursor::<Checked>::new(&bytes);

        let mut vec = BlockVec::<u64>::new();
        vec.read_from(&mut r).unwrap_err();

        assert!(vec.is_empty());
    }
}
