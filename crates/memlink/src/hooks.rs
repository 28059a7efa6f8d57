// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Construct/destruct strategies that turn type-erased block storage into typed storage.
//!
//! A [`MemBlock`][crate::MemBlock] only knows about bytes. Whenever bytes enter the logical
//! region of the block (growth, insertion) it calls [`RegionHooks::construct`] over them, and
//! whenever bytes leave it (truncation, erasure, deallocation) it calls
//! [`RegionHooks::destruct`]. The hooks are a type parameter of the block, so they are
//! resolved at compile time and cost no indirect calls on the growth path.

use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::constants::{BYTE_BLOCK_ALIGNMENT, POISON_BYTE};

/// Element lifecycle callbacks invoked by a [`MemBlock`][crate::MemBlock] on the bytes that
/// move into or out of its logical region.
///
/// # Safety
///
/// * `ALIGN` must be a power of two and `ELEMENT_SIZE` must be nonzero.
/// * After `construct()` returns, every element in the region must be a valid value.
/// * `destruct()` must leave no live values in the region, and must tolerate being given a
///   region previously filled by `construct()`.
pub unsafe trait RegionHooks {
    /// Alignment of the memory allocated for the block.
    const ALIGN: usize;

    /// Size of one element. Every region passed to the hooks is a multiple of this.
    const ELEMENT_SIZE: usize;

    /// Brings the elements in `bytes` bytes starting at `region` into existence.
    ///
    /// # Safety
    ///
    /// The region must be valid for writes and contain no live elements.
    unsafe fn construct(region: NonNull<u8>, bytes: usize);

    /// Ends the existence of the elements in `bytes` bytes starting at `region`.
    ///
    /// # Safety
    ///
    /// The region must be valid for writes and contain only live elements, which must not be
    /// used again afterwards.
    unsafe fn destruct(region: NonNull<u8>, bytes: usize);

    /// Fills newly allocated capacity that is not yet part of the logical region.
    ///
    /// The default is the best-effort byte pattern: zero in release builds and
    /// [`POISON_BYTE`][crate::POISON_BYTE] in debug builds, so that use of unconstructed
    /// storage is easier to spot.
    ///
    /// # Safety
    ///
    /// The region must be valid for writes and contain no live elements.
    unsafe fn prime_spare(region: NonNull<u8>, bytes: usize) {
        let pattern = if cfg!(debug_assertions) { POISON_BYTE } else { 0 };

        // SAFETY: Forwarding the caller's guarantee that the region is valid for writes.
        unsafe {
            region.as_ptr().write_bytes(pattern, bytes);
        }
    }
}

/// Hooks for untyped byte storage.
///
/// Constructing zero-fills the bytes. Destructing poisons them in debug builds and does
/// nothing in release builds.
#[derive(Debug)]
pub struct ByteHooks;

// SAFETY: Any byte pattern is a valid byte, bytes own nothing and can be copied freely.
unsafe impl RegionHooks for ByteHooks {
    const ALIGN: usize = BYTE_BLOCK_ALIGNMENT;
    const ELEMENT_SIZE: usize = 1;

    unsafe fn construct(region: NonNull<u8>, bytes: usize) {
        // SAFETY: Forwarding the caller's guarantee that the region is valid for writes.
        unsafe {
            region.as_ptr().write_bytes(0, bytes);
        }
    }

    #[cfg_attr(test, mutants::skip)] // Debug-only poisoning, not observable by contract.
    unsafe fn destruct(region: NonNull<u8>, bytes: usize) {
        if cfg!(debug_assertions) {
            // SAFETY: Forwarding the caller's guarantee that the region is valid for writes.
            unsafe {
                region.as_ptr().write_bytes(POISON_BYTE, bytes);
            }
        }
    }
}

/// Hooks that run the constructor (`Default`) and destructor (`Drop`) of `T` for every element.
#[derive(Debug)]
pub struct TypedHooks<T>(PhantomData<fn() -> T>);

// SAFETY: Construction writes a valid `T` into every slot and destruction drops every slot in
// place.
unsafe impl<T: Default> RegionHooks for TypedHooks<T> {
    const ALIGN: usize = align_of::<T>();
    const ELEMENT_SIZE: usize = {
        assert!(size_of::<T>() != 0, "zero-sized elements cannot be stored in a memory block");
        size_of::<T>()
    };

    unsafe fn construct(region: NonNull<u8>, bytes: usize) {
        debug_assert_eq!(bytes % Self::ELEMENT_SIZE, 0);

        let first = region.cast::<T>();

        for index in 0..bytes / Self::ELEMENT_SIZE {
            // SAFETY: The slot is inside the region the caller guarantees to be valid.
            let slot = unsafe { first.add(index) };

            // SAFETY: The caller guarantees the region is valid for writes and holds no live
            // elements, so writing without dropping the previous contents is correct. The block
            // allocates with the alignment of `T` and hands out element-aligned offsets.
            unsafe {
                slot.write(T::default());
            }
        }
    }

    unsafe fn destruct(region: NonNull<u8>, bytes: usize) {
        debug_assert_eq!(bytes % Self::ELEMENT_SIZE, 0);

        let elements = ptr::slice_from_raw_parts_mut(region.cast::<T>().as_ptr(), bytes / Self::ELEMENT_SIZE);

        // SAFETY: The caller guarantees the region holds only live elements that will not be
        // used again.
        unsafe {
            ptr::drop_in_place(elements);
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::mem::MaybeUninit;

    use super::*;
    use crate::testing::{Counted, CountedLedger};

    #[test]
    fn byte_construct_zeroes() {
        let mut bytes = [0xAA_u8; 8];

        // SAFETY: The array is valid for writes of 8 bytes.
        unsafe {
            ByteHooks::construct(NonNull::from(&mut bytes).cast(), 8);
        }

        assert_eq!(bytes, [0; 8]);
    }

    #[test]
    fn byte_destruct_poisons_in_debug() {
        let mut bytes = [0_u8; 4];

        // SAFETY: The array is valid for writes of 4 bytes.
        unsafe {
            ByteHooks::destruct(NonNull::from(&mut bytes).cast(), 4);
        }

        let expected = if cfg!(debug_assertions) { POISON_BYTE } else { 0 };
        assert_eq!(bytes, [expected; 4]);
    }

    #[test]
    fn typed_hooks_pair_up() {
        let ledger = CountedLedger::new();
        let mut slots = [const { MaybeUninit::<Counted>::uninit() }; 3];
        let region = NonNull::from(&mut slots).cast::<u8>();
        let bytes = 3 * size_of::<Counted>();

        // SAFETY: The slots are valid for writes and hold no live elements.
        unsafe {
            TypedHooks::<Counted>::construct(region, bytes);
        }
        assert_eq!(ledger.live(), 3);

        // SAFETY: The slots hold the three live elements constructed above.
        unsafe {
            TypedHooks::<Counted>::destruct(region, bytes);
        }
        assert_eq!(ledger.live(), 0);
        ledger.assert_balanced();
    }

    #[test]
    fn element_layout() {
        assert_eq!(ByteHooks::ELEMENT_SIZE, 1);
        assert_eq!(TypedHooks::<u32>::ELEMENT_SIZE, 4);
        assert_eq!(TypedHooks::<u32>::ALIGN, 4);
    }
}
