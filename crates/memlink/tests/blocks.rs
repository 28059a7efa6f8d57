// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
#![allow(missing_docs, reason = "Tests")]

use std::cell::Cell;
use std::rc::Rc;

use memlink::{ALLOCATION_GRANULE, BlockVec, Error, MemBlock, MemView, MemViewMut};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

/// Element that tracks how many instances are alive on the current thread.
#[derive(Debug, PartialEq)]
struct Tracked(u64);

impl Tracked {
    fn new(value: u64) -> Self {
        LIVE.set(LIVE.get() + 1);
        Self(value)
    }
}

impl Default for Tracked {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(self.0)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.set(LIVE.get() - 1);
    }
}

fn live() -> isize {
    LIVE.get()
}

// ===========================================================================
// Owning blocks
// ===========================================================================

mod owning {
    use super::*;

    #[test]
    fn edits_keep_contents_and_capacity_grows_monotonically() {
        let mut block: MemBlock = MemBlock::new();
        let mut shadow = Vec::new();
        let mut last_capacity = 0;

        for round in 0_u8..50 {
            let chunk = [round; 7];
            block.append(&chunk).unwrap();
            shadow.extend_from_slice(&chunk);

            if round % 5 == 0 {
                block.insert(0, 3).unwrap();
                block.copy(0, b"hdr").unwrap();
                shadow = [b"hdr".as_slice(), &shadow].concat();
            }

            if round % 7 == 0 {
                let middle = block.len() / 2;
                block.erase(middle, 2).unwrap();
                shadow.drain(middle..middle + 2);
            }

            assert_eq!(block.as_slice(), shadow.as_slice());
            assert!(block.capacity() >= last_capacity);
            assert!(block.capacity() >= block.len());
            assert_eq!(block.capacity() % ALLOCATION_GRANULE, 0);
            last_capacity = block.capacity();
        }
    }

    #[test]
    fn growth_primes_and_constructs_zeros() {
        let mut block: MemBlock = MemBlock::with_len(10).unwrap();
        assert!(block.iter().all(|&b| b == 0));

        block.fill(0, b"xy", 5).unwrap();
        block.truncate(4);
        block.resize(8, false).unwrap();

        assert_eq!(&*block, b"xyxy\0\0\0\0");
    }

    #[test]
    fn shrink_and_release() {
        let mut block = MemBlock::from_slice(&[1; 200]).unwrap();
        block.truncate(10);
        block.shrink_to_fit().unwrap();
        assert_eq!(block.capacity(), 10);

        block.deallocate();
        assert!(block.is_empty());
        assert!(!block.is_owning());
        assert_eq!(block.capacity(), 0);
    }

    #[test]
    fn oversized_request_fails_cleanly() {
        let mut block = MemBlock::from_slice(b"keep me").unwrap();

        let error = block.reserve(usize::MAX, false).unwrap_err();

        assert!(matches!(error, Error::CapacityOverflow | Error::Alloc { .. }));
        assert_eq!(&*block, b"keep me");
    }

    #[test]
    fn swap_exchanges_everything() {
        let mut a = MemBlock::from_slice(b"first").unwrap();
        let mut b = MemBlock::from_slice(b"second block").unwrap();

        a.swap(&mut b);

        assert_eq!(&*a, b"second block");
        assert_eq!(&*b, b"first");
    }
}

// ===========================================================================
// Linked blocks
// ===========================================================================

mod linked {
    use super::*;

    #[test]
    fn writes_land_in_linked_memory_until_growth() {
        let mut data = *b"0123456789";

        {
            let mut block = MemBlock::linked(&mut data);
            block.copy(0, b"ab").unwrap();
            block.truncate(4);
            assert!(block.is_linked());
        }

        assert_eq!(&data, b"ab23456789");

        let mut block = MemBlock::linked(&mut data);
        block.append(b"!").unwrap();

        assert!(block.is_owning());
        assert_eq!(&*block, b"ab23456789!");
        drop(block);
        assert_eq!(&data, b"ab23456789");
    }

    #[test]
    fn read_only_link_rejects_writes_but_copies_on_growth() {
        let data = b"constant";
        let mut block = MemBlock::linked_const(data);

        assert!(matches!(block.copy(0, b"C"), Err(Error::ReadOnly)));
        assert!(block.as_mut_slice().is_none());

        block.insert(0, 1).unwrap();
        block.copy(0, b">").unwrap();

        assert_eq!(&*block, b">constant");
        assert_eq!(data, b"constant");
    }

    #[test]
    fn copy_link_detaches() {
        let data = [7_u8; 32];
        let mut block = MemBlock::linked_const(&data);

        block.copy_link().unwrap();

        assert!(block.is_owning());
        assert_eq!(block.capacity(), 32);
        assert_ne!(block.as_ptr(), data.as_ptr());
        assert_eq!(block.as_slice(), &data);
    }

    #[test]
    fn views_over_block_memory() {
        let mut block = MemBlock::from_slice(b"hello world").unwrap();

        {
            let mut view: MemViewMut<'_> = block.as_view_mut();
            view.copy_within(6, 0, 5).unwrap();
        }

        let view: MemView<'_> = block.as_view();
        assert_eq!(view.subview(0, 5).as_slice(), b"world");
        assert_eq!(view, MemView::from(&b"world world"[..]));
    }
}

// ===========================================================================
// Typed storage
// ===========================================================================

mod typed {
    use super::*;

    #[test]
    fn every_element_is_dropped_once() {
        let before = live();

        {
            let mut items = BlockVec::new();
            for i in 0..100 {
                items.push(Tracked::new(i)).unwrap();
            }

            items.insert_default(10, 5).unwrap();
            items.erase(0, 20);
            let removed = items.remove(3);
            assert_eq!(removed.0, 18);
            drop(removed);

            items.truncate(50);
            let copy = items.clone();
            assert_eq!(copy, items);

            assert_eq!(live() - before, 100);
        }

        assert_eq!(live(), before);
    }

    #[test]
    fn shared_values_survive_reallocation() {
        let shared = Rc::new(5);
        let mut items = BlockVec::new();

        for _ in 0..1000 {
            items.push(Some(Rc::clone(&shared))).unwrap();
        }

        assert_eq!(Rc::strong_count(&shared), 1001);

        items.resize(10).unwrap();
        assert_eq!(Rc::strong_count(&shared), 11);

        items.clear();
        assert_eq!(Rc::strong_count(&shared), 1);
    }
}

// ===========================================================================
// Files
// ===========================================================================

mod files {
    use super::*;

    #[test]
    fn block_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("block.bin");

        let block = MemBlock::from_slice(&(0..=255).collect::<Vec<u8>>()).unwrap();
        block.write_file(&path, None).unwrap();

        let loaded = MemBlock::read_file(&path).unwrap();
        assert_eq!(loaded, block);
    }

    #[test]
    fn view_write_then_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("view.bin");

        MemView::from("a longer first version").write_file(&path, None).unwrap();
        MemView::from("short").write_file(&path, None).unwrap();

        assert_eq!(&*memlink::read_file(&path).unwrap(), b"short");
    }

    #[test]
    fn missing_directory_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("file.bin");

        let error = MemView::from("data").write_file(&path, None).unwrap_err();

        let Error::Io { operation, path: Some(reported), .. } = &error else {
            panic!("unexpected error: {error}");
        };
        assert_eq!(*operation, "open");
        assert_eq!(reported, &path);

        let io_error = std::io::Error::from(error);
        assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
    }
}
