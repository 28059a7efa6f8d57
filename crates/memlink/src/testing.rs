// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An instrumented element type that records every construction and destruction, so tests can
//! verify that typed blocks pair them up exactly.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };

    /// Per element identity: (constructions, destructions).
    static LEDGER: RefCell<HashMap<u64, (u32, u32)>> = RefCell::new(HashMap::new());
}

/// Element whose every instance has a unique identity tracked in a thread-local ledger.
///
/// `Default` and `Clone` count as constructions, `Drop` as destruction. Equality compares
/// values only.
#[derive(Debug)]
pub(crate) struct Counted {
    id: u64,
    value: u32,
}

impl Counted {
    pub(crate) fn new(value: u32) -> Self {
        let id = NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });

        LEDGER.with_borrow_mut(|ledger| ledger.entry(id).or_default().0 += 1);

        Self { id, value }
    }

    pub(crate) const fn value(&self) -> u32 {
        self.value
    }
}

impl Default for Counted {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        Self::new(self.value)
    }
}

impl PartialEq for Counted {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        LEDGER.with_borrow_mut(|ledger| ledger.entry(self.id).or_default().1 += 1);
    }
}

/// Clears the ledger of the current thread on creation and queries it afterwards.
#[derive(Debug)]
pub(crate) struct CountedLedger;

impl CountedLedger {
    pub(crate) fn new() -> Self {
        LEDGER.with_borrow_mut(HashMap::clear);
        Self
    }

    /// Number of instances constructed but not yet destructed.
    pub(crate) fn live(&self) -> usize {
        LEDGER.with_borrow(|ledger| ledger.values().filter(|(constructed, destructed)| constructed > destructed).count())
    }

    /// Number of instances ever constructed.
    pub(crate) fn constructed(&self) -> usize {
        LEDGER.with_borrow(HashMap::len)
    }

    /// Asserts that every instance was constructed once and destructed once.
    pub(crate) fn assert_balanced(&self) {
        LEDGER.with_borrow(|ledger| {
            for (id, counts) in ledger {
                assert_eq!(*counts, (1, 1), "element {id} was constructed and destructed {counts:?} times");
            }
        });
    }
}
