// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! How cursors react to operations that would cross the boundary of their view.
//!
//! The policy is a type parameter of [`ReadCursor`][crate::ReadCursor] and
//! [`WriteCursor`][crate::WriteCursor], so the choice costs nothing at runtime. The `checked`
//! Cargo feature selects which policy [`DefaultPolicy`] refers to.

use crate::{BoundsViolation, Result};

/// Decides what happens when a cursor operation requires more bytes than remain in the view.
pub trait BoundsPolicy {
    /// Verifies that `requested` bytes fit into the `available` bytes remaining at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bounds`][crate::Error::Bounds] if the policy reports violations and
    /// the request does not fit.
    fn verify(operation: &'static str, type_name: &'static str, offset: usize, requested: usize, available: usize) -> Result<()>;
}

/// Every violation is reported as [`Error::Bounds`][crate::Error::Bounds] and the cursor is
/// left where it was.
#[derive(Debug)]
pub struct Checked;

impl BoundsPolicy for Checked {
    #[inline]
    fn verify(operation: &'static str, type_name: &'static str, offset: usize, requested: usize, available: usize) -> Result<()> {
        if requested <= available {
            return Ok(());
        }

        Err(BoundsViolation {
            operation,
            type_name,
            offset,
            requested,
            available,
        }
        .into())
    }
}

/// Violations are caught by debug assertions only.
///
/// In release builds an operation that violates the bounds panics at the point where the view
/// is indexed, or, for positioning operations, clamps the cursor to the end of the view.
#[derive(Debug)]
pub struct Unchecked;

impl BoundsPolicy for Unchecked {
    #[inline]
    #[cfg_attr(test, mutants::skip)] // Debug assertion only, mutations are not observable in release.
    fn verify(operation: &'static str, type_name: &'static str, offset: usize, requested: usize, available: usize) -> Result<()> {
        debug_assert!(
            requested <= available,
            "{operation} of {type_name} at offset {offset} requires {requested} bytes but only {available} are available"
        );

        Ok(())
    }
}

/// The policy used by cursors that do not name one: [`Checked`] if the `checked` feature is
/// enabled, otherwise [`Unchecked`].
#[cfg(feature = "checked")]
pub type DefaultPolicy = Checked;

/// The policy used by cursors that do not name one: [`Checked`] if the `checked` feature is
/// enabled, otherwise [`Unchecked`].
#[cfg(not(feature = "checked"))]
pub type DefaultPolicy = Unchecked;
