// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Any error that may arise from the memory views, blocks and stream cursors of this crate.
///
/// Programmer errors that cannot be meaningfully recovered from (e.g. linking a null pointer
/// with a nonzero length or reading a misaligned fixed-width value) panic instead.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The allocator could not provide a buffer of the requested size.
    ///
    /// The block that attempted to grow is left unchanged, so the caller may free other
    /// memory and try again.
    #[error("failed to allocate {requested} bytes")]
    Alloc {
        /// The number of bytes that was requested from the allocator.
        requested: usize,
    },

    /// A size calculation exceeded the range of `usize`.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// A cursor operation would have crossed the boundary of the underlying view.
    ///
    /// Only reported by cursors using the [`Checked`][crate::Checked] policy.
    #[error(transparent)]
    Bounds(#[from] BoundsViolation),

    /// A mutation was attempted through a view linked to immutable memory.
    #[error("the view is linked to read-only memory")]
    ReadOnly,

    /// An operating system call failed.
    #[error("{operation} failed{}: {source}", path_suffix(.path.as_ref()))]
    Io {
        /// The name of the failing operation, e.g. `"open"` or `"read"`.
        operation: &'static str,

        /// The file the operation was performed on, if any.
        path: Option<PathBuf>,

        /// The error reported by the operating system.
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: Some(path.into()),
            source,
        }
    }

    /// The `errno`-equivalent code of an OS-level failure, if this is one and the
    /// operating system reported a code.
    #[must_use]
    pub fn os_error_code(&self) -> Option<i32> {
        match self {
            Self::Io { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

fn path_suffix(path: Option<&PathBuf>) -> String {
    path.map_or_else(String::new, |p| format!(" for {}", p.display()))
}

/// A specialized `Result` for memory and stream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Describes a cursor operation that would have crossed the boundary of its view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundsViolation {
    /// The name of the cursor operation, e.g. `"read"` or `"seek"`.
    pub operation: &'static str,

    /// The type the operation was reading or writing.
    pub type_name: &'static str,

    /// Cursor position at the time of the operation.
    pub offset: usize,

    /// Number of bytes the operation required.
    pub requested: usize,

    /// Number of bytes that remained in the view.
    pub available: usize,
}

impl fmt::Display for BoundsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} at offset {} requires {} bytes but only {} are available",
            self.operation, self.type_name, self.offset, self.requested, self.available
        )
    }
}

impl std::error::Error for BoundsViolation {}

/// Represents a memory or stream error as a standard I/O error.
///
/// Used by the [`std::io`] adapters of the stream cursors.
impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io { source, .. } => source,
            Error::Bounds(_) => Self::new(std::io::ErrorKind::UnexpectedEof, value),
            Error::Alloc { .. } => Self::new(std::io::ErrorKind::OutOfMemory, value),
            _ => Self::other(value),
        }
    }
}
