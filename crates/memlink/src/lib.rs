// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Memory views, owning memory blocks and aligned binary stream cursors.
//!
//! The crate is built from three layers, each adding to the one below:
//!
//! * [`MemView`] is a `(pointer, length)` pair over bytes owned by someone else. It can be
//!   re-pointed at any time and never frees anything.
//! * [`MemViewMut`] adds in-place mutation: copying, pattern fills and shifting bytes around
//!   without changing the length of the view.
//! * [`MemBlock`] owns a growable allocation (or links to external memory until it needs to
//!   grow) and invokes construct/destruct hooks on every byte range that enters or leaves its
//!   logical region. The hooks turn the type-erased block into typed storage, as used by
//!   [`BlockVec<T>`] and [`BlockString`].
//!
//! # Binary streams
//!
//! [`ReadCursor`] and [`WriteCursor`] walk a view front to back, reading or writing
//! fixed-width scalars in native byte order, raw byte ranges, zero-terminated strings and
//! variable-size length markers. Scalars must be aligned to their size (up to
//! [`DEFAULT_ALIGNMENT`]); the cursors skip padding with [`align()`][ReadCursor::align].
//!
//! ```
//! use memlink::{Checked, MemBlock, ReadCursor, StreamRead, StreamWrite, WriteCursor};
//!
//! let payload = MemBlock::from_slice(b"payload")?;
//!
//! let mut stream: MemBlock = MemBlock::with_len(payload.stream_size() + 8)?;
//! let mut writer = WriteCursor::<Checked>::new(stream.as_view_mut());
//! payload.write_to(&mut writer)?;
//! writer.write_fixed(2024_u64)?;
//!
//! let mut reader = ReadCursor::<Checked>::new(stream.as_view());
//! let mut copy: MemBlock = MemBlock::new();
//! copy.read_from(&mut reader)?;
//!
//! assert_eq!(copy, payload);
//! assert_eq!(reader.read_fixed::<u64>()?, 2024);
//! # Ok::<(), memlink::Error>(())
//! ```
//!
//! # Bounds checking
//!
//! Whether a cursor operation that runs past the end of its view returns an error or is only
//! caught by a debug assertion is decided by the [`BoundsPolicy`] type parameter of the cursor:
//! [`Checked`] or [`Unchecked`]. Cursors that do not name a policy use [`DefaultPolicy`], which
//! is [`Checked`] when the `checked` Cargo feature is enabled.
//!
//! # Allocation failures
//!
//! Operations that allocate return [`Error::Alloc`] when the allocator fails and leave the
//! block as it was, so the caller can release memory and retry.
//!
//! # Thread safety
//!
//! None of the types are thread-safe. They are neither `Send` nor `Sync`.

mod block;
mod constants;
mod error;
mod file;
mod hooks;
mod policy;
mod read_adapter;
mod read_cursor;
mod stream;
mod string;
mod vec;
mod view;
mod view_mut;
mod write_adapter;
mod write_cursor;

pub mod align;

pub use block::MemBlock;
pub use constants::{ALLOCATION_GRANULE, DEFAULT_ALIGNMENT, POISON_BYTE};
pub use error::{BoundsViolation, Error, Result};
pub use file::{read_file, write_file};
pub use hooks::{ByteHooks, RegionHooks, TypedHooks};
pub use policy::{BoundsPolicy, Checked, DefaultPolicy, Unchecked};
pub use read_adapter::CursorReader;
pub use read_cursor::ReadCursor;
pub use stream::{StreamRead, StreamWrite, read_from_slice, varsize_stream_size, write_to_block};
pub use string::BlockString;
pub use vec::BlockVec;
pub use view::MemView;
pub use view_mut::MemViewMut;
pub use write_adapter::CursorWriter;
pub use write_cursor::WriteCursor;

#[cfg(test)]
mod testing;
