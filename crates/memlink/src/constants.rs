// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The default alignment grain of stream cursors, equal to the native word size.
///
/// Length prefixes are written as native words, so every block in a stream starts and
/// ends on a multiple of this value.
pub const DEFAULT_ALIGNMENT: usize = size_of::<usize>();

/// Non-exact reservations round the requested capacity up to a multiple of this value.
pub const ALLOCATION_GRANULE: usize = 64;

/// Byte pattern written over released or not-yet-constructed memory in debug builds.
///
/// Reading this pattern back from a block is a strong hint that the caller is using
/// memory outside of the logical region of the block.
pub const POISON_BYTE: u8 = 0xCD;

/// Alignment of the memory allocated by a block of bytes.
///
/// This is at least the alignment of any fixed-width scalar a cursor reads or writes,
/// so that aligned stream positions are also aligned addresses.
pub(crate) const BYTE_BLOCK_ALIGNMENT: usize = 16;

/// Sentinel byte that introduces a 16-bit varsize value.
pub(crate) const VARSIZE_U8_SENTINEL: u8 = u8::MAX;

/// Sentinel value that introduces a full-width varsize value.
pub(crate) const VARSIZE_U16_SENTINEL: u16 = u16::MAX;
