// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The binary stream format.
//!
//! Streams are sequences of fixed-width scalars in native byte order, each aligned to its own
//! size (capped at [`DEFAULT_ALIGNMENT`]), and of length-prefixed byte ranges padded up to the
//! next [`DEFAULT_ALIGNMENT`] boundary. Variable-size length markers (see
//! [`WriteCursor::write_varsize()`]) take 1, 4 or 16 bytes when written at an aligned position.

use crate::{BoundsPolicy, DEFAULT_ALIGNMENT, MemBlock, ReadCursor, Result, WriteCursor, align};

/// A type that can be written to a binary stream.
pub trait StreamWrite {
    /// The number of bytes [`write_to()`][Self::write_to] writes when starting at an offset
    /// aligned to [`DEFAULT_ALIGNMENT`].
    fn stream_size(&self) -> usize;

    /// Writes the value at the position of the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot accept the value. Implementations verify the
    /// whole size up front where they can, so a failed write leaves the cursor unmoved.
    fn write_to<P: BoundsPolicy>(&self, w: &mut WriteCursor<'_, P>) -> Result<()>;
}

/// A type whose value can be replaced by one read from a binary stream.
pub trait StreamRead {
    /// Replaces `self` with the value at the position of the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is truncated or the memory to hold the value cannot be
    /// allocated.
    fn read_from<P: BoundsPolicy>(&mut self, r: &mut ReadCursor<'_, P>) -> Result<()>;
}

/// The number of bytes a varsize marker for `value` takes when written at an aligned offset.
#[must_use]
pub fn varsize_stream_size(value: usize) -> usize {
    varsize_size_at(0, value)
}

/// The number of bytes a varsize marker for `value` takes when written at offset `pos`,
/// including any alignment padding inside it.
pub(crate) fn varsize_size_at(pos: usize, value: usize) -> usize {
    if value < usize::from(u8::MAX) {
        return 1;
    }

    let mut end = pos + 1;
    end += align::padding(end, align_of::<u16>()) + size_of::<u16>();

    if value < usize::from(u16::MAX) {
        return end - pos;
    }

    end += align::padding(end, DEFAULT_ALIGNMENT) + size_of::<usize>();
    end - pos
}

macro_rules! impl_stream_scalar {
    ($($t:ty),*) => {
        $(
            impl StreamWrite for $t {
                fn stream_size(&self) -> usize {
                    size_of::<$t>()
                }

                fn write_to<P: BoundsPolicy>(&self, w: &mut WriteCursor<'_, P>) -> Result<()> {
                    w.write_fixed(*self)
                }
            }

            impl StreamRead for $t {
                fn read_from<P: BoundsPolicy>(&mut self, r: &mut ReadCursor<'_, P>) -> Result<()> {
                    *self = r.read_fixed::<$t>()?;
                    Ok(())
                }
            }
        )*
    };
}

impl_stream_scalar!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

/// Writes `value` into a newly allocated block sized to its [`stream_size()`][StreamWrite::stream_size].
///
/// # Errors
///
/// Returns an error if the block cannot be allocated or the value fails to write itself.
pub fn write_to_block<T: StreamWrite + ?Sized>(value: &T) -> Result<MemBlock<'static>> {
    let mut block: MemBlock<'static> = MemBlock::with_len(value.stream_size())?;

    let mut cursor = WriteCursor::<crate::Checked>::new(block.as_view_mut());
    value.write_to(&mut cursor)?;

    Ok(block)
}

/// Reads a value of `T` from the start of `bytes`.
///
/// # Errors
///
/// Returns an error if the bytes do not hold a complete value.
pub fn read_from_slice<T: StreamRead + Default>(bytes: &[u8]) -> Result<T> {
    let mut value = T::default();
    value.read_from(&mut ReadCursor::<crate::Checked>::new(bytes))?;
    Ok(value)
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::Checked;

    #[test]
    fn varsize_sizes_from_aligned_start() {
        assert_eq!(varsize_stream_size(0), 1);
        assert_eq!(varsize_stream_size(254), 1);
        assert_eq!(varsize_stream_size(255), 4);
        assert_eq!(varsize_stream_size(65534), 4);
        assert_eq!(varsize_stream_size(65535), 8 + size_of::<usize>());
        assert_eq!(varsize_stream_size(usize::MAX), 8 + size_of::<usize>());
    }

    #[test]
    fn varsize_size_depends_on_start() {
        assert_eq!(varsize_size_at(1, 300), 3);
        assert_eq!(varsize_size_at(3, 70_000), 5 + size_of::<usize>());
    }

    #[test]
    fn scalars_round_trip() {
        let mut buffer = [0_u8; 32];
        let mut w = WriteCursor::<Checked>::new(&mut buffer);

        1.5_f64.write_to(&mut w).unwrap();
        (-3_i32).write_to(&mut w).unwrap();
        9_u8.write_to(&mut w).unwrap();

        let mut r = ReadCursor::<Checked>::new(&buffer);
        let mut float = 0.0_f64;
        let mut int = 0_i32;
        let mut byte = 0_u8;

        float.read_from(&mut r).unwrap();
        int.read_from(&mut r).unwrap();
        byte.read_from(&mut r).unwrap();

        assert!((float - 1.5).abs() < f64::EPSILON);
        assert_eq!(int, -3);
        assert_eq!(byte, 9);
        assert_eq!(r.pos(), 13);
    }

    #[test]
    fn block_helpers() {
        let block = write_to_block(&0xDEAD_BEEF_u32).unwrap();
        assert_eq!(block.len(), 4);

        let value: u32 = read_from_slice(&block).unwrap();
        assert_eq!(value, 0xDEAD_BEEF);
    }
}
