// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, Write};

use crate::{BoundsPolicy, WriteCursor};

/// Adapter that implements [`Write`] for [`WriteCursor`].
///
/// Create an instance via [`WriteCursor::writer()`][1].
///
/// Writes are short once the view fills up and return `Ok(0)` when no room remains, which
/// [`Write::write_all()`] reports as [`io::ErrorKind::WriteZero`]. Writing through a view linked
/// to immutable memory fails with [`io::ErrorKind::Other`].
///
/// [1]: crate::WriteCursor::writer
#[derive(Debug)]
pub struct CursorWriter<'c, 'a, P: BoundsPolicy> {
    inner: &'c mut WriteCursor<'a, P>,
}

impl<'c, 'a, P: BoundsPolicy> CursorWriter<'c, 'a, P> {
    #[must_use]
    pub(crate) const fn new(inner: &'c mut WriteCursor<'a, P>) -> Self {
        Self { inner }
    }
}

impl<P: BoundsPolicy> Write for CursorWriter<'_, '_, P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let to_write = buf.len().min(self.inner.remaining());

        self.inner.write(&buf[..to_write])?;
        Ok(to_write)
    }

    #[cfg_attr(test, mutants::skip)] // Nothing is buffered, so there is nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Checked, MemViewMut};

    #[test]
    fn writes_until_full() {
        let mut buffer = [0_u8; 8];
        let mut cursor = WriteCursor::<Checked>::new(&mut buffer);
        let mut writer = cursor.writer();

        assert_eq!(writer.write(b"12345").unwrap(), 5);
        assert_eq!(writer.write(b"6789").unwrap(), 3);
        assert_eq!(writer.write(b"0").unwrap(), 0);
        writer.flush().unwrap();

        assert_eq!(cursor.pos(), 8);
        assert_eq!(&buffer, b"12345678");
    }

    #[test]
    fn write_all_overflow() {
        let mut buffer = [0_u8; 4];
        let mut cursor = WriteCursor::<Checked>::new(&mut buffer);

        let error = cursor.writer().write_all(b"too long").unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn formatted_output() {
        let mut buffer = [0_u8; 16];
        let mut cursor = WriteCursor::<Checked>::new(&mut buffer);

        write!(cursor.writer(), "{}-{}", 12, "ab").unwrap();

        assert_eq!(cursor.written(), b"12-ab");
    }

    #[test]
    fn read_only_view_fails() {
        let buffer = [0_u8; 4];
        let mut cursor = WriteCursor::<Checked>::new(MemViewMut::from_const(&buffer));

        let error = cursor.writer().write(b"x").unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::Other);
    }
}
