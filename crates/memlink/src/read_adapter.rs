// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, BufRead, Read};

use crate::{BoundsPolicy, ReadCursor};

/// Adapter that implements [`Read`] and [`BufRead`] for [`ReadCursor`].
///
/// Create an instance via [`ReadCursor::reader()`][1].
///
/// The cursor already reads from contiguous memory, so this adapter implements [`BufRead`]
/// directly without an intermediate buffer. Prefer this over wrapping in
/// [`std::io::BufReader`]. Reads never fail; they return fewer bytes at the end of the view.
///
/// [1]: crate::ReadCursor::reader
#[derive(Debug)]
pub struct CursorReader<'c, 'a, P: BoundsPolicy> {
    inner: &'c mut ReadCursor<'a, P>,
}

impl<'c, 'a, P: BoundsPolicy> CursorReader<'c, 'a, P> {
    #[must_use]
    pub(crate) const fn new(inner: &'c mut ReadCursor<'a, P>) -> Self {
        Self { inner }
    }
}

impl<P: BoundsPolicy> Read for CursorReader<'_, '_, P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.inner.remaining_slice();
        let to_read = buf.len().min(available.len());

        buf[..to_read].copy_from_slice(&available[..to_read]);
        self.inner.advance(to_read);
        Ok(to_read)
    }
}

impl<P: BoundsPolicy> BufRead for CursorReader<'_, '_, P> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(self.inner.remaining_slice())
    }

    fn consume(&mut self, amount: usize) {
        self.inner.advance(amount.min(self.inner.remaining()));
    }
}
