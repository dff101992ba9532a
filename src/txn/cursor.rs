//! Cursor
//!
//! Scoped forward iterator over a transaction's ordered key space.

use std::cmp::Ordering as KeyOrdering;
use std::iter::Peekable;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A positioned, forward-only range iterator
///
/// A cursor borrows its transaction, so it cannot outlive it. The engine
/// counts open cursors; the count drops as soon as the cursor does, whether
/// the scan finished, broke early, or unwound on an error.
pub struct Cursor<'t> {
    inner: Box<dyn Iterator<Item = (&'t [u8], &'t [u8])> + 't>,
    open_cursors: &'t AtomicUsize,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(
        inner: impl Iterator<Item = (&'t [u8], &'t [u8])> + 't,
        open_cursors: &'t AtomicUsize,
    ) -> Self {
        open_cursors.fetch_add(1, Ordering::SeqCst);
        Self {
            inner: Box::new(inner),
            open_cursors,
        }
    }
}

impl<'t> Iterator for Cursor<'t> {
    type Item = (&'t [u8], &'t [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Merges a write transaction's pending writes over its base snapshot
///
/// Both inputs are sorted by key; on equal keys the pending value wins.
pub(crate) struct MergeRange<P: Iterator, B: Iterator> {
    pending: Peekable<P>,
    base: Peekable<B>,
}

impl<P: Iterator, B: Iterator> MergeRange<P, B> {
    pub(crate) fn new(pending: P, base: B) -> Self {
        Self {
            pending: pending.peekable(),
            base: base.peekable(),
        }
    }
}

impl<'t, P, B> Iterator for MergeRange<P, B>
where
    P: Iterator<Item = (&'t [u8], &'t [u8])>,
    B: Iterator<Item = (&'t [u8], &'t [u8])>,
{
    type Item = (&'t [u8], &'t [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let order = match (self.pending.peek(), self.base.peek()) {
            (Some(&(p, _)), Some(&(b, _))) => p.cmp(b),
            (Some(_), None) => KeyOrdering::Less,
            (None, Some(_)) => KeyOrdering::Greater,
            (None, None) => return None,
        };

        match order {
            KeyOrdering::Less => self.pending.next(),
            KeyOrdering::Greater => self.base.next(),
            KeyOrdering::Equal => {
                // shadowed by the pending write
                self.base.next();
                self.pending.next()
            }
        }
    }
}
