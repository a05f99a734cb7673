//! Counting the records in a key range.
//!
//! The engine has no count primitive, so a count is a walk: position the
//! cursor on the first record satisfying the left bound with `search_near`
//! (or `next` from the start), then step forward with `next` until a key
//! fails the right bound. Cost is linear in the number of records counted.
//! The cursor is always reset afterwards.

use crate::cursor::{found, Cursor};
use crate::error::CoreResult;
use std::cmp::Ordering;
use std::ops::{Bound, RangeBounds};
use tracing::trace;
use wiredbind_native::{NativeCursor, NativeResult};

/// One edge of a key range.
///
/// A bound with an empty key places no restriction, the same as an absent
/// bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBound<'a> {
    key: &'a [u8],
    inclusive: bool,
}

impl<'a> KeyBound<'a> {
    /// A bound that includes `key`.
    #[must_use]
    pub fn inclusive<K: AsRef<[u8]> + ?Sized>(key: &'a K) -> Self {
        Self {
            key: key.as_ref(),
            inclusive: true,
        }
    }

    /// A bound that excludes `key`.
    #[must_use]
    pub fn exclusive<K: AsRef<[u8]> + ?Sized>(key: &'a K) -> Self {
        Self {
            key: key.as_ref(),
            inclusive: false,
        }
    }

    /// The bounding key.
    #[must_use]
    pub fn key(&self) -> &'a [u8] {
        self.key
    }

    /// Whether the bounding key itself is in range.
    #[must_use]
    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }

    fn from_bound(bound: Bound<&'a [u8]>) -> Option<Self> {
        match bound {
            Bound::Included(key) => Some(Self::inclusive(key)),
            Bound::Excluded(key) => Some(Self::exclusive(key)),
            Bound::Unbounded => None,
        }
    }

    /// Returns true if a key ordered `ord` against this bound's key is within
    /// it when the bound is used as an upper limit.
    fn admits_from_below(&self, ord: Ordering) -> bool {
        match ord {
            Ordering::Less => true,
            Ordering::Equal => self.inclusive,
            Ordering::Greater => false,
        }
    }
}

fn effective(bound: Option<KeyBound<'_>>) -> Option<KeyBound<'_>> {
    bound.filter(|b| !b.key.is_empty())
}

/// Moves to the first record satisfying `left`. Returns false if there is
/// none.
fn seek_start(cursor: &mut dyn NativeCursor, left: Option<KeyBound<'_>>) -> NativeResult<bool> {
    let Some(left) = left else {
        cursor.reset()?;
        return found(cursor.next());
    };
    cursor.set_key(left.key);
    let exact = match cursor.search_near() {
        Ok(exact) => exact,
        Err(status) if status.is_not_found() => return Ok(false),
        Err(status) => return Err(status),
    };
    if exact > 0 || (exact == 0 && left.inclusive) {
        Ok(true)
    } else {
        // On a smaller key, or on an excluded left key.
        found(cursor.next())
    }
}

fn count_positioned(
    cursor: &mut dyn NativeCursor,
    left: Option<KeyBound<'_>>,
    right: Option<KeyBound<'_>>,
) -> NativeResult<u64> {
    if !seek_start(cursor, left)? {
        return Ok(0);
    }
    let mut count = 0;
    loop {
        if let Some(right) = right {
            if !right.admits_from_below(cursor.compare_key(right.key)?) {
                break;
            }
        }
        count += 1;
        if !found(cursor.next())? {
            break;
        }
    }
    Ok(count)
}

/// Counts the records between `left` and `right` and resets the cursor.
///
/// An error from the count takes precedence over an error from the reset.
pub(crate) fn count_records(
    cursor: &mut dyn NativeCursor,
    left: Option<KeyBound<'_>>,
    right: Option<KeyBound<'_>>,
) -> NativeResult<u64> {
    let counted = count_positioned(cursor, effective(left), effective(right));
    let reset = cursor.reset();
    let count = counted?;
    reset?;
    Ok(count)
}

impl Cursor {
    /// Counts the records with keys between `left` and `right`.
    ///
    /// `None` leaves that side unbounded. The cursor is unpositioned
    /// afterwards, whether or not the count succeeds.
    ///
    /// # Errors
    ///
    /// Returns the engine error if a cursor operation fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use wiredbind_core::{Connection, KeyBound};
    /// use wiredbind_native::MemoryEngine;
    ///
    /// let conn = Connection::open(MemoryEngine::new(), "db", "create").unwrap();
    /// let mut session = conn.open_session("").unwrap();
    /// session.create("table:t", "").unwrap();
    /// let mut cursor = session.open_cursor("table:t", "").unwrap();
    /// for key in ["a", "b", "c", "d"] {
    ///     cursor.insert(key.as_bytes(), b"v").unwrap();
    /// }
    ///
    /// let left = Some(KeyBound::inclusive("b"));
    /// let right = Some(KeyBound::exclusive("d"));
    /// assert_eq!(cursor.total_count(left, right).unwrap(), 2);
    /// ```
    pub fn total_count(
        &mut self,
        left: Option<KeyBound<'_>>,
        right: Option<KeyBound<'_>>,
    ) -> CoreResult<u64> {
        let count = self.with_native(|c| count_records(c, left, right))?;
        trace!(uri = %self.uri(), count, "range counted");
        Ok(count)
    }

    /// Counts the records with keys in `range`.
    ///
    /// ```rust
    /// # use wiredbind_core::Connection;
    /// # use wiredbind_native::MemoryEngine;
    /// # let conn = Connection::open(MemoryEngine::new(), "db", "create").unwrap();
    /// # let mut session = conn.open_session("").unwrap();
    /// # session.create("table:t", "").unwrap();
    /// # let mut cursor = session.open_cursor("table:t", "").unwrap();
    /// # for key in ["a", "b", "c", "d"] {
    /// #     cursor.insert(key.as_bytes(), b"v").unwrap();
    /// # }
    /// assert_eq!(cursor.total_count_range("b".."d").unwrap(), 2);
    /// assert_eq!(cursor.total_count_range("b"..="d").unwrap(), 3);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the engine error if a cursor operation fails.
    pub fn total_count_range<K, R>(&mut self, range: R) -> CoreResult<u64>
    where
        K: AsRef<[u8]>,
        R: RangeBounds<K>,
    {
        let left = KeyBound::from_bound(range.start_bound().map(<K as AsRef<[u8]>>::as_ref));
        let right = KeyBound::from_bound(range.end_bound().map(<K as AsRef<[u8]>>::as_ref));
        self.total_count(left, right)
    }
}
