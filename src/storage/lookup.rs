use std::ops::Range;

use serde::Serialize;

use crate::primitives::bytes::{buf::Cursor, le};
use crate::types::{Element, FlatAdjError, Result, SEPARATOR};

/// Width of one persisted lookup entry: two `i32` offsets.
pub const SPAN_LEN: usize = 2 * le::ELEMENT_LEN;

/// Largest flat-array offset the persisted `i32` lookup can express.
pub const MAX_OFFSET: u64 = i32::MAX as u64;

/// Location of one record in the flat array.
///
/// `start` is the index of the record's first element and `end` is one past its
/// separator, so `end - 1` addresses the separator and the next record starts at `end`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Span {
    /// Index of the first element.
    pub start: u32,
    /// One past the separator.
    pub end: u32,
}

impl Span {
    /// Number of real elements in the record. A span too short to hold its separator
    /// counts as empty.
    pub fn len(&self) -> usize {
        (self.end.saturating_sub(self.start) as usize).saturating_sub(1)
    }

    /// True for a record with no elements (separator only).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements including the separator.
    pub fn with_separator(&self) -> Range<usize> {
        self.start as usize..(self.end as usize).max(self.start as usize)
    }

    /// Elements excluding the separator.
    pub fn values(&self) -> Range<usize> {
        self.start as usize..self.separator_index().max(self.start as usize)
    }

    /// Index of the separator.
    pub fn separator_index(&self) -> usize {
        (self.end as usize).saturating_sub(1)
    }

    /// Appends the persisted `(i32, i32)` form.
    pub fn encode(&self, dst: &mut Vec<u8>) {
        le::put_i32(dst, self.start as i32);
        le::put_i32(dst, self.end as i32);
    }

    /// Decodes one persisted entry, rejecting negative or inverted offsets.
    pub fn decode(src: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(src);
        let start = cur.i32_le()?;
        let end = cur.i32_le()?;
        if start < 0 || end <= start {
            return Err(FlatAdjError::corruption(format!(
                "lookup entry ({start}, {end}) is not a valid span"
            )));
        }
        Ok(Self {
            start: start as u32,
            end: end as u32,
        })
    }
}

/// Running cursor that lays records out in the flat array.
///
/// Shared by the in-memory builder and the streaming file writer. [`OffsetCursor::place`]
/// validates a record completely before advancing, so a rejected record leaves the
/// cursor untouched.
#[derive(Debug, Clone, Default)]
pub struct OffsetCursor {
    next: u64,
    records: u64,
}

impl OffsetCursor {
    /// Cursor positioned at the start of an empty flat array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next record will start at.
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Records placed so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Validates `record` and reserves its span (elements plus separator).
    pub fn place(&mut self, record: &[Element]) -> Result<Span> {
        if record.contains(&SEPARATOR) {
            return Err(FlatAdjError::ReservedElement {
                record: self.records,
            });
        }
        let end = (record.len() as u64)
            .checked_add(1)
            .and_then(|len| self.next.checked_add(len))
            .filter(|end| *end <= MAX_OFFSET)
            .ok_or(FlatAdjError::Overflow("flat array offset exceeds i32::MAX"))?;
        let span = Span {
            start: self.next as u32,
            end: end as u32,
        };
        self.next = end;
        self.records += 1;
        Ok(span)
    }
}
