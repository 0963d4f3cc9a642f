//! In-memory flat store and the range read path over borrowed arrays.

use std::ops::Range;

use super::lookup::Span;
use crate::types::{Element, FlatAdjError, Result, SEPARATOR};

/// A fully materialized store: the flat value array plus its lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatStore {
    data: Vec<Element>,
    lookup: Vec<Span>,
}

impl FlatStore {
    pub(crate) fn from_parts_unchecked(data: Vec<Element>, lookup: Vec<Span>) -> Self {
        Self { data, lookup }
    }

    /// Assembles a store from raw parts, validating every lookup and separator invariant.
    pub fn from_parts(data: Vec<Element>, lookup: Vec<Span>) -> Result<Self> {
        if let Some(issue) = lookup_chain_issues(&lookup, data.len() as u64)
            .into_iter()
            .next()
        {
            return Err(FlatAdjError::Corruption(issue));
        }
        for (id, span) in lookup.iter().enumerate() {
            if data[span.separator_index()] != SEPARATOR {
                return Err(FlatAdjError::corruption(format!(
                    "record {id} is not terminated by a separator"
                )));
            }
            if data[span.values()].contains(&SEPARATOR) {
                return Err(FlatAdjError::corruption(format!(
                    "record {id} contains a separator before its end"
                )));
            }
        }
        Ok(Self { data, lookup })
    }

    /// The flat value array, separators included.
    pub fn data(&self) -> &[Element] {
        &self.data
    }

    /// The lookup table, one span per record.
    pub fn lookup(&self) -> &[Span] {
        &self.lookup
    }

    /// Number of records.
    pub fn vertex_count(&self) -> u64 {
        self.lookup.len() as u64
    }

    /// True when the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Borrowed view of one record's values.
    pub fn record(&self, id: u64) -> Result<&[Element]> {
        check_range(id, id.saturating_add(1), self.vertex_count())?;
        Ok(&self.data[self.lookup[id as usize].values()])
    }

    /// Borrowed views of every record in order.
    pub fn records(&self) -> impl Iterator<Item = &[Element]> + '_ {
        self.lookup.iter().map(|span| &self.data[span.values()])
    }

    /// Decodes records `[start, end)`.
    pub fn read_range(&self, start: u64, end: u64) -> Result<Vec<Vec<Element>>> {
        read_range(&self.data, &self.lookup, start, end)
    }

    /// Decodes a single record.
    pub fn read_one(&self, id: u64) -> Result<Vec<Element>> {
        read_one(&self.data, &self.lookup, id)
    }

    /// Splits the store back into its arrays.
    pub fn into_parts(self) -> (Vec<Element>, Vec<Span>) {
        (self.data, self.lookup)
    }
}

/// Rejects any range that is inverted or reaches past `count`.
///
/// The empty range `count..count` is accepted.
pub fn check_range(start: u64, end: u64, count: u64) -> Result<()> {
    if start > end || end > count {
        return Err(FlatAdjError::Range { start, end, count });
    }
    Ok(())
}

/// Resolves records `[start, end)` to the flat-array range covering them, separators
/// included, from two lookup entries. `None` for an empty record range.
pub fn resolve_range(lookup: &[Span], start: u64, end: u64) -> Result<Option<Range<usize>>> {
    check_range(start, end, lookup.len() as u64)?;
    if start == end {
        return Ok(None);
    }
    let first = lookup[start as usize];
    let last = lookup[end as usize - 1];
    covering(first, last).map(Some)
}

pub(crate) fn covering(first: Span, last: Span) -> Result<Range<usize>> {
    if last.end < first.start {
        return Err(FlatAdjError::corruption(format!(
            "lookup span ends at {} before range start {}",
            last.end, first.start
        )));
    }
    Ok(first.start as usize..last.end as usize)
}

/// Reads records `[start, end)` out of borrowed arrays.
///
/// The range is checked before `data` is touched. Exactly `end - start` records are
/// returned, in order.
pub fn read_range(
    data: &[Element],
    lookup: &[Span],
    start: u64,
    end: u64,
) -> Result<Vec<Vec<Element>>> {
    let Some(range) = resolve_range(lookup, start, end)? else {
        return Ok(Vec::new());
    };
    let chunk = data.get(range.clone()).ok_or_else(|| {
        FlatAdjError::corruption(format!(
            "lookup range {}..{} exceeds flat array of {} elements",
            range.start,
            range.end,
            data.len()
        ))
    })?;
    split_records(chunk, (end - start) as usize)
}

/// Reads a single record; equivalent to unwrapping `read_range(id, id + 1)`.
pub fn read_one(data: &[Element], lookup: &[Span], id: u64) -> Result<Vec<Element>> {
    let mut records = read_range(data, lookup, id, id.saturating_add(1))?;
    records
        .pop()
        .ok_or_else(|| FlatAdjError::corruption(format!("record {id} decoded to nothing")))
}

/// Splits a separator-terminated chunk back into records.
///
/// The chunk must hold exactly `expected` records and end on a separator.
pub fn split_records(chunk: &[Element], expected: usize) -> Result<Vec<Vec<Element>>> {
    if chunk.last().is_some_and(|v| *v != SEPARATOR) {
        return Err(FlatAdjError::corruption(
            "range does not end on a record separator",
        ));
    }
    let mut records = Vec::with_capacity(expected);
    let mut current = Vec::new();
    for &value in chunk {
        if value == SEPARATOR {
            records.push(std::mem::take(&mut current));
        } else {
            current.push(value);
        }
    }
    if records.len() != expected {
        return Err(FlatAdjError::corruption(format!(
            "range decoded to {} records, expected {expected}",
            records.len()
        )));
    }
    Ok(records)
}

/// Incremental check of the lookup chain: first span at 0, each span starting where the
/// previous ended, no zero-width span, and the last span ending at the data length.
#[derive(Debug, Default)]
pub(crate) struct ChainCheck {
    expected_start: u64,
}

impl ChainCheck {
    pub(crate) fn observe(&mut self, id: u64, span: Span, issues: &mut Vec<String>) {
        if u64::from(span.start) != self.expected_start {
            issues.push(format!(
                "record {id} starts at {} but the previous record ended at {}",
                span.start, self.expected_start
            ));
        }
        if span.end <= span.start {
            issues.push(format!(
                "record {id} has an empty span ({}, {})",
                span.start, span.end
            ));
        }
        self.expected_start = u64::from(span.end);
    }

    pub(crate) fn finish(self, elements: u64, issues: &mut Vec<String>) {
        if self.expected_start != elements {
            issues.push(format!(
                "lookup covers {} elements but the flat array holds {elements}",
                self.expected_start
            ));
        }
    }
}

pub(crate) fn lookup_chain_issues(lookup: &[Span], elements: u64) -> Vec<String> {
    let mut issues = Vec::new();
    let mut chain = ChainCheck::default();
    for (id, span) in lookup.iter().enumerate() {
        chain.observe(id as u64, *span, &mut issues);
    }
    chain.finish(elements, &mut issues);
    issues
}
