use super::flat::FlatStore;
use super::lookup::{OffsetCursor, Span};
use crate::types::{Element, Result, SEPARATOR};

/// Builds a [`FlatStore`] in memory, one record at a time.
///
/// Records are laid out in push order: the elements, then [`SEPARATOR`]. A record that
/// fails validation is not appended, so the builder stays consistent after an error.
#[derive(Debug, Default)]
pub struct StoreBuilder {
    data: Vec<Element>,
    lookup: Vec<Span>,
    cursor: OffsetCursor,
}

impl StoreBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty builder with room for `records` records totalling `elements` elements,
    /// separators included.
    pub fn with_capacity(records: usize, elements: usize) -> Self {
        Self {
            data: Vec::with_capacity(elements),
            lookup: Vec::with_capacity(records),
            cursor: OffsetCursor::new(),
        }
    }

    /// Appends one record and returns its span.
    pub fn push_record(&mut self, record: &[Element]) -> Result<Span> {
        let span = self.cursor.place(record)?;
        self.data.extend_from_slice(record);
        self.data.push(SEPARATOR);
        self.lookup.push(span);
        Ok(span)
    }

    /// Records pushed so far.
    pub fn vertex_count(&self) -> u64 {
        self.lookup.len() as u64
    }

    /// Flat-array length so far.
    pub fn element_count(&self) -> u64 {
        self.data.len() as u64
    }

    /// Consumes the builder.
    pub fn finish(self) -> FlatStore {
        FlatStore::from_parts_unchecked(self.data, self.lookup)
    }
}

/// Builds a store from an ordered sequence of records.
pub fn build<I, R>(records: I) -> Result<FlatStore>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[Element]>,
{
    let mut builder = StoreBuilder::new();
    for record in records {
        builder.push_record(record.as_ref())?;
    }
    Ok(builder.finish())
}
