//! Dense renumbering of a sparse, undirected edge list.
//!
//! Remapping runs in two explicit stages over a frozen, ordered adjacency relation:
//!
//! 1. every vertex with at least one neighbor receives a dense ID, in ascending order of
//!    its original ID;
//! 2. every neighbor list is rewritten through the completed [`RemapTable`] and re-sorted.
//!
//! Because both the relation and its neighbor lists are sorted before stage one, the
//! result depends only on the multiset of edges, never on input line order.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::ingest::Edge;
use crate::types::{DenseId, Element, FlatAdjError, Result, VertexId};

/// Symmetric adjacency relation keyed by original vertex ID.
#[derive(Debug, Default, Clone)]
pub struct Adjacency {
    map: BTreeMap<VertexId, Vec<VertexId>>,
}

impl Adjacency {
    /// Builds the relation from already-parsed edges.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = Edge>,
    {
        let mut adjacency = Self::default();
        for edge in edges {
            adjacency.insert(edge);
        }
        adjacency
    }

    /// Builds the relation from a fallible edge stream, stopping at the first error.
    pub fn try_from_edges<I>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Edge>>,
    {
        let mut adjacency = Self::default();
        for edge in edges {
            adjacency.insert(edge?);
        }
        Ok(adjacency)
    }

    fn insert(&mut self, edge: Edge) {
        self.map.entry(edge.from).or_default().push(edge.to);
        // a self-loop is its own mirror
        if edge.from != edge.to {
            self.map.entry(edge.to).or_default().push(edge.from);
        }
    }

    /// Number of vertices present as keys.
    pub fn vertex_count(&self) -> usize {
        self.map.len()
    }

    /// Total neighbor entries across all vertices.
    pub fn entry_count(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    /// Neighbors of `vertex` in insertion order, if it has any.
    pub fn neighbors(&self, vertex: VertexId) -> Option<&[VertexId]> {
        self.map.get(&vertex).map(Vec::as_slice)
    }

    /// Sorts every neighbor list and freezes the relation for remapping.
    pub fn freeze(mut self) -> FrozenAdjacency {
        for neighbors in self.map.values_mut() {
            neighbors.sort_unstable();
        }
        FrozenAdjacency { map: self.map }
    }
}

/// Adjacency relation with sorted keys and sorted neighbor lists. Read-only.
#[derive(Debug, Clone)]
pub struct FrozenAdjacency {
    map: BTreeMap<VertexId, Vec<VertexId>>,
}

impl FrozenAdjacency {
    /// Iterates vertices in ascending original-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &[VertexId])> + '_ {
        self.map.iter().map(|(v, n)| (*v, n.as_slice()))
    }

    /// Stage one: assigns dense IDs to every vertex with a non-empty neighbor list.
    pub fn assign_ids(&self) -> Result<RemapTable> {
        let mut originals = Vec::with_capacity(self.map.len());
        for (vertex, neighbors) in &self.map {
            if neighbors.is_empty() {
                continue;
            }
            DenseId::from_index(originals.len())?;
            originals.push(*vertex);
        }
        Ok(RemapTable { originals })
    }

    /// Stage two: rewrites neighbor lists through a completed table.
    pub fn rewrite(&self, table: &RemapTable) -> Result<Vec<Vec<DenseId>>> {
        let mut records = Vec::with_capacity(table.len());
        for (vertex, neighbors) in &self.map {
            if neighbors.is_empty() {
                continue;
            }
            let mut dense = neighbors
                .iter()
                .map(|n| {
                    table.dense(*n).ok_or_else(|| {
                        FlatAdjError::corruption(format!(
                            "neighbor {n} of vertex {vertex} has no dense id"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            dense.sort_unstable();
            records.push(dense);
        }
        Ok(records)
    }
}

/// Bijection between surviving original IDs and dense IDs.
///
/// Dense IDs are handed out in ascending original order, so the table is a sorted array
/// of originals where a vertex's dense ID is its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    originals: Vec<VertexId>,
}

impl RemapTable {
    /// Dense ID for an original vertex, if it survived.
    pub fn dense(&self, vertex: VertexId) -> Option<DenseId> {
        self.originals
            .binary_search(&vertex)
            .ok()
            .map(|idx| DenseId(idx as u32))
    }

    /// Original vertex for a dense ID.
    pub fn original(&self, id: DenseId) -> Option<VertexId> {
        self.originals.get(id.index()).copied()
    }

    /// Number of dense IDs.
    pub fn len(&self) -> usize {
        self.originals.len()
    }

    /// True when no vertex survived.
    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// `(original, dense)` pairs in ascending order of both.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, DenseId)> + '_ {
        self.originals
            .iter()
            .enumerate()
            .map(|(idx, v)| (*v, DenseId(idx as u32)))
    }
}

/// Output of [`remap`]: one sorted neighbor record per dense ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemappedGraph {
    table: RemapTable,
    records: Vec<Vec<DenseId>>,
}

impl RemappedGraph {
    /// Table used for the renumbering.
    pub fn table(&self) -> &RemapTable {
        &self.table
    }

    /// Number of dense vertices.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted dense neighbors of `id`.
    pub fn neighbors(&self, id: DenseId) -> Option<&[DenseId]> {
        self.records.get(id.index()).map(Vec::as_slice)
    }

    /// `(dense_id, neighbors)` in ascending dense-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (DenseId, &[DenseId])> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(idx, n)| (DenseId(idx as u32), n.as_slice()))
    }

    /// Records as store elements, ready for a store builder.
    pub fn records(&self) -> impl Iterator<Item = Vec<Element>> + '_ {
        self.records
            .iter()
            .map(|n| n.iter().map(|id| id.as_element()).collect())
    }
}

/// Remaps already-parsed edges.
pub fn remap<I>(edges: I) -> Result<RemappedGraph>
where
    I: IntoIterator<Item = Edge>,
{
    remap_adjacency(Adjacency::from_edges(edges))
}

/// Remaps a fallible edge stream such as an [`crate::ingest::EdgeReader`].
pub fn remap_stream<I>(edges: I) -> Result<RemappedGraph>
where
    I: IntoIterator<Item = Result<Edge>>,
{
    remap_adjacency(Adjacency::try_from_edges(edges)?)
}

fn remap_adjacency(adjacency: Adjacency) -> Result<RemappedGraph> {
    let input_vertices = adjacency.vertex_count();
    let entries = adjacency.entry_count();
    let frozen = adjacency.freeze();

    let table = frozen.assign_ids()?;
    debug!(
        input_vertices,
        dense_vertices = table.len(),
        "remap.assign_ids"
    );
    let records = frozen.rewrite(&table)?;
    info!(
        vertices = records.len(),
        neighbor_entries = entries,
        "remap.completed"
    );
    Ok(RemappedGraph { table, records })
}
