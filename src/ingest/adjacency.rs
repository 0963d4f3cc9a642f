use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::Path;

use crate::remap::RemappedGraph;
use crate::types::{Element, FlatAdjError, Result, SEPARATOR};

/// Writes one `id n1 n2 ...` line.
pub fn write_record_line<W: Write>(out: &mut W, id: u64, record: &[Element]) -> Result<()> {
    write!(out, "{id}")?;
    for value in record {
        write!(out, " {value}")?;
    }
    writeln!(out)?;
    Ok(())
}

/// Writes a remapped graph as adjacency-list text, returning the number of lines written.
pub fn write_adjacency<W: Write>(graph: &RemappedGraph, out: &mut W) -> Result<u64> {
    let mut lines = 0u64;
    let mut scratch: Vec<Element> = Vec::new();
    for (id, neighbors) in graph.iter() {
        scratch.clear();
        scratch.extend(neighbors.iter().map(|n| n.as_element()));
        write_record_line(out, u64::from(id.0), &scratch)?;
        lines += 1;
    }
    out.flush()?;
    Ok(lines)
}

/// Streams records out of adjacency-list text.
///
/// Each line must start with its own record position (`0`, `1`, ...); the remaining
/// tokens are the record's elements, any `i32` except [`SEPARATOR`]. An empty record is a
/// bare `id` line, so a blank line is a [`FlatAdjError::Parse`] error like any other
/// malformed line.
pub struct AdjacencyReader<R> {
    lines: Lines<R>,
    line_no: usize,
    next_id: u64,
}

impl<R: BufRead> AdjacencyReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            next_id: 0,
        }
    }
}

impl AdjacencyReader<BufReader<File>> {
    /// Opens an adjacency-list file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for AdjacencyReader<R> {
    type Item = Result<Vec<Element>>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(err) => return Some(Err(FlatAdjError::from(err))),
        };
        self.line_no += 1;
        let parsed = parse_record_line(&line, self.line_no, self.next_id);
        if parsed.is_ok() {
            self.next_id += 1;
        }
        Some(parsed)
    }
}

fn parse_record_line(line: &str, line_no: usize, expected_id: u64) -> Result<Vec<Element>> {
    let mut tokens = line.split_whitespace();
    let id_token = tokens
        .next()
        .ok_or_else(|| FlatAdjError::parse(line_no, "blank line, expected a record id"))?;
    let id = id_token.parse::<u64>().map_err(|err| {
        FlatAdjError::parse(line_no, format!("invalid record id `{id_token}`: {err}"))
    })?;
    if id != expected_id {
        return Err(FlatAdjError::parse(
            line_no,
            format!("record id {id} out of sequence, expected {expected_id}"),
        ));
    }
    tokens
        .map(|token| {
            match token.parse::<Element>() {
                Ok(SEPARATOR) => Err(FlatAdjError::parse(
                    line_no,
                    format!("element {SEPARATOR} is the reserved separator"),
                )),
                Ok(value) => Ok(value),
                Err(err) => Err(FlatAdjError::parse(
                    line_no,
                    format!("invalid element `{token}`: {err}"),
                )),
            }
        })
        .collect()
}
