use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::types::{FlatAdjError, Result, VertexId};

/// One undirected edge from an edge-list file. Any trailing weight column is dropped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Edge {
    /// First endpoint.
    pub from: VertexId,
    /// Second endpoint.
    pub to: VertexId,
}

impl Edge {
    /// Builds an edge from raw endpoint IDs.
    pub fn new(from: i64, to: i64) -> Self {
        Self {
            from: VertexId(from),
            to: VertexId(to),
        }
    }
}

/// Streams edges out of `from to [weight]` text, one edge per line.
///
/// Every line, blank ones included, must hold two or three integer tokens; anything else
/// fails with [`FlatAdjError::Parse`] carrying the 1-based line number.
pub struct EdgeReader<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> EdgeReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl EdgeReader<BufReader<File>> {
    /// Opens an edge-list file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for EdgeReader<R> {
    type Item = Result<Edge>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(err) => return Some(Err(FlatAdjError::from(err))),
        };
        self.line_no += 1;
        Some(parse_edge_line(&line, self.line_no))
    }
}

/// Parses a single `from to [weight]` edge line.
pub fn parse_edge_line(line: &str, line_no: usize) -> Result<Edge> {
    let mut tokens = [""; 3];
    let mut count = 0usize;
    for token in line.split_whitespace() {
        if count == tokens.len() {
            return Err(FlatAdjError::parse(
                line_no,
                "expected `from to [weight]`, found more than 3 tokens",
            ));
        }
        tokens[count] = token;
        count += 1;
    }
    if count < 2 {
        return Err(FlatAdjError::parse(
            line_no,
            format!("expected `from to [weight]`, found {count} tokens"),
        ));
    }
    let from = parse_int(tokens[0], line_no)?;
    let to = parse_int(tokens[1], line_no)?;
    if count == 3 {
        parse_int(tokens[2], line_no)?;
    }
    Ok(Edge::new(from, to))
}

fn parse_int(token: &str, line_no: usize) -> Result<i64> {
    token
        .parse::<i64>()
        .map_err(|err| FlatAdjError::parse(line_no, format!("invalid integer `{token}`: {err}")))
}
