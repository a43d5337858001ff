// Text -> records.
//
// Grid:     ( '{' ( '[' int ',' int ',' int ',' int ',' int ',' int ',' int ']' )* '}' )+
// Topology: ( 'C' int '[' int ',' int ',' int ',' int ',' int ',' int ( ':' ( int ( ',' int )* )? )? ']' )*
//
// Whitespace between tokens is ignored. Every field is required; a record
// with a missing field is an error, never a default.

use std::collections::HashMap;

use super::types::*;
use super::ParseError;
use crate::arrows::CanvasId;
use crate::layout::{PointI, RectI};
use crate::topology::TopologyCluster;

/// Parse and validate a persisted grid.
///
/// Validation requires at least one position, rectangular rows, row/column
/// indices equal to each record's place in the text, non-negative spans and
/// no root canvas owning two positions.
pub fn parse_grid(input: &str) -> Result<GridRecord, ParseError> {
    let mut p = Parser::new(input);
    let mut rows: Vec<Vec<(usize, PositionRecord)>> = Vec::new();

    p.skip_ws();
    while !p.eof() {
        p.expect(b'{')?;
        let mut row = Vec::new();
        loop {
            p.skip_ws();
            if p.eat(b'}') {
                break;
            }
            let offset = p.pos;
            row.push((offset, p.position_record()?));
        }
        rows.push(row);
        p.skip_ws();
    }

    validate_grid(&rows, input.len())?;
    Ok(GridRecord {
        rows: rows
            .into_iter()
            .map(|row| row.into_iter().map(|(_, record)| record).collect())
            .collect(),
    })
}

/// Parse a topology payload. An empty payload is an empty topology.
pub fn parse_topology(input: &str) -> Result<Vec<TopologyCluster>, ParseError> {
    let mut p = Parser::new(input);
    let mut clusters = Vec::new();

    p.skip_ws();
    while !p.eof() {
        p.expect(b'C')?;
        let root = p.canvas()?;
        p.expect(b'[')?;
        let cx = p.i32_field()?;
        p.expect(b',')?;
        let cy = p.i32_field()?;
        p.expect(b',')?;
        let bx = p.i32_field()?;
        p.expect(b',')?;
        let by = p.i32_field()?;
        p.expect(b',')?;
        let bw = p.i32_field()?;
        p.expect(b',')?;
        let bh = p.i32_field()?;

        // a cluster without rings may close right after the box
        let mut radii = Vec::new();
        p.skip_ws();
        if !p.eat(b']') {
            p.expect(b':')?;
            p.skip_ws();
            if !p.eat(b']') {
                loop {
                    radii.push(p.i32_field()?);
                    p.skip_ws();
                    if p.eat(b']') {
                        break;
                    }
                    p.expect(b',')?;
                }
            }
        }

        let Some(root) = root else {
            return p.err("topology record for canvas 0");
        };
        clusters.push(TopologyCluster {
            root,
            center: PointI::new(cx, cy),
            bounding_box: RectI { x: bx, y: by, w: bw, h: bh },
            radii,
        });
        p.skip_ws();
    }

    Ok(clusters)
}

fn validate_grid(rows: &[Vec<(usize, PositionRecord)>], end: usize) -> Result<(), ParseError> {
    let fail = |offset: usize, msg: String| Err(ParseError { offset, msg });

    let columns = match rows.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return fail(0, "grid has no positions".to_string()),
    };

    let mut seen: HashMap<CanvasId, (usize, usize)> = HashMap::new();
    for (r, row) in rows.iter().enumerate() {
        if row.len() != columns {
            let offset = row.first().map_or(end, |(o, _)| *o);
            return fail(offset, format!("row {} has {} positions, expected {}", r, row.len(), columns));
        }
        for (c, (offset, record)) in row.iter().enumerate() {
            if record.row != r || record.column != c {
                return fail(
                    *offset,
                    format!(
                        "position at row {} column {} is recorded as ({}, {})",
                        r, c, record.row, record.column
                    ),
                );
            }
            if record.x_unit_span < 0 || record.y_unit_span < 0 {
                return fail(*offset, "negative unit span".to_string());
            }
            if let Some(root) = record.root
                && let Some((r0, c0)) = seen.insert(root, (r, c))
            {
                return fail(
                    *offset,
                    format!("canvas {} is the root of positions ({}, {}) and ({}, {})", root, r0, c0, r, c),
                );
            }
        }
    }
    Ok(())
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { src: input.as_bytes(), pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn err<T>(&self, msg: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError {
            offset: self.pos,
            msg: msg.into(),
        })
    }

    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.src.get(self.pos) == Some(&b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), ParseError> {
        self.skip_ws();
        if self.eat(b) {
            return Ok(());
        }
        match self.src.get(self.pos) {
            Some(&found) => self.err(format!("expected '{}', found '{}'", b as char, found as char)),
            None => self.err(format!("expected '{}', found end of input", b as char)),
        }
    }

    fn int(&mut self) -> Result<i64, ParseError> {
        self.skip_ws();
        let start = self.pos;
        if self.src.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        let digits = self.pos;
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos == digits {
            self.pos = start;
            return self.err("expected an integer");
        }
        // only ASCII sign and digits were consumed
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or_default();
        match text.parse::<i64>() {
            Ok(v) => Ok(v),
            Err(_) => {
                self.pos = start;
                self.err(format!("integer {} out of range", text))
            }
        }
    }

    fn i32_field(&mut self) -> Result<i32, ParseError> {
        let start = self.pos;
        let v = self.int()?;
        i32::try_from(v).or_else(|_| {
            self.pos = start;
            self.err(format!("value {} out of range", v))
        })
    }

    fn index_field(&mut self) -> Result<usize, ParseError> {
        let start = self.pos;
        let v = self.int()?;
        usize::try_from(v).or_else(|_| {
            self.pos = start;
            self.err(format!("negative index {}", v))
        })
    }

    /// Canvas id; 0 is the empty marker.
    fn canvas(&mut self) -> Result<Option<CanvasId>, ParseError> {
        let start = self.pos;
        let v = self.int()?;
        match u64::try_from(v) {
            Ok(0) => Ok(None),
            Ok(id) => Ok(Some(CanvasId(id))),
            Err(_) => {
                self.pos = start;
                self.err(format!("negative canvas id {}", v))
            }
        }
    }

    fn position_record(&mut self) -> Result<PositionRecord, ParseError> {
        self.expect(b'[')?;
        let x_unit = self.i32_field()?;
        self.expect(b',')?;
        let y_unit = self.i32_field()?;
        self.expect(b',')?;
        let x_unit_span = self.i32_field()?;
        self.expect(b',')?;
        let y_unit_span = self.i32_field()?;
        self.expect(b',')?;
        let row = self.index_field()?;
        self.expect(b',')?;
        let column = self.index_field()?;
        self.expect(b',')?;
        let root = self.canvas()?;
        self.expect(b']')?;
        Ok(PositionRecord { x_unit, y_unit, x_unit_span, y_unit_span, row, column, root })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{emit_grid, emit_topology};

    #[test]
    fn test_parse_grid() {
        let grid = parse_grid("{[0,0,5,3,0,0,42][5,0,0,0,0,1,0]}{[0,3,5,3,1,0,7][5,3,0,0,1,1,0]}").unwrap();
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.rows[0][0].root, Some(CanvasId(42)));
        assert!(grid.rows[0][1].is_empty());
        assert_eq!(grid.rows[1][0].unit_rect(), RectI { x: 0, y: 3, w: 5, h: 3 });
        assert_eq!(grid.roots(), vec![CanvasId(42), CanvasId(7)]);
    }

    #[test]
    fn test_grid_text_survives_reparse() {
        let text = "{[0,0,5,3,0,0,42][5,0,0,0,0,1,0]}{[0,3,5,3,1,0,7][5,3,0,0,1,1,0]}";
        assert_eq!(emit_grid(&parse_grid(text).unwrap()), text);
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let grid = parse_grid(" {\n  [0, 0, 5, 3, 0, 0, 42]\n}\n").unwrap();
        assert_eq!(grid.rows[0][0].x_unit_span, 5);
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let err = parse_grid("{[0,0,5,3,0,42]}").unwrap_err();
        assert!(err.msg.contains("expected ','"), "{}", err);
        assert_eq!(err.offset, 14);
    }

    #[test]
    fn test_unclosed_row_is_an_error() {
        let err = parse_grid("{[0,0,5,3,0,0,42]").unwrap_err();
        assert!(err.msg.contains("end of input"), "{}", err);
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        assert!(parse_grid("").is_err());
        assert!(parse_grid("{}").is_err());
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = parse_grid("{[0,0,1,1,0,0,1][1,0,1,1,0,1,2]}{[0,1,1,1,1,0,3]}").unwrap_err();
        assert!(err.msg.contains("expected 2"), "{}", err);
    }

    #[test]
    fn test_misplaced_indices_are_rejected() {
        let err = parse_grid("{[0,0,1,1,0,1,1]}").unwrap_err();
        assert!(err.msg.contains("recorded as (0, 1)"), "{}", err);
    }

    #[test]
    fn test_duplicate_root_is_rejected() {
        let err = parse_grid("{[0,0,1,1,0,0,9][1,0,1,1,0,1,9]}").unwrap_err();
        assert!(err.msg.contains("canvas 9"), "{}", err);
    }

    #[test]
    fn test_parse_topology() {
        let text = "C7[135,85,25,10,220,150:]C8[-3,4,-10,0,20,30:238,476]";
        let clusters = parse_topology(text).unwrap();
        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].radii.is_empty());
        assert_eq!(clusters[1].radii, vec![238, 476]);
        assert_eq!(clusters[1].center, PointI::new(-3, 4));
        assert_eq!(emit_topology(&clusters), text);
    }

    #[test]
    fn test_ringless_cluster_with_or_without_colon() {
        let bare = parse_topology("C1[125,75,15,0,220,150]").unwrap();
        let colon = parse_topology("C1[125,75,15,0,220,150:]").unwrap();
        assert_eq!(bare, colon);
        assert_eq!(bare[0].bounding_box, RectI { x: 15, y: 0, w: 220, h: 150 });
        assert!(bare[0].radii.is_empty());

        let mixed = parse_topology("C1[125,75,15,0,220,150]C2[0,0,0,0,10,10:238]").unwrap();
        assert_eq!(mixed.len(), 2);
        assert_eq!(mixed[1].radii, vec![238]);
    }

    #[test]
    fn test_topology_with_missing_box_field_is_rejected() {
        assert!(parse_topology("C7[135,85,25,10,220:238]").is_err());
        assert!(parse_topology("").unwrap().is_empty());
    }
}
