//! Plain-text formats shared with other processes.
//!
//! - Grid: one `{...}` block per row, holding one
//!   `[xUnit,yUnit,xUnitSpan,yUnitSpan,row,column,root]` record per position.
//!   Root 0 marks an empty position.
//! - Topology: one `C<root>[centerX,centerY,boxX,boxY,boxW,boxH:r1,r2,...]`
//!   record per cluster.
//!
//! Parsing produces typed records and validates them before anything is
//! handed back; a caller never sees half a grid.

mod emit;
mod parse;
mod types;

use std::fmt;

pub use emit::{emit_grid, emit_topology};
pub use parse::{parse_grid, parse_topology};
pub use types::{GridRecord, PositionRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset into the input where the problem was found.
    pub offset: usize,
    pub msg: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error at byte {}: {}", self.offset, self.msg)
    }
}
impl std::error::Error for ParseError {}
