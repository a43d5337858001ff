//! Records -> text.

use super::types::*;
use crate::topology::TopologyCluster;

/// Emit the grid format. Empty positions are written with root 0.
pub fn emit_grid(grid: &GridRecord) -> String {
    let mut out = String::new();
    for row in &grid.rows {
        out.push('{');
        for p in row {
            out.push_str(&format!(
                "[{},{},{},{},{},{},{}]",
                p.x_unit,
                p.y_unit,
                p.x_unit_span,
                p.y_unit_span,
                p.row,
                p.column,
                p.root.map_or(0, |c| c.0)
            ));
        }
        out.push('}');
    }
    out
}

/// Emit the topology payload. A cluster without rings has nothing after ':'.
pub fn emit_topology(clusters: &[TopologyCluster]) -> String {
    let mut out = String::new();
    for c in clusters {
        let b = c.bounding_box;
        out.push_str(&format!(
            "C{}[{},{},{},{},{},{}:",
            c.root, c.center.x, c.center.y, b.x, b.y, b.w, b.h
        ));
        let radii: Vec<String> = c.radii.iter().map(|r| r.to_string()).collect();
        out.push_str(&radii.join(","));
        out.push(']');
    }
    out
}
