use serde::Serialize;

use crate::arrows::CanvasId;
use crate::layout::RectI;

/// One grid position as persisted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PositionRecord {
    pub x_unit: i32,
    pub y_unit: i32,
    pub x_unit_span: i32,
    pub y_unit_span: i32,
    pub row: usize,
    pub column: usize,
    /// Root canvas of the cluster placed here; `None` for an empty position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<CanvasId>,
}

impl PositionRecord {
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Footprint in unit cells.
    pub fn unit_rect(&self) -> RectI {
        RectI {
            x: self.x_unit,
            y: self.y_unit,
            w: self.x_unit_span,
            h: self.y_unit_span,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GridRecord {
    pub rows: Vec<Vec<PositionRecord>>,
}

impl GridRecord {
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Occupied roots in row-major order.
    pub fn roots(&self) -> Vec<CanvasId> {
        self.rows.iter().flatten().filter_map(|p| p.root).collect()
    }
}
