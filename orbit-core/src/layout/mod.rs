// Ring layout and cluster packing.
//
// Goals:
// - Deterministic: no randomness, same operations => same pixels
// - Each cluster (one arrow tree) is laid out as concentric rings around its root
// - Clusters are packed onto a grid of unit cells without overlap
// - Incremental: clusters are inserted, removed and replaced in place
//
// Submodules:
// - arc_transformer: 1D arc coordinate -> 2D ring point
// - collision: pure displacement pass for sibling groups on one arc
// - slice: one top-level branch of a cluster, laid out arc by arc
// - cluster: rings, slice weights and ring radii for one tree
// - cluster_layout: absolute canvas positions of one cluster
// - unit_graph: "graph paper" placement of measured clusters
// - cluster_graph: the grid of cluster positions
//
// Output:
// - ClusterLayout per occupied grid position, already centered in its cell.

use serde::{Deserialize, Serialize};

mod arc_transformer;
mod cluster;
mod cluster_graph;
mod cluster_layout;
pub mod collision;
mod slice;
mod unit_graph;

pub use arc_transformer::ArcTransformer;
pub use cluster::Cluster;
pub use cluster_graph::ClusterGraph;
pub use cluster_layout::{CanvasPosition, ClusterLayout};
pub use slice::Slice;
pub use unit_graph::UnitGraph;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointI {
    pub x: i32,
    pub y: i32,
}

impl PointI {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeI {
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectI {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl RectI {
    pub fn right(&self) -> i32 { self.x + self.w }
    pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn overlaps(&self, other: &RectI) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn contains_rect(&self, other: &RectI) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn union(&self, other: &RectI) -> RectI {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        RectI { x: x0, y: y0, w: x1 - x0, h: y1 - y0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Pixel size of one canvas thumbnail.
    pub canvas_size: SizeI,
    /// Cell size of the unit graph that clusters are packed onto.
    pub cluster_unit_size: SizeI,
    /// Empty space kept around the canvases of a cluster.
    pub cluster_margin: i32,
    /// Fraction of the ring where the center of the first slice's arc sits.
    /// 0.0 is 3 o'clock, increasing clockwise on screen (y grows downward).
    pub first_arc_anchor: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_size: SizeI { w: 200, h: 130 },
            cluster_unit_size: SizeI { w: 50, h: 50 },
            cluster_margin: 10,
            first_arc_anchor: 7.0 / 8.0,
        }
    }
}

impl LayoutConfig {
    /// Canvases are rectangles but the ring layout treats them as circles;
    /// this is the diameter of the bounding circle, i.e. the arc length one
    /// canvas occupies on any ring.
    pub fn canvas_diameter(&self) -> i32 {
        let w = self.canvas_size.w as f64;
        let h = self.canvas_size.h as f64;
        ((w * w + h * h).sqrt() as i32).max(1)
    }

    /// Top-left corner of a canvas whose center is at `(x, y)`.
    pub fn center_canvas_at(&self, x: i32, y: i32) -> PointI {
        PointI {
            x: x - self.canvas_size.w / 2,
            y: y - self.canvas_size.h / 2,
        }
    }
}
