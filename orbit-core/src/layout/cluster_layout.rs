// Canvas positions of one cluster for one layout pass.
//
// Positions are canvas top-left corners. A fresh layout is built around a
// local origin where the root canvas is centered; ClusterGraph then moves the
// whole layout into its grid cell with `translate_by`, which keeps the
// relative arrangement intact.
//
// The tight extent (bounding box plus margin, and where the root sits inside
// it) is computed on first use and cached until `reset()`.

use std::cell::OnceCell;

use serde::Serialize;

use super::{LayoutConfig, PointI, RectI, SizeI};
use crate::arrows::CanvasId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasPosition {
    pub canvas: CanvasId,
    /// Top-left corner of the canvas.
    pub location: PointI,
}

#[derive(Debug, Copy, Clone)]
struct Extent {
    /// Root canvas top-left, relative to the top-left of the margin box.
    root_offset: PointI,
    size: SizeI,
}

#[derive(Debug, Clone)]
pub struct ClusterLayout {
    root: CanvasId,
    /// Center of the root canvas.
    location: PointI,
    ring_radii: Vec<f64>,
    positions: Vec<CanvasPosition>,
    canvas_size: SizeI,
    margin: i32,
    extent: OnceCell<Extent>,
}

impl ClusterLayout {
    pub fn new(root: CanvasId, cfg: &LayoutConfig) -> Self {
        Self {
            root,
            location: PointI::default(),
            ring_radii: Vec::new(),
            positions: Vec::new(),
            canvas_size: cfg.canvas_size,
            margin: cfg.cluster_margin,
            extent: OnceCell::new(),
        }
    }

    pub fn root(&self) -> CanvasId {
        self.root
    }

    /// Center of the cluster, i.e. the center of its root canvas.
    pub fn location(&self) -> PointI {
        self.location
    }

    /// Ring radii from the innermost ring (0, the root) outward.
    pub fn ring_radii(&self) -> &[f64] {
        &self.ring_radii
    }

    pub fn positions(&self) -> &[CanvasPosition] {
        &self.positions
    }

    pub fn position_of(&self, canvas: CanvasId) -> Option<PointI> {
        self.positions
            .iter()
            .find(|p| p.canvas == canvas)
            .map(|p| p.location)
    }

    pub fn add_canvas(&mut self, canvas: CanvasId, location: PointI) {
        self.positions.push(CanvasPosition { canvas, location });
    }

    /// Drop the cached extent. Required after adding canvases to a layout
    /// that has already been measured.
    pub fn reset(&mut self) {
        self.extent = OnceCell::new();
    }

    /// Size of the box that tightly fits every canvas, plus the margin on
    /// each side.
    pub fn bounding_box(&self) -> SizeI {
        self.extent().size
    }

    /// Where the cluster center lands, relative to the top-left of `bounds`,
    /// when the bounding box is centered inside `bounds`.
    pub fn center_within_bounds(&self, bounds: SizeI) -> PointI {
        let extent = self.extent();
        let x_inset = (bounds.w - extent.size.w) / 2;
        let y_inset = (bounds.h - extent.size.h) / 2;
        PointI {
            x: extent.root_offset.x + x_inset + self.canvas_size.w / 2,
            y: extent.root_offset.y + y_inset + self.canvas_size.h / 2,
        }
    }

    /// Bounding box (with margin) at the layout's current location.
    pub fn bounding_rect(&self) -> RectI {
        let size = self.bounding_box();
        let center = self.center_within_bounds(size);
        RectI {
            x: self.location.x - center.x,
            y: self.location.y - center.y,
            w: size.w,
            h: size.h,
        }
    }

    /// Move every canvas and the cluster center.
    pub(crate) fn translate_by(&mut self, dx: i32, dy: i32) {
        for p in &mut self.positions {
            p.location = p.location.translate(dx, dy);
        }
        self.location = self.location.translate(dx, dy);
    }

    pub(crate) fn set_ring_radii(&mut self, radii: Vec<f64>) {
        self.ring_radii = radii;
    }

    fn extent(&self) -> &Extent {
        self.extent.get_or_init(|| {
            if self.positions.is_empty() {
                return Extent {
                    root_offset: PointI::new(self.margin, self.margin),
                    size: SizeI { w: 2 * self.margin, h: 2 * self.margin },
                };
            }

            let mut x_min = i32::MAX;
            let mut y_min = i32::MAX;
            let mut x_max = i32::MIN;
            let mut y_max = i32::MIN;
            for p in &self.positions {
                x_min = x_min.min(p.location.x);
                y_min = y_min.min(p.location.y);
                x_max = x_max.max(p.location.x + self.canvas_size.w);
                y_max = y_max.max(p.location.y + self.canvas_size.h);
            }

            let root = self.position_of(self.root).unwrap_or(PointI::new(x_min, y_min));
            Extent {
                root_offset: PointI::new(root.x - x_min + self.margin, root.y - y_min + self.margin),
                size: SizeI {
                    w: x_max - x_min + 2 * self.margin,
                    h: y_max - y_min + 2 * self.margin,
                },
            }
        })
    }
}
