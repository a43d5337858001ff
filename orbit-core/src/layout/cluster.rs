// One arrow tree laid out as concentric rings.
//
// Ring 0 holds the root; ring k holds the canvases k arrows away from it.
// Every direct child of the root starts a Slice, and each slice gets a share
// of every ring proportional to its subtree size. Ring radii grow outward:
// a ring is at least one canvas diameter beyond the previous one, and at
// least large enough that every slice's arc fits its share (the arc span
// projection) and that the ring can hold all of its canvases side by side.
//
// The layout is computed around the local origin with the root centered on
// it. ClusterGraph moves it into place afterwards.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use tracing::debug;

use super::{ArcTransformer, ClusterLayout, LayoutConfig, PointI, Slice};
use crate::arrows::{self, ArrowGraph, CanvasId};
use crate::error::{LayoutError, Result};

#[derive(Debug, Clone)]
pub struct Cluster {
    root: CanvasId,
    /// Center of the root canvas after the last layout pass.
    location: PointI,
    /// Radii of rings 1.. from the last layout pass.
    ring_radii: Vec<f64>,
}

/// `(parent, canvas)` pairs of one ring, in discovery order.
type Ring = Vec<(CanvasId, CanvasId)>;

impl Cluster {
    pub fn new(root: CanvasId) -> Self {
        Self {
            root,
            location: PointI::default(),
            ring_radii: Vec::new(),
        }
    }

    pub fn root(&self) -> CanvasId {
        self.root
    }

    pub fn location(&self) -> PointI {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: PointI) {
        self.location = location;
    }

    pub fn ring_radii(&self) -> &[f64] {
        &self.ring_radii
    }

    pub fn reset(&mut self) {
        self.location = PointI::default();
        self.ring_radii.clear();
    }

    /// Compute a fresh ring layout of the tree rooted at `self.root()`.
    pub fn layout_as_circles<A: ArrowGraph + ?Sized>(&mut self, arrows: &A, cfg: &LayoutConfig) -> Result<ClusterLayout> {
        let rings = collect_rings(arrows, self.root)?;
        let diameter = cfg.canvas_diameter();

        let mut slices: Vec<Slice> = Vec::new();
        let mut slice_of: HashMap<CanvasId, usize> = HashMap::new();
        for (ring_index, ring) in rings.iter().enumerate().skip(1) {
            for &(parent, canvas) in ring {
                let index = if ring_index == 1 {
                    slices.push(Slice::new(canvas, arrows::label(arrows, canvas)));
                    slices.len() - 1
                } else {
                    match slice_of.get(&parent) {
                        Some(&index) => index,
                        None => return Err(LayoutError::violation(canvas, "parent missing from the previous ring")),
                    }
                };
                slice_of.insert(canvas, index);
                slices[index].add_canvas(parent, canvas, ring_index);
            }
        }

        let total: usize = slices.iter().map(Slice::size).sum();
        for slice in &mut slices {
            for (ring_index, ring) in rings.iter().enumerate().skip(1) {
                let share = slice.arc_size(ring_index) as f64 / ring.len() as f64;
                slice.set_arc_weight(ring_index, share);
            }
            slice.calculate_max_arc_weight();
            slice.set_weight(slice.size() as f64 / total.max(1) as f64, diameter);
        }

        let mut layout = ClusterLayout::new(self.root, cfg);
        layout.add_canvas(self.root, cfg.center_canvas_at(0, 0));

        let origin = PointI::new(0, 0);
        let mut radii: Vec<f64> = Vec::with_capacity(rings.len().saturating_sub(1));
        let mut previous_radius = 0.0;
        for (ring_index, ring) in rings.iter().enumerate().skip(1) {
            let projected = slices
                .iter()
                .map(|s| s.max_projected_span(ring_index))
                .max()
                .unwrap_or(0) as f64;
            let circumference = (2.0 * PI * (previous_radius + diameter as f64))
                .max(projected)
                .max((ring.len() as i64 * diameter as i64) as f64);
            let radius = circumference / (2.0 * PI);
            let ring_span = circumference.ceil() as i32;

            let first_arc_span = slices.first().map_or(0, |s| s.calculate_layout_span(ring_span));
            let transformer = ArcTransformer::new(origin, radius, ring_span, first_arc_span, cfg);
            let parent_radius = (ring_index > 1).then_some(previous_radius);

            let mut arc_start = 0;
            for slice in &mut slices {
                slice.layout_arc(&transformer, ring_index, ring_span, arc_start, &mut layout, parent_radius, cfg);
                arc_start += slice.layout_span();
            }

            radii.push(radius);
            previous_radius = radius;
        }

        debug!(
            cluster = %arrows::label(arrows, self.root),
            rings = radii.len(),
            canvases = total + 1,
            "cluster laid out"
        );

        self.ring_radii = radii.clone();
        layout.set_ring_radii(radii);
        Ok(layout)
    }
}

/// Walk outgoing arrows breadth-first from `root`. Reaching a canvas twice,
/// or an arrow id the oracle cannot resolve, breaks the forest contract.
fn collect_rings<A: ArrowGraph + ?Sized>(arrows: &A, root: CanvasId) -> Result<Vec<Ring>> {
    let mut visited: HashSet<CanvasId> = HashSet::from([root]);
    let mut rings: Vec<Ring> = vec![vec![(root, root)]];

    loop {
        let mut next: Ring = Vec::new();
        let outermost = &rings[rings.len() - 1];
        for &(_, canvas) in outermost {
            for id in arrows.outgoing_arrows(canvas) {
                let arrow = arrows
                    .arrow(id)
                    .ok_or_else(|| LayoutError::violation(canvas, format!("dangling arrow {}", id.0)))?;
                if arrow.source != canvas {
                    return Err(LayoutError::violation(canvas, format!("arrow {} does not leave this canvas", id.0)));
                }
                if !visited.insert(arrow.dest) {
                    return Err(LayoutError::violation(arrow.dest, "canvas reached twice from the cluster root"));
                }
                next.push((canvas, arrow.dest));
            }
        }
        if next.is_empty() {
            return Ok(rings);
        }
        rings.push(next);
    }
}
