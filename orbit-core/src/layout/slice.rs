// One top-level branch of a cluster.
//
// A slice is rooted at a direct child of the cluster root and holds every
// canvas reachable from it. It occupies one arc on each ring it reaches.
// Within an arc, canvases sharing a parent form a group; groups keep the
// order in which their parents were placed on the previous ring.
//
// Lifecycle, once per layout pass:
//   add_canvas (all rings) -> set_arc_weight / calculate_max_arc_weight
//   -> set_weight -> layout_arc for ring 1, 2, ...
//
// Arc coordinates are pixels along the ring measured from the seam (see
// ArcTransformer). `arc_positions` records where each canvas center landed so
// the next ring can place children in front of their parent.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use super::collision::{self, ArcPlacement, GroupExtent};
use super::{ArcTransformer, ClusterLayout, LayoutConfig};
use crate::arrows::CanvasId;

#[derive(Debug, Clone)]
pub(crate) struct CanvasGroup {
    pub(crate) parent: CanvasId,
    pub(crate) canvases: Vec<CanvasId>,
}

#[derive(Debug, Clone, Default)]
struct SliceArc {
    groups: Vec<CanvasGroup>,
    canvas_count: usize,
    /// Share of its ring's canvases that sit on this arc.
    weight: f64,
    /// Smallest ring span for which this arc fits in its weighted share.
    span_projection: i32,
}

impl SliceArc {
    fn add_canvas(&mut self, parent: CanvasId, canvas: CanvasId) {
        self.canvas_count += 1;
        match self.groups.iter_mut().find(|g| g.parent == parent) {
            Some(group) => group.canvases.push(canvas),
            None => self.groups.push(CanvasGroup { parent, canvases: vec![canvas] }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slice {
    root: CanvasId,
    /// Log label for the root canvas.
    label: String,
    canvases: Vec<CanvasId>,
    arcs: Vec<SliceArc>,
    arc_positions: HashMap<CanvasId, i32>,
    assigned_weight: f64,
    max_arc_weight: f64,
    layout_span: i32,
}

impl Slice {
    pub fn new(root: CanvasId, label: impl Into<String>) -> Self {
        Self {
            root,
            label: label.into(),
            canvases: Vec::new(),
            arcs: Vec::new(),
            arc_positions: HashMap::new(),
            assigned_weight: 0.0,
            max_arc_weight: 0.0,
            layout_span: 0,
        }
    }

    pub fn root(&self) -> CanvasId {
        self.root
    }

    pub fn add_canvas(&mut self, parent: CanvasId, canvas: CanvasId, ring: usize) {
        self.canvases.push(canvas);
        self.arc_mut(ring).add_canvas(parent, canvas);
    }

    /// Number of canvases in the slice.
    pub fn size(&self) -> usize {
        self.canvases.len()
    }

    /// Number of canvases this slice has on `ring`.
    pub fn arc_size(&self, ring: usize) -> usize {
        self.arcs.get(ring).map_or(0, |a| a.canvas_count)
    }

    /// Rings on which this slice has at least one canvas.
    pub fn rings(&self) -> impl Iterator<Item = usize> + '_ {
        self.arcs
            .iter()
            .enumerate()
            .filter(|(_, arc)| arc.canvas_count > 0)
            .map(|(ring, _)| ring)
    }

    pub fn weight(&self) -> f64 {
        self.assigned_weight
    }

    /// Assign the slice's share of every ring, `0.0 <= weight <= 1.0`, and
    /// project the ring span each arc needs to fit inside that share.
    pub fn set_weight(&mut self, weight: f64, canvas_diameter: i32) {
        self.assigned_weight = weight;
        debug!(
            slice = %self.label,
            canvases = self.canvases.len(),
            max_arc_weight = self.max_arc_weight,
            weight,
            "slice weight assigned"
        );

        for (ring, arc) in self.arcs.iter_mut().enumerate() {
            arc.span_projection = if arc.canvas_count == 0 || weight <= 0.0 {
                0
            } else {
                let needed = (arc.canvas_count as i64 * canvas_diameter as i64) as f64;
                (needed / weight - 1e-9).ceil() as i32
            };
            if arc.canvas_count > 0 {
                debug!(slice = %self.label, ring, projection = arc.span_projection, "arc span projected");
            }
        }
    }

    pub fn set_arc_weight(&mut self, ring: usize, weight: f64) {
        self.arc_mut(ring).weight = weight;
    }

    pub fn calculate_max_arc_weight(&mut self) {
        self.max_arc_weight = self.arcs.iter().map(|a| a.weight).fold(0.0, f64::max);
    }

    pub fn max_arc_weight(&self) -> f64 {
        self.max_arc_weight
    }

    /// Ring span this slice needs for its arc on `ring` to fit uncrowded.
    pub fn max_projected_span(&self, ring: usize) -> i32 {
        self.arcs.get(ring).map_or(0, |a| a.span_projection)
    }

    /// Pixels this slice occupies on a ring of `ring_span` pixels.
    pub fn calculate_layout_span(&self, ring_span: i32) -> i32 {
        // the epsilon keeps exact products such as 1000 * 0.2 from truncating down
        (ring_span as f64 * self.assigned_weight + 1e-9).floor() as i32
    }

    /// Span consumed by the most recent `layout_arc`.
    pub fn layout_span(&self) -> i32 {
        self.layout_span
    }

    pub fn arc_position(&self, canvas: CanvasId) -> Option<i32> {
        self.arc_positions.get(&canvas).copied()
    }

    /// Lay out this slice's arc on `ring`, which starts at `arc_start` and
    /// covers `calculate_layout_span(ring_span)` pixels.
    ///
    /// Groups are placed in front of their parents unless `parent_ring_radius`
    /// is `None` (the slice root's ring, whose parent is the cluster root) or
    /// the collision pass gives up, in which case the arc is crowded.
    #[allow(clippy::too_many_arguments)]
    pub fn layout_arc(
        &mut self,
        transformer: &ArcTransformer,
        ring: usize,
        ring_span: i32,
        arc_start: i32,
        layout: &mut ClusterLayout,
        parent_ring_radius: Option<f64>,
        cfg: &LayoutConfig,
    ) -> ArcPlacement {
        let slice_width = self.calculate_layout_span(ring_span);
        self.layout_span = slice_width;

        let arc_start_f = arc_start as f64;
        let arc_end_f = (arc_start + slice_width) as f64;
        let diameter = cfg.canvas_diameter();

        let groups = match self.arcs.get(ring) {
            Some(arc) if arc.canvas_count > 0 => arc.groups.clone(),
            _ => {
                return ArcPlacement::Ideal { starts: Vec::new(), collisions: Vec::new() };
            }
        };

        let spans: Vec<f64> = groups
            .iter()
            .map(|g| (g.canvases.len() as i64 * diameter as i64) as f64)
            .collect();

        let placement = match parent_ring_radius {
            Some(parent_radius) => {
                let extents: Vec<GroupExtent> = groups
                    .iter()
                    .zip(&spans)
                    .map(|(group, &span)| {
                        let parent_pos = self.arc_positions.get(&group.parent).copied().unwrap_or(arc_start);
                        let ideal_center = transformer.ideal_position_for(parent_pos, parent_radius);
                        trace!(
                            slice = %self.label,
                            ring,
                            ideal = ideal_center,
                            arc_start,
                            arc_end = arc_start + slice_width,
                            "group ideal position"
                        );
                        GroupExtent { ideal_center, span }
                    })
                    .collect();
                let placement = collision::resolve_collisions(&extents, arc_start_f, arc_end_f);
                for c in placement.collisions() {
                    debug!(
                        slice = %self.label,
                        ring,
                        displaced = c.displacements.len(),
                        total = c.total_displacement() as i32,
                        "group collision"
                    );
                }
                if placement.is_crowded() {
                    warn!(slice = %self.label, ring, "arc crowded; ideal placement abandoned");
                }
                placement
            }
            None => {
                let extents: Vec<GroupExtent> = spans
                    .iter()
                    .map(|&span| GroupExtent { ideal_center: arc_start_f, span })
                    .collect();
                collision::crowd(&extents, arc_start_f, arc_end_f)
            }
        };

        let starts = placement.group_starts(&spans);
        for (group, start) in groups.iter().zip(starts) {
            let mut x_arc = (start + diameter as f64 / 2.0) as i32;
            for &canvas in &group.canvases {
                layout.add_canvas(canvas, transformer.canvas_origin_at(x_arc, cfg));
                self.arc_positions.insert(canvas, x_arc);
                x_arc += diameter;
            }
        }

        placement
    }

    fn arc_mut(&mut self, ring: usize) -> &mut SliceArc {
        if self.arcs.len() <= ring {
            self.arcs.resize_with(ring + 1, SliceArc::default);
        }
        &mut self.arcs[ring]
    }
}
