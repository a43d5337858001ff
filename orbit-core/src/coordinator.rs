// Single entry point for layout operations.
//
// The coordinator owns the arrow oracle, the cluster grid, the topology of
// the last pass and the canvas positions of the last pass. Edits go through
// the grid; `layout_graph` recomputes everything and reports which canvases
// moved.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::arrows::{self, ArrowGraph, CanvasId};
use crate::error::{LayoutError, Result};
use crate::layout::{CanvasPosition, ClusterGraph, ClusterLayout, LayoutConfig, PointI};
use crate::topology::Topology;

/// Result of one full layout pass.
#[derive(Debug, Clone)]
pub struct LayoutPass {
    /// One layout per placed cluster, already in its final position.
    pub layouts: Vec<ClusterLayout>,
    /// Canvases whose position differs from the previous pass, including
    /// canvases that had no position before.
    pub moved: Vec<CanvasPosition>,
    pub topology: Topology,
}

#[derive(Debug)]
pub struct LayoutCoordinator<A> {
    arrows: A,
    graph: ClusterGraph,
    topology: Topology,
    positions: HashMap<CanvasId, PointI>,
}

impl<A: ArrowGraph> LayoutCoordinator<A> {
    pub fn new(arrows: A) -> Self {
        Self::with_config(arrows, LayoutConfig::default())
    }

    pub fn with_config(arrows: A, config: LayoutConfig) -> Self {
        Self {
            arrows,
            graph: ClusterGraph::new(config),
            topology: Topology::new(),
            positions: HashMap::new(),
        }
    }

    pub fn arrows(&self) -> &A {
        &self.arrows
    }

    /// Mutable access to the oracle. The grid's derived state is dropped
    /// since any arrow may change through the returned reference.
    pub fn arrows_mut(&mut self) -> &mut A {
        self.graph.reset();
        &mut self.arrows
    }

    pub fn graph(&self) -> &ClusterGraph {
        &self.graph
    }

    pub fn config(&self) -> &LayoutConfig {
        self.graph.config()
    }

    /// Topology of the last completed pass.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Canvas positions of the last completed pass.
    pub fn positions(&self) -> &HashMap<CanvasId, PointI> {
        &self.positions
    }

    /// Follow incoming arrows from `canvas` to the root of its tree.
    pub fn root_canvas_id(&self, canvas: CanvasId) -> Result<CanvasId> {
        let mut current = canvas;
        let mut seen = HashSet::from([canvas]);
        while let Some(id) = self.arrows.incoming_arrow(current) {
            let arrow = self
                .arrows
                .arrow(id)
                .ok_or_else(|| LayoutError::violation(current, format!("dangling incoming arrow {}", id.0)))?;
            if arrow.dest != current {
                return Err(LayoutError::violation(current, format!("incoming arrow {} ends elsewhere", id.0)));
            }
            if !seen.insert(arrow.source) {
                return Err(LayoutError::violation(arrow.source, "incoming arrows form a cycle"));
            }
            current = arrow.source;
        }
        Ok(current)
    }

    pub fn insert_cluster(&mut self, root: CanvasId) -> Result<()> {
        self.graph.insert(&self.arrows, root)
    }

    /// Insert a cluster next to the cluster containing `context`.
    pub fn insert_cluster_near(&mut self, context: CanvasId, root: CanvasId) -> Result<()> {
        let context_root = self.root_canvas_id(context)?;
        self.graph.insert_near(&self.arrows, context_root, root)
    }

    pub fn remove_cluster_if_any(&mut self, root: CanvasId) -> bool {
        self.graph.remove_if_any(root)
    }

    pub fn replace_cluster(&mut self, original_root: CanvasId, new_root: CanvasId) -> Result<()> {
        self.graph.replace(original_root, new_root)
    }

    /// Recompute every cluster, rebuild the topology and diff canvas
    /// positions against the previous pass.
    pub fn layout_graph(&mut self) -> Result<LayoutPass> {
        let layouts = self.graph.layout_all(&self.arrows)?;
        // arrows may change before the next pass
        self.graph.reset();

        self.topology.clear();
        let mut positions = HashMap::with_capacity(self.positions.len());
        let mut moved = Vec::new();
        for layout in &layouts {
            self.topology.add_cluster(layout);
            for p in layout.positions() {
                if self.positions.get(&p.canvas) != Some(&p.location) {
                    moved.push(*p);
                }
                positions.insert(p.canvas, p.location);
            }
        }
        self.positions = positions;

        info!(clusters = layouts.len(), canvases = self.positions.len(), moved = moved.len(), "layout pass complete");
        Ok(LayoutPass {
            layouts,
            moved,
            topology: self.topology.clone(),
        })
    }

    /// Position of `canvas` in the last completed pass.
    pub fn canvas_position(&self, canvas: CanvasId) -> Option<PointI> {
        self.positions.get(&canvas).copied()
    }

    /// Topology payload of the last completed pass.
    pub fn topology_payload(&self) -> String {
        self.topology.serialize()
    }

    pub fn serialize_graph(&mut self) -> Result<String> {
        self.graph.serialize(&self.arrows)
    }

    /// Install a persisted grid. Nothing changes if the text is malformed.
    pub fn load_graph(&mut self, text: &str) -> Result<()> {
        self.graph.load(text)?;
        for root in self.graph.roots() {
            if self.arrows.incoming_arrow(root).is_some() {
                warn!(cluster = %arrows::label(&self.arrows, root), "loaded cluster root has an incoming arrow");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrows::{Arrow, ArrowId, InMemoryArrows};

    fn coordinator(ids: &[u64]) -> LayoutCoordinator<InMemoryArrows> {
        let mut arrows = InMemoryArrows::new();
        for &id in ids {
            arrows.add_canvas(CanvasId(id));
        }
        LayoutCoordinator::new(arrows)
    }

    #[test]
    fn test_root_canvas_id_walks_to_root() {
        let mut c = coordinator(&[]);
        c.arrows_mut().add_arrow(CanvasId(1), CanvasId(2)).unwrap();
        c.arrows_mut().add_arrow(CanvasId(2), CanvasId(3)).unwrap();

        assert_eq!(c.root_canvas_id(CanvasId(3)).unwrap(), CanvasId(1));
        assert_eq!(c.root_canvas_id(CanvasId(1)).unwrap(), CanvasId(1));
        // canvases the oracle never heard of are their own root
        assert_eq!(c.root_canvas_id(CanvasId(9)).unwrap(), CanvasId(9));
    }

    /// Oracle that answers incoming-arrow lookups from a fixed table, so it
    /// can describe graphs that are not forests.
    struct Faulty {
        incoming: Vec<(CanvasId, ArrowId)>,
        arrows: Vec<Arrow>,
    }

    impl ArrowGraph for Faulty {
        fn incoming_arrow(&self, canvas: CanvasId) -> Option<ArrowId> {
            self.incoming.iter().find(|(c, _)| *c == canvas).map(|(_, id)| *id)
        }

        fn arrow(&self, id: ArrowId) -> Option<Arrow> {
            self.arrows.iter().find(|a| a.id == id).copied()
        }

        fn outgoing_arrows(&self, _canvas: CanvasId) -> Vec<ArrowId> {
            Vec::new()
        }
    }

    fn arrow(id: u64, source: u64, dest: u64) -> Arrow {
        Arrow { id: ArrowId(id), source: CanvasId(source), dest: CanvasId(dest) }
    }

    fn violation_at(err: LayoutError) -> (CanvasId, String) {
        match err {
            LayoutError::StructuralViolation { canvas, reason } => (canvas, reason),
            other => panic!("expected a structural violation, got {:?}", other),
        }
    }

    #[test]
    fn test_root_walk_rejects_cycle() {
        let c = LayoutCoordinator::new(Faulty {
            incoming: vec![(CanvasId(1), ArrowId(2)), (CanvasId(2), ArrowId(1))],
            arrows: vec![arrow(1, 1, 2), arrow(2, 2, 1)],
        });
        let (canvas, reason) = violation_at(c.root_canvas_id(CanvasId(1)).unwrap_err());
        assert_eq!(canvas, CanvasId(1));
        assert!(reason.contains("cycle"), "{}", reason);
        assert!(c.root_canvas_id(CanvasId(2)).is_err());
    }

    #[test]
    fn test_root_walk_rejects_dangling_incoming_arrow() {
        let c = LayoutCoordinator::new(Faulty {
            incoming: vec![(CanvasId(3), ArrowId(7))],
            arrows: vec![],
        });
        let (canvas, reason) = violation_at(c.root_canvas_id(CanvasId(3)).unwrap_err());
        assert_eq!(canvas, CanvasId(3));
        assert!(reason.contains("dangling"), "{}", reason);
    }

    #[test]
    fn test_root_walk_rejects_arrow_ending_elsewhere() {
        let c = LayoutCoordinator::new(Faulty {
            incoming: vec![(CanvasId(3), ArrowId(5))],
            arrows: vec![arrow(5, 1, 4)],
        });
        let (canvas, reason) = violation_at(c.root_canvas_id(CanvasId(3)).unwrap_err());
        assert_eq!(canvas, CanvasId(3));
        assert!(reason.contains("ends elsewhere"), "{}", reason);
    }

    #[test]
    fn test_insert_near_fails_on_broken_context() {
        let mut c = LayoutCoordinator::new(Faulty {
            incoming: vec![(CanvasId(1), ArrowId(2)), (CanvasId(2), ArrowId(1))],
            arrows: vec![arrow(1, 1, 2), arrow(2, 2, 1)],
        });
        let err = c.insert_cluster_near(CanvasId(1), CanvasId(9)).unwrap_err();
        assert!(matches!(err, LayoutError::StructuralViolation { .. }));
        assert!(!c.graph().contains(CanvasId(9)));
    }

    #[test]
    fn test_context_insert_and_removal_scenario() {
        let mut c = coordinator(&[1, 2]);
        c.insert_cluster(CanvasId(1)).unwrap();
        c.insert_cluster_near(CanvasId(1), CanvasId(2)).unwrap();
        assert_eq!(c.graph().position_of(CanvasId(2)), Some((0, 1)));

        assert!(c.remove_cluster_if_any(CanvasId(1)));
        assert_eq!(c.graph().position_of(CanvasId(2)), Some((0, 0)));
        assert_eq!((c.graph().row_count(), c.graph().column_count()), (1, 1));
    }

    #[test]
    fn test_insert_near_resolves_context_root() {
        let mut c = coordinator(&[1]);
        c.arrows_mut().add_arrow(CanvasId(1), CanvasId(5)).unwrap();
        c.insert_cluster(CanvasId(1)).unwrap();
        c.arrows_mut().add_canvas(CanvasId(8));

        // canvas 5 is inside cluster 1
        c.insert_cluster_near(CanvasId(5), CanvasId(8)).unwrap();
        assert_eq!(c.graph().position_of(CanvasId(8)), Some((0, 1)));

        let err = c.insert_cluster_near(CanvasId(42), CanvasId(43)).unwrap_err();
        assert_eq!(err, LayoutError::UnknownCluster { canvas: CanvasId(42) });
    }

    #[test]
    fn test_layout_graph_reports_only_moves() {
        let mut c = coordinator(&[1, 2]);
        c.insert_cluster(CanvasId(1)).unwrap();
        let first = c.layout_graph().unwrap();
        assert_eq!(first.moved.len(), 1);
        assert_eq!(first.topology.clusters().len(), 1);

        let again = c.layout_graph().unwrap();
        assert!(again.moved.is_empty());

        c.insert_cluster(CanvasId(2)).unwrap();
        let third = c.layout_graph().unwrap();
        let moved: Vec<CanvasId> = third.moved.iter().map(|p| p.canvas).collect();
        assert!(moved.contains(&CanvasId(2)));
        assert_eq!(c.canvas_position(CanvasId(2)), third.layouts.iter().find_map(|l| l.position_of(CanvasId(2))));
    }

    #[test]
    fn test_layout_reflects_arrow_changes() {
        let mut c = coordinator(&[1]);
        c.insert_cluster(CanvasId(1)).unwrap();
        c.layout_graph().unwrap();
        let root_before = c.canvas_position(CanvasId(1)).unwrap();

        c.arrows_mut().add_arrow(CanvasId(1), CanvasId(2)).unwrap();
        let pass = c.layout_graph().unwrap();
        assert!(c.canvas_position(CanvasId(2)).is_some());
        // the cluster grew, so its root moved to stay centered
        assert_ne!(c.canvas_position(CanvasId(1)).unwrap(), root_before);
        let radius = pass.layouts[0].ring_radii()[0] as i32;
        assert_eq!(pass.topology.clusters()[0].radii, vec![radius]);
    }

    #[test]
    fn test_topology_payload_matches_pass() {
        let mut c = coordinator(&[1]);
        c.insert_cluster(CanvasId(1)).unwrap();
        c.layout_graph().unwrap();
        // 5x3 units of 50px hold the 220x150 box with 15px to spare in x
        assert_eq!(c.topology_payload(), "C1[125,75,15,0,220,150:]");
        assert_eq!(c.canvas_position(CanvasId(1)), Some(PointI::new(25, 10)));
    }

    #[test]
    fn test_serialize_and_load_graph() {
        let mut c = coordinator(&[1, 2, 3]);
        for id in 1..=3 {
            c.insert_cluster(CanvasId(id)).unwrap();
        }
        let text = c.serialize_graph().unwrap();

        let mut restored = coordinator(&[1, 2, 3]);
        restored.load_graph(&text).unwrap();
        assert_eq!(restored.serialize_graph().unwrap(), text);
        assert!(restored.load_graph("{[").is_err());
        assert_eq!(restored.graph().roots(), c.graph().roots());
    }
}
