// Render-agnostic summary of every cluster: where it is centered, the radii
// of its rings and the box that holds it. Rebuilt from scratch on each
// layout pass.

use serde::Serialize;

use crate::arrows::CanvasId;
use crate::codec;
use crate::error::Result;
use crate::layout::{ClusterLayout, PointI, RectI};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyCluster {
    pub root: CanvasId,
    pub center: PointI,
    /// Ring radii from the innermost ring outward, truncated to pixels.
    pub radii: Vec<i32>,
    /// Tight box around the cluster's canvases, margin included.
    pub bounding_box: RectI,
}

impl TopologyCluster {
    pub fn from_layout(layout: &ClusterLayout) -> Self {
        Self {
            root: layout.root(),
            center: layout.location(),
            radii: layout.ring_radii().iter().map(|r| *r as i32).collect(),
            bounding_box: layout.bounding_rect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    clusters: Vec<TopologyCluster>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a topology payload, e.g. one received from another process.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self { clusters: codec::parse_topology(text)? })
    }

    pub fn clear(&mut self) {
        self.clusters.clear();
    }

    pub fn add_cluster(&mut self, layout: &ClusterLayout) {
        self.clusters.push(TopologyCluster::from_layout(layout));
    }

    pub fn clusters(&self) -> &[TopologyCluster] {
        &self.clusters
    }

    pub fn cluster(&self, root: CanvasId) -> Option<&TopologyCluster> {
        self.clusters.iter().find(|c| c.root == root)
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn serialize(&self) -> String {
        codec::emit_topology(&self.clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;

    fn placed_layout() -> ClusterLayout {
        let cfg = LayoutConfig::default();
        let mut layout = ClusterLayout::new(CanvasId(3), &cfg);
        layout.add_canvas(CanvasId(3), cfg.center_canvas_at(0, 0));
        layout.add_canvas(CanvasId(4), cfg.center_canvas_at(0, 250));
        layout.set_ring_radii(vec![250.7]);
        layout.translate_by(400, 300);
        layout
    }

    #[test]
    fn test_cluster_summary_from_layout() {
        let layout = placed_layout();
        let c = TopologyCluster::from_layout(&layout);

        assert_eq!(c.root, CanvasId(3));
        assert_eq!(c.center, PointI::new(400, 300));
        assert_eq!(c.radii, vec![250]);
        // canvases cover x 300..500, y 235..615, plus a 10px margin
        assert_eq!(c.bounding_box, RectI { x: 290, y: 225, w: 220, h: 400 });
    }

    #[test]
    fn test_rebuild_and_serialize() {
        let mut topology = Topology::new();
        topology.add_cluster(&placed_layout());
        let text = topology.serialize();
        assert_eq!(text, "C3[400,300,290,225,220,400:250]");

        let parsed = Topology::parse(&text).unwrap();
        assert_eq!(parsed, topology);

        topology.clear();
        assert!(topology.is_empty());
        assert!(topology.cluster(CanvasId(3)).is_none());
    }
}
