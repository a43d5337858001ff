//! Output types for JavaScript consumers.
//!
//! These structs are serialized to JSON by the wasm bindings. A host renders
//! clusters from `clusters` and animates only the canvases in `moved`.

use serde::Serialize;

use crate::arrows::CanvasId;
use crate::coordinator::LayoutPass;
use crate::error::LayoutError;
use crate::layout::{PointI, RectI};

/// A canvas that changed position in the last pass
#[derive(Debug, Clone, Serialize)]
pub struct CanvasMoveOutput {
    pub canvas: CanvasId,
    pub x: i32,
    pub y: i32,
}

/// One cluster with the top-left corner of each of its canvases
#[derive(Debug, Clone, Serialize)]
pub struct ClusterOutput {
    pub root: CanvasId,
    pub center: PointI,
    pub radii: Vec<i32>,
    pub bounding_box: RectI,
    pub canvases: Vec<CanvasMoveOutput>,
}

/// Error information for the host's console or status line
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub message: String,
    /// "unknown_cluster", "structural_violation" or "malformed"
    pub kind: &'static str,
    /// Byte offset into the rejected text, for malformed data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl From<&LayoutError> for ErrorInfo {
    fn from(e: &LayoutError) -> Self {
        let (kind, offset) = match e {
            LayoutError::UnknownCluster { .. } => ("unknown_cluster", None),
            LayoutError::StructuralViolation { .. } => ("structural_violation", None),
            LayoutError::Malformed(p) => ("malformed", Some(p.offset)),
        };
        ErrorInfo {
            message: e.to_string(),
            kind,
            offset,
        }
    }
}

/// The combined output of one layout pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutOutput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<ClusterOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub moved: Vec<CanvasMoveOutput>,
    /// Topology payload text
    #[serde(skip_serializing_if = "String::is_empty")]
    pub topology: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl LayoutOutput {
    pub fn from_error(e: &LayoutError) -> Self {
        LayoutOutput {
            error: Some(ErrorInfo::from(e)),
            ..LayoutOutput::default()
        }
    }
}

impl From<&LayoutPass> for LayoutOutput {
    fn from(pass: &LayoutPass) -> Self {
        let clusters = pass
            .layouts
            .iter()
            .zip(pass.topology.clusters())
            .map(|(layout, summary)| ClusterOutput {
                root: summary.root,
                center: summary.center,
                radii: summary.radii.clone(),
                bounding_box: summary.bounding_box,
                canvases: layout
                    .positions()
                    .iter()
                    .map(|p| CanvasMoveOutput { canvas: p.canvas, x: p.location.x, y: p.location.y })
                    .collect(),
            })
            .collect();
        let moved = pass
            .moved
            .iter()
            .map(|p| CanvasMoveOutput { canvas: p.canvas, x: p.location.x, y: p.location.y })
            .collect();

        LayoutOutput {
            clusters,
            moved,
            topology: pass.topology.serialize(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrows::InMemoryArrows;
    use crate::coordinator::LayoutCoordinator;

    #[test]
    fn test_pass_to_json() {
        let mut arrows = InMemoryArrows::new();
        arrows.add_canvas(CanvasId(1));
        let mut c = LayoutCoordinator::new(arrows);
        c.insert_cluster(CanvasId(1)).unwrap();
        let pass = c.layout_graph().unwrap();

        let json = serde_json::to_value(LayoutOutput::from(&pass)).unwrap();
        assert_eq!(json["clusters"][0]["root"], 1);
        assert_eq!(json["clusters"][0]["canvases"][0]["x"], 25);
        assert_eq!(json["moved"][0]["canvas"], 1);
        assert_eq!(json["topology"], "C1[125,75,15,0,220,150:]");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_to_json() {
        let out = LayoutOutput::from_error(&LayoutError::UnknownCluster { canvas: CanvasId(9) });
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["error"]["kind"], "unknown_cluster");
        assert!(json["error"].get("offset").is_none());
        assert!(json.get("clusters").is_none());
    }
}
