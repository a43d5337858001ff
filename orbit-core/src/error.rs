// Error taxonomy for layout operations.
//
// - UnknownCluster: the caller named a root/context canvas that owns no grid
//   position. The caller is out of sync with the layout state.
// - StructuralViolation: the arrow oracle broke the forest contract (cycle,
//   second incoming arrow, dangling arrow id).
// - Malformed: persisted grid or topology text could not be parsed. Nothing
//   is installed when this is returned.

use std::fmt;

use crate::arrows::CanvasId;
use crate::codec::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    UnknownCluster { canvas: CanvasId },
    StructuralViolation { canvas: CanvasId, reason: String },
    Malformed(ParseError),
}

impl LayoutError {
    pub(crate) fn violation(canvas: CanvasId, reason: impl Into<String>) -> Self {
        LayoutError::StructuralViolation {
            canvas,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::UnknownCluster { canvas } => {
                write!(f, "no cluster is rooted at canvas {}", canvas)
            }
            LayoutError::StructuralViolation { canvas, reason } => {
                write!(f, "arrow graph is not a forest at canvas {}: {}", canvas, reason)
            }
            LayoutError::Malformed(e) => write!(f, "malformed layout data: {}", e),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for LayoutError {
    fn from(e: ParseError) -> Self {
        LayoutError::Malformed(e)
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
