// Arrow forest oracle.
//
// The layout engine never owns links between canvases. It reads them through
// `ArrowGraph`, which must describe a forest: every canvas is the destination
// of at most one arrow and following incoming arrows always ends at a root.
//
// `InMemoryArrows` is a small forest store that enforces those rules. Hosts
// with their own link subsystem implement `ArrowGraph` over it instead.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// Externally allocated canvas identifier. Id 0 is reserved as the "empty"
/// marker of the persisted grid format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanvasId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArrowId(pub u64);

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Directed link `source -> dest`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Arrow {
    pub id: ArrowId,
    pub source: CanvasId,
    pub dest: CanvasId,
}

/// Read-only view of the arrow forest.
pub trait ArrowGraph {
    /// The unique arrow ending at `canvas`, if any.
    fn incoming_arrow(&self, canvas: CanvasId) -> Option<ArrowId>;

    fn arrow(&self, id: ArrowId) -> Option<Arrow>;

    /// Arrows leaving `canvas`. The returned order is the sibling order used
    /// by the ring layout, so it must be stable between calls.
    fn outgoing_arrows(&self, canvas: CanvasId) -> Vec<ArrowId>;

    /// Registry index of a canvas. Only used to label log lines.
    fn canvas_index(&self, _canvas: CanvasId) -> Option<u32> {
        None
    }
}

impl<T: ArrowGraph + ?Sized> ArrowGraph for &T {
    fn incoming_arrow(&self, canvas: CanvasId) -> Option<ArrowId> {
        (**self).incoming_arrow(canvas)
    }

    fn arrow(&self, id: ArrowId) -> Option<Arrow> {
        (**self).arrow(id)
    }

    fn outgoing_arrows(&self, canvas: CanvasId) -> Vec<ArrowId> {
        (**self).outgoing_arrows(canvas)
    }

    fn canvas_index(&self, canvas: CanvasId) -> Option<u32> {
        (**self).canvas_index(canvas)
    }
}

/// Human-readable label for a canvas in log output.
pub(crate) fn label<A: ArrowGraph + ?Sized>(arrows: &A, canvas: CanvasId) -> String {
    match arrows.canvas_index(canvas) {
        Some(index) => format!("#{}", index),
        None => format!("canvas {}", canvas),
    }
}

/// Forest store used by tests and the wasm bindings.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArrows {
    arrows: HashMap<ArrowId, Arrow>,
    incoming: HashMap<CanvasId, ArrowId>,
    outgoing: HashMap<CanvasId, Vec<ArrowId>>,
    /// Canvas -> sequential index, assigned from 1 in registration order.
    indexes: HashMap<CanvasId, u32>,
    next_index: u32,
    next_arrow: u64,
}

impl InMemoryArrows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canvas, returning its index. Registering twice is a no-op.
    pub fn add_canvas(&mut self, canvas: CanvasId) -> u32 {
        if let Some(&index) = self.indexes.get(&canvas) {
            return index;
        }
        self.next_index += 1;
        self.indexes.insert(canvas, self.next_index);
        self.next_index
    }

    pub fn contains_canvas(&self, canvas: CanvasId) -> bool {
        self.indexes.contains_key(&canvas)
    }

    /// Registered canvases, in index order.
    pub fn canvases(&self) -> Vec<CanvasId> {
        let mut all: Vec<(u32, CanvasId)> = self.indexes.iter().map(|(c, i)| (*i, *c)).collect();
        all.sort();
        all.into_iter().map(|(_, c)| c).collect()
    }

    /// Create `source -> dest`. Both canvases are registered on demand.
    ///
    /// Fails when `dest` already has an incoming arrow or when the arrow
    /// would close a cycle.
    pub fn add_arrow(&mut self, source: CanvasId, dest: CanvasId) -> Result<ArrowId> {
        if source == dest {
            return Err(LayoutError::violation(dest, "arrow from a canvas to itself"));
        }
        if self.incoming.contains_key(&dest) {
            return Err(LayoutError::violation(dest, "canvas already has an incoming arrow"));
        }
        // dest must not be an ancestor of source
        let mut walk = source;
        while let Some(id) = self.incoming.get(&walk) {
            walk = self.arrows[id].source;
            if walk == dest {
                return Err(LayoutError::violation(dest, "arrow would close a cycle"));
            }
        }

        self.add_canvas(source);
        self.add_canvas(dest);

        self.next_arrow += 1;
        let id = ArrowId(self.next_arrow);
        self.arrows.insert(id, Arrow { id, source, dest });
        self.incoming.insert(dest, id);
        self.outgoing.entry(source).or_default().push(id);
        Ok(id)
    }

    pub fn remove_arrow(&mut self, id: ArrowId) -> Option<Arrow> {
        let arrow = self.arrows.remove(&id)?;
        self.incoming.remove(&arrow.dest);
        if let Some(list) = self.outgoing.get_mut(&arrow.source) {
            list.retain(|a| *a != id);
        }
        Some(arrow)
    }

    /// Remove every arrow touching `canvas`: the incoming one first, then the
    /// outgoing ones in creation order.
    pub fn detach_canvas(&mut self, canvas: CanvasId) -> Vec<Arrow> {
        let mut removed = Vec::new();
        if let Some(id) = self.incoming.get(&canvas).copied() {
            removed.extend(self.remove_arrow(id));
        }
        let outgoing = self.outgoing.remove(&canvas).unwrap_or_default();
        for id in outgoing {
            removed.extend(self.remove_arrow(id));
        }
        removed
    }

    /// Detach and unregister a canvas.
    pub fn remove_canvas(&mut self, canvas: CanvasId) -> Vec<Arrow> {
        let removed = self.detach_canvas(canvas);
        self.indexes.remove(&canvas);
        removed
    }

    /// Direct children of `canvas`, in arrow creation order.
    pub fn children(&self, canvas: CanvasId) -> Vec<CanvasId> {
        self.outgoing
            .get(&canvas)
            .map(|ids| ids.iter().map(|id| self.arrows[id].dest).collect())
            .unwrap_or_default()
    }
}

impl ArrowGraph for InMemoryArrows {
    fn incoming_arrow(&self, canvas: CanvasId) -> Option<ArrowId> {
        self.incoming.get(&canvas).copied()
    }

    fn arrow(&self, id: ArrowId) -> Option<Arrow> {
        self.arrows.get(&id).copied()
    }

    fn outgoing_arrows(&self, canvas: CanvasId) -> Vec<ArrowId> {
        self.outgoing.get(&canvas).cloned().unwrap_or_default()
    }

    fn canvas_index(&self, canvas: CanvasId) -> Option<u32> {
        self.indexes.get(&canvas).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_arrow_links_both_ends() {
        let mut arrows = InMemoryArrows::new();
        let id = arrows.add_arrow(CanvasId(1), CanvasId(2)).unwrap();

        assert_eq!(arrows.incoming_arrow(CanvasId(2)), Some(id));
        assert_eq!(arrows.incoming_arrow(CanvasId(1)), None);
        assert_eq!(arrows.outgoing_arrows(CanvasId(1)), vec![id]);
        assert_eq!(arrows.children(CanvasId(1)), vec![CanvasId(2)]);
        assert_eq!(arrows.canvas_index(CanvasId(1)), Some(1));
        assert_eq!(arrows.canvas_index(CanvasId(2)), Some(2));
    }

    #[test]
    fn test_second_incoming_arrow_rejected() {
        let mut arrows = InMemoryArrows::new();
        arrows.add_arrow(CanvasId(1), CanvasId(3)).unwrap();
        let err = arrows.add_arrow(CanvasId(2), CanvasId(3)).unwrap_err();
        assert!(matches!(err, LayoutError::StructuralViolation { canvas: CanvasId(3), .. }));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut arrows = InMemoryArrows::new();
        arrows.add_arrow(CanvasId(1), CanvasId(2)).unwrap();
        arrows.add_arrow(CanvasId(2), CanvasId(3)).unwrap();
        assert!(arrows.add_arrow(CanvasId(3), CanvasId(1)).is_err());
        assert!(arrows.add_arrow(CanvasId(4), CanvasId(4)).is_err());
    }

    #[test]
    fn test_detach_canvas_removes_incoming_first() {
        let mut arrows = InMemoryArrows::new();
        arrows.add_arrow(CanvasId(1), CanvasId(2)).unwrap();
        arrows.add_arrow(CanvasId(2), CanvasId(3)).unwrap();
        arrows.add_arrow(CanvasId(2), CanvasId(4)).unwrap();

        let removed = arrows.detach_canvas(CanvasId(2));
        let dests: Vec<CanvasId> = removed.iter().map(|a| a.dest).collect();
        assert_eq!(dests, vec![CanvasId(2), CanvasId(3), CanvasId(4)]);
        assert_eq!(arrows.incoming_arrow(CanvasId(3)), None);
        assert!(arrows.children(CanvasId(1)).is_empty());
    }

    #[test]
    fn test_label_prefers_registry_index() {
        let mut arrows = InMemoryArrows::new();
        arrows.add_canvas(CanvasId(40));
        assert_eq!(label(&arrows, CanvasId(40)), "#1");
        assert_eq!(label(&arrows, CanvasId(41)), "canvas 41");
    }
}
