// Thread-safe wrapper around a coordinator.
//
// Mutations are serialized by one mutex around the coordinator. Readers get
// the snapshot published by the last completed layout pass and never see a
// grid mid-edit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::arrows::{ArrowGraph, CanvasId};
use crate::coordinator::{LayoutCoordinator, LayoutPass};
use crate::error::Result;
use crate::events::ForestChange;
use crate::layout::PointI;
use crate::topology::Topology;

/// Canvas positions and topology of one completed layout pass.
#[derive(Debug, Clone, Default)]
pub struct LayoutSnapshot {
    pub positions: HashMap<CanvasId, PointI>,
    pub topology: Topology,
}

#[derive(Debug)]
pub struct SharedLayout<A> {
    coordinator: Mutex<LayoutCoordinator<A>>,
    snapshot: RwLock<Arc<LayoutSnapshot>>,
}

impl<A: ArrowGraph> SharedLayout<A> {
    pub fn new(coordinator: LayoutCoordinator<A>) -> Self {
        let snapshot = LayoutSnapshot {
            positions: coordinator.positions().clone(),
            topology: coordinator.topology().clone(),
        };
        Self {
            coordinator: Mutex::new(coordinator),
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The last published pass.
    pub fn snapshot(&self) -> Arc<LayoutSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn canvas_position(&self, canvas: CanvasId) -> Option<PointI> {
        self.snapshot().positions.get(&canvas).copied()
    }

    pub fn apply(&self, change: ForestChange) -> Result<LayoutPass> {
        self.update(|c| c.apply(change))
    }

    pub fn layout_graph(&self) -> Result<LayoutPass> {
        self.update(LayoutCoordinator::layout_graph)
    }

    /// Run `f` with exclusive access to the coordinator, then publish
    /// whatever pass it leaves behind.
    pub fn update<R>(&self, f: impl FnOnce(&mut LayoutCoordinator<A>) -> R) -> R {
        let mut coordinator = self.coordinator.lock().unwrap_or_else(|e| e.into_inner());
        let result = f(&mut coordinator);
        let snapshot = Arc::new(LayoutSnapshot {
            positions: coordinator.positions().clone(),
            topology: coordinator.topology().clone(),
        });
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
        result
    }
}
