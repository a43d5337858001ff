// Forest edits reported by the host, mapped onto cluster operations.
//
// The host changes its arrow oracle first and then reports what happened.
// Each change touches at most a handful of grid positions and is always
// followed by a full layout pass.

use serde::Deserialize;
use tracing::debug;

use crate::arrows::{ArrowGraph, CanvasId};
use crate::coordinator::{LayoutCoordinator, LayoutPass};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForestChange {
    /// A new canvas, optionally opened from `origin`.
    CanvasCreated { canvas: CanvasId, origin: Option<CanvasId> },
    /// An arrow now ends at `dest`. `dest_was_root` is whether `dest` had no
    /// incoming arrow before, i.e. whether it headed a cluster of its own.
    ArrowCreated { dest: CanvasId, dest_was_root: bool },
    /// The arrow `source -> dest` is gone, so `dest` heads a new cluster.
    ArrowDeleted { source: CanvasId, dest: CanvasId },
    /// `canvas` was removed with all of its arrows. `former_root` is the root
    /// of its tree before the removal, `children` the canvases its outgoing
    /// arrows pointed at.
    CanvasDeleted {
        canvas: CanvasId,
        former_root: CanvasId,
        children: Vec<CanvasId>,
    },
}

impl<A: ArrowGraph> LayoutCoordinator<A> {
    /// Update the grid for `change`, then run a full layout pass.
    pub fn apply(&mut self, change: ForestChange) -> Result<LayoutPass> {
        debug!(?change, "applying forest change");
        match change {
            ForestChange::CanvasCreated { canvas, origin: Some(origin) } => {
                self.insert_cluster_near(origin, canvas)?;
            }
            ForestChange::CanvasCreated { canvas, origin: None } => {
                self.insert_cluster(canvas)?;
            }
            ForestChange::ArrowCreated { dest, dest_was_root } => {
                if dest_was_root {
                    self.remove_cluster_if_any(dest);
                }
            }
            ForestChange::ArrowDeleted { source, dest } => {
                self.insert_cluster_near(source, dest)?;
            }
            ForestChange::CanvasDeleted { canvas, former_root, children } => {
                self.canvas_deleted(canvas, former_root, &children)?;
            }
        }
        self.layout_graph()
    }

    fn canvas_deleted(&mut self, canvas: CanvasId, former_root: CanvasId, children: &[CanvasId]) -> Result<()> {
        if canvas != former_root {
            for &child in children {
                self.insert_cluster_near(former_root, child)?;
            }
            return Ok(());
        }

        let Some((&heir, rest)) = children.split_first() else {
            self.remove_cluster_if_any(canvas);
            return Ok(());
        };
        self.replace_cluster(canvas, heir)?;
        for &child in rest {
            self.insert_cluster_near(heir, child)?;
        }
        Ok(())
    }
}
