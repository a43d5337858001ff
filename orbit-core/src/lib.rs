//! Ring layout and grid packing for canvases linked into a forest by arrows.
//!
//! Each tree of the forest is a cluster, laid out as concentric rings around
//! its root. Clusters are packed onto a grid so that no two overlap. The
//! `LayoutCoordinator` is the entry point; `SharedLayout` wraps it for use
//! across threads and `wasm::LayoutEngine` exposes it to JavaScript.

pub mod arrows;
pub mod codec;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod layout;
pub mod output;
pub mod shared;
pub mod topology;
pub mod wasm;

pub use arrows::{Arrow, ArrowGraph, ArrowId, CanvasId, InMemoryArrows};
pub use coordinator::{LayoutCoordinator, LayoutPass};
pub use error::{LayoutError, Result};
pub use events::ForestChange;
pub use layout::{CanvasPosition, ClusterGraph, ClusterLayout, LayoutConfig, PointI, RectI, SizeI};
pub use shared::{LayoutSnapshot, SharedLayout};
pub use topology::{Topology, TopologyCluster};
