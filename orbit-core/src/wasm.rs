//! WASM bindings for the orbit-core library.
//!
//! A `LayoutEngine` owns an in-memory arrow forest and a coordinator. Every
//! edit runs a full layout pass and returns it as `LayoutOutput` JSON.
//! Canvas ids cross the boundary as `u32`; 0 means "no canvas".

use wasm_bindgen::prelude::*;
use serde_json::to_string;

use crate::arrows::{ArrowGraph, CanvasId, InMemoryArrows};
use crate::coordinator::{LayoutCoordinator, LayoutPass};
use crate::error::{LayoutError, Result};
use crate::events::ForestChange;
use crate::layout::LayoutConfig;
use crate::output::LayoutOutput;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

const FALLBACK_ERROR: &str = "{\"error\":{\"message\":\"could not encode layout output\",\"kind\":\"internal\"}}";

fn canvas(id: u32) -> Option<CanvasId> {
    (id != 0).then(|| CanvasId(u64::from(id)))
}

fn render(result: Result<LayoutPass>) -> String {
    let output = match result {
        Ok(pass) => LayoutOutput::from(&pass),
        Err(e) => {
            console_error(&format!("Layout error: {}", e));
            LayoutOutput::from_error(&e)
        }
    };
    to_string(&output).unwrap_or_else(|_| FALLBACK_ERROR.to_string())
}

#[wasm_bindgen]
pub struct LayoutEngine {
    coordinator: LayoutCoordinator<InMemoryArrows>,
}

#[wasm_bindgen]
impl LayoutEngine {
    /// Create an engine. `config_json` may override any `LayoutConfig` field;
    /// an unreadable config falls back to the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> LayoutEngine {
        let config = match config_json.as_deref().map(serde_json::from_str::<LayoutConfig>) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                console_error(&format!("Error reading layout config: {}", e));
                LayoutConfig::default()
            }
            None => LayoutConfig::default(),
        };
        LayoutEngine::with_config(config)
    }

    /// A new canvas, opened from `origin` (0 for none).
    pub fn create_canvas(&mut self, id: u32, origin: u32) -> String {
        render(self.try_create_canvas(id, origin))
    }

    /// Link `source -> dest`.
    pub fn create_arrow(&mut self, source: u32, dest: u32) -> String {
        render(self.try_create_arrow(source, dest))
    }

    /// Remove the arrow ending at `dest`.
    pub fn delete_arrow(&mut self, dest: u32) -> String {
        render(self.try_delete_arrow(dest))
    }

    /// Remove a canvas and all of its arrows.
    pub fn delete_canvas(&mut self, id: u32) -> String {
        render(self.try_delete_canvas(id))
    }

    pub fn layout_graph(&mut self) -> String {
        render(self.coordinator.layout_graph())
    }

    /// Persisted grid text, or an empty string on error.
    pub fn serialize_graph(&mut self) -> String {
        self.coordinator.serialize_graph().unwrap_or_else(|e| {
            console_error(&format!("Error serializing graph: {}", e));
            String::new()
        })
    }

    /// Install a persisted grid and lay it out.
    pub fn load_graph(&mut self, text: &str) -> String {
        let result = self.coordinator.load_graph(text).and_then(|()| self.coordinator.layout_graph());
        if result.is_ok() {
            console_log(&format!("Loaded {} clusters", self.coordinator.graph().roots().len()));
        }
        render(result)
    }

    /// Topology payload of the last pass.
    pub fn topology(&self) -> String {
        self.coordinator.topology_payload()
    }
}

impl LayoutEngine {
    pub fn with_config(config: LayoutConfig) -> LayoutEngine {
        LayoutEngine {
            coordinator: LayoutCoordinator::with_config(InMemoryArrows::new(), config),
        }
    }

    fn require(id: u32) -> Result<CanvasId> {
        canvas(id).ok_or_else(|| LayoutError::violation(CanvasId(0), "canvas id 0 is reserved"))
    }

    fn try_create_canvas(&mut self, id: u32, origin: u32) -> Result<LayoutPass> {
        let id = Self::require(id)?;
        self.coordinator.arrows_mut().add_canvas(id);
        self.coordinator.apply(ForestChange::CanvasCreated { canvas: id, origin: canvas(origin) })
    }

    fn try_create_arrow(&mut self, source: u32, dest: u32) -> Result<LayoutPass> {
        let (source, dest) = (Self::require(source)?, Self::require(dest)?);
        let dest_was_root = self.coordinator.arrows().incoming_arrow(dest).is_none();
        self.coordinator.arrows_mut().add_arrow(source, dest)?;
        self.coordinator.apply(ForestChange::ArrowCreated { dest, dest_was_root })
    }

    fn try_delete_arrow(&mut self, dest: u32) -> Result<LayoutPass> {
        let dest = Self::require(dest)?;
        let removed = self
            .coordinator
            .arrows()
            .incoming_arrow(dest)
            .and_then(|id| self.coordinator.arrows_mut().remove_arrow(id));
        let Some(arrow) = removed else {
            // nothing to unlink
            return self.coordinator.layout_graph();
        };
        self.coordinator.apply(ForestChange::ArrowDeleted { source: arrow.source, dest })
    }

    fn try_delete_canvas(&mut self, id: u32) -> Result<LayoutPass> {
        let canvas = Self::require(id)?;
        let former_root = self.coordinator.root_canvas_id(canvas)?;
        let children = self.coordinator.arrows().children(canvas);
        self.coordinator.arrows_mut().remove_canvas(canvas);
        self.coordinator.apply(ForestChange::CanvasDeleted { canvas, former_root, children })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_edit_sequence() {
        let mut engine = LayoutEngine::with_config(LayoutConfig::default());
        engine.try_create_canvas(1, 0).unwrap();
        engine.try_create_canvas(2, 1).unwrap();
        let merged = engine.try_create_arrow(1, 2).unwrap();
        assert_eq!(merged.layouts.len(), 1);

        let split = engine.try_delete_arrow(2).unwrap();
        assert_eq!(split.layouts.len(), 2);

        let gone = engine.try_delete_canvas(1).unwrap();
        assert_eq!(gone.layouts.len(), 1);
        assert!(engine.topology().starts_with("C2["));
    }

    #[test]
    fn test_zero_canvas_is_rejected() {
        let mut engine = LayoutEngine::with_config(LayoutConfig::default());
        assert!(matches!(
            engine.try_create_canvas(0, 0),
            Err(LayoutError::StructuralViolation { .. })
        ));
    }

    #[test]
    fn test_second_parent_is_rejected() {
        let mut engine = LayoutEngine::with_config(LayoutConfig::default());
        for id in 1..=3 {
            engine.try_create_canvas(id, 0).unwrap();
        }
        engine.try_create_arrow(1, 3).unwrap();
        assert!(engine.try_create_arrow(2, 3).is_err());
        // the failed edit left the grid as it was
        assert_eq!(engine.coordinator.graph().roots().len(), 2);
    }

    #[test]
    fn test_serialize_then_load_in_new_engine() {
        let mut engine = LayoutEngine::with_config(LayoutConfig::default());
        engine.try_create_canvas(1, 0).unwrap();
        engine.try_create_canvas(2, 1).unwrap();
        let text = engine.coordinator.serialize_graph().unwrap();

        let mut other = LayoutEngine::with_config(LayoutConfig::default());
        other.coordinator.arrows_mut().add_canvas(CanvasId(1));
        other.coordinator.arrows_mut().add_canvas(CanvasId(2));
        other.coordinator.load_graph(&text).unwrap();
        assert_eq!(other.coordinator.serialize_graph().unwrap(), text);
    }
}
