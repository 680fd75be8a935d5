//! Physical outputs of the node
//!
//! This module provides:
//! - Per-output crop, four-corner keystone warp, and edge blend configuration
//! - Lazily recomputed render geometry driven by explicit dirty flags
//!
//! An [`Output`] owns its settings (pure data) and the derived
//! [`OutputTransform`]. Mutating the settings marks both the settings and the
//! geometry dirty; geometry is recomputed on the next tick only if dirty.

mod edge_blend;
mod rect;
mod transform;
mod warp;

pub use edge_blend::{build_blend_meshes, BlendMesh, BlendVertex, BlendWidths, Edge, BLEND_INNER_COLOR, BLEND_OUTER_COLOR};
pub use rect::Rect;
pub use transform::OutputTransform;
pub use warp::{Corner, CornerOffsets, WarpQuad};

use crate::settings::OutputSettings;

/// One projection surface
#[derive(Debug, Clone)]
pub struct Output {
    settings: OutputSettings,
    transform: OutputTransform,
    geometry_dirty: bool,
    settings_dirty: bool,
}

impl Output {
    /// Create an output; its geometry starts dirty
    pub fn new(settings: OutputSettings) -> Self {
        Self {
            settings,
            transform: OutputTransform::default(),
            geometry_dirty: true,
            settings_dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    /// Mutable settings access. Marks settings and geometry dirty.
    pub fn settings_mut(&mut self) -> &mut OutputSettings {
        self.settings_dirty = true;
        self.geometry_dirty = true;
        &mut self.settings
    }

    pub fn transform(&self) -> &OutputTransform {
        &self.transform
    }

    pub fn is_geometry_dirty(&self) -> bool {
        self.geometry_dirty
    }

    pub fn is_settings_dirty(&self) -> bool {
        self.settings_dirty
    }

    /// Force a geometry rebuild on the next update (image or viewport changed)
    pub fn mark_geometry_dirty(&mut self) {
        self.geometry_dirty = true;
    }

    /// Called after the settings have been durably flushed
    pub fn clear_settings_dirty(&mut self) {
        self.settings_dirty = false;
    }

    /// Recompute geometry if dirty. Returns whether anything was recomputed.
    pub fn update_geometry(&mut self, image_width: u32, image_height: u32, viewport: &Rect) -> bool {
        if !self.geometry_dirty {
            return false;
        }
        self.transform = OutputTransform::compute(&self.settings, image_width, image_height, viewport);
        self.geometry_dirty = false;
        tracing::trace!(
            output = %self.settings.name,
            bounding_box = ?self.transform.bounding_box,
            blend_meshes = self.transform.blend_meshes.len(),
            "Output geometry recomputed"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_output_is_geometry_dirty() {
        let output = Output::new(OutputSettings::named("A"));
        assert!(output.is_geometry_dirty());
        assert!(!output.is_settings_dirty());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut output = Output::new(OutputSettings::named("A"));
        let viewport = Rect::from_size(640.0, 480.0);
        assert!(output.update_geometry(1920, 1080, &viewport));
        let first = output.transform().clone();

        // Dirty flag cleared: a second call is a no-op, even with other inputs
        assert!(!output.update_geometry(10, 10, &viewport));
        assert_eq!(output.transform(), &first);
    }

    #[test]
    fn test_settings_mutation_marks_dirty() {
        let mut output = Output::new(OutputSettings::named("A"));
        output.update_geometry(1920, 1080, &Rect::from_size(640.0, 480.0));
        output.settings_mut().blend_left = 12.0;
        assert!(output.is_geometry_dirty());
        assert!(output.is_settings_dirty());
        output.clear_settings_dirty();
        assert!(!output.is_settings_dirty());
    }
}
