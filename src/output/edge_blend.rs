//! Edge blending for seamless projector overlap
//!
//! Each edge with a positive width gets a 4-vertex triangle strip running from
//! the output edge inward. The outer vertices are opaque black and the inner
//! ones transparent, so compositing the strip over the image produces a
//! linear falloff without a separate blend pass.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::rect::Rect;
use super::warp::WarpQuad;
use crate::settings::OutputSettings;

/// Colour at the outer edge of a blend strip
pub const BLEND_OUTER_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
/// Colour at the inner edge of a blend strip
pub const BLEND_INNER_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Output edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

/// Blend widths in output pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlendWidths {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl BlendWidths {
    pub fn from_settings(settings: &OutputSettings) -> Self {
        Self {
            top: settings.blend_top,
            right: settings.blend_right,
            bottom: settings.blend_bottom,
            left: settings.blend_left,
        }
    }

    pub fn get(&self, edge: Edge) -> f32 {
        match edge {
            Edge::Top => self.top,
            Edge::Right => self.right,
            Edge::Bottom => self.bottom,
            Edge::Left => self.left,
        }
    }
}

/// Vertex for blend strips
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BlendVertex {
    /// Position in render space
    pub position: [f32; 2],
    /// RGBA colour
    pub color: [f32; 4],
}

/// Triangle strip covering one blended edge
#[derive(Debug, Clone, PartialEq)]
pub struct BlendMesh {
    pub edge: Edge,
    /// Strip order: outer, inner, outer, inner
    pub vertices: [BlendVertex; 4],
}

impl BlendMesh {
    /// Build the strip for `edge` of `bounds`, mapped through `quad`.
    ///
    /// Returns `None` for non-positive widths or empty bounds. Widths larger
    /// than the box are clamped to it.
    pub fn build(edge: Edge, width: f32, bounds: &Rect, quad: &WarpQuad) -> Option<Self> {
        if width.is_nan() || width <= 0.0 || bounds.is_empty() {
            return None;
        }

        // Strip endpoints in normalized box coordinates (u right, v up)
        let (outer, inner) = match edge {
            Edge::Top => {
                let t = (width / bounds.height).min(1.0);
                ([Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)], [Vec2::new(0.0, 1.0 - t), Vec2::new(1.0, 1.0 - t)])
            }
            Edge::Bottom => {
                let t = (width / bounds.height).min(1.0);
                ([Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)], [Vec2::new(0.0, t), Vec2::new(1.0, t)])
            }
            Edge::Left => {
                let t = (width / bounds.width).min(1.0);
                ([Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0)], [Vec2::new(t, 0.0), Vec2::new(t, 1.0)])
            }
            Edge::Right => {
                let t = (width / bounds.width).min(1.0);
                ([Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)], [Vec2::new(1.0 - t, 0.0), Vec2::new(1.0 - t, 1.0)])
            }
        };

        let vertex = |uv: Vec2, color: [f32; 4]| BlendVertex {
            position: quad.map(uv.x, uv.y).to_array(),
            color,
        };

        Some(Self {
            edge,
            vertices: [
                vertex(outer[0], BLEND_OUTER_COLOR),
                vertex(inner[0], BLEND_INNER_COLOR),
                vertex(outer[1], BLEND_OUTER_COLOR),
                vertex(inner[1], BLEND_INNER_COLOR),
            ],
        })
    }

    /// Vertices on the output edge (opaque)
    pub fn outer_vertices(&self) -> [BlendVertex; 2] {
        [self.vertices[0], self.vertices[2]]
    }

    /// Vertices on the inner edge (transparent)
    pub fn inner_vertices(&self) -> [BlendVertex; 2] {
        [self.vertices[1], self.vertices[3]]
    }

    /// Raw bytes for vertex buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Build strips for every edge with a positive width
pub fn build_blend_meshes(widths: &BlendWidths, bounds: &Rect, quad: &WarpQuad) -> Vec<BlendMesh> {
    Edge::ALL
        .iter()
        .filter_map(|&edge| BlendMesh::build(edge, widths.get(edge), bounds, quad))
        .collect()
}
