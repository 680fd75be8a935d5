//! Four-corner keystone warp
//!
//! The bounding box corners are displaced by per-corner offsets to produce the
//! projected quad. Offsets are configured top-left-origin (y down) as fractions
//! of the destination viewport; the quad itself lives in render space (y up).

use glam::Vec2;

use super::rect::Rect;
use crate::settings::OutputSettings;

/// Quad corner, in the order the quad stores them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    pub fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }
}

/// Per-corner offsets read from output settings, in configuration space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CornerOffsets(pub [Vec2; 4]);

impl CornerOffsets {
    pub fn from_settings(settings: &OutputSettings) -> Self {
        Self([
            settings.quad_top_left.into(),
            settings.quad_top_right.into(),
            settings.quad_bottom_right.into(),
            settings.quad_bottom_left.into(),
        ])
    }

    pub fn get(&self, corner: Corner) -> Vec2 {
        self.0[corner.index()]
    }
}

/// Warped quad in render space, corners ordered TL, TR, BR, BL
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WarpQuad {
    pub corners: [Vec2; 4],
}

impl WarpQuad {
    /// Undisplaced corners of a rect (render space: top = larger y)
    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            corners: [
                Vec2::new(rect.x, rect.top()),
                Vec2::new(rect.right(), rect.top()),
                Vec2::new(rect.right(), rect.y),
                Vec2::new(rect.x, rect.y),
            ],
        }
    }

    /// Displace each corner of `rect` by its offset scaled to `extent`.
    ///
    /// The vertical component is negated to go from y-down configuration
    /// space to y-up render space.
    pub fn warped(rect: &Rect, offsets: &CornerOffsets, extent: Vec2) -> Self {
        let mut quad = Self::from_rect(rect);
        for corner in Corner::ALL {
            let offset = offsets.get(corner);
            quad.corners[corner.index()] += Vec2::new(offset.x * extent.x, -offset.y * extent.y);
        }
        quad
    }

    pub fn corner(&self, corner: Corner) -> Vec2 {
        self.corners[corner.index()]
    }

    /// Bilinear map of normalized quad coordinates.
    ///
    /// `u` runs left to right, `v` bottom to top.
    pub fn map(&self, u: f32, v: f32) -> Vec2 {
        let bottom = self.corner(Corner::BottomLeft).lerp(self.corner(Corner::BottomRight), u);
        let top = self.corner(Corner::TopLeft).lerp(self.corner(Corner::TopRight), u);
        bottom.lerp(top, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_quad_matches_rect() {
        let rect = Rect::new(0.0, 60.0, 640.0, 360.0);
        let quad = WarpQuad::warped(&rect, &CornerOffsets::default(), Vec2::new(640.0, 480.0));
        assert_eq!(quad.corner(Corner::TopLeft), Vec2::new(0.0, 420.0));
        assert_eq!(quad.corner(Corner::TopRight), Vec2::new(640.0, 420.0));
        assert_eq!(quad.corner(Corner::BottomRight), Vec2::new(640.0, 60.0));
        assert_eq!(quad.corner(Corner::BottomLeft), Vec2::new(0.0, 60.0));
    }

    #[test]
    fn test_offset_y_is_inverted() {
        let rect = Rect::from_size(100.0, 100.0);
        let mut offsets = CornerOffsets::default();
        // Push the top-left corner right and down in configuration space
        offsets.0[Corner::TopLeft.index()] = Vec2::new(0.1, 0.2);
        let quad = WarpQuad::warped(&rect, &offsets, Vec2::new(200.0, 100.0));
        assert_eq!(quad.corner(Corner::TopLeft), Vec2::new(20.0, 80.0));
        assert_eq!(quad.corner(Corner::BottomRight), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_bilinear_map_hits_corners() {
        let quad = WarpQuad::from_rect(&Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(quad.map(0.0, 0.0), Vec2::new(10.0, 20.0));
        assert_eq!(quad.map(1.0, 1.0), Vec2::new(40.0, 60.0));
        assert_eq!(quad.map(0.5, 0.5), Vec2::new(25.0, 40.0));
    }
}
