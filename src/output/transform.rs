//! Derived per-output geometry
//!
//! Turns an output's crop/warp/blend settings plus the realized image size and
//! the destination viewport into render-space draw state. All derived geometry
//! is bottom-left origin (y up); settings are top-left origin (y down).

use glam::Vec2;

use super::edge_blend::{build_blend_meshes, BlendMesh, BlendWidths};
use super::rect::Rect;
use super::warp::{CornerOffsets, WarpQuad};
use crate::settings::OutputSettings;

/// Render-ready geometry for one output
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputTransform {
    /// Region of the source image to sample, in image pixels (y up)
    pub crop_box: Rect,
    /// Where the crop lands in the viewport, aspect preserved
    pub bounding_box: Rect,
    /// Bounding box corners after keystone displacement
    pub quad: WarpQuad,
    /// One strip per edge with a positive blend width
    pub blend_meshes: Vec<BlendMesh>,
}

impl OutputTransform {
    /// Compute geometry from scratch.
    ///
    /// A zero-area image or viewport gives a zero-size bounding box and no
    /// blend meshes rather than an error.
    pub fn compute(settings: &OutputSettings, image_width: u32, image_height: u32, viewport: &Rect) -> Self {
        let image_bounds = Rect::from_size(image_width as f32, image_height as f32);
        let crop_box = crop_box(settings, &image_bounds);
        let bounding_box = crop_box.fit_into(viewport);

        if bounding_box.is_empty() {
            return Self {
                crop_box,
                bounding_box,
                quad: WarpQuad::from_rect(&bounding_box),
                blend_meshes: Vec::new(),
            };
        }

        let quad = WarpQuad::warped(
            &bounding_box,
            &CornerOffsets::from_settings(settings),
            Vec2::new(viewport.width, viewport.height),
        );
        let blend_meshes = build_blend_meshes(&BlendWidths::from_settings(settings), &bounding_box, &quad);

        Self {
            crop_box,
            bounding_box,
            quad,
            blend_meshes,
        }
    }

    /// Whether there is anything to draw
    pub fn is_visible(&self) -> bool {
        !self.bounding_box.is_empty()
    }
}

/// Crop rectangle flipped into y-up image space and clipped to the image
fn crop_box(settings: &OutputSettings, image_bounds: &Rect) -> Rect {
    if !settings.crop_active {
        return *image_bounds;
    }

    let width = settings.crop_size.x.max(0.0);
    let height = settings.crop_size.y.max(0.0);
    let flipped = Rect::new(
        settings.crop_origin.x,
        image_bounds.height - settings.crop_origin.y - height,
        width,
        height,
    );
    flipped.intersect(image_bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::edge_blend::Edge;
    use crate::settings::Point2D;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_uncropped_letterbox() {
        let settings = OutputSettings::named("A");
        let viewport = Rect::from_size(640.0, 480.0);
        let t = OutputTransform::compute(&settings, 1920, 1080, &viewport);

        assert_eq!(t.crop_box, Rect::from_size(1920.0, 1080.0));
        let bb = t.bounding_box;
        assert!(approx(bb.width, 640.0));
        assert!(approx(bb.height, 360.0));
        assert!(approx(bb.x, 0.0));
        assert!(approx(bb.y, 60.0));
        assert!(viewport.contains_rect(&bb));
        assert!(approx(bb.aspect_ratio(), 16.0 / 9.0));
        assert!(t.blend_meshes.is_empty());
    }

    #[test]
    fn test_crop_is_flipped_and_clipped() {
        let mut settings = OutputSettings::named("A");
        settings.crop_active = true;
        settings.crop_origin = Point2D::new(100.0, 50.0);
        settings.crop_size = Point2D::new(400.0, 200.0);

        let viewport = Rect::from_size(800.0, 400.0);
        let t = OutputTransform::compute(&settings, 1000, 500, &viewport);
        // y' = 500 - 50 - 200
        assert_eq!(t.crop_box, Rect::new(100.0, 250.0, 400.0, 200.0));
        assert!(approx(t.bounding_box.width, 800.0));
        assert!(approx(t.bounding_box.height, 400.0));
    }

    #[test]
    fn test_crop_outside_image_is_clipped() {
        let mut settings = OutputSettings::named("A");
        settings.crop_active = true;
        settings.crop_origin = Point2D::new(900.0, 0.0);
        settings.crop_size = Point2D::new(400.0, 500.0);

        let image = Rect::from_size(1000.0, 500.0);
        let t = OutputTransform::compute(&settings, 1000, 500, &Rect::from_size(100.0, 100.0));
        assert_eq!(t.crop_box, Rect::new(900.0, 0.0, 100.0, 500.0));
        assert!(image.contains_rect(&t.crop_box));
    }

    #[test]
    fn test_degenerate_inputs_are_empty_not_errors() {
        let mut settings = OutputSettings::named("A");
        settings.blend_top = 20.0;

        let t = OutputTransform::compute(&settings, 0, 0, &Rect::from_size(640.0, 480.0));
        assert!(!t.is_visible());
        assert!(t.blend_meshes.is_empty());

        let t = OutputTransform::compute(&settings, 1920, 1080, &Rect::from_size(0.0, 0.0));
        assert!(!t.is_visible());
        assert!(t.blend_meshes.is_empty());
    }

    #[test]
    fn test_top_blend_mesh() {
        let mut settings = OutputSettings::named("A");
        settings.blend_top = 36.0;
        let t = OutputTransform::compute(&settings, 1920, 1080, &Rect::from_size(640.0, 480.0));

        assert_eq!(t.blend_meshes.len(), 1);
        let mesh = &t.blend_meshes[0];
        assert_eq!(mesh.edge, Edge::Top);
        for v in mesh.outer_vertices() {
            assert_eq!(v.color[3], 1.0);
            assert!(approx(v.position[1], 420.0));
        }
        for v in mesh.inner_vertices() {
            assert_eq!(v.color[3], 0.0);
            assert!(approx(v.position[1], 384.0));
        }
    }

    #[test]
    fn test_warp_offsets_move_quad() {
        let mut settings = OutputSettings::named("A");
        settings.quad_bottom_right = Point2D::new(-0.1, 0.1);
        let t = OutputTransform::compute(&settings, 1920, 1080, &Rect::from_size(640.0, 480.0));
        let br = t.quad.corners[2];
        assert!(approx(br.x, 640.0 - 64.0));
        // Down in configuration space means lower y in render space
        assert!(approx(br.y, 60.0 - 48.0));
    }
}
