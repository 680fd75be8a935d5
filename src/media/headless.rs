//! Windowless render surface
//!
//! Keeps a fixed viewport and records each frame's draw calls instead of
//! rasterizing them. Used by the binary when no display is attached and by
//! tests to inspect what the render pass produced.

use super::{Color, RenderSurface};
use crate::output::{OutputTransform, Rect};

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Output {
        name: String,
        transform: OutputTransform,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
    },
}

/// [`RenderSurface`] without a window
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    viewport: Rect,
    windowed_viewport: Rect,
    fullscreen_viewport: Option<Rect>,
    fullscreen: bool,
    calls: Vec<DrawCall>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let viewport = Rect::from_size(width as f32, height as f32);
        Self {
            viewport,
            windowed_viewport: viewport,
            fullscreen_viewport: None,
            fullscreen: false,
            calls: Vec::new(),
        }
    }

    /// Viewport to switch to when fullscreen is enabled
    pub fn with_fullscreen_size(mut self, width: u32, height: u32) -> Self {
        self.fullscreen_viewport = Some(Rect::from_size(width as f32, height as f32));
        self
    }

    /// Simulate a window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.windowed_viewport = Rect::from_size(width as f32, height as f32);
        if !self.fullscreen {
            self.viewport = self.windowed_viewport;
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Draw calls since the last clear
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn clear_color(&self) -> Option<Color> {
        self.calls.iter().find_map(|c| match c {
            DrawCall::Clear(color) => Some(*color),
            _ => None,
        })
    }
}

impl RenderSurface for HeadlessSurface {
    fn viewport(&self) -> Rect {
        self.viewport
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        if self.fullscreen == fullscreen {
            return;
        }
        self.fullscreen = fullscreen;
        self.viewport = match (fullscreen, self.fullscreen_viewport) {
            (true, Some(full)) => full,
            _ => self.windowed_viewport,
        };
        tracing::info!(fullscreen, "Surface fullscreen changed");
    }

    fn clear(&mut self, color: Color) {
        self.calls.clear();
        self.calls.push(DrawCall::Clear(color));
    }

    fn draw_output(&mut self, name: &str, transform: &OutputTransform) {
        tracing::trace!(
            output = %name,
            bounds = ?transform.bounding_box,
            blends = transform.blend_meshes.len(),
            "draw output"
        );
        self.calls.push(DrawCall::Output {
            name: name.to_string(),
            transform: transform.clone(),
        });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            x,
            y,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_starts_new_frame() {
        let mut surface = HeadlessSurface::new(640, 480);
        surface.draw_text("old", 0.0, 0.0);
        surface.clear(Color::rgb(1, 2, 3));
        surface.draw_text("new", 10.0, 20.0);

        assert_eq!(surface.clear_color(), Some(Color::rgb(1, 2, 3)));
        assert_eq!(surface.texts().collect::<Vec<_>>(), vec!["new"]);
    }

    #[test]
    fn test_fullscreen_switches_viewport() {
        let mut surface = HeadlessSurface::new(640, 480).with_fullscreen_size(1920, 1080);
        surface.set_fullscreen(true);
        assert_eq!(surface.viewport(), Rect::from_size(1920.0, 1080.0));

        // Resizing the window while fullscreen only takes effect on leaving it
        surface.resize(800, 600);
        assert_eq!(surface.viewport().width, 1920.0);
        surface.set_fullscreen(false);
        assert_eq!(surface.viewport(), Rect::from_size(800.0, 600.0));
    }
}
