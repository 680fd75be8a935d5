//! Media and render collaborators
//!
//! The sync loop drives a [`MediaSource`] (what to show) and a
//! [`RenderSurface`] (where to show it) through these traits. The binary uses
//! the headless implementations in this module; a windowed renderer plugs in
//! behind the same interfaces.

pub mod headless;
pub mod playlist;
pub mod sequence;

pub use headless::{DrawCall, HeadlessSurface};
pub use playlist::Playlist;
pub use sequence::ImageSequenceSource;

use crate::output::{OutputTransform, Rect};

/// Errors raised while loading media
#[derive(Debug)]
pub enum MediaError {
    /// Filesystem error
    Io(std::io::Error),
    /// Playlist file could not be parsed
    Playlist(quick_xml::DeError),
    /// Frame image could not be read
    Image(image::ImageError),
    /// Source resolved to no frames
    Empty(String),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::Io(e) => write!(f, "IO error: {}", e),
            MediaError::Playlist(e) => write!(f, "Invalid playlist: {}", e),
            MediaError::Image(e) => write!(f, "Image error: {}", e),
            MediaError::Empty(path) => write!(f, "No frames found in {}", path),
        }
    }
}

impl std::error::Error for MediaError {}

impl From<std::io::Error> for MediaError {
    fn from(e: std::io::Error) -> Self {
        MediaError::Io(e)
    }
}

impl From<quick_xml::DeError> for MediaError {
    fn from(e: quick_xml::DeError) -> Self {
        MediaError::Playlist(e)
    }
}

impl From<image::ImageError> for MediaError {
    fn from(e: image::ImageError) -> Self {
        MediaError::Image(e)
    }
}

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalized RGBA, for clear colours
    pub fn to_rgba_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            1.0,
        ]
    }
}

/// Source of frames for the outputs
pub trait MediaSource {
    /// Load the source at `path`, replacing any current one.
    ///
    /// On error the source is left unloaded.
    fn load(&mut self, path: &str) -> Result<(), MediaError>;

    /// Seek to `frame` (already wrapped into `0..total_frames`)
    fn set_frame(&mut self, frame: u64);

    /// Frame currently shown
    fn current_frame(&self) -> u64;

    /// Number of frames, 0 when unloaded
    fn total_frames(&self) -> u64;

    /// Pixel width of the current frame
    fn width(&self) -> u32;

    /// Pixel height of the current frame
    fn height(&self) -> u32;

    fn is_loaded(&self) -> bool;

    /// Path given to the last successful `load`
    fn current_path(&self) -> Option<&str>;
}

/// Destination of the render pass
pub trait RenderSurface {
    /// Current drawable area, bottom-left origin
    fn viewport(&self) -> Rect;

    fn set_fullscreen(&mut self, fullscreen: bool);

    /// Start a frame by clearing to `color`
    fn clear(&mut self, color: Color);

    /// Draw the media's current frame through one output's geometry
    fn draw_output(&mut self, name: &str, transform: &OutputTransform);

    /// Draw a line of overlay text, top-left anchored
    fn draw_text(&mut self, text: &str, x: f32, y: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_normalization() {
        let c = Color::rgb(255, 0, 51).to_rgba_f32();
        assert_eq!(c, [1.0, 0.0, 0.2, 1.0]);
    }

    #[test]
    fn test_error_display() {
        let e = MediaError::Empty("clips/".into());
        assert_eq!(e.to_string(), "No frames found in clips/");
    }
}
