//! Image-sequence media source
//!
//! Resolves a source path into an ordered list of frame files:
//! - a playlist (`.xml`), expanded by [`Playlist`]
//! - a directory, whose image files are taken in name order
//! - a single image, shown as a one-frame sequence
//!
//! Frames are not decoded. Only the header of the current frame is read to
//! track its pixel dimensions.

use std::path::{Path, PathBuf};

use super::playlist::{is_playlist_path, Playlist};
use super::{MediaError, MediaSource};

/// Headless [`MediaSource`] over image files
#[derive(Debug, Default)]
pub struct ImageSequenceSource {
    path: Option<String>,
    frames: Vec<PathBuf>,
    current: u64,
    width: u32,
    height: u32,
}

impl ImageSequenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the frame currently shown
    pub fn current_frame_path(&self) -> Option<&Path> {
        self.frames.get(self.current as usize).map(PathBuf::as_path)
    }

    fn unload(&mut self) {
        self.path = None;
        self.frames.clear();
        self.current = 0;
        self.width = 0;
        self.height = 0;
    }
}

/// Expand a source path into frame files
pub fn resolve_frames(path: &Path) -> Result<Vec<PathBuf>, MediaError> {
    let frames = if path.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && image::ImageFormat::from_path(p).is_ok())
            .collect();
        files.sort();
        files
    } else if is_playlist_path(path) {
        Playlist::load(path)?.into_paths()
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        return Err(MediaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    };

    if frames.is_empty() {
        return Err(MediaError::Empty(path.display().to_string()));
    }
    Ok(frames)
}

impl MediaSource for ImageSequenceSource {
    fn load(&mut self, path: &str) -> Result<(), MediaError> {
        self.unload();

        let frames = resolve_frames(Path::new(path))?;
        let (width, height) = image::image_dimensions(&frames[0])?;

        tracing::info!(
            path = %path,
            frames = frames.len(),
            width,
            height,
            "Loaded image sequence"
        );

        self.path = Some(path.to_string());
        self.frames = frames;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn set_frame(&mut self, frame: u64) {
        if frame == self.current || frame >= self.total_frames() {
            return;
        }
        self.current = frame;

        let Some(path) = self.current_frame_path() else {
            return;
        };
        match image::image_dimensions(path) {
            Ok((width, height)) => {
                self.width = width;
                self.height = height;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read frame header");
            }
        }
    }

    fn current_frame(&self) -> u64 {
        self.current
    }

    fn total_frames(&self) -> u64 {
        self.frames.len() as u64
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn is_loaded(&self) -> bool {
        self.path.is_some()
    }

    fn current_path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}
