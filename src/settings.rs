//! Settings management for syncwall
//!
//! Node and output settings are plain value types. Mutation sites set an
//! explicit dirty flag on the owner; the sync loop flushes the whole document
//! through a [`SettingsStore`] and clears the flags only after a successful
//! write. Every field carries a serde default so partial or older files load.

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::frame::{DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY, MIN_HISTORY_CAPACITY};

/// Length of a generated client identifier
pub const CLIENT_ID_LEN: usize = 8;

/// 2D point stored in settings (configuration space, y down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point2D> for glam::Vec2 {
    fn from(p: Point2D) -> Self {
        glam::Vec2::new(p.x, p.y)
    }
}

/// Node-level settings shared process-wide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Routing token for client-scoped addresses; generated on first run
    #[serde(rename = "clientId", default)]
    pub client_id: String,

    /// Path of the media source (movie, image, directory, or playlist)
    #[serde(rename = "sourcePath", default = "default_source_path")]
    pub source_path: String,

    /// Whether the frame/identity overlay is drawn
    #[serde(rename = "showStats", default)]
    pub show_stats: bool,

    #[serde(rename = "fullscreen", default)]
    pub fullscreen: bool,

    /// Number of announcements used as continuity evidence.
    /// Larger windows keep a transient dropout visible for longer.
    #[serde(rename = "frameHistoryCapacity", default = "default_history_capacity")]
    pub frame_history_capacity: usize,
}

fn default_source_path() -> String {
    "Movie.mov".to_string()
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            source_path: default_source_path(),
            show_stats: false,
            fullscreen: false,
            frame_history_capacity: default_history_capacity(),
        }
    }
}

impl NodeSettings {
    /// Clamp the history window to its valid range
    pub fn clamp_history_capacity(&mut self) {
        self.frame_history_capacity = self
            .frame_history_capacity
            .clamp(MIN_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY);
    }

    /// Generate a client id if none is set. Returns true if one was generated.
    pub fn ensure_client_id(&mut self) -> bool {
        if !self.client_id.trim().is_empty() {
            return false;
        }
        self.client_id = generate_client_id();
        true
    }
}

/// Random alphanumeric routing token
pub fn generate_client_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CLIENT_ID_LEN)
        .map(char::from)
        .collect()
}

/// Persisted configuration of one output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Output name; also the routing segment and the persisted key
    #[serde(rename = "name", default)]
    pub name: String,

    #[serde(rename = "cropActive", default)]
    pub crop_active: bool,

    /// Crop origin in source pixels, top-left origin
    #[serde(rename = "cropOrigin", default)]
    pub crop_origin: Point2D,

    /// Crop width (x) and height (y) in source pixels
    #[serde(rename = "cropSize", default = "default_crop_size")]
    pub crop_size: Point2D,

    /// Corner offsets as fractions of the viewport, y down
    #[serde(rename = "quadTopLeft", default)]
    pub quad_top_left: Point2D,
    #[serde(rename = "quadTopRight", default)]
    pub quad_top_right: Point2D,
    #[serde(rename = "quadBottomRight", default)]
    pub quad_bottom_right: Point2D,
    #[serde(rename = "quadBottomLeft", default)]
    pub quad_bottom_left: Point2D,

    /// Blend widths in output pixels
    #[serde(rename = "blendTop", default)]
    pub blend_top: f32,
    #[serde(rename = "blendRight", default)]
    pub blend_right: f32,
    #[serde(rename = "blendBottom", default)]
    pub blend_bottom: f32,
    #[serde(rename = "blendLeft", default)]
    pub blend_left: f32,
}

fn default_crop_size() -> Point2D {
    Point2D::new(1920.0, 1080.0)
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self::named("1")
    }
}

impl OutputSettings {
    /// Default settings for an output called `name`
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            crop_active: false,
            crop_origin: Point2D::default(),
            crop_size: default_crop_size(),
            quad_top_left: Point2D::default(),
            quad_top_right: Point2D::default(),
            quad_bottom_right: Point2D::default(),
            quad_bottom_left: Point2D::default(),
            blend_top: 0.0,
            blend_right: 0.0,
            blend_bottom: 0.0,
            blend_left: 0.0,
        }
    }
}

/// The whole persisted record: one node plus its named outputs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename = "SyncwallSettings")]
pub struct SettingsDocument {
    #[serde(rename = "node", default)]
    pub node: NodeSettings,

    #[serde(rename = "output", default)]
    pub outputs: Vec<OutputSettings>,
}

impl SettingsDocument {
    /// Parse a document from XML text
    pub fn from_xml(xml: &str) -> Result<Self, SettingsError> {
        let mut document: Self = from_str(xml).map_err(SettingsError::XmlParse)?;
        document.node.clamp_history_capacity();
        // Unnamed or duplicate outputs cannot be routed to
        let mut seen = std::collections::HashSet::new();
        document
            .outputs
            .retain(|o| !o.name.is_empty() && seen.insert(o.name.clone()));
        Ok(document)
    }

    /// Serialize the document with an XML declaration
    pub fn to_xml(&self) -> Result<String, SettingsError> {
        let xml = to_string(self).map_err(SettingsError::XmlWrite)?;
        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml))
    }
}

/// Durable storage for the settings document
pub trait SettingsStore {
    /// Load the persisted document; `None` if nothing has been stored yet
    fn load(&mut self) -> Result<Option<SettingsDocument>, SettingsError>;

    /// Write the document to durable storage
    fn flush(&mut self, document: &SettingsDocument) -> Result<(), SettingsError>;
}

/// Settings stored as an XML file on disk
#[derive(Debug, Clone)]
pub struct XmlSettingsStore {
    path: PathBuf,
}

impl XmlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform config directory
    pub fn in_config_dir() -> Result<Self, SettingsError> {
        Self::default_path().map(Self::new).ok_or(SettingsError::NoConfigDir)
    }

    /// `<config dir>/syncwall/settings.xml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("syncwall");
            p.push("settings.xml");
            p
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for XmlSettingsStore {
    fn load(&mut self) -> Result<Option<SettingsDocument>, SettingsError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No settings file");
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(SettingsError::Io)?;
        SettingsDocument::from_xml(&contents).map(Some)
    }

    fn flush(&mut self, document: &SettingsDocument) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(SettingsError::Io)?;
            }
        }
        let xml = document.to_xml()?;
        fs::write(&self.path, xml).map_err(SettingsError::Io)?;
        tracing::debug!(path = %self.path.display(), "Settings flushed");
        Ok(())
    }
}

/// Settings-related errors
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    XmlParse(quick_xml::DeError),
    XmlWrite(quick_xml::SeError),
    NoConfigDir,
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::XmlParse(e) => write!(f, "XML parse error: {}", e),
            SettingsError::XmlWrite(e) => write!(f, "XML write error: {}", e),
            SettingsError::NoConfigDir => write!(f, "Could not find config directory"),
        }
    }
}

impl std::error::Error for SettingsError {}
