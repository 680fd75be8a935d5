//! XML playlists of frame files
//!
//! ```xml
//! <playlist>
//!     <file>intro.png</file>
//!     <sequence digits="5" suffix=".png" count="250" start="1">shots/take_</sequence>
//! </playlist>
//! ```
//!
//! A `sequence` expands to `count` paths `base + zero-padded(start + i) + suffix`.
//! Relative entries resolve against the playlist's directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::MediaError;

#[derive(Debug, Deserialize)]
#[serde(rename = "playlist")]
struct PlaylistXml {
    #[serde(rename = "$value", default)]
    entries: Vec<EntryXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EntryXml {
    File(String),
    Sequence(SequenceXml),
}

#[derive(Debug, Deserialize)]
struct SequenceXml {
    #[serde(rename = "@digits", default)]
    digits: usize,

    #[serde(rename = "@suffix", default)]
    suffix: String,

    #[serde(rename = "@count", default)]
    count: u32,

    #[serde(rename = "@start", default)]
    start: u32,

    #[serde(rename = "$text", default)]
    base: String,
}

impl SequenceXml {
    fn expand(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.count).map(move |i| {
            let n = self.start as u64 + i as u64;
            format!("{}{:0width$}{}", self.base, n, self.suffix, width = self.digits)
        })
    }
}

/// Ordered list of frame paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    paths: Vec<PathBuf>,
}

impl Playlist {
    /// Read a playlist file
    pub fn load(path: &Path) -> Result<Self, MediaError> {
        let xml = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_xml(&xml, base)
    }

    /// Parse playlist XML, resolving relative entries against `base`
    pub fn from_xml(xml: &str, base: &Path) -> Result<Self, MediaError> {
        let doc: PlaylistXml = quick_xml::de::from_str(xml)?;

        let mut paths = Vec::new();
        for entry in &doc.entries {
            match entry {
                EntryXml::File(file) => paths.push(base.join(file.trim())),
                EntryXml::Sequence(seq) => paths.extend(seq.expand().map(|p| base.join(p))),
            }
        }
        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }
}

/// Whether `path` looks like a playlist file
pub fn is_playlist_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}
