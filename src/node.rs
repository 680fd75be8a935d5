//! Node state shared by the router and the sync loop
//!
//! Holds the node settings, the outputs keyed by name, and the frame tracker.
//! The router mutates it and records what happened in [`TickEvents`]; the
//! sync loop takes those events once per tick and performs the side effects.

use std::collections::BTreeMap;
use std::fmt;

use crate::frame::FrameTracker;
use crate::network::ConfigReport;
use crate::output::{Output, Rect};
use crate::settings::{NodeSettings, OutputSettings, SettingsDocument};

/// Destination of a `send_config` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDestination {
    pub host: String,
    pub port: u16,
}

impl ConfigDestination {
    /// Parse `host:port`
    pub fn parse(s: &str) -> Result<Self, DestinationError> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| DestinationError(s.to_string()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(DestinationError(s.to_string()));
        }
        let port: u16 = port.parse().map_err(|_| DestinationError(s.to_string()))?;
        if port == 0 {
            return Err(DestinationError(s.to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ConfigDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Malformed `host:port` string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationError(pub String);

impl fmt::Display for DestinationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid destination (expected host:port): {:?}", self.0)
    }
}

impl std::error::Error for DestinationError {}

/// What the router did during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    /// A frame announcement or reset arrived
    pub frame_data_received: bool,
    /// The current frame moved (advance or reset)
    pub frame_advanced: bool,
    /// The source path was set and needs reloading
    pub source_changed: bool,
    /// Fullscreen was set and must be applied to the surface
    pub fullscreen_changed: bool,
    /// Pending configuration reports, in arrival order
    pub config_requests: Vec<ConfigDestination>,
}

/// Mutable state of a running node
#[derive(Debug, Clone)]
pub struct NodeState {
    settings: NodeSettings,
    settings_dirty: bool,
    outputs: BTreeMap<String, Output>,
    frames: FrameTracker,
    events: TickEvents,
}

impl Default for NodeState {
    fn default() -> Self {
        Self::first_run()
    }
}

impl NodeState {
    /// State for a node with no stored settings: defaults plus output `1`
    pub fn first_run() -> Self {
        let mut state = Self::from_document(SettingsDocument::default());
        state.add_output(None);
        state
    }

    /// Build state from a loaded settings document.
    ///
    /// Generates a client id when the document has none, marking the node
    /// settings dirty so it gets persisted. An empty output list stays empty.
    pub fn from_document(document: SettingsDocument) -> Self {
        let SettingsDocument { node: mut settings, outputs } = document;
        settings.clamp_history_capacity();

        let mut settings_dirty = false;
        if settings.ensure_client_id() {
            tracing::info!(client_id = %settings.client_id, "Generated client id");
            settings_dirty = true;
        }

        let mut state = Self {
            frames: FrameTracker::new(settings.frame_history_capacity),
            settings,
            settings_dirty,
            outputs: BTreeMap::new(),
            events: TickEvents::default(),
        };

        for output in outputs {
            state.outputs.insert(output.name.clone(), Output::new(output));
        }

        state
    }

    pub fn client_id(&self) -> &str {
        &self.settings.client_id
    }

    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    /// Mutable node settings. Marks the node settings dirty.
    pub fn settings_mut(&mut self) -> &mut NodeSettings {
        self.settings_dirty = true;
        &mut self.settings
    }

    pub fn is_settings_dirty(&self) -> bool {
        self.settings_dirty
    }

    /// Node or any output has unflushed settings
    pub fn any_settings_dirty(&self) -> bool {
        self.settings_dirty || self.outputs.values().any(Output::is_settings_dirty)
    }

    /// Clear every settings dirty flag after a successful flush
    pub fn clear_settings_dirty(&mut self) {
        self.settings_dirty = false;
        for output in self.outputs.values_mut() {
            output.clear_settings_dirty();
        }
    }

    /// Resize the discontinuity window and persist the new size
    pub fn set_history_capacity(&mut self, capacity: usize) {
        let settings = self.settings_mut();
        settings.frame_history_capacity = capacity;
        settings.clamp_history_capacity();
        let capacity = settings.frame_history_capacity;
        self.frames.set_history_capacity(capacity);
    }

    pub fn frames(&self) -> &FrameTracker {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameTracker {
        &mut self.frames
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    pub fn outputs_mut(&mut self) -> impl Iterator<Item = &mut Output> {
        self.outputs.values_mut()
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    pub fn output_mut(&mut self, name: &str) -> Option<&mut Output> {
        self.outputs.get_mut(name)
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn output_names(&self) -> Vec<String> {
        self.outputs.keys().cloned().collect()
    }

    /// Add an output. Without a name it is called `count + 1`.
    ///
    /// Returns the name, or `None` if an output of that name already exists.
    pub fn add_output(&mut self, name: Option<&str>) -> Option<String> {
        let name = match name {
            Some(n) => n.to_string(),
            None => (self.outputs.len() + 1).to_string(),
        };
        if self.outputs.contains_key(&name) {
            return None;
        }
        self.outputs
            .insert(name.clone(), Output::new(OutputSettings::named(name.clone())));
        self.settings_dirty = true;
        tracing::info!(output = %name, "Output added");
        Some(name)
    }

    /// Remove an output. Returns false if it did not exist.
    pub fn remove_output(&mut self, name: &str) -> bool {
        if self.outputs.remove(name).is_none() {
            return false;
        }
        self.settings_dirty = true;
        tracing::info!(output = %name, "Output removed");
        true
    }

    /// Geometry of every output must be rebuilt (image or viewport changed)
    pub fn mark_all_geometry_dirty(&mut self) {
        for output in self.outputs.values_mut() {
            output.mark_geometry_dirty();
        }
    }

    pub fn events(&self) -> &TickEvents {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut TickEvents {
        &mut self.events
    }

    /// Take the events accumulated since the last call
    pub fn take_events(&mut self) -> TickEvents {
        std::mem::take(&mut self.events)
    }

    /// Snapshot of all persisted settings
    pub fn to_document(&self) -> SettingsDocument {
        SettingsDocument {
            node: self.settings.clone(),
            outputs: self.outputs.values().map(|o| o.settings().clone()).collect(),
        }
    }

    /// Configuration report sent on `send_config`
    pub fn config_report(&self, viewport: &Rect) -> ConfigReport {
        ConfigReport::new(
            &self.settings.client_id,
            viewport,
            &self.settings.source_path,
            self.output_names(),
        )
    }
}
