//! Per-tick synchronization loop
//!
//! Each tick drains the already-buffered control messages, applies the side
//! effects the router recorded, brings derived geometry up to date and then
//! renders. All state mutation for a tick finishes before the render pass
//! reads it.

use crate::control::{dispatch, Dispatch};
use crate::media::{Color, MediaSource, RenderSurface};
use crate::network::{ConfigSender, Inbox};
use crate::node::NodeState;
use crate::output::Rect;
use crate::settings::SettingsStore;

/// Background while the frame stream is continuous
pub const CONTINUOUS_COLOR: Color = Color::rgb(76, 153, 0);
/// Background while the history shows a gap
pub const DISCONTINUITY_COLOR: Color = Color::rgb(204, 0, 0);

const TEXT_MARGIN: f32 = 20.0;
const TEXT_LINE_HEIGHT: f32 = 20.0;

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Messages that changed state
    pub applied: usize,
    /// Messages dropped by the router
    pub dropped: usize,
    pub frame_advanced: bool,
    /// The discontinuity verdict flipped
    pub continuity_changed: bool,
    pub source_reloaded: bool,
    /// Realized image dimensions differ from the previous tick
    pub image_size_changed: bool,
    pub viewport_changed: bool,
    /// Config reports handed to the sender
    pub configs_sent: usize,
    pub settings_flushed: bool,
    /// Outputs whose geometry was rebuilt
    pub outputs_recomputed: usize,
}

/// A running node: state plus its collaborators
pub struct App<M, R> {
    state: NodeState,
    media: M,
    surface: R,
    store: Box<dyn SettingsStore>,
    config_sender: Box<dyn ConfigSender>,
    /// Realized image size; `None` until measured after a (re)load
    image_size: Option<(u32, u32)>,
    viewport: Rect,
    background: Color,
    flush_failing: bool,
    tick_count: u64,
}

impl<M: MediaSource, R: RenderSurface> App<M, R> {
    /// Wire up a node. Loads the configured source and applies the persisted
    /// fullscreen state.
    pub fn new(
        state: NodeState,
        media: M,
        surface: R,
        store: Box<dyn SettingsStore>,
        config_sender: Box<dyn ConfigSender>,
    ) -> Self {
        let mut app = Self {
            state,
            media,
            surface,
            store,
            config_sender,
            image_size: None,
            viewport: Rect::default(),
            background: CONTINUOUS_COLOR,
            flush_failing: false,
            tick_count: 0,
        };

        app.surface.set_fullscreen(app.state.settings().fullscreen);
        app.viewport = app.surface.viewport();
        app.load_source();

        tracing::info!(
            client_id = %app.state.client_id(),
            outputs = app.state.output_count(),
            viewport = ?app.viewport,
            "Node started"
        );
        app
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut NodeState {
        &mut self.state
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Dimensions of the image the geometry was last computed for
    pub fn image_size(&self) -> (u32, u32) {
        self.image_size.unwrap_or((0, 0))
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Run one tick: drain `inbox`, update state, render
    pub fn tick(&mut self, inbox: &mut dyn Inbox) -> TickReport {
        let mut report = TickReport::default();
        self.tick_count += 1;

        // Messages that arrive while draining wait for the next tick
        let backlog = inbox.backlog();
        for _ in 0..backlog {
            let Some(message) = inbox.try_next() else {
                break;
            };
            match dispatch(&mut self.state, &message) {
                Dispatch::Applied => report.applied += 1,
                Dispatch::Dropped(_) => report.dropped += 1,
            }
        }

        let events = self.state.take_events();

        if events.frame_data_received && self.state.frames_mut().recompute_continuity() {
            report.continuity_changed = true;
            let frames = self.state.frames();
            if frames.in_discontinuity() {
                tracing::warn!(gaps = %frames.gap_report(), "Frame discontinuity");
                self.background = DISCONTINUITY_COLOR;
            } else {
                tracing::info!(frame = frames.current_frame(), "Frame continuity restored");
                self.background = CONTINUOUS_COLOR;
            }
        }

        if events.fullscreen_changed {
            self.surface.set_fullscreen(self.state.settings().fullscreen);
        }

        if events.source_changed {
            self.load_source();
            report.source_reloaded = true;
        }

        if events.frame_advanced || events.source_changed {
            report.frame_advanced = events.frame_advanced;
            if let Some(frame) = self.state.frames().display_frame(self.media.total_frames()) {
                self.media.set_frame(frame);
            }
        }

        let size = (self.media.width(), self.media.height());
        if self.image_size != Some(size) {
            tracing::debug!(width = size.0, height = size.1, "Image size changed");
            self.image_size = Some(size);
            self.state.mark_all_geometry_dirty();
            report.image_size_changed = true;
        }

        let viewport = self.surface.viewport();
        if viewport != self.viewport {
            tracing::debug!(viewport = ?viewport, "Viewport changed");
            self.viewport = viewport;
            self.state.mark_all_geometry_dirty();
            report.viewport_changed = true;
        }

        for destination in &events.config_requests {
            let config = self.state.config_report(&self.viewport);
            self.config_sender.send(destination, &config);
            report.configs_sent += 1;
        }

        if self.state.any_settings_dirty() {
            report.settings_flushed = self.flush_settings();
        }

        let (width, height) = self.image_size();
        let viewport = self.viewport;
        for output in self.state.outputs_mut() {
            if output.update_geometry(width, height, &viewport) {
                report.outputs_recomputed += 1;
            }
        }

        self.render();

        tracing::trace!(tick = self.tick_count, ?report, "Tick");
        report
    }

    /// Reload the source named in settings and forget the realized size
    fn load_source(&mut self) {
        self.image_size = None;

        let path = self.state.settings().source_path.clone();
        if path.is_empty() {
            return;
        }
        if let Err(e) = self.media.load(&path) {
            tracing::warn!(path = %path, error = %e, "Failed to load source");
        }
    }

    fn flush_settings(&mut self) -> bool {
        match self.store.flush(&self.state.to_document()) {
            Ok(()) => {
                self.state.clear_settings_dirty();
                if self.flush_failing {
                    tracing::info!("Settings flush recovered");
                }
                self.flush_failing = false;
                true
            }
            Err(e) => {
                if !self.flush_failing {
                    tracing::warn!(error = %e, "Failed to save settings, will retry");
                }
                self.flush_failing = true;
                false
            }
        }
    }

    fn render(&mut self) {
        self.surface.clear(self.background);

        if self.media.is_loaded() {
            for output in self.state.outputs() {
                if output.transform().is_visible() {
                    self.surface.draw_output(output.name(), output.transform());
                }
            }
        }

        let mut lines: Vec<String> = Vec::new();
        let frames = self.state.frames();
        if frames.in_discontinuity() {
            lines.push("Frame discontinuity".to_string());
            lines.push(frames.gap_report().to_string());
        }
        if self.state.settings().show_stats {
            lines.push(format!("Frame {}", frames.current_frame()));
            lines.push(format!("Client {}", self.state.client_id()));
            if let Some(path) = self.media.current_path() {
                lines.push(format!("Source {}", path));
            }
        }

        for (i, line) in lines.iter().enumerate() {
            let y = TEXT_MARGIN + i as f32 * TEXT_LINE_HEIGHT;
            self.surface.draw_text(line, TEXT_MARGIN, y);
        }
    }
}
