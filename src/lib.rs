//! Syncwall Library
//!
//! A networked video-wall node. Frame numbers announced over OSC keep the
//! displayed frame in step with the rest of the wall, and each physical output
//! crops, keystone-warps and edge-blends the image independently.

pub mod app;
pub mod control;
pub mod frame;
pub mod media;
pub mod network;
pub mod node;
pub mod output;
pub mod settings;
pub mod telemetry;

pub use app::{App, TickReport, CONTINUOUS_COLOR, DISCONTINUITY_COLOR};
pub use control::{dispatch, Argument, ControlMessage, Dispatch, DropReason};
pub use frame::{ContinuityState, FrameHistory, FrameTracker};
pub use media::{Color, HeadlessSurface, ImageSequenceSource, MediaError, MediaSource, Playlist, RenderSurface};
pub use network::{ConfigReport, ConfigSender, Inbox, OscConfigSender, OscReceiver};
pub use node::{ConfigDestination, NodeState, TickEvents};
pub use output::{Output, OutputTransform, Rect};
pub use settings::{NodeSettings, OutputSettings, SettingsDocument, SettingsError, SettingsStore, XmlSettingsStore};
