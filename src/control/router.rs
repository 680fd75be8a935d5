//! Message dispatch
//!
//! Routes a parsed address to a node-level command or an output-level field
//! through static dispatch tables and applies it to [`NodeState`]. The router
//! does no I/O: it mutates state, sets dirty flags, and records side effects
//! in the node's tick events. Anything it cannot apply is logged and dropped.

use std::fmt;

use super::message::{Argument, ControlMessage};
use super::route::{parse_route, Route, RouteError};
use crate::node::{ConfigDestination, NodeState};
use crate::output::{Corner, Edge};
use crate::settings::OutputSettings;

/// Node-level commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCommand {
    FrameReset,
    FrameNumber,
    ShowStats,
    Fullscreen,
    SourcePath,
    AddOutput,
    DeleteOutput,
    SendConfig,
}

/// Node-level dispatch table
pub const NODE_COMMANDS: &[(&str, NodeCommand)] = &[
    ("frame_reset", NodeCommand::FrameReset),
    ("frame_number", NodeCommand::FrameNumber),
    ("show_stats", NodeCommand::ShowStats),
    ("fullscreen", NodeCommand::Fullscreen),
    ("source_path", NodeCommand::SourcePath),
    ("add_output", NodeCommand::AddOutput),
    ("delete_output", NodeCommand::DeleteOutput),
    ("send_config", NodeCommand::SendConfig),
];

impl NodeCommand {
    pub fn lookup(path: &str) -> Option<Self> {
        NODE_COMMANDS.iter().find(|(p, _)| *p == path).map(|(_, c)| *c)
    }

    /// Accepted argument counts (min, max)
    fn arity(self) -> (usize, usize) {
        match self {
            NodeCommand::FrameReset | NodeCommand::AddOutput => (0, 1),
            _ => (1, 1),
        }
    }
}

/// Axis of a 2D setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Output-level settable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputField {
    CropActive,
    CropX,
    CropY,
    CropWidth,
    CropHeight,
    Quad(Corner, Axis),
    Blend(Edge),
}

/// Output-level dispatch table
pub const OUTPUT_FIELDS: &[(&str, OutputField)] = &[
    ("crop/active", OutputField::CropActive),
    ("crop/x", OutputField::CropX),
    ("crop/y", OutputField::CropY),
    ("crop/width", OutputField::CropWidth),
    ("crop/height", OutputField::CropHeight),
    ("quad/top_left/x", OutputField::Quad(Corner::TopLeft, Axis::X)),
    ("quad/top_left/y", OutputField::Quad(Corner::TopLeft, Axis::Y)),
    ("quad/top_right/x", OutputField::Quad(Corner::TopRight, Axis::X)),
    ("quad/top_right/y", OutputField::Quad(Corner::TopRight, Axis::Y)),
    ("quad/bottom_right/x", OutputField::Quad(Corner::BottomRight, Axis::X)),
    ("quad/bottom_right/y", OutputField::Quad(Corner::BottomRight, Axis::Y)),
    ("quad/bottom_left/x", OutputField::Quad(Corner::BottomLeft, Axis::X)),
    ("quad/bottom_left/y", OutputField::Quad(Corner::BottomLeft, Axis::Y)),
    ("blend/top", OutputField::Blend(Edge::Top)),
    ("blend/right", OutputField::Blend(Edge::Right)),
    ("blend/bottom", OutputField::Blend(Edge::Bottom)),
    ("blend/left", OutputField::Blend(Edge::Left)),
];

impl OutputField {
    pub fn lookup(path: &str) -> Option<Self> {
        OUTPUT_FIELDS.iter().find(|(p, _)| *p == path).map(|(_, f)| *f)
    }
}

/// Outcome of dispatching one message
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Applied,
    Dropped(DropReason),
}

impl Dispatch {
    pub fn is_applied(&self) -> bool {
        matches!(self, Dispatch::Applied)
    }
}

/// Why a message was dropped
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    Route(RouteError),
    UnknownAddress(String),
    UnknownOutput(String),
    DuplicateOutput(String),
    WrongArity { expected: (usize, usize), got: usize },
    WrongType { expected: &'static str, got: &'static str },
    InvalidDestination(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Route(e) => write!(f, "{}", e),
            DropReason::UnknownAddress(path) => write!(f, "unknown address {:?}", path),
            DropReason::UnknownOutput(name) => write!(f, "unknown output {:?}", name),
            DropReason::DuplicateOutput(name) => write!(f, "output {:?} already exists", name),
            DropReason::WrongArity { expected: (min, max), got } if min == max => {
                write!(f, "expected {} argument(s), got {}", min, got)
            }
            DropReason::WrongArity { expected: (min, max), got } => {
                write!(f, "expected {}..={} arguments, got {}", min, max, got)
            }
            DropReason::WrongType { expected, got } => write!(f, "expected {} argument, got {}", expected, got),
            DropReason::InvalidDestination(e) => write!(f, "{}", e),
        }
    }
}

type Handled = Result<(), DropReason>;

/// Route and apply one message to `state`. Never fails; drops are logged.
pub fn dispatch(state: &mut NodeState, message: &ControlMessage) -> Dispatch {
    let result = match parse_route(&message.address, state.client_id()) {
        Ok(Route::Node { path }) => apply_node(state, path, &message.args),
        Ok(Route::Output { name, path }) => apply_output(state, name, path, &message.args),
        Err(e) => Err(DropReason::Route(e)),
    };

    match result {
        Ok(()) => {
            tracing::trace!(msg = %message, "Applied");
            Dispatch::Applied
        }
        Err(reason) => {
            match &reason {
                DropReason::Route(RouteError::OtherClient(_)) => {
                    tracing::trace!(address = %message.address, "Ignoring message for another client")
                }
                DropReason::UnknownAddress(_) | DropReason::DuplicateOutput(_) => {
                    tracing::debug!(msg = %message, reason = %reason, "Message dropped")
                }
                _ => tracing::warn!(msg = %message, reason = %reason, "Message dropped"),
            }
            Dispatch::Dropped(reason)
        }
    }
}

fn check_arity(args: &[Argument], expected: (usize, usize)) -> Handled {
    if args.len() < expected.0 || args.len() > expected.1 {
        return Err(DropReason::WrongArity {
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn int_arg(arg: &Argument) -> Result<i64, DropReason> {
    arg.as_i64().ok_or(DropReason::WrongType {
        expected: "integer",
        got: arg.type_name(),
    })
}

fn float_arg(arg: &Argument) -> Result<f32, DropReason> {
    arg.as_f32().ok_or(DropReason::WrongType {
        expected: "float",
        got: arg.type_name(),
    })
}

fn bool_arg(arg: &Argument) -> Result<bool, DropReason> {
    arg.as_bool().ok_or(DropReason::WrongType {
        expected: "boolean",
        got: arg.type_name(),
    })
}

fn string_arg(arg: &Argument) -> Result<&str, DropReason> {
    match arg {
        Argument::String(s) => Ok(s),
        other => Err(DropReason::WrongType {
            expected: "string",
            got: other.type_name(),
        }),
    }
}

/// Output names may arrive as numbers ("add_output 3")
fn name_arg(arg: &Argument) -> Result<String, DropReason> {
    let name = match arg {
        Argument::String(s) => s.trim().to_string(),
        Argument::Int(_) | Argument::Long(_) => arg.to_text(),
        Argument::Float(_) => {
            return Err(DropReason::WrongType {
                expected: "name",
                got: arg.type_name(),
            })
        }
    };
    if name.is_empty() || name.contains('/') {
        return Err(DropReason::WrongType {
            expected: "name",
            got: arg.type_name(),
        });
    }
    Ok(name)
}

fn apply_node(state: &mut NodeState, path: &str, args: &[Argument]) -> Handled {
    let command = NodeCommand::lookup(path).ok_or_else(|| DropReason::UnknownAddress(path.to_string()))?;
    check_arity(args, command.arity())?;

    match command {
        NodeCommand::FrameReset => {
            let value = args.first().map(int_arg).transpose()?;
            state.frames_mut().reset(value);
            let events = state.events_mut();
            events.frame_data_received = true;
            events.frame_advanced = true;
            tracing::info!(frame = state.frames().current_frame(), "Frame reset");
        }
        NodeCommand::FrameNumber => {
            let frame = int_arg(&args[0])?;
            let advanced = state.frames_mut().record_frame(frame);
            let events = state.events_mut();
            events.frame_data_received = true;
            events.frame_advanced |= advanced;
        }
        NodeCommand::ShowStats => {
            let show = bool_arg(&args[0])?;
            state.settings_mut().show_stats = show;
        }
        NodeCommand::Fullscreen => {
            let fullscreen = bool_arg(&args[0])?;
            state.settings_mut().fullscreen = fullscreen;
            state.events_mut().fullscreen_changed = true;
        }
        NodeCommand::SourcePath => {
            let path = string_arg(&args[0])?.trim().to_string();
            tracing::info!(path = %path, "Source path changed");
            state.settings_mut().source_path = path;
            state.events_mut().source_changed = true;
        }
        NodeCommand::AddOutput => {
            let name = args.first().map(name_arg).transpose()?;
            if let Some(existing) = name.as_deref().filter(|n| state.output(n).is_some()) {
                return Err(DropReason::DuplicateOutput(existing.to_string()));
            }
            if state.add_output(name.as_deref()).is_none() {
                return Err(DropReason::DuplicateOutput((state.output_count() + 1).to_string()));
            }
        }
        NodeCommand::DeleteOutput => {
            let name = name_arg(&args[0])?;
            if !state.remove_output(&name) {
                return Err(DropReason::UnknownOutput(name));
            }
        }
        NodeCommand::SendConfig => {
            let destination = ConfigDestination::parse(string_arg(&args[0])?)
                .map_err(|e| DropReason::InvalidDestination(e.to_string()))?;
            state.events_mut().config_requests.push(destination);
        }
    }

    Ok(())
}

/// The numeric setting a field writes to
fn float_slot(settings: &mut OutputSettings, field: OutputField) -> Option<&mut f32> {
    Some(match field {
        OutputField::CropActive => return None,
        OutputField::CropX => &mut settings.crop_origin.x,
        OutputField::CropY => &mut settings.crop_origin.y,
        OutputField::CropWidth => &mut settings.crop_size.x,
        OutputField::CropHeight => &mut settings.crop_size.y,
        OutputField::Quad(corner, axis) => {
            let point = match corner {
                Corner::TopLeft => &mut settings.quad_top_left,
                Corner::TopRight => &mut settings.quad_top_right,
                Corner::BottomRight => &mut settings.quad_bottom_right,
                Corner::BottomLeft => &mut settings.quad_bottom_left,
            };
            match axis {
                Axis::X => &mut point.x,
                Axis::Y => &mut point.y,
            }
        }
        OutputField::Blend(Edge::Top) => &mut settings.blend_top,
        OutputField::Blend(Edge::Right) => &mut settings.blend_right,
        OutputField::Blend(Edge::Bottom) => &mut settings.blend_bottom,
        OutputField::Blend(Edge::Left) => &mut settings.blend_left,
    })
}

fn apply_output(state: &mut NodeState, name: &str, path: &str, args: &[Argument]) -> Handled {
    if state.output(name).is_none() {
        return Err(DropReason::UnknownOutput(name.to_string()));
    }
    let field = OutputField::lookup(path).ok_or_else(|| DropReason::UnknownAddress(path.to_string()))?;
    check_arity(args, (1, 1))?;

    let output = state
        .output_mut(name)
        .ok_or_else(|| DropReason::UnknownOutput(name.to_string()))?;

    // Parse before touching the settings so a bad argument leaves flags alone
    if field == OutputField::CropActive {
        let active = bool_arg(&args[0])?;
        output.settings_mut().crop_active = active;
    } else {
        let mut value = float_arg(&args[0])?;
        if matches!(field, OutputField::Blend(_)) {
            value = value.max(0.0);
        }
        if let Some(slot) = float_slot(output.settings_mut(), field) {
            *slot = value;
        }
    }

    Ok(())
}
