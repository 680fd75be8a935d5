//! Control channel handling
//!
//! Typed control messages, address routing, and dispatch onto node state.

pub mod message;
pub mod route;
pub mod router;

pub use message::{Argument, ControlMessage};
pub use route::{parse_route, Route, RouteError, CLIENT_SCOPE, OUTPUT_SCOPE};
pub use router::{dispatch, Axis, Dispatch, DropReason, NodeCommand, OutputField, NODE_COMMANDS, OUTPUT_FIELDS};
