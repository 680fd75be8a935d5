//! Network plumbing
//!
//! - `osc`: OSC 1.0 datagram codec
//! - `receiver`: UDP listener feeding the sync loop
//! - `config_sender`: outbound `/config` reports

pub mod config_sender;
pub mod osc;
pub mod receiver;

pub use config_sender::{ConfigReport, ConfigSender, OscConfigSender, ReportedOutput, CONFIG_ADDRESS};
pub use osc::{decode_packet, encode_message, OscError};
pub use receiver::{Inbox, OscReceiver, DEFAULT_CONTROL_PORT};
