//! Outbound configuration reports
//!
//! `send_config` asks the node to describe itself to a controller. The report
//! is serialized as XML and sent as the single string argument of a `/config`
//! message over a short-lived UDP socket. Sending is fire-and-forget: failures
//! are logged by the sending task and never surface to the sync loop.

use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tokio::runtime::Handle;

use super::osc::encode_message;
use crate::control::{Argument, ControlMessage};
use crate::node::ConfigDestination;
use crate::output::Rect;

/// Address of the outbound report message
pub const CONFIG_ADDRESS: &str = "/config";

/// Output entry in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedOutput {
    #[serde(rename = "@name")]
    pub name: String,
}

/// Node description sent in reply to `send_config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "SyncwallConfig")]
pub struct ConfigReport {
    #[serde(rename = "clientId")]
    pub client_id: String,

    #[serde(rename = "hostname", default)]
    pub hostname: String,

    #[serde(rename = "viewportWidth")]
    pub viewport_width: u32,

    #[serde(rename = "viewportHeight")]
    pub viewport_height: u32,

    #[serde(rename = "sourcePath")]
    pub source_path: String,

    #[serde(rename = "output", default)]
    pub outputs: Vec<ReportedOutput>,
}

impl ConfigReport {
    pub fn new(client_id: &str, viewport: &Rect, source_path: &str, outputs: Vec<String>) -> Self {
        Self {
            client_id: client_id.to_string(),
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_default(),
            viewport_width: viewport.width.max(0.0).round() as u32,
            viewport_height: viewport.height.max(0.0).round() as u32,
            source_path: source_path.to_string(),
            outputs: outputs.into_iter().map(|name| ReportedOutput { name }).collect(),
        }
    }

    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        quick_xml::se::to_string(self)
    }

    /// The `/config` message carrying this report
    pub fn to_message(&self) -> Result<ControlMessage, quick_xml::SeError> {
        Ok(ControlMessage::new(
            CONFIG_ADDRESS,
            vec![Argument::String(self.to_xml()?)],
        ))
    }
}

/// Delivers configuration reports; no acknowledgement is tracked
pub trait ConfigSender {
    fn send(&mut self, destination: &ConfigDestination, report: &ConfigReport);
}

/// Sends reports over UDP from tasks on a tokio runtime
#[derive(Debug, Clone)]
pub struct OscConfigSender {
    runtime: Handle,
}

impl OscConfigSender {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl ConfigSender for OscConfigSender {
    fn send(&mut self, destination: &ConfigDestination, report: &ConfigReport) {
        let packet = match report.to_message() {
            Ok(message) => encode_message(&message),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize config report");
                return;
            }
        };
        let target = destination.to_string();

        self.runtime.spawn(async move {
            let result = async {
                let addr = tokio::net::lookup_host(target.as_str())
                    .await?
                    .next()
                    .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address"))?;
                let bind = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
                let socket = UdpSocket::bind(bind).await?;
                socket.send_to(&packet, addr).await?;
                Ok::<_, std::io::Error>(addr)
            }
            .await;

            match result {
                Ok(addr) => tracing::info!(destination = %addr, "Sent config report"),
                Err(e) => tracing::warn!(destination = %target, error = %e, "Config report not sent"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::osc::decode_packet;

    fn report() -> ConfigReport {
        ConfigReport {
            client_id: "abc".into(),
            hostname: "wall-01".into(),
            viewport_width: 1024,
            viewport_height: 768,
            source_path: "Movie.mov".into(),
            outputs: vec![
                ReportedOutput { name: "1".into() },
                ReportedOutput { name: "left".into() },
            ],
        }
    }

    #[test]
    fn test_report_xml_contents() {
        let xml = report().to_xml().unwrap();
        assert!(xml.starts_with("<SyncwallConfig>"));
        assert!(xml.contains("<clientId>abc</clientId>"));
        assert!(xml.contains("<viewportWidth>1024</viewportWidth>"));
        assert!(xml.contains("name=\"left\""));
    }

    #[test]
    fn test_report_message() {
        let msg = report().to_message().unwrap();
        let decoded = decode_packet(&encode_message(&msg)).unwrap();
        assert_eq!(decoded[0].address, CONFIG_ADDRESS);
        assert!(matches!(&decoded[0].args[..], [Argument::String(s)] if s.contains("wall-01")));
    }

    #[tokio::test]
    async fn test_report_reaches_listener() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut sender = OscConfigSender::new(Handle::current());
        sender.send(&ConfigDestination { host: "127.0.0.1".into(), port }, &report());

        let mut buf = [0u8; 2048];
        let (len, _) = tokio::time::timeout(std::time::Duration::from_secs(5), listener.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let decoded = decode_packet(&buf[..len]).unwrap();
        assert_eq!(decoded[0].address, CONFIG_ADDRESS);
    }
}
