//! Host stream framing
//!
//! The gateway talks to its host over a byte stream, one line per event:
//!
//! ```text
//! READY:Gateway_Online
//! DATA:{"sensor_id":"...","temperatura":28.00,...,"rssi":-42,"snr":7.5}
//! ERROR:LoRa init failed
//! ```

use std::fmt;

/// Prefix of a relayed record
pub const DATA_TAG: &str = "DATA:";
/// Prefix of the readiness announcement
pub const READY_TAG: &str = "READY:";
/// Prefix of a gateway error report
pub const ERROR_TAG: &str = "ERROR:";

/// Readiness payload announced after link bring-up
pub const GATEWAY_ONLINE: &str = "Gateway_Online";

/// One line of the host stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostLine {
    /// A relayed, augmented record
    Data(String),
    /// Gateway is listening
    Ready(String),
    /// Gateway reported an error
    Error(String),
    /// Anything else (console chatter)
    Other(String),
}

impl HostLine {
    /// Classify one line of the host stream; blank lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let parsed = if let Some(rest) = line.strip_prefix(DATA_TAG) {
            HostLine::Data(rest.trim().to_string())
        } else if let Some(rest) = line.strip_prefix(READY_TAG) {
            HostLine::Ready(rest.to_string())
        } else if let Some(rest) = line.strip_prefix(ERROR_TAG) {
            HostLine::Error(rest.to_string())
        } else {
            HostLine::Other(line.to_string())
        };
        Some(parsed)
    }

    /// Render the line, newline-terminated
    ///
    /// Embedded line breaks are replaced so one event stays one line.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for HostLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (tag, body) = match self {
            HostLine::Data(body) => (DATA_TAG, body),
            HostLine::Ready(body) => (READY_TAG, body),
            HostLine::Error(body) => (ERROR_TAG, body),
            HostLine::Other(body) => ("", body),
        };
        write!(f, "{}{}", tag, body.replace(['\r', '\n'], " "))
    }
}
