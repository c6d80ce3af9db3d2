// LoRa Bridge - Host side of the gateway stream
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Destinations for accepted records
//!
//! Any [`Write`] is a sink that receives one JSON object per line.
//! [`HttpSink`] POSTs each record to a collection server instead.

use crate::bridge::StampedRecord;
use crate::error::{BridgeError, Result};
use std::io::Write;
use std::time::Duration;

/// Endpoint the collection server accepts records on
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000/api/sensor";

/// Request timeout for [`HttpSink`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Receives accepted records
pub trait RecordSink {
    /// Hand one record over
    ///
    /// Errors for which [`BridgeError::is_delivery_failure`] holds are
    /// counted and the bridge moves on; any other error stops it.
    fn deliver(&mut self, record: &StampedRecord) -> Result<()>;
}

impl<W: Write> RecordSink for W {
    fn deliver(&mut self, record: &StampedRecord) -> Result<()> {
        serde_json::to_writer(&mut *self, record)?;
        self.write_all(b"\n")?;
        self.flush()?;
        Ok(())
    }
}

/// POSTs each record as JSON to a collection server
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSink {
    /// Create a sink for `url` with the default timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a sink for `url` with a specific request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Server endpoint
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RecordSink for HttpSink {
    fn deliver(&mut self, record: &StampedRecord) -> Result<()> {
        let response = self.client.post(&self.url).json(record).send()?;
        let status = response.status();
        if status.is_success() {
            log::debug!("Server accepted {} ({})", record.record.sensor_id, status);
            Ok(())
        } else {
            Err(BridgeError::ServerStatus {
                status: status.as_u16(),
            })
        }
    }
}
