// LoRa Bridge - Host side of the gateway stream
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use std::fmt;

/// Bridge counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// `DATA:` lines seen
    pub received: u64,
    /// Records that passed validation
    pub accepted: u64,
    /// Records rejected by validation
    pub rejected: u64,
    /// Accepted records the sink took
    pub forwarded: u64,
    /// Accepted records the sink failed to deliver
    pub failed: u64,
}

impl BridgeStats {
    /// Percentage of accepted records that reached the sink
    pub fn success_rate(&self) -> Option<f64> {
        if self.accepted == 0 {
            None
        } else {
            Some(self.forwarded as f64 / self.accepted as f64 * 100.0)
        }
    }
}

impl fmt::Display for BridgeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} accepted={} rejected={} forwarded={} failed={}",
            self.received, self.accepted, self.rejected, self.forwarded, self.failed
        )?;
        if let Some(rate) = self.success_rate() {
            write!(f, " success={:.1}%", rate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_success_rate() {
        let stats = BridgeStats {
            received: 4,
            accepted: 3,
            rejected: 1,
            forwarded: 2,
            failed: 1,
        };
        assert_relative_eq!(stats.success_rate().unwrap(), 66.666_666, epsilon = 1e-4);
        assert_eq!(
            stats.to_string(),
            "received=4 accepted=3 rejected=1 forwarded=2 failed=1 success=66.7%"
        );
    }

    #[test]
    fn test_no_rate_without_accepted_records() {
        let stats = BridgeStats::default();
        assert_eq!(stats.success_rate(), None);
        assert_eq!(
            stats.to_string(),
            "received=0 accepted=0 rejected=0 forwarded=0 failed=0"
        );

        let all_rejected = BridgeStats {
            received: 2,
            rejected: 2,
            ..Default::default()
        };
        assert_eq!(all_rejected.success_rate(), None);
    }
}
