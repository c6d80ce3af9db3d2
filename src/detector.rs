// LoRa Telemetry - Adaptive duty-cycle sensor node
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Change detection module
//!
//! This module decides whether a new reading differs enough from the last
//! transmitted one to be worth the radio time. Each scalar field has its
//! own absolute threshold; the reading counts as changed as soon as one
//! field moved by at least its threshold.

use crate::error::ConfigError;
use crate::protocol::Reading;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-field absolute change thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum temperature change in °C (default: 0.5)
    pub temperature: f64,
    /// Minimum humidity change in % (default: 2.0)
    pub humidity: f64,
    /// Minimum dust change in µg/m³ (default: 5.0)
    pub dust: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            humidity: 2.0,
            dust: 5.0,
        }
    }
}

impl Thresholds {
    /// Create new thresholds
    pub fn new(temperature: f64, humidity: f64, dust: f64) -> Self {
        Self {
            temperature,
            humidity,
            dust,
        }
    }

    /// Check that every threshold is finite and non-negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("thresholds.temperature", self.temperature),
            ("thresholds.humidity", self.humidity),
            ("thresholds.dust", self.dust),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("{} is not a finite non-negative number", value),
                ));
            }
        }
        Ok(())
    }
}

/// Which fields crossed their threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangedFields {
    pub temperature: bool,
    pub humidity: bool,
    pub dust: bool,
}

impl ChangedFields {
    /// True if at least one field changed
    pub fn any(&self) -> bool {
        self.temperature || self.humidity || self.dust
    }
}

impl fmt::Display for ChangedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (self.temperature, "temperature"),
            (self.humidity, "humidity"),
            (self.dust, "dust"),
        ]
        .iter()
        .filter(|(changed, _)| *changed)
        .map(|(_, name)| *name)
        .collect();
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("+"))
        }
    }
}

/// Result of comparing a reading against the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Nothing has been sent yet (cold start)
    NoBaseline,
    /// At least one field reached its threshold
    Changed(ChangedFields),
    /// Every field stayed within its threshold
    Unchanged,
}

impl Evaluation {
    /// Whether this evaluation warrants a transmission
    pub fn is_change(&self) -> bool {
        !matches!(self, Evaluation::Unchanged)
    }
}

/// Pure change detector
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    thresholds: Thresholds,
}

impl ChangeDetector {
    /// Create a detector with the given thresholds
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Compare `current` against the last sent reading
    ///
    /// A difference exactly equal to a threshold counts as a change. A
    /// difference that is not a number (NaN on either side) also counts
    /// as a change.
    pub fn evaluate(&self, current: &Reading, last_sent: Option<&Reading>) -> Evaluation {
        let baseline = match last_sent {
            Some(r) => r,
            None => return Evaluation::NoBaseline,
        };

        let changed = ChangedFields {
            temperature: reaches(
                current.temperature,
                baseline.temperature,
                self.thresholds.temperature,
            ),
            humidity: reaches(current.humidity, baseline.humidity, self.thresholds.humidity),
            dust: reaches(current.dust, baseline.dust, self.thresholds.dust),
        };

        if changed.any() {
            Evaluation::Changed(changed)
        } else {
            Evaluation::Unchanged
        }
    }

    /// Whether `current` should be sent given the last sent reading
    pub fn decide(&self, current: &Reading, last_sent: Option<&Reading>) -> bool {
        self.evaluate(current, last_sent).is_change()
    }

    /// Get the configured thresholds
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

/// `|a - b| >= threshold`, with NaN counting as reached
#[allow(clippy::neg_cmp_op_on_partial_ord)]
fn reaches(a: f64, b: f64, threshold: f64) -> bool {
    !((a - b).abs() < threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temperature: f64, humidity: f64, dust: f64) -> Reading {
        Reading::new("node", temperature, humidity, dust)
    }

    #[test]
    fn test_no_baseline_always_changes() {
        let detector = ChangeDetector::default();
        for r in [
            reading(0.0, 0.0, 0.0),
            reading(28.0, 45.0, 20.0),
            reading(-40.0, 100.0, 999.0),
        ] {
            assert!(detector.decide(&r, None));
            assert_eq!(detector.evaluate(&r, None), Evaluation::NoBaseline);
        }
    }

    #[test]
    fn test_identical_reading_is_unchanged() {
        let detector = ChangeDetector::default();
        let base = reading(28.0, 45.0, 20.0);
        assert!(!detector.decide(&base.clone(), Some(&base)));
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let detector = ChangeDetector::default();
        let base = reading(28.0, 45.0, 20.0);

        let result = detector.evaluate(&reading(28.5, 45.0, 20.0), Some(&base));
        assert_eq!(
            result,
            Evaluation::Changed(ChangedFields {
                temperature: true,
                ..Default::default()
            })
        );

        assert!(detector.decide(&reading(28.0, 47.0, 20.0), Some(&base)));
        assert!(detector.decide(&reading(28.0, 45.0, 15.0), Some(&base)));
    }

    #[test]
    fn test_just_below_threshold() {
        let detector = ChangeDetector::default();
        let base = reading(28.0, 45.0, 20.0);
        assert!(!detector.decide(&reading(28.49, 46.99, 24.99), Some(&base)));
        assert!(!detector.decide(&reading(27.51, 43.01, 15.01), Some(&base)));
    }

    #[test]
    fn test_or_across_fields() {
        let detector = ChangeDetector::default();
        let base = reading(28.0, 45.0, 20.0);
        match detector.evaluate(&reading(28.1, 45.1, 30.0), Some(&base)) {
            Evaluation::Changed(fields) => {
                assert!(!fields.temperature);
                assert!(!fields.humidity);
                assert!(fields.dust);
                assert_eq!(fields.to_string(), "dust");
            }
            other => panic!("expected change, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_counts_as_change() {
        let detector = ChangeDetector::default();
        let base = reading(28.0, 45.0, 20.0);
        assert!(detector.decide(&reading(f64::NAN, 45.0, 20.0), Some(&base)));
    }

    #[test]
    fn test_custom_thresholds() {
        let detector = ChangeDetector::new(Thresholds::new(5.0, 10.0, 50.0));
        let base = reading(20.0, 50.0, 10.0);
        assert!(!detector.decide(&reading(24.0, 59.0, 59.0), Some(&base)));
        assert!(detector.decide(&reading(25.0, 50.0, 10.0), Some(&base)));
    }

    #[test]
    fn test_thresholds_validate() {
        assert!(Thresholds::default().validate().is_ok());
        assert!(Thresholds::new(0.0, 0.0, 0.0).validate().is_ok());
        assert!(Thresholds::new(-0.5, 2.0, 5.0).validate().is_err());
        assert!(Thresholds::new(0.5, f64::NAN, 5.0).validate().is_err());
    }

    #[test]
    fn test_changed_fields_display() {
        let fields = ChangedFields {
            temperature: true,
            humidity: false,
            dust: true,
        };
        assert_eq!(fields.to_string(), "temperature+dust");
        assert_eq!(ChangedFields::default().to_string(), "none");
    }
}
