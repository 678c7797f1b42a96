// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// One decoded snapshot of the climate sensor.
///
/// Every field is optional on its own: a reading with only some values present
/// is still a valid reading and renders the missing values as placeholders.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorReading {
    temperature_celsius: Option<f64>,
    humidity_percent: Option<f64>,
    co2_ppm: Option<u64>,
}

impl SensorReading {
    /// Creates a reading, dropping non-finite temperature and humidity values.
    pub fn new(
        temperature_celsius: Option<f64>,
        humidity_percent: Option<f64>,
        co2_ppm: Option<u64>,
    ) -> Self {
        Self {
            temperature_celsius: temperature_celsius.filter(|t| t.is_finite()),
            humidity_percent: humidity_percent.filter(|h| h.is_finite()),
            co2_ppm,
        }
    }

    pub fn temperature_celsius(&self) -> Option<f64> {
        self.temperature_celsius
    }

    pub fn humidity_percent(&self) -> Option<f64> {
        self.humidity_percent
    }

    pub fn co2_ppm(&self) -> Option<u64> {
        self.co2_ppm
    }

    /// `true` if none of the three values could be decoded.
    pub fn is_empty(&self) -> bool {
        self.temperature_celsius.is_none()
            && self.humidity_percent.is_none()
            && self.co2_ppm.is_none()
    }
}

#[test]
fn test_reading_drops_non_finite_values() {
    let reading = SensorReading::new(Some(f64::NAN), Some(f64::INFINITY), Some(400));

    assert_eq!(reading.temperature_celsius(), None);
    assert_eq!(reading.humidity_percent(), None);
    assert_eq!(reading.co2_ppm(), Some(400));
    assert!(!reading.is_empty());
    assert!(SensorReading::default().is_empty());
}
