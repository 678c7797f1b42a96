// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::reading::SensorReading;

pub const TEMPERATURE_PLACEHOLDER: &str = "--°";
pub const HUMIDITY_PLACEHOLDER: &str = "--%";
pub const CO2_PLACEHOLDER: &str = "-- ppm";

/// The three strings a widget shows.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DisplayText {
    pub temperature: String,
    pub humidity: String,
    pub co2: String,
}

impl Default for DisplayText {
    fn default() -> Self {
        format(&SensorReading::default())
    }
}

/// Formats a reading for display, substituting placeholders for absent values.
///
/// No clamping is applied, out of range values are shown as they are.
pub fn format(reading: &SensorReading) -> DisplayText {
    DisplayText {
        temperature: reading
            .temperature_celsius()
            .map(|t| format!("{}°", one_decimal_half_up(t)))
            .unwrap_or_else(|| TEMPERATURE_PLACEHOLDER.to_string()),
        humidity: reading
            .humidity_percent()
            // `as` truncates toward zero
            .map(|h| format!("{}%", h as i64))
            .unwrap_or_else(|| HUMIDITY_PLACEHOLDER.to_string()),
        co2: reading
            .co2_ppm()
            .map(|ppm| format!("{ppm} ppm"))
            .unwrap_or_else(|| CO2_PLACEHOLDER.to_string()),
    }
}

/// Rounds to one decimal place, ties away from zero.
///
/// Works on the shortest decimal representation of `value`, so `21.25` rounds
/// to `21.3` even though its binary value is not an exact tie.
fn one_decimal_half_up(value: f64) -> String {
    let digits = value.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut frac = frac_part.bytes();
    let tenths = frac.next().unwrap_or(b'0');
    let round_up = frac.next().is_some_and(|d| d >= b'5');

    let mut number: Vec<u8> = int_part.bytes().chain(std::iter::once(tenths)).collect();
    if round_up {
        // Carry through trailing nines, growing a digit if needed.
        let mut i = number.len();
        loop {
            if i == 0 {
                number.insert(0, b'1');
                break;
            }
            i -= 1;
            if number[i] == b'9' {
                number[i] = b'0';
            } else {
                number[i] += 1;
                break;
            }
        }
    }

    let (int_digits, tenth) = number.split_at(number.len() - 1);
    let sign = if value.is_sign_negative() { "-" } else { "" };
    let int_digits: String = int_digits.iter().map(|&d| d as char).collect();

    format!("{sign}{int_digits}.{}", tenth[0] as char)
}
