//! Display strings for the four headline metrics.

use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub duration: String,
    pub distance: String,
    pub calories: String,
    pub pace: String,
}

impl DisplayMetrics {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        Self {
            duration: format_duration(metrics.duration_ms),
            distance: format_distance(metrics.distance_km),
            calories: format_calories(metrics.calories_kcal),
            pace: format_pace(metrics.pace_kmh),
        }
    }
}

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_duration(duration_ms: i64) -> String {
    let duration_ms = duration_ms.max(0);
    let seconds = (duration_ms / 1000) % 60;
    let minutes = (duration_ms / (1000 * 60)) % 60;
    let hours = duration_ms / (1000 * 60 * 60);
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub fn format_distance(distance_km: f64) -> String {
    format!("{} km", fixed(distance_km, 2))
}

pub fn format_calories(calories_kcal: f64) -> String {
    format!("{} kcal", fixed(calories_kcal, 0))
}

pub fn format_pace(pace_kmh: f64) -> String {
    format!("{} km/h", fixed(pace_kmh, 2))
}

/// Fixed-point rendering that rounds half-up on the shortest decimal
/// representation of `value`, so 1.005 renders as "1.01" even though the
/// nearest double is slightly below it.
fn fixed(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{value:.decimals$}");
    }

    // Display for f64 is the shortest round-trip form, never exponential
    let shortest = value.abs().to_string();
    let (int_part, frac_part) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));
    let kept_frac = frac_part.bytes().chain(std::iter::repeat(b'0')).take(decimals);
    let mut digits: Vec<u8> = int_part.bytes().chain(kept_frac).map(|b| b - b'0').collect();

    if frac_part.as_bytes().get(decimals).is_some_and(|&d| d >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - decimals;
    let render = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    let sign = if value < 0.0 { "-" } else { "" };
    if decimals == 0 {
        format!("{sign}{}", render(&digits))
    } else {
        format!("{sign}{}.{}", render(&digits[..split]), render(&digits[split..]))
    }
}
