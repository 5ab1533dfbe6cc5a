//! Choropleth color scale derivation.
//!
//! A scale is only valid for the aggregate it was derived from; the pipeline
//! derives a new one on every refresh.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::aggregate::AggregateMap;
use crate::constants::scale::{BREAK_FRACTIONS, DEFAULT_PALETTE, MIN_SCALE_MAX};
use crate::errors::PipelineError;
use crate::types::HexColor;

/// Sequential palette, light to dark, one color per break point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// `#rrggbb` colors, light to dark.
    pub colors: Vec<HexColor>,
}

impl Palette {
    /// Palette from hex colors.
    pub fn new(colors: impl IntoIterator<Item = impl Into<HexColor>>) -> Self {
        Self {
            colors: colors.into_iter().map(Into::into).collect(),
        }
    }

    /// Require one parseable `#rrggbb` color per break point.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.colors.len() != BREAK_FRACTIONS.len() {
            return Err(PipelineError::Configuration(format!(
                "palette needs {} colors, got {}",
                BREAK_FRACTIONS.len(),
                self.colors.len()
            )));
        }
        for color in &self.colors {
            if Rgb::parse_hex(color).is_none() {
                return Err(PipelineError::Configuration(format!(
                    "palette color '{color}' is not a #rrggbb hex value"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE)
    }
}

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Parse `#rrggbb` (leading `#` optional, case-insensitive).
    pub fn parse_hex(value: &str) -> Option<Self> {
        let digits = value.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(self) -> HexColor {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// One break point of a scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleStop {
    /// Value at which `color` applies.
    pub value: f64,
    /// Color at this stop.
    pub color: HexColor,
}

/// Piecewise-linear color scale over an aggregate's value range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    /// Largest aggregate value, floored at `1`.
    pub max: f64,
    /// Break points, non-decreasing for non-negative aggregates.
    pub stops: Vec<ScaleStop>,
}

impl ColorScale {
    /// Derive break points `round(f * M)` for `f` in `0, .1, .3, .6, 1`, where
    /// `M = max(1, largest value)`, paired with `palette`.
    pub fn derive(values: &AggregateMap, palette: &Palette) -> Self {
        let largest = values.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let max = largest.max(MIN_SCALE_MAX);
        let stops = BREAK_FRACTIONS
            .iter()
            .zip(&palette.colors)
            .map(|(fraction, color)| ScaleStop {
                value: (max * fraction).round(),
                color: color.clone(),
            })
            .collect();
        Self { max, stops }
    }

    /// Break point values in order.
    pub fn break_points(&self) -> Vec<f64> {
        self.stops.iter().map(|stop| stop.value).collect()
    }

    /// Interpolated color for `value`, clamped to the first and last stops.
    ///
    /// Between two stops with the same value the later color is used.
    pub fn color_for(&self, value: f64) -> Option<Rgb> {
        let first = self.stops.first()?;
        if value <= first.value {
            return Rgb::parse_hex(&first.color);
        }
        let idx = self.stops.iter().rposition(|stop| stop.value <= value)?;
        let lower = &self.stops[idx];
        let lower_color = Rgb::parse_hex(&lower.color)?;
        let Some(upper) = self.stops.get(idx + 1) else {
            return Some(lower_color);
        };
        let upper_color = Rgb::parse_hex(&upper.color)?;
        let t = (value - lower.value) / (upper.value - lower.value);
        Some(lower_color.lerp(upper_color, t))
    }

    /// Map-widget paint expression:
    /// `["interpolate", ["linear"], ["get", property], v0, c0, ..., v4, c4]`.
    pub fn to_interpolate_expression(&self, property: &str) -> Value {
        let mut expression = vec![json!("interpolate"), json!(["linear"]), json!(["get", property])];
        for stop in &self.stops {
            expression.push(json!(stop.value));
            expression.push(json!(stop.color));
        }
        Value::Array(expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> AggregateMap {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    #[test]
    fn derive_places_breaks_at_rounded_fractions() {
        let scale = ColorScale::derive(&map(&[("CA", 1000.0), ("TX", 10.0)]), &Palette::default());
        assert_eq!(scale.max, 1000.0);
        assert_eq!(scale.break_points(), vec![0.0, 100.0, 300.0, 600.0, 1000.0]);
        assert_eq!(scale.stops[0].color, "#f7fbff");
        assert_eq!(scale.stops[4].color, "#08306b");

        let scale = ColorScale::derive(&map(&[("CA", 17.0)]), &Palette::default());
        assert_eq!(scale.break_points(), vec![0.0, 2.0, 5.0, 10.0, 17.0]);
    }

    #[test]
    fn zero_and_empty_maps_floor_max_at_one() {
        // round(0.6 * 1) == 1
        let zeros = ColorScale::derive(&map(&[("A", 0.0), ("B", 0.0)]), &Palette::default());
        assert_eq!(zeros.break_points(), vec![0.0, 0.0, 0.0, 1.0, 1.0]);

        let empty = ColorScale::derive(&AggregateMap::new(), &Palette::default());
        assert_eq!(empty.max, 1.0);
        assert_eq!(empty.break_points(), vec![0.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn color_for_interpolates_and_clamps() {
        let scale = ColorScale::derive(&map(&[("A", 100.0)]), &Palette::default());
        assert_eq!(scale.color_for(-5.0), Rgb::parse_hex("#f7fbff"));
        assert_eq!(scale.color_for(0.0), Rgb::parse_hex("#f7fbff"));
        assert_eq!(scale.color_for(10.0), Rgb::parse_hex("#c6dbef"));
        assert_eq!(scale.color_for(100.0), Rgb::parse_hex("#08306b"));
        assert_eq!(scale.color_for(500.0), Rgb::parse_hex("#08306b"));

        let mid = scale.color_for(80.0).unwrap();
        let dark = Rgb::parse_hex("#2171b5").unwrap();
        let darkest = Rgb::parse_hex("#08306b").unwrap();
        assert!(mid.r <= dark.r && mid.r >= darkest.r);
    }

    #[test]
    fn duplicate_stops_resolve_to_later_color() {
        let scale = ColorScale::derive(&AggregateMap::new(), &Palette::default());
        assert_eq!(scale.color_for(0.0), Rgb::parse_hex("#f7fbff"));
        assert_eq!(scale.color_for(1.0), Rgb::parse_hex("#08306b"));
    }

    #[test]
    fn hex_round_trip_and_rejects_garbage() {
        let rgb = Rgb::parse_hex("#2171B5").unwrap();
        assert_eq!(rgb, Rgb { r: 0x21, g: 0x71, b: 0xb5 });
        assert_eq!(rgb.to_hex(), "#2171b5");
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("#gg0000"), None);
    }

    #[test]
    fn palette_validation_requires_five_hex_colors() {
        assert!(Palette::default().validate().is_ok());
        assert!(Palette::new(["#000000"]).validate().is_err());
        assert!(
            Palette::new(["#000000", "#111111", "#222222", "#333333", "blue"])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn interpolate_expression_lists_stops() {
        let scale = ColorScale::derive(&map(&[("A", 10.0)]), &Palette::default());
        let expression = scale.to_interpolate_expression("value");
        assert_eq!(expression[0], "interpolate");
        assert_eq!(expression[1], json!(["linear"]));
        assert_eq!(expression[2], json!(["get", "value"]));
        assert_eq!(expression.as_array().map(Vec::len), Some(13));
        assert_eq!(expression[11], json!(10.0));
        assert_eq!(expression[12], "#08306b");
    }
}
