//! Classification styles: ordered breakpoints from pixel value to color.

use image::Rgb;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use raster_common::ConfigError;

/// Style configuration loaded from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    pub version: String,
    pub styles: HashMap<String, StyleDefinition>,
}

/// A single style definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleDefinition {
    pub name: String,
    pub description: Option<String>,
    pub units: Option<String>,
    /// Color of pixels outside the region or matching no entry
    pub background: String,
    /// Color of missing or quality-rejected pixels
    pub unknown: String,
    pub entries: Vec<BreakpointEntry>,
}

/// One breakpoint. Entries are tested in order and the first match wins.
///
/// ```json
/// { "type": "exact", "value": 3, "color": "#0000FF" }
/// { "type": "range", "min": 7, "max": 9, "color": "#FF0000" }
/// { "type": "ramp", "min": 0, "max": 100, "from": "#000000", "to": "#FFFFFF" }
/// { "type": "stepped", "min": -2000, "max": 10000, "levels": 350, "from": "#FF0000", "to": "#00FF00" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BreakpointEntry {
    /// A category code
    Exact { value: f64, color: String },
    /// Inclusive bounds; an absent bound is unbounded
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        color: String,
    },
    /// Linear interpolation between two colors over inclusive bounds
    Ramp {
        min: f64,
        max: f64,
        from: String,
        to: String,
    },
    /// Integer color walk over inclusive bounds. The position is truncated
    /// to one of `levels` steps and every channel moves one unit per step
    /// from `from` toward `to`, stopping once it reaches `to`.
    Stepped {
        min: f64,
        max: f64,
        levels: u32,
        from: String,
        to: String,
    },
}

impl StyleConfig {
    /// Load style configuration from JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Load style configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Get a specific style definition
    pub fn get_style(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.get(name)
    }

    /// Compiled table for a named style.
    pub fn table(&self, name: &str) -> Result<ColorBreakpointTable, ConfigError> {
        let style = self
            .get_style(name)
            .ok_or_else(|| ConfigError::StyleNotFound(name.to_string()))?;
        ColorBreakpointTable::from_definition(style)
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

fn parse_color(hex: &str) -> Result<Rgb<u8>, ConfigError> {
    hex_to_rgb(hex)
        .map(|(r, g, b)| Rgb([r, g, b]))
        .ok_or_else(|| ConfigError::InvalidColor(hex.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Breakpoint {
    Exact(f64, Rgb<u8>),
    Range(f64, f64, Rgb<u8>),
    Ramp(f64, f64, Rgb<u8>, Rgb<u8>),
    Stepped(f64, f64, f64, Rgb<u8>, Rgb<u8>),
}

impl Breakpoint {
    fn color(&self, value: f64) -> Option<Rgb<u8>> {
        match *self {
            Self::Exact(v, color) => (value == v).then_some(color),
            Self::Range(min, max, color) => (value >= min && value <= max).then_some(color),
            Self::Ramp(min, max, from, to) => {
                if value < min || value > max {
                    return None;
                }
                let t = (value - min) / (max - min);
                let lerp = |a: u8, b: u8| (a as f64 + t * (b as f64 - a as f64)).round() as u8;
                Some(Rgb([
                    lerp(from[0], to[0]),
                    lerp(from[1], to[1]),
                    lerp(from[2], to[2]),
                ]))
            }
            Self::Stepped(min, max, levels, from, to) => {
                if value < min || value > max {
                    return None;
                }
                let step = (((value - min) / (max - min)) * levels).floor().min(255.0) as u8;
                let walk = |a: u8, b: u8| {
                    if b >= a {
                        a.saturating_add(step).min(b)
                    } else {
                        a.saturating_sub(step).max(b)
                    }
                };
                Some(Rgb([
                    walk(from[0], to[0]),
                    walk(from[1], to[1]),
                    walk(from[2], to[2]),
                ]))
            }
        }
    }
}

/// Compiled style: a pure function from a scaled pixel value to a color.
///
/// NaN always maps to the unknown color, whatever the entries say.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBreakpointTable {
    breakpoints: Vec<Breakpoint>,
    background: Rgb<u8>,
    unknown: Rgb<u8>,
}

impl ColorBreakpointTable {
    pub fn from_definition(style: &StyleDefinition) -> Result<Self, ConfigError> {
        let breakpoints = style
            .entries
            .iter()
            .map(compile_entry)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            breakpoints,
            background: parse_color(&style.background)?,
            unknown: parse_color(&style.unknown)?,
        })
    }

    pub fn background(&self) -> Rgb<u8> {
        self.background
    }

    pub fn unknown(&self) -> Rgb<u8> {
        self.unknown
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    #[inline]
    pub fn color_for(&self, value: f64) -> Rgb<u8> {
        if value.is_nan() {
            return self.unknown;
        }
        self.breakpoints
            .iter()
            .find_map(|b| b.color(value))
            .unwrap_or(self.background)
    }
}

fn compile_entry(entry: &BreakpointEntry) -> Result<Breakpoint, ConfigError> {
    match entry {
        BreakpointEntry::Exact { value, color } => {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("exact value {} is not finite", value)));
            }
            Ok(Breakpoint::Exact(*value, parse_color(color)?))
        }
        BreakpointEntry::Range { min, max, color } => {
            let min = min.unwrap_or(f64::NEG_INFINITY);
            let max = max.unwrap_or(f64::INFINITY);
            if min.is_nan() || max.is_nan() || min > max {
                return Err(ConfigError::Invalid(format!("range [{}, {}] is empty", min, max)));
            }
            Ok(Breakpoint::Range(min, max, parse_color(color)?))
        }
        BreakpointEntry::Ramp { min, max, from, to } => {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ConfigError::Invalid(format!(
                    "ramp needs finite bounds with min < max, got [{}, {}]",
                    min, max
                )));
            }
            Ok(Breakpoint::Ramp(*min, *max, parse_color(from)?, parse_color(to)?))
        }
        BreakpointEntry::Stepped { min, max, levels, from, to } => {
            if !min.is_finite() || !max.is_finite() || min >= max || *levels == 0 {
                return Err(ConfigError::Invalid(format!(
                    "stepped ramp needs finite bounds with min < max and at least one level, got [{}, {}] in {} levels",
                    min, max, levels
                )));
            }
            Ok(Breakpoint::Stepped(
                *min,
                *max,
                f64::from(*levels),
                parse_color(from)?,
                parse_color(to)?,
            ))
        }
    }
}
