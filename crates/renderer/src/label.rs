//! Text overlay for rendered frames.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{Font, Scale};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::style::hex_to_rgb;

/// Where and how the frame label is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    /// TrueType font file; no font means no overlay
    #[serde(default)]
    pub font: Option<PathBuf>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_offset")]
    pub x: i32,
    #[serde(default = "default_offset")]
    pub y: i32,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_font_size() -> f32 {
    30.0
}

fn default_offset() -> i32 {
    50
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font: None,
            font_size: default_font_size(),
            x: default_offset(),
            y: default_offset(),
            color: default_color(),
        }
    }
}

/// Draws labels with a font loaded once and shared by every frame.
pub struct LabelPainter {
    font: Option<Font<'static>>,
    scale: Scale,
    x: i32,
    y: i32,
    color: Rgb<u8>,
}

impl LabelPainter {
    /// Load the configured font. A missing or unreadable font disables the
    /// overlay with a warning instead of failing the run.
    pub fn load(style: &LabelStyle) -> Self {
        let font = style.font.as_ref().and_then(|path| {
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(font = %path.display(), error = %e, "Failed to read font, frames will have no label");
                    return None;
                }
            };
            let font = Font::try_from_vec(bytes);
            if font.is_none() {
                warn!(font = %path.display(), "Failed to parse font, frames will have no label");
            }
            font
        });

        if style.font.is_none() {
            warn!("No label font configured, frames will have no label");
        }

        let color = hex_to_rgb(&style.color).unwrap_or_else(|| {
            warn!(color = %style.color, "Invalid label color, using white");
            (255, 255, 255)
        });

        Self {
            font,
            scale: Scale::uniform(style.font_size),
            x: style.x,
            y: style.y,
            color: Rgb([color.0, color.1, color.2]),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw `text` onto the image. Text falling off the image is clipped.
    pub fn draw(&self, image: &mut RgbImage, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(image, self.color, self.x, self.y, self.scale, font, text);
        }
    }
}
