//! Theme modes and their colour palettes.
//!
//! Every variant draws with the same small set of colours, picked by the
//! current [`Theme`]. The theme is owned by the host; the engine reads it once
//! per rendered frame.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ParseKindError;

/// Two-valued colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// The palette used for this theme.
    pub fn palette(self) -> &'static Palette {
        match self {
            Theme::Dark => &DARK,
            Theme::Light => &LIGHT,
        }
    }

    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn is_light(self) -> bool {
        matches!(self, Theme::Light)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        })
    }
}

impl FromStr for Theme {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(ParseKindError {
                kind: "theme",
                value: s.to_string(),
                expected: "dark, light",
            }),
        }
    }
}

/// Fixed colour set for one theme. Colours are linear RGB in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Main accent, used for heads, dots and glows.
    pub primary: Vec3,
    /// Secondary accent, used for trails and sparks.
    pub secondary: Vec3,
    /// Three-stop gradient used by the pointer-field variants.
    pub gradient: [Vec3; 3],
    /// Page background the canvas is composited over; also the fade colour.
    pub background: Vec3,
}

const fn rgb(r: u8, g: u8, b: u8) -> Vec3 {
    Vec3::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

static DARK: Palette = Palette {
    primary: rgb(139, 92, 246),   // violet
    secondary: rgb(59, 130, 246), // blue
    gradient: [rgb(168, 85, 247), rgb(129, 140, 248), rgb(79, 70, 229)],
    background: rgb(0, 0, 0),
};

static LIGHT: Palette = Palette {
    primary: rgb(249, 115, 22),  // orange
    secondary: rgb(234, 179, 8), // amber
    gradient: [rgb(251, 146, 60), rgb(234, 88, 12), rgb(220, 38, 38)],
    background: rgb(255, 255, 255),
};
