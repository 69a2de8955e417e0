//! Severity tiers for CLS values

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the green tier
pub const LOW_MAX: f64 = 0.1;
/// Upper bound (inclusive) of the orange tier
pub const MEDIUM_MAX: f64 = 0.25;

/// Straight (non-premultiplied) 8-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Colors used for one tier: outline, translucent fill and the badge color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierColors {
    pub stroke: Rgba,
    pub fill: Rgba,
    pub solid: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTier {
    Low,
    Medium,
    High,
}

impl ColorTier {
    /// `score <= 0.1` is low, `score <= 0.25` is medium, anything above is high
    pub fn for_score(score: f64) -> Self {
        if score > MEDIUM_MAX {
            ColorTier::High
        } else if score > LOW_MAX {
            ColorTier::Medium
        } else {
            ColorTier::Low
        }
    }

    pub fn colors(self) -> TierColors {
        match self {
            // rgba(0,128,0,.7) / rgba(0,128,0,.1)
            ColorTier::Low => TierColors {
                stroke: Rgba::new(0, 128, 0, 179),
                fill: Rgba::new(0, 128, 0, 26),
                solid: Rgba::new(0, 128, 0, 255),
            },
            // rgba(255,125,0,.5) / rgba(255,125,0,.05)
            ColorTier::Medium => TierColors {
                stroke: Rgba::new(255, 125, 0, 128),
                fill: Rgba::new(255, 125, 0, 13),
                solid: Rgba::new(255, 125, 0, 255),
            },
            ColorTier::High => TierColors {
                stroke: Rgba::new(255, 0, 0, 128),
                fill: Rgba::new(255, 0, 0, 13),
                solid: Rgba::new(255, 0, 0, 255),
            },
        }
    }
}
