//! Serializable color representation.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// RGBA8 color that round-trips through the document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Alpha as a unit fraction.
    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peniko_roundtrip() {
        let color = Rgba::new(12, 34, 56, 200);
        let peniko: Color = color.into();
        let back: Rgba = peniko.into();
        assert_eq!(color, back);
    }

    #[test]
    fn test_opacity() {
        assert!((Rgba::black().opacity() - 1.0).abs() < f64::EPSILON);
        assert!(Rgba::transparent().opacity().abs() < f64::EPSILON);
    }
}
