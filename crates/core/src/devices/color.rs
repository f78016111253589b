use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 24-bit RGB color, serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 7 || !hex.starts_with('#') {
            return None;
        }

        let r = u8::from_str_radix(&hex[1..3], 16).ok()?;
        let g = u8::from_str_radix(&hex[3..5], 16).ok()?;
        let b = u8::from_str_radix(&hex[5..7], 16).ok()?;

        Some(Color { r, g, b })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Hue in degrees (0-359), saturation and value in percent (0-100).
    pub fn to_hsv(&self) -> (u16, u8, u8) {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;

        let cmax = r.max(g).max(b);
        let cmin = r.min(g).min(b);
        let delta = cmax - cmin;

        let sector = if delta == 0.0 {
            0.0
        } else if cmax == r {
            ((g - b) / delta).rem_euclid(6.0)
        } else if cmax == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        let hue = (sector * 60.0).round() as u16 % 360;

        let saturation = if cmax == 0.0 {
            0
        } else {
            (delta / cmax * 100.0).round() as u8
        };
        let value = (cmax * 100.0).round() as u8;

        (hue, saturation, value)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Color::from_hex(&hex).ok_or_else(|| format!("invalid hex color '{}'", hex))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Named colors used by the dispatch plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    colors: BTreeMap<String, Color>,
}

impl Palette {
    pub fn empty() -> Self {
        Self {
            colors: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, color: Color) -> Self {
        self.colors.insert(name.to_string(), color);
        self
    }

    pub fn get(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.colors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.colors.keys().map(String::as_str)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::empty()
            .with("red", Color::rgb(0xff, 0x37, 0x29))
            .with("green", Color::rgb(0x47, 0xff, 0x88))
            .with("blue", Color::rgb(0x00, 0x00, 0xff))
            .with("yellow", Color::rgb(0xff, 0xff, 0x00))
            .with("cyan", Color::rgb(0x00, 0xff, 0xff))
            .with("light_blue", Color::rgb(0x1f, 0xb0, 0xff))
            .with("magenta", Color::rgb(0xff, 0x00, 0xff))
            .with("orange", Color::rgb(0xff, 0xa5, 0x00))
            .with("pink", Color::rgb(0xff, 0x75, 0x8f))
            .with("purple", Color::rgb(0xe3, 0x00, 0xe3))
            .with("white", Color::rgb(0xff, 0xff, 0xff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#ff3729"), Some(Color::rgb(255, 55, 41)));
        assert_eq!(Color::from_hex("#FFA500"), Some(Color::rgb(255, 165, 0)));
        assert_eq!(Color::from_hex("ff3729"), None);
        assert_eq!(Color::from_hex("#ff37"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_to_hsv_primaries() {
        assert_eq!(Color::rgb(255, 0, 0).to_hsv(), (0, 100, 100));
        assert_eq!(Color::rgb(0, 255, 0).to_hsv(), (120, 100, 100));
        assert_eq!(Color::rgb(0, 0, 255).to_hsv(), (240, 100, 100));
        assert_eq!(Color::rgb(255, 255, 255).to_hsv(), (0, 0, 100));
        assert_eq!(Color::rgb(0, 0, 0).to_hsv(), (0, 0, 0));
    }

    #[test]
    fn test_to_hsv_palette_colors() {
        let palette = Palette::default();
        assert_eq!(palette.get("orange").unwrap().to_hsv(), (39, 100, 100));
        assert_eq!(palette.get("magenta").unwrap().to_hsv(), (300, 100, 100));
        // pink is a desaturated red with a hue just below 360
        let (hue, saturation, value) = palette.get("pink").unwrap().to_hsv();
        assert_eq!((hue, saturation, value), (349, 54, 100));
    }

    #[test]
    fn test_palette_serializes_as_hex_strings() {
        let palette = Palette::empty().with("red", Color::rgb(0xff, 0x37, 0x29));
        let json = serde_json::to_string(&palette).unwrap();
        assert_eq!(json, r##"{"red":"#ff3729"}"##);

        let parsed: Palette = serde_json::from_str(r##"{"warm":"#FFA500"}"##).unwrap();
        assert_eq!(parsed.get("warm"), Some(Color::rgb(255, 165, 0)));

        assert!(serde_json::from_str::<Palette>(r#"{"bad":"orange"}"#).is_err());
    }
}
