use serde::Deserialize;

use crate::Pixel;

/// Straight (non premultiplied) 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
    pub const BACKGROUND: Rgba = Rgba::opaque(150, 150, 150);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba::new(r, g, b, 0xff)
    }

    /// Parses `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        let value = u32::from_str_radix(digits, 16).ok()?;
        let rgba = match digits.len() {
            6 => (value << 8) | 0xff,
            8 => value,
            _ => return None,
        };
        Some(Rgba::from(rgba.to_be_bytes()))
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Rgba {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Rgba { r, g, b, a }
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: serde::Deserializer<'de>>(deser: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let hex = String::deserialize(deser)?;
        Rgba::from_hex(&hex).ok_or_else(|| Error::custom(format!("invalid color {hex:?}")))
    }
}

/// Byte order of the pixels written to the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum PixelFormat {
    /// Red and blue swapped, alpha passed through.
    #[default]
    #[serde(rename = "bgra")]
    Bgra,
    #[serde(rename = "rgba")]
    Rgba,
}

impl PixelFormat {
    #[inline(always)]
    pub fn encode(self, color: Rgba) -> Pixel {
        match self {
            PixelFormat::Bgra => [color.b, color.g, color.r, color.a],
            PixelFormat::Rgba => color.to_array(),
        }
    }

    #[inline(always)]
    pub fn decode(self, pixel: Pixel) -> Rgba {
        match self {
            PixelFormat::Bgra => Rgba::new(pixel[2], pixel[1], pixel[0], pixel[3]),
            PixelFormat::Rgba => Rgba::from(pixel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(Rgba::from_hex("#ff8000"), Some(Rgba::opaque(255, 128, 0)));
        assert_eq!(Rgba::from_hex("#10203040"), Some(Rgba::new(0x10, 0x20, 0x30, 0x40)));
        assert_eq!(Rgba::from_hex("ff8000"), None);
        assert_eq!(Rgba::from_hex("#ff80"), None);
        assert_eq!(Rgba::from_hex("#gg0000"), None);
    }

    #[test]
    fn bgra_swaps_red_and_blue() {
        let color = Rgba::new(1, 2, 3, 4);
        assert_eq!(PixelFormat::Bgra.encode(color), [3, 2, 1, 4]);
        assert_eq!(PixelFormat::Rgba.encode(color), [1, 2, 3, 4]);
        assert_eq!(PixelFormat::Bgra.decode([3, 2, 1, 4]), color);
    }
}
