//! Element styling: colour and the stroke settings every element carries.

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("expected `#rrggbb` or `#rrggbbaa`")]
    BadLength,
    #[error(transparent)]
    Digit(#[from] std::num::ParseIntError),
    #[error("unknown colour name")]
    UnrecognizedName,
}

/// Straight-alpha sRGB colour, 8 bits per channel.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct Color(pub [u8; 4]);
impl Color {
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }
    #[must_use]
    pub fn with_alpha(self, a: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, a])
    }
    #[must_use]
    pub fn to_skia(self) -> tiny_skia::Color {
        let [r, g, b, a] = self.0;
        tiny_skia::Color::from_rgba8(r, g, b, a)
    }
}
impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}
impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}
impl std::str::FromStr for Color {
    type Err = ColorParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(hex) = s.strip_prefix('#') else {
            return match s.to_ascii_lowercase().as_str() {
                "black" => Ok(Self::BLACK),
                "white" => Ok(Self::WHITE),
                "transparent" => Ok(Self::TRANSPARENT),
                "red" => Ok(Self::rgba(255, 0, 0, 255)),
                "green" => Ok(Self::rgba(0, 128, 0, 255)),
                "blue" => Ok(Self::rgba(0, 0, 255, 255)),
                _ => Err(ColorParseError::UnrecognizedName),
            };
        };
        // Non-ascii would panic the byte slicing below.
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(ColorParseError::BadLength);
        }
        let channel = |idx: usize| u8::from_str_radix(&hex[idx * 2..idx * 2 + 2], 16);
        let a = if hex.len() == 8 { channel(3)? } else { 255 };
        Ok(Self([channel(0)?, channel(1)?, channel(2)?, a]))
    }
}
impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Visual settings of an element.
#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Style {
    pub stroke_color: Color,
    /// Nominal stroke width, in logical pixels. The outline model scales this.
    pub stroke_width: f32,
    /// Opacity applied when compositing, `[0, 1]`.
    pub opacity: f32,
}
impl Default for Style {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            stroke_width: 1.0,
            opacity: 1.0,
        }
    }
}
impl Style {
    /// Width, with non-finite or negative widths read as zero.
    #[must_use]
    pub fn sanitized_width(&self) -> f32 {
        if self.stroke_width.is_finite() {
            self.stroke_width.max(0.0)
        } else {
            0.0
        }
    }
    #[must_use]
    pub fn sanitized_opacity(&self) -> f32 {
        if self.opacity.is_finite() {
            self.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Color, ColorParseError};

    #[test]
    fn parse_hex() {
        assert_eq!("#102030".parse(), Ok(Color::rgba(0x10, 0x20, 0x30, 255)));
        assert_eq!("#10203040".parse(), Ok(Color::rgba(0x10, 0x20, 0x30, 0x40)));
        assert_eq!("Black".parse(), Ok(Color::BLACK));
    }
    #[test]
    fn parse_failures() {
        assert_eq!("#1020".parse::<Color>(), Err(ColorParseError::BadLength));
        assert_eq!("#ééé".parse::<Color>(), Err(ColorParseError::BadLength));
        assert!(matches!(
            "#zz0000".parse::<Color>(),
            Err(ColorParseError::Digit(_))
        ));
        assert_eq!(
            "chartreuse".parse::<Color>(),
            Err(ColorParseError::UnrecognizedName)
        );
    }
    #[test]
    fn display_roundtrips() {
        let c = Color::rgba(1, 2, 255, 128);
        assert_eq!(c.to_string().parse(), Ok(c));
        assert_eq!(Color::BLACK.to_string(), "#000000");
    }
}
