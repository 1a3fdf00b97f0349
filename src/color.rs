use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// One color component of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
    White,
}

impl Channel {
    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'R' => Some(Self::Red),
            'G' => Some(Self::Green),
            'B' => Some(Self::Blue),
            'W' => Some(Self::White),
            _ => None,
        }
    }

    /// Letter used for this channel in color orders and host status payloads.
    #[inline]
    pub const fn letter(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Green => 'G',
            Self::Blue => 'B',
            Self::White => 'W',
        }
    }

    /// Position of this channel within a logical RGBW pixel.
    #[inline]
    pub const fn logical_index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::White => 3,
        }
    }
}

/// Error when parsing a color order string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color order '{0}': expected R, G, B and an optional W, each exactly once")]
pub struct ColorOrderError(String);

/// Order in which a strip expects color components on the wire.
///
/// The length of the order (3 or 4) fixes the size of every pixel in the
/// strip's buffer. Buffers always hold components in logical R, G, B, (W)
/// order; only hardware drivers care about the wire order itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ColorOrder {
    channels: Vec<Channel>,
}

impl ColorOrder {
    /// Bytes per pixel.
    #[inline]
    pub fn component_size(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn has_white(&self) -> bool {
        self.channels.contains(&Channel::White)
    }

    /// Whether white, if present, is the last wire channel.
    ///
    /// WS281x/SK6812 hardware only comes in these layouts.
    pub fn is_white_last(&self) -> bool {
        !self.has_white() || self.channels.last() == Some(&Channel::White)
    }

    /// Channels in wire order.
    #[inline]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

impl Default for ColorOrder {
    fn default() -> Self {
        Self {
            channels: vec![Channel::Red, Channel::Green, Channel::Blue, Channel::White],
        }
    }
}

impl FromStr for ColorOrder {
    type Err = ColorOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ColorOrderError(s.to_string());

        let mut channels = Vec::with_capacity(4);
        for letter in s.trim().chars() {
            let channel = Channel::from_letter(letter).ok_or_else(invalid)?;
            if channels.contains(&channel) {
                return Err(invalid());
            }
            channels.push(channel);
        }

        let rgb = [Channel::Red, Channel::Green, Channel::Blue];
        if !rgb.iter().all(|c| channels.contains(c)) {
            return Err(invalid());
        }
        Ok(Self { channels })
    }
}

impl TryFrom<String> for ColorOrder {
    type Error = ColorOrderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ColorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.channels
            .iter()
            .try_for_each(|c| write!(f, "{}", c.letter()))
    }
}

/// Convert a host color component in `[0, 1]` to a byte.
///
/// Out of range values are clamped; NaN maps to 0.
#[inline]
pub fn to_byte(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// A color as the printer host describes it: four components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub white: f64,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(red: f64, green: f64, blue: f64, white: f64) -> Self {
        Self {
            red,
            green,
            blue,
            white,
        }
    }

    /// Logical RGBW bytes.
    #[inline]
    pub fn to_bytes(self) -> [u8; 4] {
        [
            to_byte(self.red),
            to_byte(self.green),
            to_byte(self.blue),
            to_byte(self.white),
        ]
    }
}

/// Flat per-pixel color buffer of a strip.
///
/// Holds `chain_count * component_size` bytes at all times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    component_size: usize,
}

impl PixelBuffer {
    /// Create an all-black buffer.
    pub fn new(chain_count: usize, component_size: usize) -> Self {
        debug_assert!(component_size == 3 || component_size == 4);
        Self {
            data: vec![0; chain_count * component_size],
            component_size,
        }
    }

    #[inline]
    pub fn chain_count(&self) -> usize {
        self.data.len() / self.component_size
    }

    #[inline]
    pub fn component_size(&self) -> usize {
        self.component_size
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for pixel in self.data.chunks_exact_mut(self.component_size) {
            pixel.copy_from_slice(&bytes[..self.component_size]);
        }
    }

    /// Set the pixel at zero-based `offset`. Returns false if out of range.
    pub fn set(&mut self, offset: usize, color: Color) -> bool {
        let size = self.component_size;
        match self.data.get_mut(offset * size..(offset + 1) * size) {
            Some(pixel) => {
                pixel.copy_from_slice(&color.to_bytes()[..size]);
                true
            }
            None => false,
        }
    }

    /// Components of the pixel at zero-based `offset`.
    #[inline]
    pub fn pixel(&self, offset: usize) -> Option<&[u8]> {
        let size = self.component_size;
        self.data.get(offset * size..(offset + 1) * size)
    }

    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.component_size)
    }

    /// Reset every pixel to black.
    #[inline]
    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("RGB", 3; "rgb")]
    #[test_case("GRB", 3; "grb")]
    #[test_case("RGBW", 4; "rgbw")]
    #[test_case("grbw", 4; "lowercase")]
    #[test_case("WBGR", 4; "white first")]
    fn color_order_component_size(order: &str, size: usize) {
        let order: ColorOrder = order.parse().expect("valid color order");
        assert_eq!(order.component_size(), size);
    }

    #[test_case(""; "empty")]
    #[test_case("RG"; "missing blue")]
    #[test_case("RGGB"; "duplicate")]
    #[test_case("RGBX"; "unknown letter")]
    #[test_case("RGBWW"; "too long")]
    fn color_order_rejects(order: &str) {
        assert!(order.parse::<ColorOrder>().is_err());
    }

    #[test]
    fn color_order_displays_uppercase() {
        let order: ColorOrder = "grbw".parse().unwrap();
        assert_eq!(order.to_string(), "GRBW");
        assert!(order.has_white());
    }

    #[test_case("RGB", true; "no white")]
    #[test_case("GRBW", true; "white last")]
    #[test_case("WRGB", false; "white first")]
    #[test_case("RGWB", false; "white in the middle")]
    fn white_position(order: &str, expected: bool) {
        let order: ColorOrder = order.parse().unwrap();
        assert_eq!(order.is_white_last(), expected);
    }

    #[test]
    fn default_color_order_is_rgbw() {
        assert_eq!(ColorOrder::default().to_string(), "RGBW");
    }

    #[test_case(0.0, 0; "zero")]
    #[test_case(1.0, 255; "full")]
    #[test_case(0.5, 128; "half rounds up")]
    #[test_case(-0.3, 0; "negative clamps")]
    #[test_case(7.0, 255; "overflow clamps")]
    #[test_case(f64::NAN, 0; "nan")]
    fn to_byte_rounds_and_clamps(value: f64, expected: u8) {
        assert_eq!(to_byte(value), expected);
    }

    #[test_case(60, 3; "rgb strip")]
    #[test_case(60, 4; "rgbw strip")]
    #[test_case(1, 4; "single pixel")]
    fn buffer_is_chain_count_times_component_size(chain_count: usize, size: usize) {
        let buffer = PixelBuffer::new(chain_count, size);
        assert_eq!(buffer.as_bytes().len(), chain_count * size);
        assert_eq!(buffer.chain_count(), chain_count);
        assert_eq!(buffer.pixels().count(), chain_count);
    }

    #[test]
    fn fill_drops_white_on_rgb_buffer() {
        let mut buffer = PixelBuffer::new(2, 3);
        buffer.fill(Color::new(1.0, 0.0, 0.5, 1.0));
        assert_eq!(buffer.as_bytes(), &[255, 0, 128, 255, 0, 128]);
    }

    #[test]
    fn set_touches_only_one_pixel() {
        let mut buffer = PixelBuffer::new(3, 4);
        assert!(buffer.set(1, Color::new(0.0, 1.0, 0.0, 0.0)));
        assert_eq!(buffer.pixel(0), Some(&[0, 0, 0, 0][..]));
        assert_eq!(buffer.pixel(1), Some(&[0, 255, 0, 0][..]));
        assert_eq!(buffer.pixel(2), Some(&[0, 0, 0, 0][..]));
    }

    #[test]
    fn set_out_of_range_is_rejected() {
        let mut buffer = PixelBuffer::new(3, 4);
        assert!(!buffer.set(3, Color::new(1.0, 1.0, 1.0, 1.0)));
        assert_eq!(buffer.as_bytes().len(), 12);
        assert!(buffer.as_bytes().iter().all(|b| *b == 0));
    }
}
