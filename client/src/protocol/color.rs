use serde::{Deserialize, Serialize};

/// Color reported when the server cannot provide one.
pub const DEFAULT_COLOR: Rgbw = Rgbw::new(0, 0, 0, 0);
pub const DEFAULT_OFF_COLOR: Rgbw = Rgbw::new(0, 0, 0, 0);
/// Color applied when the light is switched on without color or brightness.
pub const DEFAULT_ON_COLOR: Rgbw = Rgbw::new(0, 0, 0, 255);

// Rec. 709 luma coefficients
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// RGBW color as seen by clients, each channel in `0..=255`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgbw {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Rgbw {
    pub const fn new(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    /// Same value on every channel.
    pub const fn uniform(value: u8) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn is_on(&self) -> bool {
        u16::from(self.r) + u16::from(self.g) + u16::from(self.b) + u16::from(self.w) > 0
    }

    /// Perceived brightness: the mean of the RGB luma and the white channel.
    pub fn brightness(&self) -> u8 {
        let luma = LUMA_R * f32::from(self.r) + LUMA_G * f32::from(self.g) + LUMA_B * f32::from(self.b);
        ((luma + f32::from(self.w)) / 2.0).round().clamp(0.0, 255.0) as u8
    }

    pub fn to_css_rgb(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    pub fn to_css_white(&self) -> String {
        format!("rgb({}, {}, {})", self.w, self.w, self.w)
    }
}

impl From<(u8, u8, u8, u8)> for Rgbw {
    fn from((r, g, b, w): (u8, u8, u8, u8)) -> Self {
        Self::new(r, g, b, w)
    }
}

impl From<Rgbw> for (u8, u8, u8, u8) {
    fn from(color: Rgbw) -> Self {
        (color.r, color.g, color.b, color.w)
    }
}

impl std::fmt::Display for Rgbw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.r, self.g, self.b, self.w)
    }
}

/// RGBW color as exchanged with the LED Foot server, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WireColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub w: f32,
}

fn channel_to_wire(value: u8) -> f32 {
    f32::from(value) / f32::from(u8::MAX)
}

fn channel_from_wire(value: f32) -> u8 {
    // `as` saturates and maps NaN to 0
    (value.clamp(0.0, 1.0) * f32::from(u8::MAX)).round() as u8
}

impl From<Rgbw> for WireColor {
    fn from(color: Rgbw) -> Self {
        Self {
            r: channel_to_wire(color.r),
            g: channel_to_wire(color.g),
            b: channel_to_wire(color.b),
            w: channel_to_wire(color.w),
        }
    }
}

impl From<WireColor> for Rgbw {
    fn from(color: WireColor) -> Self {
        Self {
            r: channel_from_wire(color.r),
            g: channel_from_wire(color.g),
            b: channel_from_wire(color.b),
            w: channel_from_wire(color.w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_on() {
        assert!(!DEFAULT_COLOR.is_on());
        assert!(Rgbw::new(0, 0, 1, 0).is_on());
        assert!(Rgbw::uniform(255).is_on());
    }

    #[test]
    fn test_brightness() {
        assert_eq!(Rgbw::uniform(255).brightness(), 255);
        assert_eq!(DEFAULT_OFF_COLOR.brightness(), 0);
        assert_eq!(DEFAULT_ON_COLOR.brightness(), 128);
        // 0.7152 * 100 / 2 = 35.76
        assert_eq!(Rgbw::new(0, 100, 0, 0).brightness(), 36);
    }

    #[test]
    fn test_wire_conversion() {
        let wire = WireColor::from(Rgbw::new(255, 0, 51, 102));
        assert_eq!(wire.r, 1.0);
        assert_eq!(wire.g, 0.0);
        assert!((wire.b - 0.2).abs() < 1e-6);
        assert!((wire.w - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_wire_values_are_clamped() {
        let color = Rgbw::from(WireColor {
            r: 1.5,
            g: -0.3,
            b: f32::NAN,
            w: 0.5,
        });
        assert_eq!(color, Rgbw::new(255, 0, 0, 128));
    }

    #[test]
    fn test_wire_json_shape() {
        let json = r#"{"r":0.0,"g":1.0,"b":0.0,"w":0.25}"#;
        let wire: WireColor = serde_json::from_str(json).unwrap();
        assert_eq!(Rgbw::from(wire), Rgbw::new(0, 255, 0, 64));
    }

    #[test]
    fn test_css() {
        let color = Rgbw::new(1, 2, 3, 4);
        assert_eq!(color.to_css_rgb(), "rgb(1, 2, 3)");
        assert_eq!(color.to_css_white(), "rgb(4, 4, 4)");
        assert_eq!(<(u8, u8, u8, u8)>::from(color), (1, 2, 3, 4));
    }
}
