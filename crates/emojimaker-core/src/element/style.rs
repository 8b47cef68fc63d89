//! Visual styling for layer elements.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse a CSS hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`) or the keyword `transparent`.
    pub fn from_hex(color: &str) -> Option<Self> {
        let color = color.trim();
        if color.eq_ignore_ascii_case("transparent") {
            return Some(Self::transparent());
        }

        let hex = color.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = channel(0..1)? * 17;
                let g = channel(1..2)? * 17;
                let b = channel(2..3)? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
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

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Border treatment drawn around an element by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    #[default]
    None,
    ChatBubbleGreen,
    ChatBubbleBlue,
    ChatBubbleGray,
    ChatBubbleGreenRight,
    ChatBubbleBlueRight,
    ChatBubbleGrayRight,
    ChatBubbleOutline,
    ChatBubbleOutlineRight,
    Rounded,
    Square,
    Shadow,
}

impl BorderStyle {
    /// Get all available border styles, in menu order.
    pub fn all() -> &'static [BorderStyle] {
        &[
            BorderStyle::None,
            BorderStyle::ChatBubbleGreen,
            BorderStyle::ChatBubbleBlue,
            BorderStyle::ChatBubbleGray,
            BorderStyle::ChatBubbleGreenRight,
            BorderStyle::ChatBubbleBlueRight,
            BorderStyle::ChatBubbleGrayRight,
            BorderStyle::ChatBubbleOutline,
            BorderStyle::ChatBubbleOutlineRight,
            BorderStyle::Rounded,
            BorderStyle::Square,
            BorderStyle::Shadow,
        ]
    }

    /// Whether this border is one of the chat bubble variants.
    pub fn is_chat_bubble(&self) -> bool {
        matches!(
            self,
            BorderStyle::ChatBubbleGreen
                | BorderStyle::ChatBubbleBlue
                | BorderStyle::ChatBubbleGray
                | BorderStyle::ChatBubbleGreenRight
                | BorderStyle::ChatBubbleBlueRight
                | BorderStyle::ChatBubbleGrayRight
                | BorderStyle::ChatBubbleOutline
                | BorderStyle::ChatBubbleOutlineRight
        )
    }

    /// Chat bubbles whose tail points to the right.
    pub fn is_right_aligned(&self) -> bool {
        matches!(
            self,
            BorderStyle::ChatBubbleGreenRight
                | BorderStyle::ChatBubbleBlueRight
                | BorderStyle::ChatBubbleGrayRight
                | BorderStyle::ChatBubbleOutlineRight
        )
    }
}

/// Inner spacing in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Style properties for an element.
///
/// Every field has a documented default so partially persisted styles
/// can be backfilled on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualStyle {
    /// Font size in pixels (text elements).
    pub font_size: f64,
    /// Text color.
    pub color: SerializableColor,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    pub opacity: f64,
    /// Border treatment.
    pub border: BorderStyle,
    /// Background fill behind the content.
    pub background: SerializableColor,
    /// Inner spacing.
    pub padding: Padding,
}

impl VisualStyle {
    /// Default font size for elements without an explicit one.
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    /// Get the text color with opacity applied.
    pub fn color_with_opacity(&self) -> Color {
        apply_opacity(self.color, self.opacity)
    }

    /// Get the background color with opacity applied, `None` when transparent.
    pub fn background_with_opacity(&self) -> Option<Color> {
        if self.background.is_transparent() {
            None
        } else {
            Some(apply_opacity(self.background, self.opacity))
        }
    }

    /// Set the text color from a peniko Color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color.into();
    }

    /// Clamp values that a malformed or hand-edited style may carry.
    pub fn sanitize(&mut self) {
        if !self.opacity.is_finite() {
            self.opacity = 1.0;
        }
        self.opacity = self.opacity.clamp(0.0, 1.0);
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            self.font_size = Self::DEFAULT_FONT_SIZE;
        }
    }
}

fn apply_opacity(color: SerializableColor, opacity: f64) -> Color {
    let alpha = (color.a as f64 * opacity.clamp(0.0, 1.0)) as u8;
    Color::from_rgba8(color.r, color.g, color.b, alpha)
}

impl Default for VisualStyle {
    fn default() -> Self {
        Self {
            font_size: Self::DEFAULT_FONT_SIZE,
            color: SerializableColor::black(),
            opacity: 1.0,
            border: BorderStyle::default(),
            background: SerializableColor::transparent(),
            padding: Padding::default(),
        }
    }
}
