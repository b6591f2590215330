//! # Style System
//!
//! The handful of style facts the engine needs: which block a run lives in,
//! which inline tags are active, and what that means for font size, weight,
//! slant and underline.
//!
//! Styles are never looked up by walking ancestors. The walker threads an
//! immutable [`StyleContext`] down the tree and every run carries its own copy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ratio between a line's height and its effective font size.
pub const LINE_HEIGHT_RATIO: f64 = 1.5;

/// An RGBA colour with components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a colour from 8-bit channels and a 0.0 - 1.0 alpha.
    pub fn rgba8(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Parse `#rgb` or `#rrggbb`. Anything else yields black.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Color::BLACK;
        }
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).unwrap_or(0);
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                (r, g, b)
            }
            _ => (0, 0, 0),
        };
        Self::rgba8(r, g, b, 1.0)
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba(
            self.r.clamp(0.0, 1.0) as f32,
            self.g.clamp(0.0, 1.0) as f32,
            self.b.clamp(0.0, 1.0) as f32,
            self.a.clamp(0.0, 1.0) as f32,
        )
        .unwrap_or(tiny_skia::Color::BLACK)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// The structural block a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph,
    /// Heading level 1-3.
    Heading(u8),
    List,
    ListItem,
}

impl BlockKind {
    /// Font size multiplier for this block.
    pub fn size_multiplier(self) -> f64 {
        match self {
            BlockKind::Heading(1) => 1.8,
            BlockKind::Heading(2) => 1.5,
            BlockKind::Heading(3) => 1.2,
            _ => 1.0,
        }
    }

    /// Font size for this block at the given base size.
    pub fn effective_font_size(self, base_size: f64) -> f64 {
        base_size * self.size_multiplier()
    }

    /// Line height for this block at the given base size.
    pub fn line_height(self, base_size: f64) -> f64 {
        line_height(self.effective_font_size(base_size))
    }
}

/// Line height for an effective font size.
pub fn line_height(font_size: f64) -> f64 {
    font_size * LINE_HEIGHT_RATIO
}

/// The active tags at a point in the document tree.
///
/// Cheap to copy; each nested element derives a new value instead of
/// mutating a shared stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleContext {
    pub block: BlockKind,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for StyleContext {
    fn default() -> Self {
        Self {
            block: BlockKind::Paragraph,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

impl StyleContext {
    pub fn in_block(self, block: BlockKind) -> Self {
        Self { block, ..self }
    }

    /// Layer an inline style on top of this context. Tags only ever turn a
    /// flag on; there is no way to un-bold inside bold.
    pub fn with_inline(self, inline: InlineStyle) -> Self {
        match inline {
            InlineStyle::Bold => Self { bold: true, ..self },
            InlineStyle::Italic => Self {
                italic: true,
                ..self
            },
            InlineStyle::Underline => Self {
                underline: true,
                ..self
            },
        }
    }

    pub fn weight(self) -> FontWeight {
        if self.bold {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        }
    }

    /// The font this context selects for the given family and base size.
    pub fn font_spec(self, family: &str, base_size: f64) -> FontSpec {
        FontSpec {
            family: family.to_string(),
            size: self.block.effective_font_size(base_size),
            weight: self.weight(),
            italic: self.italic,
        }
    }
}

/// An inline formatting tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    /// Numeric CSS weight.
    pub fn numeric(self) -> u32 {
        match self {
            FontWeight::Normal => 400,
            FontWeight::Bold => 700,
        }
    }
}

/// A fully-resolved font request: family, pixel size, weight and slant.
///
/// Displays as a CSS font shorthand, `"{weight}{slant} {size}px {family}"`,
/// with the weight and slant parts omitted when normal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    pub weight: FontWeight,
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: &str, size: f64) -> Self {
        Self {
            family: family.to_string(),
            size,
            weight: FontWeight::Normal,
            italic: false,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let weight = if self.is_bold() { "bold" } else { "" };
        let slant = match (self.is_bold(), self.italic) {
            (true, true) => " italic",
            (false, true) => "italic",
            _ => "",
        };
        let lead = format!("{}{}", weight, slant);
        if lead.is_empty() {
            write!(f, "{}px {}", self.size, self.family)
        } else {
            write!(f, "{} {}px {}", lead, self.size, self.family)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_multipliers() {
        assert_eq!(BlockKind::Heading(1).size_multiplier(), 1.8);
        assert_eq!(BlockKind::Heading(2).size_multiplier(), 1.5);
        assert_eq!(BlockKind::Heading(3).size_multiplier(), 1.2);
        assert_eq!(BlockKind::Paragraph.size_multiplier(), 1.0);
        assert_eq!(BlockKind::ListItem.size_multiplier(), 1.0);
    }

    #[test]
    fn test_line_heights_at_16px() {
        assert!((BlockKind::Heading(1).line_height(16.0) - 43.2).abs() < 1e-9);
        assert!((BlockKind::Paragraph.line_height(16.0) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_color_hex() {
        let c = Color::hex("#FF0000");
        assert_eq!((c.r, c.g, c.b), (1.0, 0.0, 0.0));
        let short = Color::hex("#fff");
        assert_eq!(short, Color::WHITE);
        assert_eq!(Color::hex("not a colour"), Color::BLACK);
    }

    #[test]
    fn test_font_spec_display() {
        let mut spec = FontSpec::new("Caveat", 16.0);
        assert_eq!(spec.to_string(), "16px Caveat");
        spec.italic = true;
        assert_eq!(spec.to_string(), "italic 16px Caveat");
        spec.weight = FontWeight::Bold;
        assert_eq!(spec.to_string(), "bold italic 16px Caveat");
        spec.italic = false;
        assert_eq!(spec.to_string(), "bold 16px Caveat");
    }

    #[test]
    fn test_context_layers_inline_styles() {
        let ctx = StyleContext::default()
            .in_block(BlockKind::Heading(2))
            .with_inline(InlineStyle::Bold)
            .with_inline(InlineStyle::Underline);
        assert!(ctx.bold && ctx.underline && !ctx.italic);
        let spec = ctx.font_spec("Kalam", 20.0);
        assert_eq!(spec.size, 30.0);
        assert_eq!(spec.weight, FontWeight::Bold);
    }
}
