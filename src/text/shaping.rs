//! # OpenType Shaping
//!
//! Wraps rustybuzz to perform OpenType shaping (GSUB/GPOS) on a word.
//! Measurement and painting both go through here so that the width the
//! layout engine reserves is exactly the advance the painter draws.
//!
//! The built-in standard metrics bypass shaping entirely.

/// A single glyph produced by OpenType shaping.
#[derive(Debug, Clone)]
pub struct ShapedGlyph {
    /// Real glyph ID from GSUB (not a Unicode codepoint).
    pub glyph_id: u16,
    /// Horizontal advance in font units.
    pub x_advance: i32,
    /// Horizontal offset from GPOS (kerning, mark positioning).
    pub x_offset: i32,
    /// Vertical offset from GPOS.
    pub y_offset: i32,
}

/// Shape text with an already parsed face.
pub fn shape_text(text: &str, face: &rustybuzz::Face<'_>) -> Vec<ShapedGlyph> {
    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);

    let output = rustybuzz::shape(face, &[], buffer);

    output
        .glyph_infos()
        .iter()
        .zip(output.glyph_positions().iter())
        .map(|(info, pos)| ShapedGlyph {
            glyph_id: info.glyph_id as u16,
            x_advance: pos.x_advance,
            x_offset: pos.x_offset,
            y_offset: pos.y_offset,
        })
        .collect()
}

/// Compute the total advance width of shaped glyphs in pixels.
pub fn shaped_width(glyphs: &[ShapedGlyph], units_per_em: u16, font_size: f64) -> f64 {
    let scale = font_size / units_per_em as f64;
    glyphs.iter().map(|g| g.x_advance as f64 * scale).sum()
}

/// Pen origins of each glyph, in font units, relative to the word start.
///
/// Each entry is `(glyph_id, x, y)` with GPOS offsets already applied.
pub fn glyph_origins(glyphs: &[ShapedGlyph]) -> Vec<(u16, i32, i32)> {
    let mut pen = 0i32;
    glyphs
        .iter()
        .map(|g| {
            let origin = (g.glyph_id, pen + g.x_offset, g.y_offset);
            pen += g.x_advance;
            origin
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(glyph_id: u16, x_advance: i32) -> ShapedGlyph {
        ShapedGlyph {
            glyph_id,
            x_advance,
            x_offset: 0,
            y_offset: 0,
        }
    }

    #[test]
    fn test_shaped_width_empty() {
        assert_eq!(shaped_width(&[], 1000, 12.0), 0.0);
    }

    #[test]
    fn test_shaped_width_scales_to_pixels() {
        let glyphs = vec![glyph(1, 500), glyph(2, 600)];
        // (500 + 600) / 1000 * 10
        assert!((shaped_width(&glyphs, 1000, 10.0) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_glyph_origins_accumulate_advances() {
        let mut kerned = glyph(3, 400);
        kerned.x_offset = -20;
        let glyphs = vec![glyph(1, 500), glyph(2, 600), kerned];
        let origins = glyph_origins(&glyphs);
        assert_eq!(origins, vec![(1, 0, 0), (2, 500, 0), (3, 1080, 0)]);
    }
}
