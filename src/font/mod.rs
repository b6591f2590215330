//! # Font Management
//!
//! Resolving a [`FontSpec`] to real font data, and measuring text with it.
//!
//! Resolution order for each family in the CSS family list: fonts registered
//! by the caller, then (when enabled) the platform font database, matched
//! by the family, weight and style names inside each font. If nothing
//! matches, the built-in Helvetica width tables keep measurement working,
//! although such text has no outlines to paint.

pub mod metrics;
pub mod system;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub use metrics::{StandardFont, StandardFontMetrics};
pub use system::SystemFonts;

use crate::error::{Result, ScribeError};
use crate::model::FontEntry;
use crate::style::FontSpec;
use crate::text::shaping;

/// Off-screen text measurement.
///
/// Implementations must be deterministic: the same text and font always
/// measure the same width. Layout relies on this for dry/paint parity.
pub trait MetricsProbe {
    /// Width of `text` in CSS pixels.
    fn measure_width(&self, text: &str, font: &FontSpec) -> f64;

    /// Width of a single space in CSS pixels.
    fn measure_space_width(&self, font: &FontSpec) -> f64 {
        self.measure_width(" ", font)
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    /// Lower-cased family name.
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, weight: u32, italic: bool) -> Self {
        Self {
            family: family.trim().to_lowercase(),
            weight,
            italic,
        }
    }
}

/// A parsed outline font.
///
/// The face is parsed once and kept next to the bytes it borrows, so
/// measuring and painting a word never re-parse the font tables.
pub struct FaceData {
    // Declared before `data` so the face is dropped first.
    face: rustybuzz::Face<'static>,
    pub data: Arc<Vec<u8>>,
    pub index: u32,
    pub units_per_em: u16,
    pub ascender: i16,
}

impl std::fmt::Debug for FaceData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceData")
            .field("data_len", &self.data.len())
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

// SAFETY: the face only holds shared slices into `data`, which is immutable
// and kept alive by the Arc for as long as the face exists.
unsafe impl Send for FaceData {}
unsafe impl Sync for FaceData {}

impl FaceData {
    pub fn parse(data: Arc<Vec<u8>>) -> Result<Self> {
        Self::parse_indexed(data, 0)
    }

    /// Parse face `index` of a font file (non-zero only for collections).
    pub fn parse_indexed(data: Arc<Vec<u8>>, index: u32) -> Result<Self> {
        // SAFETY: the slice points into the Arc's heap buffer, which never
        // moves or changes and outlives the face stored beside it.
        let bytes: &'static [u8] = unsafe { std::slice::from_raw_parts(data.as_ptr(), data.len()) };
        let face = rustybuzz::Face::from_slice(bytes, index)
            .ok_or_else(|| ScribeError::Font(format!("unparseable font data (face {})", index)))?;
        Ok(Self {
            units_per_em: ttf_parser::Face::units_per_em(&face),
            ascender: face.ascender(),
            face,
            data,
            index,
        })
    }

    /// The shaping face.
    pub fn shaper(&self) -> &rustybuzz::Face<'_> {
        &self.face
    }

    /// The outline tables.
    pub fn outlines(&self) -> &ttf_parser::Face<'_> {
        &self.face
    }

    /// Distance from the top of the em box to the baseline, in pixels.
    pub fn ascent_px(&self, font_size: f64) -> f64 {
        self.ascender as f64 / self.units_per_em as f64 * font_size
    }

    /// Shaped width of `text` in pixels.
    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        let glyphs = shaping::shape_text(text, self.shaper());
        shaping::shaped_width(&glyphs, self.units_per_em, font_size)
    }
}

/// The result of resolving a font request.
#[derive(Debug, Clone)]
pub enum FontData {
    /// No outline font found; measure with AFM widths, paint nothing.
    Standard(StandardFont),
    /// An outline font. The synthetic flags are set when the face lacks the
    /// requested weight or slant and the painter has to fake it.
    Custom {
        face: Arc<FaceData>,
        synthetic_bold: bool,
        synthetic_italic: bool,
    },
}

impl FontData {
    pub fn has_outlines(&self) -> bool {
        matches!(self, FontData::Custom { .. })
    }
}

/// Fonts registered by the caller, keyed by family + weight + slant.
#[derive(Default)]
pub struct FontRegistry {
    fonts: HashMap<FontKey, Arc<FaceData>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register raw TTF/OTF bytes.
    pub fn register(&mut self, family: &str, weight: u32, italic: bool, data: Vec<u8>) -> Result<()> {
        let face = FaceData::parse(Arc::new(data))?;
        self.fonts
            .insert(FontKey::new(family, weight, italic), Arc::new(face));
        Ok(())
    }

    /// Register a font described by a request entry.
    pub fn register_entry(&mut self, entry: &FontEntry) -> Result<()> {
        let bytes = decode_font_source(&entry.src)?;
        self.register(&entry.family, entry.weight, entry.italic, bytes)
    }

    /// Find a registered face for the family, preferring the exact style.
    /// The returned flags say which style aspects must be synthesized.
    fn lookup(&self, family: &str, bold: bool, italic: bool) -> Option<(Arc<FaceData>, bool, bool)> {
        let weight = if bold { 700 } else { 400 };
        let attempts = [
            (weight, italic),
            (400, italic),
            (weight, false),
            (400, false),
        ];
        for (w, i) in attempts {
            let key = FontKey::new(family, w, i);
            if let Some(face) = self.fonts.get(&key) {
                return Some((face.clone(), bold && w != 700, italic && !i));
            }
        }
        // Any other registered weight of the family; 600+ counts as bold.
        self.fonts
            .iter()
            .find(|(k, _)| k.family == family.trim().to_lowercase())
            .map(|(k, face)| {
                let has_bold = k.weight >= 600;
                (face.clone(), bold && !has_bold, italic && !k.italic)
            })
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

/// Decode a font `src`: a data URI or raw base64.
fn decode_font_source(src: &str) -> Result<Vec<u8>> {
    use base64::Engine;

    let payload = if src.starts_with("data:") {
        let comma = src
            .find(',')
            .ok_or_else(|| ScribeError::Font("invalid data URI: missing comma".to_string()))?;
        &src[comma + 1..]
    } else {
        src
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ScribeError::Font(format!("base64 decode error: {}", e)))
}

/// Shared font context used by measurement and painting.
///
/// Create it once and share it by reference; resolution results are cached
/// behind a mutex so pages rendered on different threads can share it.
pub struct FontContext {
    registry: FontRegistry,
    system: Option<Arc<SystemFonts>>,
    cache: Mutex<HashMap<FontKey, FontData>>,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    /// A context that only knows registered fonts and the built-in tables.
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
            system: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A context that also searches the platform font directories.
    pub fn with_system_fonts() -> Self {
        Self::with_font_database(SystemFonts::shared())
    }

    /// A context backed by a specific font database.
    pub fn with_font_database(fonts: Arc<SystemFonts>) -> Self {
        Self {
            system: Some(fonts),
            ..Self::new()
        }
    }

    /// Build the context for an export request, registering its fonts.
    /// Fonts that fail to decode are logged and skipped.
    pub fn for_request(entries: &[FontEntry], system_fonts: bool) -> Self {
        let mut ctx = if system_fonts {
            Self::with_system_fonts()
        } else {
            Self::new()
        };
        for entry in entries {
            if let Err(e) = ctx.registry.register_entry(entry) {
                log::warn!("skipping font {:?}: {}", entry.family, e);
            }
        }
        ctx
    }

    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    /// Register a font after construction. Clears the resolution cache.
    pub fn register(&mut self, family: &str, weight: u32, italic: bool, data: Vec<u8>) -> Result<()> {
        self.registry.register(family, weight, italic, data)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
        Ok(())
    }

    /// Resolve a font request to font data.
    pub fn resolve(&self, font: &FontSpec) -> FontData {
        let key = FontKey::new(&font.family, font.weight.numeric(), font.italic);
        if let Ok(cache) = self.cache.lock() {
            if let Some(found) = cache.get(&key) {
                return found.clone();
            }
        }

        let resolved = self.resolve_uncached(font);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, resolved.clone());
        }
        resolved
    }

    fn resolve_uncached(&self, font: &FontSpec) -> FontData {
        let bold = font.is_bold();
        for family in family_list(&font.family) {
            if let Some((face, synthetic_bold, synthetic_italic)) =
                self.registry.lookup(family, bold, font.italic)
            {
                return FontData::Custom {
                    face,
                    synthetic_bold,
                    synthetic_italic,
                };
            }
            if let Some(found) = self.system_face(family, bold, font.italic) {
                return found;
            }
        }
        log::debug!("no outline font for {:?}, measuring with Helvetica widths", font.family);
        FontData::Standard(StandardFont::for_style(bold, font.italic))
    }

    fn system_face(&self, family: &str, bold: bool, italic: bool) -> Option<FontData> {
        let found = self.system.as_ref()?.find(family, bold, italic)?;
        Some(FontData::Custom {
            face: found.face,
            synthetic_bold: bold && !found.bold,
            synthetic_italic: italic && !found.italic,
        })
    }
}

impl MetricsProbe for FontContext {
    fn measure_width(&self, text: &str, font: &FontSpec) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        match self.resolve(font) {
            FontData::Standard(std_font) => std_font.metrics().measure_string(text, font.size),
            FontData::Custom { face, .. } => face.measure(text, font.size),
        }
    }
}

/// Split a CSS family list into unquoted family names.
pub fn family_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .map(|f| f.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|f| !f.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::FontWeight;

    #[test]
    fn test_measure_with_standard_metrics() {
        let ctx = FontContext::new();
        let spec = FontSpec::new("Helvetica", 12.0);
        assert!((ctx.measure_space_width(&spec) - 3.336).abs() < 0.001);
        assert!(ctx.measure_width("Hello", &spec) > 0.0);
        assert_eq!(ctx.measure_width("", &spec), 0.0);
    }

    #[test]
    fn test_unknown_family_falls_back() {
        let ctx = FontContext::new();
        let a = ctx.measure_width("A", &FontSpec::new("Helvetica", 12.0));
        let b = ctx.measure_width("A", &FontSpec::new("'No Such Font', cursive", 12.0));
        assert!((a - b).abs() < 1e-9);
        assert!(!ctx.resolve(&FontSpec::new("Nope", 12.0)).has_outlines());
    }

    #[test]
    fn test_bold_measures_wider() {
        let ctx = FontContext::new();
        let mut spec = FontSpec::new("Caveat", 20.0);
        let regular = ctx.measure_width("bold", &spec);
        spec.weight = FontWeight::Bold;
        let bold = ctx.measure_width("bold", &spec);
        assert!(bold > regular);
    }

    #[test]
    fn test_measurement_is_deterministic() {
        let ctx = FontContext::new();
        let spec = FontSpec::new("Kalam", 33.0);
        let first = ctx.measure_width("the quick brown fox", &spec);
        for _ in 0..10 {
            assert_eq!(ctx.measure_width("the quick brown fox", &spec), first);
        }
    }

    #[test]
    fn test_register_rejects_garbage() {
        let mut ctx = FontContext::new();
        let err = ctx.register("Broken", 400, false, vec![0, 1, 2, 3]);
        assert!(matches!(err, Err(ScribeError::Font(_))));
        assert!(ctx.registry().is_empty());
    }

    #[test]
    fn test_request_fonts_skip_bad_entries() {
        let entries = vec![FontEntry {
            family: "Broken".to_string(),
            src: "data:font/ttf;base64,AAAA".to_string(),
            weight: 400,
            italic: false,
        }];
        let ctx = FontContext::for_request(&entries, false);
        assert!(ctx.registry().is_empty());
    }

    #[test]
    fn test_decode_font_source() {
        assert_eq!(decode_font_source("data:font/ttf;base64,AQID").unwrap(), vec![1, 2, 3]);
        assert_eq!(decode_font_source("AQID").unwrap(), vec![1, 2, 3]);
        assert!(decode_font_source("data:font/ttf;base64").is_err());
    }

    #[test]
    fn test_family_list() {
        let families: Vec<&str> = family_list("'Gochi Hand', \"Kalam\", cursive").collect();
        assert_eq!(families, vec!["Gochi Hand", "Kalam", "cursive"]);
    }
}
