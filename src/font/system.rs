//! Platform font lookup.
//!
//! A `fontdb` database of every face in the platform font directories, plus
//! any directories listed in `SCRIBBLECRAFT_FONT_DIR`. Faces are matched on
//! the family, weight and style stored in the font itself, so file names
//! (`Caveat[wght].ttf`, collections, ...) do not matter.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use super::FaceData;

/// Extra font directories, separated like `PATH`.
pub const FONT_DIR_ENV: &str = "SCRIBBLECRAFT_FONT_DIR";

static SHARED: OnceLock<Arc<SystemFonts>> = OnceLock::new();

/// A face picked from the database, with the style it actually has.
pub struct SystemMatch {
    pub face: Arc<FaceData>,
    pub bold: bool,
    pub italic: bool,
}

pub struct SystemFonts {
    db: fontdb::Database,
    loaded: Mutex<HashMap<fontdb::ID, Arc<FaceData>>>,
}

impl Default for SystemFonts {
    fn default() -> Self {
        Self::empty()
    }
}

impl SystemFonts {
    /// A database with no faces; add directories with [`SystemFonts::add_dir`].
    pub fn empty() -> Self {
        Self {
            db: fontdb::Database::new(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Platform fonts plus `SCRIBBLECRAFT_FONT_DIR`.
    pub fn load() -> Self {
        let mut fonts = Self::empty();
        fonts.db.load_system_fonts();
        if let Some(extra) = std::env::var_os(FONT_DIR_ENV) {
            for dir in std::env::split_paths(&extra) {
                if !dir.as_os_str().is_empty() {
                    fonts.add_dir(&dir);
                }
            }
        }
        log::debug!("font database holds {} faces", fonts.len());
        fonts
    }

    /// The process-wide database, loaded on first use.
    pub fn shared() -> Arc<Self> {
        SHARED.get_or_init(|| Arc::new(Self::load())).clone()
    }

    pub fn add_dir(&mut self, dir: &Path) {
        self.db.load_fonts_dir(dir);
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Best face for `family` in the requested style. The database falls
    /// back to the nearest weight and slant of the family, so callers check
    /// the returned flags to see what must be synthesized.
    pub fn find(&self, family: &str, bold: bool, italic: bool) -> Option<SystemMatch> {
        let families = query_families(family);
        let query = fontdb::Query {
            families: &families,
            weight: if bold {
                fontdb::Weight::BOLD
            } else {
                fontdb::Weight::NORMAL
            },
            stretch: fontdb::Stretch::Normal,
            style: if italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            },
        };
        let id = self.db.query(&query)?;
        let info = self.db.face(id)?;
        let face = self.load_face(id)?;
        log::debug!("resolved system font {:?} -> {}", family, info.post_script_name);
        Some(SystemMatch {
            face,
            bold: info.weight.0 >= 600,
            italic: info.style != fontdb::Style::Normal,
        })
    }

    fn load_face(&self, id: fontdb::ID) -> Option<Arc<FaceData>> {
        if let Ok(loaded) = self.loaded.lock() {
            if let Some(face) = loaded.get(&id) {
                return Some(face.clone());
            }
        }

        let (bytes, index) = self.db.with_face_data(id, |data, index| (data.to_vec(), index))?;
        let face = match FaceData::parse_indexed(Arc::new(bytes), index) {
            Ok(face) => Arc::new(face),
            Err(e) => {
                log::warn!("skipping system face: {}", e);
                return None;
            }
        };
        if let Ok(mut loaded) = self.loaded.lock() {
            loaded.insert(id, face.clone());
        }
        Some(face)
    }
}

/// Query families for one entry of a CSS family list. Generic names try
/// the database's generic family first, then common Linux faces.
fn query_families(family: &str) -> Vec<fontdb::Family<'_>> {
    use fontdb::Family;

    let fallbacks: &[&'static str] = match family.to_ascii_lowercase().as_str() {
        "cursive" | "fantasy" => &["Comic Neue", "DejaVu Sans", "Noto Sans", "Liberation Sans"],
        "sans-serif" | "system-ui" => &["DejaVu Sans", "Noto Sans", "Liberation Sans"],
        "serif" => &["DejaVu Serif", "Noto Serif", "Liberation Serif"],
        "monospace" => &["DejaVu Sans Mono", "Noto Sans Mono", "Liberation Mono"],
        _ => return vec![Family::Name(family)],
    };
    let generic = match family.to_ascii_lowercase().as_str() {
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        _ => Family::SansSerif,
    };
    std::iter::once(generic)
        .chain(fallbacks.iter().map(|&name| Family::Name(name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_family_queries_by_name() {
        let families = query_families("Patrick Hand");
        assert_eq!(families.len(), 1);
        assert!(matches!(families[0], fontdb::Family::Name("Patrick Hand")));
    }

    #[test]
    fn test_generic_family_tries_generic_first() {
        let families = query_families("Cursive");
        assert!(matches!(families[0], fontdb::Family::Cursive));
        assert!(families
            .iter()
            .any(|f| matches!(f, fontdb::Family::Name("DejaVu Sans"))));
    }

    #[test]
    fn test_empty_database_finds_nothing() {
        let fonts = SystemFonts::empty();
        assert!(fonts.is_empty());
        assert!(fonts.find("Caveat", false, false).is_none());
    }
}
