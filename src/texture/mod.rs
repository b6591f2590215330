//! # Paper Textures
//!
//! Paints the page background before any text. Each [`PaperVariant`] is a
//! small procedural painter: flat fills, ruled or gridded lines, gradients
//! and, for the tactile papers, a few thousand randomly placed specks.
//!
//! Noise is unseeded on purpose: two renders of the same page produce
//! slightly different grain, like two sheets from the same pad.
//!
//! Variants split into two groups. Paper-like variants have a dark palette
//! used in [`DisplayMode::Dark`]. Materials (blueprint, blackboard,
//! corkboard, stone, papyrus, parchment, old paper) look the same in both
//! modes.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::raster::Surface;
use crate::style::{line_height, Color};

/// Background texture catalogue. Serialized by its kebab-case id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaperVariant {
    #[default]
    WhitePaper,
    NotebookPaper,
    DiaryPage,
    OldPaper,
    GraphPaper,
    Blueprint,
    Blackboard,
    Corkboard,
    Parchment,
    LegalPad,
    DottedGrid,
    StoneTablet,
    Papyrus,
    LinenPaper,
    WatercolorPaper,
}

impl PaperVariant {
    pub const ALL: [PaperVariant; 15] = [
        PaperVariant::WhitePaper,
        PaperVariant::NotebookPaper,
        PaperVariant::DiaryPage,
        PaperVariant::OldPaper,
        PaperVariant::GraphPaper,
        PaperVariant::Blueprint,
        PaperVariant::Blackboard,
        PaperVariant::Corkboard,
        PaperVariant::Parchment,
        PaperVariant::LegalPad,
        PaperVariant::DottedGrid,
        PaperVariant::StoneTablet,
        PaperVariant::Papyrus,
        PaperVariant::LinenPaper,
        PaperVariant::WatercolorPaper,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PaperVariant::WhitePaper => "white-paper",
            PaperVariant::NotebookPaper => "notebook-paper",
            PaperVariant::DiaryPage => "diary-page",
            PaperVariant::OldPaper => "old-paper",
            PaperVariant::GraphPaper => "graph-paper",
            PaperVariant::Blueprint => "blueprint",
            PaperVariant::Blackboard => "blackboard",
            PaperVariant::Corkboard => "corkboard",
            PaperVariant::Parchment => "parchment",
            PaperVariant::LegalPad => "legal-pad",
            PaperVariant::DottedGrid => "dotted-grid",
            PaperVariant::StoneTablet => "stone-tablet",
            PaperVariant::Papyrus => "papyrus",
            PaperVariant::LinenPaper => "linen-paper",
            PaperVariant::WatercolorPaper => "watercolor-paper",
        }
    }

    /// Look up a variant by id. Unknown ids fall back to white paper.
    pub fn from_id(id: &str) -> Self {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.id().eq_ignore_ascii_case(id))
            .unwrap_or_else(|| {
                log::debug!("unknown background variant {:?}, using white-paper", id);
                PaperVariant::WhitePaper
            })
    }

    /// Ink that must replace the user's choice for this surface, if any.
    pub fn forced_ink(self) -> Option<Color> {
        match self {
            PaperVariant::Blueprint | PaperVariant::Blackboard => Some(Color::WHITE),
            _ => None,
        }
    }

    /// Whether the variant has a separate dark-mode palette.
    pub fn is_mode_aware(self) -> bool {
        !matches!(
            self,
            PaperVariant::Blueprint
                | PaperVariant::Blackboard
                | PaperVariant::Corkboard
                | PaperVariant::StoneTablet
                | PaperVariant::Papyrus
                | PaperVariant::Parchment
                | PaperVariant::OldPaper
        )
    }
}

impl From<String> for PaperVariant {
    fn from(id: String) -> Self {
        PaperVariant::from_id(&id)
    }
}

impl From<PaperVariant> for String {
    fn from(v: PaperVariant) -> Self {
        v.id().to_string()
    }
}

impl fmt::Display for PaperVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Light,
    Dark,
}

/// Geometry a texture is painted for. All values in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureParams {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Distance between ruled lines; matches the base text line height so
    /// writing sits on the rules.
    pub rule_spacing: f64,
}

impl TextureParams {
    pub fn new(width: f64, height: f64, margin: f64, base_font_size: f64) -> Self {
        Self {
            width,
            height,
            margin,
            rule_spacing: line_height(base_font_size),
        }
    }
}

/// Paint `variant` across the whole surface.
pub fn render(surface: &mut Surface, params: &TextureParams, variant: PaperVariant, mode: DisplayMode) {
    let dark = mode == DisplayMode::Dark && variant.is_mode_aware();
    let mut painter = Painter {
        surface,
        p: *params,
        dark,
        rng: rand::rng(),
    };
    match variant {
        PaperVariant::WhitePaper => painter.white_paper(),
        PaperVariant::NotebookPaper => painter.notebook_paper(),
        PaperVariant::DiaryPage => painter.diary_page(),
        PaperVariant::OldPaper => painter.old_paper(),
        PaperVariant::GraphPaper => painter.graph_paper(),
        PaperVariant::Blueprint => painter.blueprint(),
        PaperVariant::Blackboard => painter.blackboard(),
        PaperVariant::Corkboard => painter.corkboard(),
        PaperVariant::Parchment => painter.parchment(),
        PaperVariant::LegalPad => painter.legal_pad(),
        PaperVariant::DottedGrid => painter.dotted_grid(),
        PaperVariant::StoneTablet => painter.stone_tablet(),
        PaperVariant::Papyrus => painter.papyrus(),
        PaperVariant::LinenPaper => painter.linen_paper(),
        PaperVariant::WatercolorPaper => painter.watercolor_paper(),
    }
}

struct Painter<'a, R: Rng> {
    surface: &'a mut Surface,
    p: TextureParams,
    dark: bool,
    rng: R,
}

impl<R: Rng> Painter<'_, R> {
    /// Light or dark palette entry.
    fn pick(&self, light: Color, dark: Color) -> Color {
        if self.dark {
            dark
        } else {
            light
        }
    }

    fn full(&self) -> (f64, f64, f64, f64) {
        (0.0, 0.0, self.p.width, self.p.height)
    }

    fn vertical_lines(&mut self, step: f64, width: f64, color: Color) {
        let mut x = 0.0;
        while x < self.p.width {
            self.surface.stroke_line((x, 0.0), (x, self.p.height), width, color);
            x += step;
        }
    }

    fn horizontal_lines(&mut self, from_x: f64, start_y: f64, step: f64, width: f64, color: Color) {
        let mut y = start_y;
        while y < self.p.height {
            self.surface.stroke_line((from_x, y), (self.p.width, y), width, color);
            y += step;
        }
    }

    /// `count` square specks of black or white with random alpha up to
    /// `max_alpha` and random size up to `max_size` (fixed when `fixed`).
    fn specks(&mut self, count: usize, rgb: (u8, u8, u8), max_alpha: f64, max_size: f64, fixed: bool) {
        let (w, h) = (self.p.width, self.p.height);
        for _ in 0..count {
            let x = self.rng.random::<f64>() * w;
            let y = self.rng.random::<f64>() * h;
            let alpha = self.rng.random::<f64>() * max_alpha;
            let (sw, sh) = if fixed {
                (max_size, max_size)
            } else {
                (
                    self.rng.random::<f64>() * max_size,
                    self.rng.random::<f64>() * max_size,
                )
            };
            self.surface
                .fill_rect(x, y, sw, sh, Color::rgba8(rgb.0, rgb.1, rgb.2, alpha));
        }
    }

    fn white_paper(&mut self) {
        let bg = self.pick(Color::hex("#fdfdfc"), Color::hex("#1e1e1e"));
        self.surface.fill(bg);
        let edge = Color::rgba8(0, 0, 0, self.pick_alpha(0.05, 0.25));
        let clear = Color::rgba8(0, 0, 0, 0.0);
        let full = self.full();
        self.surface.fill_rect_linear(
            full,
            (0.0, 0.0),
            (0.0, self.p.height),
            &[(0.0, edge), (0.5, clear), (1.0, edge)],
        );
    }

    fn pick_alpha(&self, light: f64, dark: f64) -> f64 {
        if self.dark {
            dark
        } else {
            light
        }
    }

    fn notebook_paper(&mut self) {
        let bg = self.pick(Color::WHITE, Color::hex("#1c1f26"));
        self.surface.fill(bg);
        let rule = self.pick(Color::rgba8(173, 216, 230, 0.5), Color::rgba8(90, 130, 170, 0.5));
        let (margin, spacing) = (self.p.margin, self.p.rule_spacing);
        self.horizontal_lines(0.0, margin, spacing, 1.0, rule);
        let red = self.pick(Color::rgba8(255, 182, 193, 0.8), Color::rgba8(200, 90, 110, 0.7));
        let x = margin * 1.5;
        self.surface.stroke_line((x, 0.0), (x, self.p.height), 2.0, red);
    }

    fn diary_page(&mut self) {
        let bg = self.pick(Color::hex("#f3f0e8"), Color::hex("#2b2822"));
        self.surface.fill(bg);
        let speck = if self.dark { (255, 255, 255) } else { (0, 0, 0) };
        self.specks(5000, speck, 0.05, 2.0, true);
        let border = self.pick(Color::hex("#e0d8c6"), Color::hex("#3d372c"));
        let (w, h) = (self.p.width, self.p.height);
        self.surface
            .stroke_rect(7.5, 7.5, w - 15.0, h - 15.0, 15.0, border);
    }

    fn old_paper(&mut self) {
        self.surface.fill(Color::hex("#f5e8c8"));
        let stain = Color::rgba8(165, 42, 42, 0.05);
        let fade = Color::rgba8(165, 42, 42, 0.0);
        for _ in 0..20 {
            let x = self.rng.random::<f64>() * self.p.width;
            let y = self.rng.random::<f64>() * self.p.height;
            let r = self.rng.random::<f64>() * 50.0 + 20.0;
            self.surface.fill_rect_radial(
                (x - r, y - r, r * 2.0, r * 2.0),
                (x, y),
                r,
                &[(0.0, stain), (1.0, fade)],
            );
        }
    }

    fn graph_paper(&mut self) {
        let bg = self.pick(Color::WHITE, Color::hex("#15181d"));
        self.surface.fill(bg);
        let line = self.pick(Color::rgba8(0, 100, 255, 0.2), Color::rgba8(80, 150, 255, 0.25));
        self.vertical_lines(20.0, 0.5, line);
        self.horizontal_lines(0.0, 0.0, 20.0, 0.5, line);
    }

    fn blueprint(&mut self) {
        self.surface.fill(Color::hex("#0a2e5d"));
        let line = Color::rgba8(255, 255, 255, 0.2);
        self.vertical_lines(30.0, 0.5, line);
        self.horizontal_lines(0.0, 0.0, 30.0, 0.5, line);
    }

    fn blackboard(&mut self) {
        self.surface.fill(Color::hex("#343434"));
        self.specks(10000, (255, 255, 255), 0.02, 2.0, true);
    }

    fn corkboard(&mut self) {
        self.surface.fill(Color::hex("#d2b48c"));
        for _ in 0..20000 {
            let x = self.rng.random::<f64>() * self.p.width;
            let y = self.rng.random::<f64>() * self.p.height;
            let shade = self.rng.random::<f64>() * 0.2 - 0.1;
            let r = self.rng.random::<f64>() * 1.5;
            self.surface
                .fill_circle(x, y, r, Color::rgba8(0, 0, 0, 0.05 + shade));
        }
    }

    fn parchment(&mut self) {
        self.surface.fill(Color::hex("#f5eecf"));
        let (w, h) = (self.p.width, self.p.height);
        let full = self.full();
        self.surface.fill_rect_radial(
            full,
            (w / 2.0, h / 2.0),
            w.max(h),
            &[
                (0.0, Color::rgba8(210, 180, 140, 0.0)),
                (1.0, Color::rgba8(210, 180, 140, 0.3)),
            ],
        );
    }

    fn legal_pad(&mut self) {
        let bg = self.pick(Color::hex("#fffacd"), Color::hex("#2e2b1a"));
        self.surface.fill(bg);
        let rule = self.pick(Color::rgba8(173, 216, 230, 0.7), Color::rgba8(120, 160, 190, 0.6));
        let (margin, spacing) = (self.p.margin, self.p.rule_spacing);
        self.horizontal_lines(margin * 2.0, margin, spacing, 1.0, rule);
        let red = self.pick(Color::hex("#ff6347"), Color::hex("#b5473a"));
        let h = self.p.height;
        self.surface.stroke_line((margin, 0.0), (margin, h), 2.0, red);
        self.surface
            .stroke_line((margin + 4.0, 0.0), (margin + 4.0, h), 2.0, red);
    }

    fn dotted_grid(&mut self) {
        let bg = self.pick(Color::hex("#f9f9f9"), Color::hex("#1b1b1b"));
        self.surface.fill(bg);
        let dot = self.pick(Color::hex("#cccccc"), Color::hex("#444444"));
        let m = self.p.margin;
        let mut x = m;
        while x < self.p.width - m {
            let mut y = m;
            while y < self.p.height - m {
                self.surface.fill_circle(x, y, 1.0, dot);
                y += 25.0;
            }
            x += 25.0;
        }
    }

    fn stone_tablet(&mut self) {
        self.surface.fill(Color::hex("#a9a9a9"));
        self.specks(15000, (0, 0, 0), 0.1, 3.0, false);
        let full = self.full();
        self.surface.fill_rect_linear(
            full,
            (0.0, 0.0),
            (self.p.width, self.p.height),
            &[
                (0.0, Color::rgba8(255, 255, 255, 0.1)),
                (1.0, Color::rgba8(0, 0, 0, 0.1)),
            ],
        );
    }

    fn papyrus(&mut self) {
        self.surface.fill(Color::hex("#e6d8b5"));
        let (w, h) = (self.p.width, self.p.height);
        let mut i = 0.0;
        while i < w {
            let alpha = self.rng.random::<f64>() * 0.05;
            self.surface
                .stroke_line((i, 0.0), (i, h), 1.0, Color::rgba8(0, 0, 0, alpha));
            i += 4.0;
        }
        let mut i = 0.0;
        while i < h {
            let alpha = self.rng.random::<f64>() * 0.05;
            self.surface
                .stroke_line((0.0, i), (w, i), 1.0, Color::rgba8(0, 0, 0, alpha));
            i += 4.0;
        }
    }

    fn linen_paper(&mut self) {
        let bg = self.pick(Color::hex("#faf0e6"), Color::hex("#2a2622"));
        self.surface.fill(bg);
        let thread = self.pick(Color::rgba8(0, 0, 0, 0.05), Color::rgba8(255, 255, 255, 0.04));
        self.vertical_lines(3.0, 0.5, thread);
        self.horizontal_lines(0.0, 0.0, 3.0, 0.5, thread);
    }

    fn watercolor_paper(&mut self) {
        let bg = self.pick(Color::hex("#f8f8f0"), Color::hex("#22221e"));
        self.surface.fill(bg);
        let grain = if self.dark { (255, 255, 255) } else { (0, 0, 0) };
        for _ in 0..30000 {
            let x = self.rng.random::<f64>() * self.p.width;
            let y = self.rng.random::<f64>() * self.p.height;
            let alpha = self.rng.random::<f64>() * 0.02;
            let size = self.rng.random::<f64>() * 2.0;
            self.surface
                .fill_rect(x, y, size, size, Color::rgba8(grain.0, grain.1, grain.2, alpha));
        }
        let (w, h) = (self.p.width, self.p.height);
        let rim = self.pick(Color::rgba8(220, 220, 220, 0.1), Color::rgba8(0, 0, 0, 0.15));
        let full = self.full();
        self.surface.fill_rect_radial(
            full,
            (w / 2.0, h / 2.0),
            w,
            &[(0.0, Color::rgba8(255, 255, 255, 0.0)), (1.0, rim)],
        );
    }
}
