//! # Line-Wrapping Layout Engine
//!
//! Greedy word wrapping over the flow items produced by [`crate::text::walk`].
//!
//! There is exactly one traversal. Measuring a page and painting it differ
//! only in the [`LayoutSink`] that receives each placed word: the dry pass
//! hands words to [`MeasureSink`], which drops them, and the paint pass hands
//! them to a rasterizing sink. Because the cursor arithmetic is shared, the
//! height measured for a page is always the height its content occupies
//! when painted.
//!
//! ## Rules
//!
//! - The cursor starts at `(margin, margin)`; the content box is
//!   `width - 2 * margin` wide.
//! - A word that would cross the right edge moves to a new line, unless it
//!   is the first word on its line. Over-wide words are never split.
//! - After each word the pen advances by the word's width plus one space.
//! - A line is as tall as the tallest run placed on it (`1.5 * font size`).
//! - Every block starts on a fresh line. A block that produced content is
//!   followed by half its own line height of spacing.
//! - List markers sit at the start of the item's first line, at the base
//!   size, whatever the enclosing block.

use serde::Serialize;

use crate::font::MetricsProbe;
use crate::model::{Document, RenderConfig};
use crate::style::{line_height, BlockKind, FontSpec};
use crate::text::{self, FlowItem, InlineRun, MarkerRun};

/// Fraction of a block's line height added after it.
const BLOCK_SPACING: f64 = 0.5;

/// A word (or list marker) at its final position. `y` is the top of the
/// line the word sits on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedWord {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub font: FontSpec,
    pub underline: bool,
    pub marker: bool,
}

/// Receives every word the engine places, in reading order.
pub trait LayoutSink {
    fn word(&mut self, word: &PlacedWord);
}

/// The dry pass: positions are computed and discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeasureSink;

impl LayoutSink for MeasureSink {
    fn word(&mut self, _word: &PlacedWord) {}
}

/// Keeps every placed word. Used for layout inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub words: Vec<PlacedWord>,
}

impl LayoutSink for RecordingSink {
    fn word(&mut self, word: &PlacedWord) {
        self.words.push(word.clone());
    }
}

impl<S: LayoutSink + ?Sized> LayoutSink for &mut S {
    fn word(&mut self, word: &PlacedWord) {
        (**self).word(word)
    }
}

// ── Serializable layout snapshot (for tests and the CLI's debug dump) ──

/// Everything the engine decided for one page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    pub width: f64,
    pub margin: f64,
    /// Cursor `y` after the last item.
    pub final_y: f64,
    /// Height the page needs to show all of its content.
    pub required_height: f64,
    pub words: Vec<PlacedWord>,
}

impl LayoutInfo {
    /// Distinct line tops, in order.
    pub fn line_tops(&self) -> Vec<f64> {
        let mut tops: Vec<f64> = Vec::new();
        for w in &self.words {
            if tops.last().map_or(true, |last| (w.y - last).abs() > 1e-9) {
                tops.push(w.y);
            }
        }
        tops
    }
}

// ── Engine ──────────────────────────────────────────────────────────

/// Page geometry and typography shared by both passes.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    pub width: f64,
    pub margin: f64,
    pub base_size: f64,
    pub family: String,
}

impl LayoutEngine {
    pub fn new(width: f64, margin: f64, base_size: f64, family: &str) -> Self {
        Self {
            width,
            margin,
            base_size,
            family: family.to_string(),
        }
    }

    /// An engine for a page of `width` CSS pixels using the config's
    /// typography.
    pub fn from_config(config: &RenderConfig, width: f64) -> Self {
        Self::new(width, config.margin, config.font_size_px, &config.font_family)
    }

    /// Width of the content box. Never negative.
    pub fn max_width(&self) -> f64 {
        (self.width - 2.0 * self.margin).max(0.0)
    }

    /// Height needed for content whose cursor ended at `final_y`: one more
    /// base line plus the bottom margin.
    pub fn required_height(&self, final_y: f64) -> f64 {
        final_y + line_height(self.base_size) + self.margin
    }

    /// Lay out `items`, handing each placed word to `sink`. Returns the
    /// final cursor `y`.
    pub fn run<P, S>(&self, items: &[FlowItem], probe: &P, sink: &mut S) -> f64
    where
        P: MetricsProbe + ?Sized,
        S: LayoutSink + ?Sized,
    {
        let mut pass = Pass {
            engine: self,
            probe,
            sink,
            cursor: Cursor::new(self.margin),
            blocks: Vec::new(),
        };
        for item in items {
            pass.item(item);
        }
        pass.cursor.y
    }

    /// Dry pass: the height `document` needs on this page.
    pub fn measure<P: MetricsProbe + ?Sized>(&self, document: &Document, probe: &P) -> f64 {
        let items = text::walk(document);
        let final_y = self.run(&items, probe, &mut MeasureSink);
        self.required_height(final_y)
    }

    /// Lay out `document` and keep every placed word.
    pub fn layout_lines<P: MetricsProbe + ?Sized>(&self, document: &Document, probe: &P) -> LayoutInfo {
        let items = text::walk(document);
        let mut sink = RecordingSink::default();
        let final_y = self.run(&items, probe, &mut sink);
        LayoutInfo {
            width: self.width,
            margin: self.margin,
            final_y,
            required_height: self.required_height(final_y),
            words: sink.words,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    x: f64,
    y: f64,
    /// Tallest line height placed on the current line; 0 while empty.
    line_height: f64,
}

impl Cursor {
    fn new(margin: f64) -> Self {
        Self {
            x: margin,
            y: margin,
            line_height: 0.0,
        }
    }
}

struct OpenBlock {
    kind: BlockKind,
    has_content: bool,
}

struct Pass<'a, P: ?Sized, S: ?Sized> {
    engine: &'a LayoutEngine,
    probe: &'a P,
    sink: &'a mut S,
    cursor: Cursor,
    blocks: Vec<OpenBlock>,
}

impl<P, S> Pass<'_, P, S>
where
    P: MetricsProbe + ?Sized,
    S: LayoutSink + ?Sized,
{
    fn item(&mut self, item: &FlowItem) {
        match item {
            FlowItem::BlockStart(kind) => {
                if self.at_line_content() {
                    self.new_line();
                }
                self.blocks.push(OpenBlock {
                    kind: *kind,
                    has_content: false,
                });
            }
            FlowItem::BlockEnd(kind) => self.end_block(*kind),
            FlowItem::Run(run) => self.run(run),
            FlowItem::Marker(marker) => self.marker(marker),
            FlowItem::HardBreak => {
                if self.at_line_content() {
                    self.new_line();
                } else {
                    self.cursor.y += self.current_block().line_height(self.engine.base_size);
                }
                self.mark_content();
            }
        }
    }

    fn run(&mut self, run: &InlineRun) {
        let font = run.style.font_spec(&self.engine.family, self.engine.base_size);
        let space = self.probe.measure_space_width(&font);
        let run_line_height = line_height(font.size);
        for word in text::words(&run.text) {
            let width = self.probe.measure_width(word, &font);
            self.place(word, width, &font, run.style.underline, false, run_line_height);
            self.cursor.x += space;
        }
    }

    fn marker(&mut self, marker: &MarkerRun) {
        let font = marker
            .style
            .in_block(BlockKind::ListItem)
            .font_spec(&self.engine.family, self.engine.base_size);
        let label = marker.marker.text();
        // Measured with its trailing space; the pen gets no extra space.
        let width = self.probe.measure_width(&label, &font);
        let run_line_height = line_height(font.size);
        self.place(&label, width, &font, false, true, run_line_height);
    }

    fn place(
        &mut self,
        text: &str,
        width: f64,
        font: &FontSpec,
        underline: bool,
        marker: bool,
        run_line_height: f64,
    ) {
        let right = self.engine.margin + self.engine.max_width();
        if self.cursor.x + width > right && self.at_line_content() {
            self.new_line();
        }
        self.sink.word(&PlacedWord {
            text: text.to_string(),
            x: self.cursor.x,
            y: self.cursor.y,
            width,
            font: font.clone(),
            underline,
            marker,
        });
        self.cursor.line_height = self.cursor.line_height.max(run_line_height);
        self.cursor.x += width;
        self.mark_content();
    }

    fn end_block(&mut self, kind: BlockKind) {
        let Some(block) = self.blocks.pop() else {
            return;
        };
        debug_assert_eq!(block.kind, kind);
        if block.has_content {
            self.cursor.y += BLOCK_SPACING * kind.line_height(self.engine.base_size);
            self.mark_content();
        }
    }

    fn at_line_content(&self) -> bool {
        self.cursor.x > self.engine.margin
    }

    fn new_line(&mut self) {
        let advance = if self.cursor.line_height > 0.0 {
            self.cursor.line_height
        } else {
            self.current_block().line_height(self.engine.base_size)
        };
        self.cursor.y += advance;
        self.cursor.x = self.engine.margin;
        self.cursor.line_height = 0.0;
    }

    fn current_block(&self) -> BlockKind {
        self.blocks
            .last()
            .map(|b| b.kind)
            .unwrap_or(BlockKind::Paragraph)
    }

    /// Content in a block counts as content for every enclosing block.
    fn mark_content(&mut self) {
        for block in &mut self.blocks {
            block.has_content = true;
        }
    }
}
