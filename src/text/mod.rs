//! # Styled-Run Walker
//!
//! Flattens a [`Document`] into the linear sequence of [`FlowItem`]s the
//! layout engine consumes: block boundaries, styled text runs, synthetic
//! list markers and hard breaks, in depth-first document order.
//!
//! The walk is a pure function of the document. Both layout passes consume
//! the same item list, so they cannot disagree about what is on the page.

pub mod shaping;

use serde::Serialize;

use crate::model::{Block, Document, Inline, ItemNode, ListItem};
use crate::style::{BlockKind, StyleContext};

/// A maximal span of text sharing one style context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineRun {
    pub text: String,
    pub style: StyleContext,
}

/// The synthetic marker placed before each list item's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListMarker {
    Bullet,
    /// 1-based position within its list.
    Ordinal(usize),
}

impl ListMarker {
    /// Marker text, including its trailing space.
    pub fn text(&self) -> String {
        match self {
            ListMarker::Bullet => "\u{2022} ".to_string(),
            ListMarker::Ordinal(n) => format!("{}. ", n),
        }
    }
}

/// A list marker together with the style of the item it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerRun {
    pub marker: ListMarker,
    pub style: StyleContext,
}

/// One step of the flattened document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FlowItem {
    BlockStart(BlockKind),
    Run(InlineRun),
    Marker(MarkerRun),
    HardBreak,
    BlockEnd(BlockKind),
}

/// Flatten a document into flow items.
pub fn walk(document: &Document) -> Vec<FlowItem> {
    let mut walker = Walker::default();
    for block in &document.blocks {
        walker.block(block, StyleContext::default());
    }
    walker.items
}

#[derive(Default)]
struct Walker {
    items: Vec<FlowItem>,
    /// A whitespace-only text node was skipped since the last run.
    pending_space: bool,
}

impl Walker {
    fn block(&mut self, block: &Block, ctx: StyleContext) {
        match block {
            Block::Paragraph { content } => {
                self.wrap_block(BlockKind::Paragraph, ctx, |w, ctx| w.inlines(content, ctx));
            }
            Block::Heading { level, content } => {
                let kind = BlockKind::Heading((*level).clamp(1, 3));
                self.wrap_block(kind, ctx, |w, ctx| w.inlines(content, ctx));
            }
            Block::List { ordered, items } => {
                self.wrap_block(BlockKind::List, ctx, |w, ctx| {
                    for (i, item) in items.iter().enumerate() {
                        let marker = if *ordered {
                            ListMarker::Ordinal(i + 1)
                        } else {
                            ListMarker::Bullet
                        };
                        w.list_item(item, marker, ctx);
                    }
                });
            }
        }
    }

    fn list_item(&mut self, item: &ListItem, marker: ListMarker, ctx: StyleContext) {
        self.wrap_block(BlockKind::ListItem, ctx, |w, ctx| {
            w.items.push(FlowItem::Marker(MarkerRun { marker, style: ctx }));
            for child in &item.children {
                match child {
                    ItemNode::Inline(inline) => w.inline(inline, ctx),
                    ItemNode::Block(block) => w.block(block, ctx),
                }
            }
        });
    }

    fn wrap_block(
        &mut self,
        kind: BlockKind,
        ctx: StyleContext,
        body: impl FnOnce(&mut Self, StyleContext),
    ) {
        self.items.push(FlowItem::BlockStart(kind));
        self.pending_space = false;
        body(self, ctx.in_block(kind));
        self.items.push(FlowItem::BlockEnd(kind));
        self.pending_space = false;
    }

    fn inlines(&mut self, inlines: &[Inline], ctx: StyleContext) {
        for inline in inlines {
            self.inline(inline, ctx);
        }
    }

    fn inline(&mut self, inline: &Inline, ctx: StyleContext) {
        match inline {
            Inline::Text { text } => self.text(text, ctx),
            Inline::Styled { style, children } => self.inlines(children, ctx.with_inline(*style)),
            Inline::LineBreak => {
                self.items.push(FlowItem::HardBreak);
                self.pending_space = false;
            }
        }
    }

    fn text(&mut self, text: &str, style: StyleContext) {
        if text.chars().all(char::is_whitespace) {
            self.pending_space = true;
            return;
        }
        // Adjacent text of identical style is one run ("hel" + "lo").
        if !self.pending_space {
            if let Some(FlowItem::Run(prev)) = self.items.last_mut() {
                if prev.style == style {
                    prev.text.push_str(text);
                    return;
                }
            }
        }
        self.pending_space = false;
        self.items.push(FlowItem::Run(InlineRun {
            text: text.to_string(),
            style,
        }));
    }
}

/// The words of a run: split on single spaces, empty pieces dropped.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(' ').filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListItem;
    use crate::style::InlineStyle;

    fn runs(items: &[FlowItem]) -> Vec<&InlineRun> {
        items
            .iter()
            .filter_map(|i| match i {
                FlowItem::Run(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn markers(items: &[FlowItem]) -> Vec<String> {
        items
            .iter()
            .filter_map(|i| match i {
                FlowItem::Marker(m) => Some(m.marker.text()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_paragraph_yields_block_and_run() {
        let doc = Document::new(vec![Block::paragraph(vec![Inline::text("hello world")])]);
        let items = walk(&doc);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], FlowItem::BlockStart(BlockKind::Paragraph));
        assert_eq!(items[2], FlowItem::BlockEnd(BlockKind::Paragraph));
        let r = runs(&items);
        assert_eq!(r[0].text, "hello world");
        assert_eq!(r[0].style.block, BlockKind::Paragraph);
    }

    #[test]
    fn test_inline_styles_nest() {
        let doc = Document::new(vec![Block::heading(
            2,
            vec![Inline::styled(
                InlineStyle::Bold,
                vec![
                    Inline::text("bold "),
                    Inline::styled(InlineStyle::Italic, vec![Inline::text("both")]),
                ],
            )],
        )]);
        let items = walk(&doc);
        let r = runs(&items);
        assert_eq!(r.len(), 2);
        assert!(r[0].style.bold && !r[0].style.italic);
        assert!(r[1].style.bold && r[1].style.italic);
        assert_eq!(r[1].style.block, BlockKind::Heading(2));
    }

    #[test]
    fn test_whitespace_only_text_skipped() {
        let doc = Document::new(vec![Block::paragraph(vec![
            Inline::text("  \n "),
            Inline::text("\t"),
        ])]);
        let items = walk(&doc);
        assert!(runs(&items).is_empty());
    }

    #[test]
    fn test_adjacent_same_style_runs_merge() {
        let doc = Document::new(vec![Block::paragraph(vec![
            Inline::text("hel"),
            Inline::text("lo"),
            Inline::text(" "),
            Inline::text("world"),
        ])]);
        let items = walk(&doc);
        let r = runs(&items);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].text, "hello");
        assert_eq!(r[1].text, "world");
    }

    #[test]
    fn test_ordered_list_markers_count_per_list() {
        let item = |t: &str| ListItem::text(vec![Inline::text(t)]);
        let doc = Document::new(vec![
            Block::list(true, vec![item("a"), item("b"), item("c")]),
            Block::list(true, vec![item("x")]),
            Block::list(false, vec![item("y")]),
        ]);
        let items = walk(&doc);
        assert_eq!(markers(&items), vec!["1. ", "2. ", "3. ", "1. ", "\u{2022} "]);
    }

    #[test]
    fn test_marker_precedes_item_content() {
        let doc = Document::new(vec![Block::list(
            false,
            vec![ListItem::text(vec![Inline::text("milk")])],
        )]);
        let items = walk(&doc);
        assert_eq!(items[0], FlowItem::BlockStart(BlockKind::List));
        assert_eq!(items[1], FlowItem::BlockStart(BlockKind::ListItem));
        assert!(matches!(items[2], FlowItem::Marker(_)));
        assert!(matches!(&items[3], FlowItem::Run(r) if r.text == "milk"));
    }

    #[test]
    fn test_words_drop_empty_pieces() {
        let w: Vec<&str> = words(" a  b ").collect();
        assert_eq!(w, vec!["a", "b"]);
    }
}
