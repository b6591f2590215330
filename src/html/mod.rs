//! # Rich-Text Parser
//!
//! Parses the constrained HTML subset produced by the rich-text editor into
//! the [`Document`] model. Supported: `p`, `div`, `h1`-`h3`, `ul`, `ol`,
//! `li`, `b`/`strong`, `i`/`em`, `u`, `br`. Any other tag is transparent:
//! the tag is dropped and its children are processed in its place.
//!
//! Editor markup is HTML, not XML, so the reader runs in lenient mode (end
//! tags need not match, `<br>` needs no close) and parsing never fails. On a
//! hard syntax error the parser stops and keeps what it has built so far.

use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;

use crate::model::{Block, Document, Inline, ItemNode, ListItem};
use crate::style::InlineStyle;

/// A lightweight element tree, the intermediate form between markup and
/// the document model.
#[derive(Debug, Clone, PartialEq)]
enum HtmlNode {
    Element { tag: String, children: Vec<HtmlNode> },
    Text(String),
}

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr", "col"];
const BLOCK_TAGS: &[&str] = &["p", "div", "h1", "h2", "h3", "ul", "ol", "li"];

/// Parse an HTML fragment into a document.
pub fn parse_fragment(html: &str) -> Document {
    let nodes = parse_tree(html);
    let mut converter = Converter::default();
    converter.nodes(&nodes);
    converter.flush();
    Document::new(converter.blocks)
}

fn parse_tree(html: &str) -> Vec<HtmlNode> {
    let mut reader = Reader::from_str(html);
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;

    // Bottom frame is the fragment root.
    let mut stack: Vec<(String, Vec<HtmlNode>)> = vec![(String::new(), Vec::new())];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = tag_name(e.name().as_ref());
                if VOID_TAGS.contains(&tag.as_str()) {
                    push_node(&mut stack, HtmlNode::Element { tag, children: Vec::new() });
                } else {
                    stack.push((tag, Vec::new()));
                }
            }
            Ok(Event::Empty(e)) => {
                let tag = tag_name(e.name().as_ref());
                push_node(&mut stack, HtmlNode::Element { tag, children: Vec::new() });
            }
            Ok(Event::End(e)) => {
                let tag = tag_name(e.name().as_ref());
                // Close up to the nearest matching open tag; stray ends are ignored.
                if let Some(pos) = stack.iter().skip(1).rposition(|(t, _)| *t == tag) {
                    let target = pos + 1;
                    while stack.len() > target {
                        close_frame(&mut stack);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let text = decode_text(&e);
                if !text.is_empty() {
                    push_node(&mut stack, HtmlNode::Text(text));
                }
            }
            Ok(Event::CData(e)) => {
                let text = collapse_whitespace(&String::from_utf8_lossy(&e.into_inner()));
                push_node(&mut stack, HtmlNode::Text(text));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!(
                    "rich-text parse stopped at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                break;
            }
            _ => {}
        }
    }

    while stack.len() > 1 {
        close_frame(&mut stack);
    }
    stack.pop().map(|(_, nodes)| nodes).unwrap_or_default()
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn push_node(stack: &mut [(String, Vec<HtmlNode>)], node: HtmlNode) {
    if let Some((_, children)) = stack.last_mut() {
        children.push(node);
    }
}

fn close_frame(stack: &mut Vec<(String, Vec<HtmlNode>)>) {
    if let Some((tag, children)) = stack.pop() {
        push_node(stack, HtmlNode::Element { tag, children });
    }
}

fn decode_text(e: &BytesText<'_>) -> String {
    let raw = e
        .unescape_with(resolve_entity)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
    collapse_whitespace(&raw)
}

fn resolve_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        "nbsp" => Some("\u{a0}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "hellip" => Some("\u{2026}"),
        "bull" => Some("\u{2022}"),
        _ => None,
    }
}

/// Source line breaks and tabs are plain spaces in rendered HTML.
/// Non-breaking spaces are kept.
fn collapse_whitespace(text: &str) -> String {
    text.chars()
        .map(|c| if c != '\u{a0}' && c.is_whitespace() { ' ' } else { c })
        .collect()
}

fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

fn contains_block(nodes: &[HtmlNode]) -> bool {
    nodes.iter().any(|n| match n {
        HtmlNode::Element { tag, children } => is_block_tag(tag) || contains_block(children),
        HtmlNode::Text(_) => false,
    })
}

#[derive(Default)]
struct Converter {
    blocks: Vec<Block>,
    /// Loose inline content waiting to become an implicit paragraph.
    pending: Vec<Inline>,
}

impl Converter {
    fn nodes(&mut self, nodes: &[HtmlNode]) {
        for node in nodes {
            self.node(node);
        }
    }

    fn node(&mut self, node: &HtmlNode) {
        let HtmlNode::Element { tag, children } = node else {
            self.pending.extend(inline_nodes(std::slice::from_ref(node)));
            return;
        };
        match tag.as_str() {
            "p" | "div" | "li" if contains_block(children) => self.nodes(children),
            "p" | "div" | "li" => {
                self.flush();
                self.blocks.push(Block::paragraph(inline_nodes(children)));
            }
            "h1" | "h2" | "h3" => {
                self.flush();
                let level = tag[1..].parse().unwrap_or(3);
                self.blocks.push(Block::heading(level, inline_nodes(children)));
            }
            "ul" | "ol" => {
                self.flush();
                self.blocks.push(list_block(tag == "ol", children));
            }
            _ if contains_block(children) => self.nodes(children),
            _ => self.pending.extend(inline_nodes(std::slice::from_ref(node))),
        }
    }

    fn flush(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        if has_content(&pending) {
            self.blocks.push(Block::paragraph(pending));
        }
    }
}

fn list_block(ordered: bool, children: &[HtmlNode]) -> Block {
    let mut items = Vec::new();
    collect_items(children, &mut items);
    Block::list(ordered, items)
}

fn collect_items(nodes: &[HtmlNode], items: &mut Vec<ListItem>) {
    for node in nodes {
        match node {
            HtmlNode::Element { tag, children } if tag == "li" => {
                items.push(ListItem {
                    children: item_nodes(children),
                });
            }
            HtmlNode::Element { children, .. } if contains_block(children) => {
                collect_items(children, items);
            }
            other => {
                let content = inline_nodes(std::slice::from_ref(other));
                if has_content(&content) {
                    items.push(ListItem::text(content));
                }
            }
        }
    }
}

fn item_nodes(nodes: &[HtmlNode]) -> Vec<ItemNode> {
    let mut out: Vec<ItemNode> = Vec::new();
    for node in nodes {
        match node {
            HtmlNode::Element { tag, children } => match tag.as_str() {
                "ul" | "ol" => out.push(ItemNode::Block(list_block(tag == "ol", children))),
                "h1" | "h2" | "h3" => {
                    let level = tag[1..].parse().unwrap_or(3);
                    out.push(ItemNode::Block(Block::heading(level, inline_nodes(children))));
                }
                // Paragraphs inside an item stay on the marker's line; later
                // ones start on a new line.
                "p" | "div" => {
                    if out.iter().any(|n| matches!(n, ItemNode::Inline(_))) {
                        out.push(ItemNode::Inline(Inline::LineBreak));
                    }
                    out.extend(item_nodes(children));
                }
                _ if contains_block(children) => out.extend(item_nodes(children)),
                _ => out.extend(
                    inline_nodes(std::slice::from_ref(node))
                        .into_iter()
                        .map(ItemNode::Inline),
                ),
            },
            HtmlNode::Text(_) => out.extend(
                inline_nodes(std::slice::from_ref(node))
                    .into_iter()
                    .map(ItemNode::Inline),
            ),
        }
    }
    out
}

fn inline_nodes(nodes: &[HtmlNode]) -> Vec<Inline> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push(Inline::Text { text: text.clone() }),
            HtmlNode::Element { tag, children } => match tag.as_str() {
                "b" | "strong" => out.push(Inline::styled(InlineStyle::Bold, inline_nodes(children))),
                "i" | "em" => out.push(Inline::styled(InlineStyle::Italic, inline_nodes(children))),
                "u" => out.push(Inline::styled(InlineStyle::Underline, inline_nodes(children))),
                "br" => out.push(Inline::LineBreak),
                _ => out.extend(inline_nodes(children)),
            },
        }
    }
    out
}

fn has_content(inlines: &[Inline]) -> bool {
    inlines.iter().any(|i| match i {
        Inline::Text { text } => !text.trim().is_empty(),
        Inline::Styled { children, .. } => has_content(children),
        Inline::LineBreak => true,
    })
}
