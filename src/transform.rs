//! Block classification and document assembly.
//!
//! [`block_elements`] maps one fetched content block to zero, one, or two
//! renderable elements; [`assemble`] runs the full linear scan that produces
//! the final element sequence (title, export metadata line, transformed
//! blocks). The page-break sentinel checks are standalone predicates on the
//! composed text so their differing matching rules stay visible in isolation.

use chrono::{DateTime, Local};

use crate::model::{ParagraphStyle, RenderElement, MM_PER_INCH, MM_PER_POINT};
use crate::notion::{ContentBlock, RichTextPayload};
use crate::richtext;

/// Sentinel values a paragraph must equal (trimmed, case-normalized) to be
/// reinterpreted as an explicit page break. The upstream content model has no
/// native page-break primitive; these reserved literals are the escape hatch.
pub const PARAGRAPH_BREAK_SENTINELS: [&str; 3] =
    ["PAGE BREAK", "PAGEBREAK", "--- PAGE BREAK ---"];

/// Phrase whose mere containment turns a toggle into a page break.
pub const TOGGLE_BREAK_PHRASE: &str = "PAGE BREAK";

const BULLET_PREFIX: &str = "\u{2022} ";
const TOGGLE_PREFIX: &str = "\u{25B6} ";

/// Left indent of list and toggle paragraphs, 20 pt upstream.
const LIST_INDENT_MM: f64 = 20.0 * MM_PER_POINT;

const TITLE_SPACER_MM: f64 = 0.3 * MM_PER_INCH;
const METADATA_SPACER_MM: f64 = 0.5 * MM_PER_INCH;

const TIMESTAMP_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// Returns whether a composed paragraph text requests a page break.
///
/// Paragraphs match exactly: the trimmed, uppercased text must equal one of
/// the three sentinel literals. This is intentionally stricter than the
/// toggle rule in [`toggle_break_requested`]; the asymmetry is inherited
/// behavior and must not be unified.
pub fn paragraph_break_requested(text: &str) -> bool {
    let normalized = text.trim().to_uppercase();
    PARAGRAPH_BREAK_SENTINELS
        .iter()
        .any(|sentinel| normalized == *sentinel)
}

/// Returns whether a composed toggle text requests a page break.
///
/// Toggles match loosely: the uppercased, untrimmed text merely has to
/// contain the phrase anywhere.
pub fn toggle_break_requested(text: &str) -> bool {
    text.to_uppercase().contains(TOGGLE_BREAK_PHRASE)
}

/// Maps one content block to its renderable elements.
///
/// Unrecognized block types produce an empty sequence. Blank paragraphs are
/// dropped; blank headings are kept (inherited behavior). A sentinel match
/// replaces the block's text element with a single page break.
pub fn block_elements(block: &ContentBlock) -> Vec<RenderElement> {
    match block {
        ContentBlock::Paragraph { paragraph } => {
            let text = richtext::compose(&paragraph.rich_text);
            if paragraph_break_requested(&text) {
                vec![RenderElement::PageBreak]
            } else if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![RenderElement::body(text, ParagraphStyle::Normal)]
            }
        }
        ContentBlock::Heading1 { heading_1 } => heading(heading_1, ParagraphStyle::Heading1),
        ContentBlock::Heading2 { heading_2 } => heading(heading_2, ParagraphStyle::Heading2),
        ContentBlock::Heading3 { heading_3 } => heading(heading_3, ParagraphStyle::Heading3),
        ContentBlock::BulletedListItem { bulleted_list_item } => {
            let text = richtext::compose(&bulleted_list_item.rich_text);
            vec![RenderElement::indented_body(
                format!("{BULLET_PREFIX}{text}"),
                ParagraphStyle::Bullet,
                LIST_INDENT_MM,
            )]
        }
        ContentBlock::Toggle { toggle } => {
            let text = richtext::compose(&toggle.rich_text);
            if toggle_break_requested(&text) {
                vec![RenderElement::PageBreak]
            } else {
                vec![RenderElement::indented_body(
                    format!("{TOGGLE_PREFIX}{text}"),
                    ParagraphStyle::Toggle,
                    LIST_INDENT_MM,
                )]
            }
        }
        ContentBlock::Unsupported => Vec::new(),
    }
}

fn heading(payload: &RichTextPayload, style: ParagraphStyle) -> Vec<RenderElement> {
    vec![RenderElement::body(
        richtext::compose(&payload.rich_text),
        style,
    )]
}

/// Assembles the complete renderable sequence for one export.
///
/// The output is the title, a fixed spacer, an italicized export-metadata
/// line stamped with `exported_at`, a larger fixed spacer, and then every
/// block's elements flattened in input order. No sorting, deduplication, or
/// reordering happens anywhere.
pub fn assemble(
    title: &str,
    exported_at: DateTime<Local>,
    blocks: &[ContentBlock],
) -> Vec<RenderElement> {
    let metadata_line = format!(
        "Exported from Notion on {}",
        exported_at.format(TIMESTAMP_FORMAT)
    );

    let mut elements = vec![
        RenderElement::Title(title.to_owned()),
        RenderElement::spacer(TITLE_SPACER_MM),
        RenderElement::body(richtext::italicized(metadata_line), ParagraphStyle::Normal),
        RenderElement::spacer(METADATA_SPACER_MM),
    ];

    for block in blocks {
        elements.extend(block_elements(block));
    }

    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn block(kind: &str, text: &str) -> ContentBlock {
        serde_json::from_value(json!({
            "type": kind,
            kind: {
                "rich_text": [{ "plain_text": text }]
            }
        }))
        .expect("block fixture deserializes")
    }

    fn empty_block(kind: &str) -> ContentBlock {
        serde_json::from_value(json!({ "type": kind, kind: { "rich_text": [] } }))
            .expect("block fixture deserializes")
    }

    #[test]
    fn paragraph_sentinel_matches_exactly_after_normalization() {
        let elements = block_elements(&block("paragraph", "  page break  "));
        assert_eq!(elements, vec![RenderElement::PageBreak]);
    }

    #[test]
    fn paragraph_sentinel_requires_exact_match() {
        let elements = block_elements(&block("paragraph", "this is not a page break"));
        assert_eq!(
            elements,
            vec![RenderElement::body(
                "this is not a page break",
                ParagraphStyle::Normal
            )]
        );
    }

    #[test]
    fn dashed_sentinel_also_breaks() {
        let elements = block_elements(&block("paragraph", "--- page break ---"));
        assert_eq!(elements, vec![RenderElement::PageBreak]);
    }

    #[test]
    fn blank_paragraph_is_dropped() {
        assert!(block_elements(&block("paragraph", "   ")).is_empty());
        assert!(block_elements(&empty_block("paragraph")).is_empty());
    }

    #[test]
    fn blank_heading_is_kept() {
        let elements = block_elements(&empty_block("heading_2"));
        assert_eq!(
            elements,
            vec![RenderElement::body("", ParagraphStyle::Heading2)]
        );
    }

    #[test]
    fn headings_map_to_their_styles() {
        for (kind, style) in [
            ("heading_1", ParagraphStyle::Heading1),
            ("heading_2", ParagraphStyle::Heading2),
            ("heading_3", ParagraphStyle::Heading3),
        ] {
            let elements = block_elements(&block(kind, "Overview"));
            assert_eq!(elements, vec![RenderElement::body("Overview", style)]);
        }
    }

    #[test]
    fn bulleted_item_gets_glyph_and_indent() {
        let elements = block_elements(&block("bulleted_list_item", "Item A"));
        let [RenderElement::Body {
            markup,
            style,
            indent_mm,
        }] = elements.as_slice()
        else {
            panic!("expected a single body element");
        };
        assert_eq!(markup, "\u{2022} Item A");
        assert_eq!(*style, ParagraphStyle::Bullet);
        assert!(indent_mm.is_some());
    }

    #[test]
    fn toggle_break_matches_substring_case_insensitively() {
        let elements = block_elements(&block("toggle", "see Page Break below"));
        assert_eq!(elements, vec![RenderElement::PageBreak]);
    }

    #[test]
    fn toggle_without_phrase_gets_glyph_and_indent() {
        let elements = block_elements(&block("toggle", "Details"));
        let [RenderElement::Body { markup, style, .. }] = elements.as_slice() else {
            panic!("expected a single body element");
        };
        assert_eq!(markup, "\u{25B6} Details");
        assert_eq!(*style, ParagraphStyle::Toggle);
    }

    #[test]
    fn unrecognized_block_is_silently_dropped() {
        let block: ContentBlock =
            serde_json::from_value(json!({ "type": "child_page", "child_page": {} }))
                .expect("block fixture deserializes");
        assert!(block_elements(&block).is_empty());
    }

    #[test]
    fn assemble_produces_expected_sequence() {
        let blocks = vec![
            block("heading_1", "Overview"),
            block("paragraph", "Revenue up."),
            block("paragraph", "PAGE BREAK"),
            block("bulleted_list_item", "Item A"),
        ];
        let exported_at = Local.with_ymd_and_hms(2026, 2, 14, 15, 5, 0).unwrap();

        let elements = assemble("Q1 Plan", exported_at, &blocks);

        assert_eq!(elements.len(), 8);
        assert_eq!(elements[0], RenderElement::Title("Q1 Plan".to_owned()));
        assert!(matches!(elements[1], RenderElement::Spacer { .. }));
        assert_eq!(
            elements[2],
            RenderElement::body(
                "<i>Exported from Notion on February 14, 2026 at 03:05 PM</i>",
                ParagraphStyle::Normal
            )
        );
        assert!(matches!(elements[3], RenderElement::Spacer { .. }));
        assert_eq!(
            elements[4],
            RenderElement::body("Overview", ParagraphStyle::Heading1)
        );
        assert_eq!(
            elements[5],
            RenderElement::body("Revenue up.", ParagraphStyle::Normal)
        );
        assert_eq!(elements[6], RenderElement::PageBreak);
        let RenderElement::Body { markup, .. } = &elements[7] else {
            panic!("expected a bullet body element");
        };
        assert_eq!(markup, "\u{2022} Item A");
    }

    #[test]
    fn assemble_element_count_is_preamble_plus_block_sums() {
        let blocks = vec![
            block("paragraph", ""),
            block("paragraph", "text"),
            block("toggle", "PAGE BREAK"),
            empty_block("heading_3"),
            serde_json::from_value(json!({ "type": "divider", "divider": {} })).unwrap(),
        ];
        let per_block: usize = blocks.iter().map(|b| block_elements(b).len()).sum();
        let exported_at = Local.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).unwrap();

        let elements = assemble("Untitled", exported_at, &blocks);

        assert_eq!(per_block, 3);
        assert_eq!(elements.len(), 4 + per_block);
    }
}
