//! Rendering-engine boundary: turns an [`ExportDocument`] into PDF bytes.
//!
//! The abstract element sequence is mapped onto `genpdf` elements using a
//! fixed style table and rendered in one pass. When a watermark is configured
//! the bytes go through the overlay post-pass before they are returned.

use genpdf::style::Style;
use genpdf::{elements, Alignment, Element, Margins, Mm};
use log::debug;

use crate::elements::VerticalSpace;
use crate::error::ExportError;
use crate::model::{ExportDocument, PageSize, ParagraphStyle, RenderElement, MM_PER_INCH};
use crate::watermark;
use crate::{fonts, richtext};

/// Page margin on all four sides, 1 in upstream.
const PAGE_MARGIN_MM: f64 = MM_PER_INCH;

/// Font geometry and alignment for one paragraph style.
struct StyleSpec {
    font_size: u8,
    bold: bool,
    italic: bool,
    alignment: Alignment,
    space_after_mm: f64,
}

fn style_spec(style: ParagraphStyle) -> StyleSpec {
    match style {
        ParagraphStyle::Title => StyleSpec {
            font_size: 18,
            bold: true,
            italic: false,
            alignment: Alignment::Center,
            space_after_mm: 2.0,
        },
        ParagraphStyle::Heading1 => StyleSpec {
            font_size: 18,
            bold: true,
            italic: false,
            alignment: Alignment::Left,
            space_after_mm: 2.0,
        },
        ParagraphStyle::Heading2 => StyleSpec {
            font_size: 14,
            bold: true,
            italic: false,
            alignment: Alignment::Left,
            space_after_mm: 2.0,
        },
        ParagraphStyle::Heading3 => StyleSpec {
            font_size: 12,
            bold: true,
            italic: true,
            alignment: Alignment::Left,
            space_after_mm: 2.0,
        },
        ParagraphStyle::Normal | ParagraphStyle::Bullet | ParagraphStyle::Toggle => StyleSpec {
            font_size: 10,
            bold: false,
            italic: false,
            alignment: Alignment::Left,
            space_after_mm: 1.0,
        },
    }
}

fn paper_size(page_size: PageSize) -> genpdf::PaperSize {
    match page_size {
        PageSize::Letter => genpdf::PaperSize::Letter,
        PageSize::A4 => genpdf::PaperSize::A4,
    }
}

fn mm(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Renders the document to PDF bytes, applying the watermark overlay when one
/// is configured.
pub fn render_document(document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
    let mut doc = genpdf::Document::new(fonts::default_font_family()?);
    doc.set_title(document.title.clone());
    doc.set_paper_size(paper_size(document.page_size));

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(Margins::trbl(
        mm(PAGE_MARGIN_MM),
        mm(PAGE_MARGIN_MM),
        mm(PAGE_MARGIN_MM),
        mm(PAGE_MARGIN_MM),
    ));
    doc.set_page_decorator(decorator);

    let mono = doc.add_font_family(fonts::monospace_font_family()?);

    for element in &document.elements {
        match element {
            RenderElement::Title(text) => {
                let spec = style_spec(ParagraphStyle::Title);
                let paragraph = paragraph_from_markup(text, &spec, &mono)?;
                doc.push(paragraph.padded(Margins::trbl(
                    mm(0.0),
                    mm(0.0),
                    mm(spec.space_after_mm),
                    mm(0.0),
                )));
            }
            RenderElement::Body {
                markup,
                style,
                indent_mm,
            } => {
                let spec = style_spec(*style);
                let paragraph = paragraph_from_markup(markup, &spec, &mono)?;
                let indent = indent_mm.unwrap_or(0.0);
                doc.push(paragraph.padded(Margins::trbl(
                    mm(0.0),
                    mm(0.0),
                    mm(spec.space_after_mm),
                    mm(indent),
                )));
            }
            RenderElement::Spacer { height_mm } => {
                doc.push(VerticalSpace::new(*height_mm));
            }
            RenderElement::PageBreak => {
                doc.push(elements::PageBreak::new());
            }
        }
    }

    let mut bytes = Vec::new();
    doc.render(&mut bytes)?;
    debug!("rendered {} bytes of PDF output", bytes.len());

    match document.watermark.as_deref() {
        Some(text) if !text.is_empty() => Ok(watermark::apply_watermark(&bytes, text)?),
        _ => Ok(bytes),
    }
}

fn paragraph_from_markup(
    markup: &str,
    spec: &StyleSpec,
    mono: &genpdf::fonts::FontFamily<genpdf::fonts::Font>,
) -> Result<elements::Paragraph, ExportError> {
    let mut paragraph = elements::Paragraph::default();

    for span in richtext::parse_markup(markup)? {
        let mut style = Style::new();
        style.set_font_size(spec.font_size);
        if spec.bold || span.is_bold() {
            style.set_bold();
        }
        if spec.italic || span.is_italic() {
            style.set_italic();
        }
        if span.is_code() {
            style.set_font_family(mono.clone());
        }
        paragraph.push_styled(span.text().to_owned(), style);
    }

    paragraph.set_alignment(spec.alignment);
    Ok(paragraph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_styles_shrink_with_level() {
        let sizes: Vec<u8> = [
            ParagraphStyle::Heading1,
            ParagraphStyle::Heading2,
            ParagraphStyle::Heading3,
        ]
        .into_iter()
        .map(|style| style_spec(style).font_size)
        .collect();
        assert_eq!(sizes, vec![18, 14, 12]);
    }

    #[test]
    fn title_is_centered_and_bold() {
        let spec = style_spec(ParagraphStyle::Title);
        assert!(spec.bold);
        assert!(matches!(spec.alignment, Alignment::Center));
    }

    #[test]
    fn list_styles_share_normal_geometry() {
        for style in [ParagraphStyle::Bullet, ParagraphStyle::Toggle] {
            let spec = style_spec(style);
            assert_eq!(spec.font_size, style_spec(ParagraphStyle::Normal).font_size);
            assert!(!spec.bold);
        }
    }
}
