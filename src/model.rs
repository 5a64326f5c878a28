//! Abstract document model consumed by the rendering boundary.
//!
//! The types here describe the renderable output of the transformation
//! pipeline without referencing the rendering crate, so the core stays
//! testable with plain equality assertions and the engine remains swappable.

use std::fmt;
use std::str::FromStr;

use crate::error::ExportError;

/// Millimetres per inch, for converting the upstream inch/point geometry.
pub const MM_PER_INCH: f64 = 25.4;

/// Millimetres per PostScript point (72 points to the inch).
pub const MM_PER_POINT: f64 = MM_PER_INCH / 72.0;

/// Styles a body paragraph can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParagraphStyle {
    Title,
    Normal,
    Heading1,
    Heading2,
    Heading3,
    Bullet,
    Toggle,
}

/// One renderable unit of the output document.
///
/// The element sequence reflects the order of the source blocks exactly; a
/// page-break sentinel replaces its source block's text element rather than
/// accompanying it.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderElement {
    /// The page title, rendered in the title style.
    Title(String),
    /// A body paragraph carrying composed rich-text markup.
    Body {
        markup: String,
        style: ParagraphStyle,
        indent_mm: Option<f64>,
    },
    /// Fixed vertical whitespace.
    Spacer { height_mm: f64 },
    /// Forces the following content onto a new physical page.
    PageBreak,
}

impl RenderElement {
    /// Creates a body paragraph without an indent.
    pub fn body(markup: impl Into<String>, style: ParagraphStyle) -> Self {
        Self::Body {
            markup: markup.into(),
            style,
            indent_mm: None,
        }
    }

    /// Creates an indented body paragraph.
    pub fn indented_body(markup: impl Into<String>, style: ParagraphStyle, indent_mm: f64) -> Self {
        Self::Body {
            markup: markup.into(),
            style,
            indent_mm: Some(indent_mm),
        }
    }

    /// Creates a fixed-height spacer.
    pub fn spacer(height_mm: f64) -> Self {
        Self::Spacer { height_mm }
    }
}

/// Physical page size of the generated document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageSize {
    #[default]
    Letter,
    A4,
}

impl FromStr for PageSize {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "letter" => Ok(Self::Letter),
            "a4" => Ok(Self::A4),
            _ => Err(ExportError::InvalidPageSize(value.to_owned())),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Letter => f.write_str("letter"),
            Self::A4 => f.write_str("a4"),
        }
    }
}

/// The complete renderable document for one export invocation.
///
/// Created once per export and consumed exactly once by the rendering
/// boundary; the title doubles as the PDF metadata title.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportDocument {
    pub title: String,
    pub elements: Vec<RenderElement>,
    pub page_size: PageSize,
    pub watermark: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_parses_known_selectors() {
        assert_eq!("letter".parse::<PageSize>().unwrap(), PageSize::Letter);
        assert_eq!("a4".parse::<PageSize>().unwrap(), PageSize::A4);
        assert_eq!("A4".parse::<PageSize>().unwrap(), PageSize::A4);
    }

    #[test]
    fn page_size_rejects_unknown_selector() {
        let err = "tabloid".parse::<PageSize>().unwrap_err();
        assert!(err.to_string().contains("tabloid"));
    }

    #[test]
    fn page_size_defaults_to_letter() {
        assert_eq!(PageSize::default(), PageSize::Letter);
    }
}
