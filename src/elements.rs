//! Custom element implementations built on top of `genpdf` primitives.

use genpdf::style::Style;
use genpdf::{render, Element, Mm, RenderResult, Size};

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Fixed vertical whitespace between elements.
///
/// Unlike [`genpdf::elements::Break`], which is measured in line heights, the
/// space is given in millimetres so the document geometry stays independent of
/// the surrounding font size. If less room is left on the page, the spacer
/// collapses to whatever remains instead of forcing a page break.
pub struct VerticalSpace {
    height: Mm,
}

impl VerticalSpace {
    /// Creates a spacer of the given height in millimetres.
    pub fn new(height_mm: f64) -> Self {
        Self {
            height: mm_from_f64(height_mm),
        }
    }
}

impl Element for VerticalSpace {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, genpdf::error::Error> {
        let available = area.size().height;
        let consumed = if self.height < available {
            self.height
        } else {
            available
        };

        let mut result = RenderResult::default();
        result.size = Size::new(0, consumed);
        Ok(result)
    }
}
