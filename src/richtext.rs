//! Rich-text composition and the inline markup vocabulary.
//!
//! Annotated spans fetched from the content API are composed into a single
//! markup string (`<b>`, `<i>`, `<font name='Courier'>`), and at the
//! rendering boundary the same vocabulary is parsed back into styled [`Span`]
//! values for the PDF engine. Keeping both directions in one module makes the
//! tag set a single source of truth.
//!
//! Span content is not escaped, so content that happens to contain tag syntax
//! will be re-interpreted by the parser. The parser is therefore lenient: a
//! `<` that does not open one of the known tags is treated as literal text.

use thiserror::Error;

use crate::notion::TextSpan;

const BOLD_OPEN: &str = "<b>";
const BOLD_CLOSE: &str = "</b>";
const ITALIC_OPEN: &str = "<i>";
const ITALIC_CLOSE: &str = "</i>";
const CODE_OPEN: &str = "<font name='Courier'>";
const CODE_CLOSE: &str = "</font>";

/// Composes an ordered sequence of annotated spans into one markup string.
///
/// Each span's content is wrapped according to its annotation flags with a
/// fixed nesting order (bold outermost, then italic, then code), so the same
/// flag combination always yields identically nested markup regardless of how
/// the flags were declared. Span results are concatenated in sequence order
/// with no separator; an empty sequence yields the empty string.
pub fn compose(spans: &[TextSpan]) -> String {
    let mut composed = String::new();

    for span in spans {
        let mut text = span.plain_text.clone();
        if span.annotations.code {
            text = format!("{CODE_OPEN}{text}{CODE_CLOSE}");
        }
        if span.annotations.italic {
            text = format!("{ITALIC_OPEN}{text}{ITALIC_CLOSE}");
        }
        if span.annotations.bold {
            text = format!("{BOLD_OPEN}{text}{BOLD_CLOSE}");
        }
        composed.push_str(&text);
    }

    composed
}

/// Wraps a markup string in the italic tag pair.
pub fn italicized(markup: impl AsRef<str>) -> String {
    format!("{ITALIC_OPEN}{}{ITALIC_CLOSE}", markup.as_ref())
}

/// A slice of text together with the inline styles in effect for it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    code: bool,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether the span should be rendered in bold.
    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Returns whether the span should be rendered in italic.
    pub fn is_italic(&self) -> bool {
        self.italic
    }

    /// Returns whether the span should be rendered in the monospace family.
    pub fn is_code(&self) -> bool {
        self.code
    }

    /// Marks the span as bold and returns it.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the span as italic and returns it.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Marks the span as code and returns it.
    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }
}

/// Parse errors produced by [`parse_markup`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} (at byte {index})")]
pub struct ParseError {
    index: usize,
    message: String,
}

impl ParseError {
    fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }

    /// Byte index in the original input string where the error was detected.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human-readable description of the parsing error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct StyleState {
    bold: bool,
    italic: bool,
    code: bool,
}

impl StyleState {
    fn to_span(self, text: impl Into<String>) -> Span {
        Span {
            text: text.into(),
            bold: self.bold,
            italic: self.italic,
            code: self.code,
        }
    }

    fn with(mut self, tag: Tag) -> Self {
        match tag {
            Tag::Bold => self.bold = true,
            Tag::Italic => self.italic = true,
            Tag::Code => self.code = true,
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Bold,
    Italic,
    Code,
}

const TAGS: [Tag; 3] = [Tag::Bold, Tag::Italic, Tag::Code];

impl Tag {
    fn opening_token(self) -> &'static str {
        match self {
            Tag::Bold => BOLD_OPEN,
            Tag::Italic => ITALIC_OPEN,
            Tag::Code => CODE_OPEN,
        }
    }

    fn closing_token(self) -> &'static str {
        match self {
            Tag::Bold => BOLD_CLOSE,
            Tag::Italic => ITALIC_CLOSE,
            Tag::Code => CODE_CLOSE,
        }
    }

    fn description(self) -> &'static str {
        match self {
            Tag::Bold => "bold span",
            Tag::Italic => "italic span",
            Tag::Code => "code span",
        }
    }
}

/// Parses a composed markup string into a list of styled [`Span`]s.
///
/// The recognized constructs are the three tag pairs emitted by [`compose`],
/// nested arbitrarily. Any other text, including a `<` that does not open a
/// known tag, is literal. A closing tag without a matching opening tag, or an
/// opening tag that is never closed, yields a [`ParseError`] with positional
/// information.
pub fn parse_markup(input: &str) -> Result<Vec<Span>, ParseError> {
    let (spans, index) = parse_inner(input, 0, StyleState::default(), None)?;
    debug_assert_eq!(index, input.len());
    Ok(spans)
}

fn parse_inner(
    input: &str,
    mut index: usize,
    state: StyleState,
    closing_tag: Option<Tag>,
) -> Result<(Vec<Span>, usize), ParseError> {
    let mut spans = Vec::new();
    let mut buffer = String::new();

    'scan: while index < input.len() {
        if let Some(tag) = closing_tag {
            if input[index..].starts_with(tag.closing_token()) {
                flush_buffer(&mut buffer, &mut spans, state);
                index += tag.closing_token().len();
                return Ok((spans, index));
            }
        }

        for tag in TAGS {
            if input[index..].starts_with(tag.opening_token()) {
                flush_buffer(&mut buffer, &mut spans, state);
                index += tag.opening_token().len();
                let (nested, new_index) = parse_inner(input, index, state.with(tag), Some(tag))?;
                spans.extend(nested);
                index = new_index;
                continue 'scan;
            }
        }

        for tag in TAGS {
            if input[index..].starts_with(tag.closing_token()) {
                return Err(ParseError::new(
                    index,
                    format!(
                        "unexpected closing tag `{}` without matching `{}`",
                        tag.closing_token(),
                        tag.opening_token()
                    ),
                ));
            }
        }

        let ch = input[index..]
            .chars()
            .next()
            .expect("character extraction succeeded");
        buffer.push(ch);
        index += ch.len_utf8();
    }

    if let Some(tag) = closing_tag {
        Err(ParseError::new(
            index,
            format!("unterminated {}", tag.description()),
        ))
    } else {
        flush_buffer(&mut buffer, &mut spans, state);
        Ok((spans, index))
    }
}

fn flush_buffer(buffer: &mut String, spans: &mut Vec<Span>, state: StyleState) {
    if buffer.is_empty() {
        return;
    }
    spans.push(state.to_span(std::mem::take(buffer)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::Annotations;

    fn span(text: &str, bold: bool, italic: bool, code: bool) -> TextSpan {
        TextSpan {
            plain_text: text.to_owned(),
            annotations: Annotations { bold, italic, code },
        }
    }

    #[test]
    fn compose_of_empty_sequence_is_empty() {
        assert_eq!(compose(&[]), "");
    }

    #[test]
    fn compose_passes_plain_text_through() {
        assert_eq!(
            compose(&[span("Hello world", false, false, false)]),
            "Hello world"
        );
    }

    #[test]
    fn compose_nests_all_annotations_in_fixed_order() {
        assert_eq!(
            compose(&[span("content", true, true, true)]),
            "<b><i><font name='Courier'>content</font></i></b>"
        );
    }

    #[test]
    fn compose_is_associative_over_span_concatenation() {
        let first = span("alpha ", true, false, false);
        let second = span("beta", false, true, false);
        let joined = compose(&[first.clone(), second.clone()]);
        assert_eq!(
            joined,
            format!("{}{}", compose(&[first]), compose(&[second]))
        );
    }

    #[test]
    fn parse_plain_text() {
        let spans = parse_markup("Hello world").expect("parse succeeds");
        assert_eq!(spans, vec![Span::new("Hello world")]);
    }

    #[test]
    fn parse_round_trips_composed_markup() {
        let markup = compose(&[
            span("plain ", false, false, false),
            span("loud", true, false, false),
            span(" and ", false, false, false),
            span("ls -la", false, false, true),
        ]);
        let spans = parse_markup(&markup).expect("parse succeeds");
        assert_eq!(
            spans,
            vec![
                Span::new("plain "),
                Span::new("loud").bold(),
                Span::new(" and "),
                Span::new("ls -la").code(),
            ]
        );
    }

    #[test]
    fn parse_nested_styles() {
        let spans = parse_markup("This is <b>very <i>cool</i></b>!").expect("parse succeeds");
        assert_eq!(
            spans,
            vec![
                Span::new("This is "),
                Span::new("very ").bold(),
                Span::new("cool").bold().italic(),
                Span::new("!"),
            ]
        );
    }

    #[test]
    fn lone_angle_bracket_is_literal_text() {
        let spans = parse_markup("2 < 3 <em>nope</em>").expect("parse succeeds");
        assert_eq!(spans, vec![Span::new("2 < 3 <em>nope</em>")]);
    }

    #[test]
    fn error_on_unterminated_bold() {
        let err = parse_markup("<b>oops").unwrap_err();
        assert!(err.message().contains("unterminated bold"));
    }

    #[test]
    fn error_on_stray_closing_tag() {
        let err = parse_markup("oops</font>").unwrap_err();
        assert!(err.message().contains("unexpected closing tag"));
        assert_eq!(err.index(), 4);
    }
}
