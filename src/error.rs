//! Error types for the notion2pdf library.
//!
//! Every stage of an export propagates its failure unchanged to the caller;
//! there is no local recovery. The binary converts the final error into a
//! single user-facing message and a non-zero exit status.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::richtext::ParseError;
use crate::watermark::WatermarkError;

/// All errors returned by an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The Notion API returned a non-success status, the connection failed,
    /// or the response body did not decode.
    #[error("Notion API request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The rendering engine could not produce the document.
    #[error("failed to render PDF document: {0}")]
    Render(#[from] genpdf::error::Error),

    /// Composed rich-text markup did not parse at the rendering boundary.
    #[error("invalid rich text markup: {0}")]
    Markup(#[from] ParseError),

    /// The watermark overlay could not be applied to the rendered pages.
    #[error("failed to apply watermark overlay: {0}")]
    Watermark(#[from] WatermarkError),

    /// The finished document could not be written to the target path.
    #[error("failed to write output file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An unknown page-size selector was supplied.
    #[error("invalid page size '{0}', expected 'letter' or 'a4'")]
    InvalidPageSize(String),
}
