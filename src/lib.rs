//! Core entry point for the notion2pdf crate.
//!
//! The pipeline is a one-shot batch transform: fetch a page and its direct
//! child blocks from the Notion API, classify each block into abstract
//! renderable elements, assemble the full document sequence, render it with
//! `genpdf`, and stamp an optional watermark across every page.

pub mod builder;
pub mod elements;
pub mod error;
pub mod export;
pub mod fonts;
pub mod model;
pub mod notion;
pub mod richtext;
pub mod transform;
pub mod watermark;

pub use crate::error::ExportError;
pub use crate::export::{export_page, ExportRequest};
pub use crate::model::{ExportDocument, PageSize, ParagraphStyle, RenderElement};
