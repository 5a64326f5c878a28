//! One-shot export pipeline: fetch, assemble, render, write.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use log::{debug, info};

use crate::builder;
use crate::error::ExportError;
use crate::model::{ExportDocument, PageSize};
use crate::notion::{self, NotionClient};
use crate::transform;

/// Everything one export invocation needs.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    /// Notion integration token used for API authentication.
    pub token: String,
    /// Identifier of the page to export.
    pub page_id: String,
    /// Path of the PDF file to write.
    pub output: PathBuf,
    /// Optional text stamped diagonally across every page.
    pub watermark: Option<String>,
    /// Physical page size of the generated document.
    pub page_size: PageSize,
    /// Accepted for interface compatibility; page numbers are not rendered.
    pub page_numbers: bool,
}

/// Runs a complete export and returns the output path on success.
///
/// Every stage failure propagates unchanged; nothing is retried and no
/// partially written output is cleaned up.
pub fn export_page(request: &ExportRequest) -> Result<PathBuf, ExportError> {
    let client = NotionClient::new(request.token.as_str());

    info!("exporting page {}", request.page_id);
    let meta = client.fetch_page(&request.page_id)?;
    let title = notion::page_title(&meta);
    let blocks = client.fetch_blocks(&request.page_id)?;
    debug!("page '{title}' has {} blocks", blocks.len());

    let elements = transform::assemble(&title, Local::now(), &blocks);
    let document = ExportDocument {
        title,
        elements,
        page_size: request.page_size,
        watermark: request.watermark.clone(),
    };

    let bytes = builder::render_document(&document)?;
    fs::write(&request.output, &bytes).map_err(|source| ExportError::Write {
        path: request.output.clone(),
        source,
    })?;
    info!("wrote {} bytes to {}", bytes.len(), request.output.display());

    Ok(request.output.clone())
}
