//! Notion API collaborator: wire-format data model and a synchronous client.
//!
//! The client consumes two endpoints, page metadata and child-block listing,
//! and hides the cursor pagination of the latter behind a single call. Only
//! the direct children of a page are fetched; nested block trees are out of
//! scope. Any non-success response fails the whole export.

use std::collections::HashMap;

use log::debug;
use serde::Deserialize;

use crate::error::ExportError;

/// API revision sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";

/// Maximum number of blocks per listing round trip.
const LIST_PAGE_SIZE: u32 = 100;

/// Title shown when the page metadata carries no resolvable title.
pub const UNTITLED: &str = "Untitled";

/// Inline annotation flags of a rich-text span. Unknown wire flags are ignored.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub code: bool,
}

/// A contiguous run of text sharing one annotation set.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct TextSpan {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub annotations: Annotations,
}

/// Payload shared by all text-bearing block types.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct RichTextPayload {
    #[serde(default)]
    pub rich_text: Vec<TextSpan>,
}

/// One content block of a page body, dispatched on the wire-level `type` tag.
///
/// Block types outside the six handled variants deserialize into
/// [`ContentBlock::Unsupported`] and are silently dropped by the transformer.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "paragraph")]
    Paragraph { paragraph: RichTextPayload },
    #[serde(rename = "heading_1")]
    Heading1 { heading_1: RichTextPayload },
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: RichTextPayload },
    #[serde(rename = "heading_3")]
    Heading3 { heading_3: RichTextPayload },
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem { bulleted_list_item: RichTextPayload },
    #[serde(rename = "toggle")]
    Toggle { toggle: RichTextPayload },
    #[serde(other)]
    Unsupported,
}

/// A page property as far as title extraction is concerned.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageProperty {
    #[serde(default)]
    pub title: Vec<TextSpan>,
}

/// Raw page metadata returned by the pages endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub properties: HashMap<String, PageProperty>,
}

/// One page of the block listing, following the cursor continuation protocol.
#[derive(Debug, Deserialize)]
struct BlockList {
    #[serde(default)]
    results: Vec<ContentBlock>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Extracts the page title from raw metadata.
///
/// Looks for a title-bearing property under the key `"title"`, then `"Name"`,
/// takes the first rich-text span's plain text, and falls back to
/// [`UNTITLED`] if any step comes up empty.
pub fn page_title(meta: &PageMeta) -> String {
    meta.properties
        .get("title")
        .or_else(|| meta.properties.get("Name"))
        .and_then(|property| property.title.first())
        .map(|span| span.plain_text.clone())
        .unwrap_or_else(|| UNTITLED.to_owned())
}

/// Blocking HTTP client for the two consumed Notion endpoints.
pub struct NotionClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl NotionClient {
    /// Creates a client against the public Notion API.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Creates a client against an alternate base URL, e.g. a local stub.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn get(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        self.http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", NOTION_VERSION)
            .header("Content-Type", "application/json")
    }

    /// Fetches the metadata record of a single page.
    pub fn fetch_page(&self, page_id: &str) -> Result<PageMeta, ExportError> {
        let url = format!("{}/pages/{}", self.base_url, page_id);
        debug!("fetching page metadata from {url}");
        let response = self.get(&url).send()?.error_for_status()?;
        Ok(response.json()?)
    }

    /// Fetches the full ordered sequence of direct child blocks of `parent_id`,
    /// following `has_more`/`next_cursor` until the listing is exhausted.
    pub fn fetch_blocks(&self, parent_id: &str) -> Result<Vec<ContentBlock>, ExportError> {
        let url = format!("{}/blocks/{}/children", self.base_url, parent_id);
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .get(&url)
                .query(&[("page_size", LIST_PAGE_SIZE.to_string())]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("start_cursor", cursor.as_str())]);
            }

            let listing: BlockList = request.send()?.error_for_status()?.json()?;
            debug!(
                "fetched {} blocks (has_more: {})",
                listing.results.len(),
                listing.has_more
            );
            blocks.extend(listing.results);

            if !listing.has_more {
                break;
            }
            match listing.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(blocks)
    }
}
