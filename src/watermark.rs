//! Watermark overlay built on top of `lopdf`.
//!
//! The rendering engine has no hook for rotated, semi-transparent page
//! decoration, so the watermark is stamped onto the finished document: one
//! content stream per page that saves the graphics state, moves the text
//! origin to the page center rotated 45 degrees, draws the text in light
//! gray at partial opacity, and restores the state. Every physical page is
//! decorated identically, including the first and last.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use log::debug;
use thiserror::Error;

/// Font size of the watermark text, in points.
const WATERMARK_FONT_SIZE: f32 = 50.0;

/// Fill gray level of the watermark text.
const WATERMARK_GRAY: f32 = 0.9;

/// Fill opacity of the watermark text.
const WATERMARK_ALPHA: f32 = 0.3;

/// Counter-clockwise rotation of the watermark baseline, in degrees.
const WATERMARK_ANGLE_DEGREES: f32 = 45.0;

/// Average Helvetica glyph width as a fraction of the font size. The base-14
/// font carries no embedded metrics here, so centering uses this estimate.
const APPROX_GLYPH_WIDTH_EM: f32 = 0.5;

const FONT_RESOURCE: &str = "FWatermark";
const STATE_RESOURCE: &str = "GSWatermark";

/// Errors that can occur while stamping the watermark onto a rendered PDF.
#[derive(Debug, Error)]
pub enum WatermarkError {
    /// The rendered bytes could not be parsed or edited by `lopdf`.
    #[error("failed to process rendered PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Neither the page nor any ancestor node carries a media box.
    #[error("page {page} carries no media box")]
    MissingMediaBox { page: u32 },

    /// Serializing the stamped document back to bytes failed.
    #[error("failed to serialize watermarked PDF: {0}")]
    Io(#[from] std::io::Error),
}

/// Stamps `text` diagonally across every page of the rendered document.
///
/// An empty watermark is a no-op: the bytes are returned unchanged and no
/// drawing state is touched.
pub fn apply_watermark(pdf_bytes: &[u8], text: &str) -> Result<Vec<u8>, WatermarkError> {
    if text.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;

    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let state_id = document.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => WATERMARK_ALPHA,
        "CA" => WATERMARK_ALPHA,
    });

    let pages = document.get_pages();
    debug!("stamping watermark onto {} pages", pages.len());

    for (page_number, page_id) in pages {
        let (width, height) = media_box_size(&document, page_id, page_number)?;
        let content = Content {
            operations: watermark_operations(text, width, height),
        };
        let stream_id =
            document.add_object(Stream::new(Dictionary::new(), content.encode()?));

        append_content_stream(&mut document, page_id, stream_id)?;
        let slot = locate_resources(&mut document, page_id)?;
        set_resource_entry(&mut document, page_id, slot, b"Font", FONT_RESOURCE, font_id)?;
        set_resource_entry(
            &mut document,
            page_id,
            slot,
            b"ExtGState",
            STATE_RESOURCE,
            state_id,
        )?;
    }

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Builds the overlay drawing operations for one page of the given size.
fn watermark_operations(text: &str, width: f32, height: f32) -> Vec<Operation> {
    let radians = WATERMARK_ANGLE_DEGREES.to_radians();
    let (sin, cos) = radians.sin_cos();
    let half_width = approximate_text_width(text) / 2.0;

    vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![Object::Name(STATE_RESOURCE.into())]),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_RESOURCE.into()),
                WATERMARK_FONT_SIZE.into(),
            ],
        ),
        Operation::new(
            "rg",
            vec![
                WATERMARK_GRAY.into(),
                WATERMARK_GRAY.into(),
                WATERMARK_GRAY.into(),
            ],
        ),
        Operation::new(
            "Tm",
            vec![
                cos.into(),
                sin.into(),
                (-sin).into(),
                cos.into(),
                (width / 2.0).into(),
                (height / 2.0).into(),
            ],
        ),
        Operation::new("Td", vec![(-half_width).into(), 0.0_f32.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

fn approximate_text_width(text: &str) -> f32 {
    text.chars().count() as f32 * WATERMARK_FONT_SIZE * APPROX_GLYPH_WIDTH_EM
}

/// Resolves the page size, following the `Parent` chain for inherited boxes.
fn media_box_size(
    document: &Document,
    page_id: ObjectId,
    page_number: u32,
) -> Result<(f32, f32), WatermarkError> {
    let mut current = page_id;

    loop {
        let dict = document.get_object(current)?.as_dict()?;

        if let Ok(media_box) = dict.get(b"MediaBox") {
            let array = match media_box {
                Object::Reference(id) => document.get_object(*id)?.as_array()?,
                other => other.as_array()?,
            };
            return rectangle_size(array)
                .ok_or(WatermarkError::MissingMediaBox { page: page_number });
        }

        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => return Err(WatermarkError::MissingMediaBox { page: page_number }),
        }
    }
}

fn rectangle_size(rectangle: &[Object]) -> Option<(f32, f32)> {
    if rectangle.len() != 4 {
        return None;
    }
    let corners: Vec<f32> = rectangle.iter().filter_map(number).collect();
    if corners.len() != 4 {
        return None;
    }
    Some((corners[2] - corners[0], corners[3] - corners[1]))
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Appends the overlay stream after the page's existing content so it draws
/// on top.
fn append_content_stream(
    document: &mut Document,
    page_id: ObjectId,
    stream_id: ObjectId,
) -> Result<(), WatermarkError> {
    let current = {
        let page = document.get_object(page_id)?.as_dict()?;
        page.get(b"Contents").ok().cloned()
    };

    let combined = match current {
        Some(Object::Array(mut streams)) => {
            streams.push(Object::Reference(stream_id));
            Object::Array(streams)
        }
        Some(existing @ Object::Reference(_)) => {
            Object::Array(vec![existing, Object::Reference(stream_id)])
        }
        _ => Object::Reference(stream_id),
    };

    document
        .get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", combined);
    Ok(())
}

/// Where a page's resource dictionary lives.
#[derive(Clone, Copy)]
enum ResourcesSlot {
    /// Inline dictionary stored directly in the page dictionary.
    Inline,
    /// Indirect object shared through a reference.
    Indirect(ObjectId),
}

fn locate_resources(
    document: &mut Document,
    page_id: ObjectId,
) -> Result<ResourcesSlot, WatermarkError> {
    let slot = {
        let page = document.get_object(page_id)?.as_dict()?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(ResourcesSlot::Indirect(*id)),
            Ok(_) => Some(ResourcesSlot::Inline),
            Err(_) => None,
        }
    };

    match slot {
        Some(slot) => Ok(slot),
        None => {
            // A page-level Resources entry replaces an inherited one entirely,
            // so the new dictionary must start as a copy of whatever the page
            // inherits or its existing text loses its font lookups.
            let seeded = inherited_resources(document, page_id)?.unwrap_or_else(Dictionary::new);
            let page = document.get_object_mut(page_id)?.as_dict_mut()?;
            page.set("Resources", seeded);
            Ok(ResourcesSlot::Inline)
        }
    }
}

fn inherited_resources(
    document: &Document,
    page_id: ObjectId,
) -> Result<Option<Dictionary>, WatermarkError> {
    let mut current = page_id;

    loop {
        let dict = document.get_object(current)?.as_dict()?;

        if let Ok(resources) = dict.get(b"Resources") {
            let resolved = match resources {
                Object::Reference(id) => document.get_object(*id)?.as_dict()?,
                other => other.as_dict()?,
            };
            return Ok(Some(resolved.clone()));
        }

        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => return Ok(None),
        }
    }
}

fn resources_dict_mut<'a>(
    document: &'a mut Document,
    page_id: ObjectId,
    slot: ResourcesSlot,
) -> Result<&'a mut Dictionary, WatermarkError> {
    match slot {
        ResourcesSlot::Indirect(id) => Ok(document.get_object_mut(id)?.as_dict_mut()?),
        ResourcesSlot::Inline => {
            let page = document.get_object_mut(page_id)?.as_dict_mut()?;
            Ok(page.get_mut(b"Resources")?.as_dict_mut()?)
        }
    }
}

/// Registers `target` under `category`/`name` without disturbing entries the
/// rendered pages already rely on.
fn set_resource_entry(
    document: &mut Document,
    page_id: ObjectId,
    slot: ResourcesSlot,
    category: &[u8],
    name: &str,
    target: ObjectId,
) -> Result<(), WatermarkError> {
    let category_ref = {
        let resources = match slot {
            ResourcesSlot::Indirect(id) => document.get_object(id)?.as_dict()?,
            ResourcesSlot::Inline => document
                .get_object(page_id)?
                .as_dict()?
                .get(b"Resources")?
                .as_dict()?,
        };
        match resources.get(category) {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    if let Some(id) = category_ref {
        document
            .get_object_mut(id)?
            .as_dict_mut()?
            .set(name, Object::Reference(target));
        return Ok(());
    }

    let resources = resources_dict_mut(document, page_id, slot)?;
    let category_is_dict = matches!(resources.get(category), Ok(Object::Dictionary(_)));
    if category_is_dict {
        if let Ok(Object::Dictionary(existing)) = resources.get_mut(category) {
            existing.set(name, Object::Reference(target));
        }
    } else {
        let mut fresh = Dictionary::new();
        fresh.set(name, Object::Reference(target));
        resources.set(category, fresh);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_document(page_count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for index in 0..page_count {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("Page {index}"))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                content.encode().expect("content encodes"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("document saves");
        bytes
    }

    #[test]
    fn empty_watermark_leaves_bytes_untouched() {
        let original = minimal_document(1);
        let stamped = apply_watermark(&original, "").expect("no-op succeeds");
        assert_eq!(stamped, original);
    }

    #[test]
    fn operations_bracket_state_and_rotate_around_page_center() {
        let ops = watermark_operations("DRAFT", 612.0, 792.0);
        let names: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();

        assert_eq!(names.first(), Some(&"q"));
        assert_eq!(names.last(), Some(&"Q"));
        assert!(names.contains(&"Tj"));

        let tm = ops
            .iter()
            .find(|op| op.operator == "Tm")
            .expect("text matrix is set");
        assert_eq!(tm.operands.len(), 6);
        assert_eq!(tm.operands[4], Object::Real(306.0));
        assert_eq!(tm.operands[5], Object::Real(396.0));

        let tf = ops
            .iter()
            .find(|op| op.operator == "Tf")
            .expect("font is selected");
        assert_eq!(tf.operands[1], Object::Real(WATERMARK_FONT_SIZE));
    }

    #[test]
    fn every_page_gains_one_overlay_stream() {
        let original = minimal_document(3);
        let stamped = apply_watermark(&original, "DRAFT").expect("watermark applies");

        let doc = Document::load_mem(&stamped).expect("stamped PDF parses");
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);

        for (_, page_id) in pages {
            let page = doc
                .get_object(page_id)
                .and_then(Object::as_dict)
                .expect("page dictionary resolves");

            let contents = page
                .get(b"Contents")
                .and_then(Object::as_array)
                .expect("contents became an array");
            assert_eq!(contents.len(), 2);

            let resources = page
                .get(b"Resources")
                .and_then(Object::as_dict)
                .expect("page-level resources exist");
            let fonts = resources
                .get(b"Font")
                .and_then(Object::as_dict)
                .expect("font category exists");
            assert!(fonts.get(FONT_RESOURCE.as_bytes()).is_ok());
            assert!(
                fonts.get(b"F1").is_ok(),
                "inherited font entries must survive the overlay"
            );
            let states = resources
                .get(b"ExtGState")
                .and_then(Object::as_dict)
                .expect("graphics state category exists");
            assert!(states.get(STATE_RESOURCE.as_bytes()).is_ok());
        }
    }
}
