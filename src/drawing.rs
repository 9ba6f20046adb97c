//! PDF drawing operations for the overlay

use crate::Result;
use crate::font::FontMetrics;
use crate::layout::PlacedLine;
use crate::style::Color;
use lopdf::{
    Dictionary, Document, Object, ObjectId, Stream,
    content::{Content, Operation},
};
use tracing::{debug, trace};

/// Convert a top-left based y coordinate into PDF user space
pub fn to_pdf_y(top: f32, y: f32) -> f32 {
    top - y
}

/// Draw an image XObject as the page background
///
/// The image covers `(0, 0)` to `(width, height)` measured from the top-left
/// corner of a page that is `media_height` tall.
pub fn background_operations(
    image_name: &str,
    width: f32,
    height: f32,
    media_height: f32,
) -> Vec<Operation> {
    let bottom = to_pdf_y(media_height, height);
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                width.into(),
                0.into(),
                0.into(),
                height.into(),
                0.into(),
                bottom.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(image_name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Generate text operations for placed lines
///
/// `origin` is the top-left corner of the media box in PDF user space. Each
/// line gets its own text object so that lines of different sizes and
/// alignments do not depend on each other.
pub fn text_operations(
    lines: &[PlacedLine],
    font_name: &str,
    color: Color,
    metrics: &dyn FontMetrics,
    origin: (f32, f32),
) -> Vec<Operation> {
    let (left, top) = origin;
    let mut operations = Vec::with_capacity(lines.len() * 6);

    for line in lines {
        let x = left + line.left_edge(metrics);
        let y = to_pdf_y(top, line.y);
        trace!("Line {:?} of '{}' at ({}, {})", line.text, line.field_id, x, y);

        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(font_name.as_bytes().to_vec()),
                line.font_size.into(),
            ],
        ));
        operations.push(Operation::new(
            "rg",
            vec![color.r.into(), color.g.into(), color.b.into()],
        ));
        operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(metrics.encode_text(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    operations
}

/// Enclose a page's existing content streams in `q` ... `Q`
///
/// Graphics state left behind by the existing content then cannot leak into
/// streams appended afterwards. Pages without content are left alone.
pub fn isolate_page_contents(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut streams = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => return Ok(()),
    };
    if streams.is_empty() {
        return Ok(());
    }

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    streams.insert(0, save_id.into());
    streams.push(restore_id.into());

    trace!("Isolated {} content streams on page {:?}", streams.len() - 2, page_id);
    doc.get_dictionary_mut(page_id)?.set("Contents", streams);
    Ok(())
}

/// Append operations to a page as a new content stream
pub fn add_operations_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<()> {
    debug!(
        "Adding {} operations to page {:?}",
        operations.len(),
        page_id
    );

    let content = Content { operations };
    let content_bytes = content.encode()?;
    doc.add_page_contents(page_id, content_bytes)?;

    Ok(())
}
