//! Output document construction and page resource helpers

use crate::Result;
use crate::error::OverlayError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::HashSet;
use tracing::{debug, trace};

/// A freshly built single-page document
#[derive(Debug)]
pub struct OutputDocument {
    pub doc: Document,
    pub page_id: ObjectId,
    pub media_width: f32,
    pub media_height: f32,
}

/// Media box for a landscape page; the longer side becomes the width
pub fn landscape_media_box(width: f32, height: f32) -> (f32, f32) {
    if height > width {
        (height, width)
    } else {
        (width, height)
    }
}

/// Standard Helvetica font dictionary
pub fn helvetica_font() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Image XObject holding JPEG data
pub fn jpeg_image_stream(jpeg: Vec<u8>, width: u32, height: u32) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
}

/// Create a document with one empty landscape page sized for the template
pub fn new_landscape_document(page_width: f32, page_height: f32) -> OutputDocument {
    let (media_width, media_height) = landscape_media_box(page_width, page_height);
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), media_width.into(), media_height.into()],
        "Resources" => Dictionary::new(),
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    debug!(
        "Created {}x{} output page {:?}",
        media_width, media_height, page_id
    );

    OutputDocument {
        doc,
        page_id,
        media_width,
        media_height,
    }
}

/// Register `object_id` under `/Resources/<category>/<name>` of a page
///
/// Resources may be inline or referenced, at either level. A page without
/// its own resources dictionary gets a copy of the inherited one.
pub fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    object_id: ObjectId,
) -> Result<()> {
    if !doc.get_dictionary(page_id)?.has(b"Resources") {
        let inherited = inherited_resources(doc, page_id)?
            .cloned()
            .unwrap_or_else(Dictionary::new);
        doc.get_dictionary_mut(page_id)?.set("Resources", inherited);
    }

    let resources_ref = match doc.get_dictionary(page_id)?.get(b"Resources") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    if resources_ref.is_none() {
        let page = doc.get_dictionary_mut(page_id)?;
        if !matches!(page.get(b"Resources"), Ok(Object::Dictionary(_))) {
            page.set("Resources", Dictionary::new());
        }
    }

    let category_ref = {
        let resources = resources_mut(doc, page_id, resources_ref)?;
        match resources.get(category.as_bytes()) {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Dictionary(_)) => None,
            _ => {
                resources.set(category, Dictionary::new());
                None
            }
        }
    };

    let entries = match category_ref {
        Some(id) => doc.get_dictionary_mut(id)?,
        None => resources_mut(doc, page_id, resources_ref)?
            .get_mut(category.as_bytes())?
            .as_dict_mut()?,
    };
    entries.set(name, object_id);

    trace!("Registered /{}/{} on page {:?}", category, name, page_id);
    Ok(())
}

fn resources_mut(
    doc: &mut Document,
    page_id: ObjectId,
    resources_ref: Option<ObjectId>,
) -> Result<&mut Dictionary> {
    let resources = match resources_ref {
        Some(id) => doc.get_dictionary_mut(id)?,
        None => doc
            .get_dictionary_mut(page_id)?
            .get_mut(b"Resources")?
            .as_dict_mut()?,
    };
    Ok(resources)
}

/// First of `base`, `base_1`, `base_2`, ... not yet defined under
/// `/Resources/<category>` of a page, inherited resources included
pub fn unused_resource_name(
    doc: &Document,
    page_id: ObjectId,
    category: &str,
    base: &str,
) -> Result<String> {
    let taken = resource_names(doc, page_id, category)?;
    if !taken.contains(base.as_bytes()) {
        return Ok(base.to_string());
    }

    let mut n = 1;
    loop {
        let name = format!("{}_{}", base, n);
        if !taken.contains(name.as_bytes()) {
            debug!("/{}/{} is taken on page {:?}; using {}", category, base, page_id, name);
            return Ok(name);
        }
        n += 1;
    }
}

fn resource_names(doc: &Document, page_id: ObjectId, category: &str) -> Result<HashSet<Vec<u8>>> {
    let Some(resources) = inherited_resources(doc, page_id)? else {
        return Ok(HashSet::new());
    };
    let names = match resources.get(category.as_bytes()) {
        Ok(entries) => resolve(doc, entries)?
            .as_dict()?
            .iter()
            .map(|(name, _)| name.clone())
            .collect(),
        Err(_) => HashSet::new(),
    };
    Ok(names)
}

/// Resources dictionary in effect for a page, its own or a parent's
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Result<Option<&Dictionary>> {
    let mut current = Some(page_id);

    while let Some(id) = current {
        let node = doc.get_dictionary(id)?;
        if let Ok(resources) = node.get(b"Resources") {
            return Ok(Some(resolve(doc, resources)?.as_dict()?));
        }
        current = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(None)
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Media box of a page as `[left, bottom, right, top]`, following inherited values
pub fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4]> {
    let mut current = Some(page_id);

    while let Some(id) = current {
        let node = doc.get_dictionary(id)?;
        if let Ok(media_box) = node.get(b"MediaBox") {
            let values = resolve(doc, media_box)?
                .as_array()?
                .iter()
                .map(|v| v.as_float())
                .collect::<std::result::Result<Vec<f32>, _>>()?;
            if let [x0, y0, x1, y1] = values[..] {
                return Ok([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]);
            }
            return Err(OverlayError::DocumentDecode(format!(
                "page {:?} has a malformed MediaBox",
                page_id
            )));
        }
        current = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Err(OverlayError::DocumentDecode(format!(
        "page {:?} has no MediaBox",
        page_id
    )))
}

/// Media box of a page as `(width, height)`
pub fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f32, f32)> {
    let [left, bottom, right, top] = media_box(doc, page_id)?;
    Ok((right - left, top - bottom))
}
