use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::ExportError;
use crate::processor::{FileResult, OcrEngine};

/// Page attributes a page may inherit from its `Pages` ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Renders every page's preview through the engine's searchable-PDF output
/// and joins the results, in page order, into one document.
pub fn render_searchable_pdf(
    engine: &dyn OcrEngine,
    static_dir: &Path,
    result: &FileResult,
    language: &str,
) -> Result<Vec<u8>, ExportError> {
    let _span = tracing::info_span!("export.pdf", pages = result.pages.len(), language).entered();

    if result.pages.is_empty() {
        return Err(ExportError::NoPages(result.filename.clone()));
    }

    let mut parts = Vec::with_capacity(result.pages.len());
    for page in &result.pages {
        let image_path = static_dir.join(&page.preview_image);
        if !image_path.is_file() {
            return Err(ExportError::ReadPreview {
                path: image_path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "preview image missing"),
            });
        }
        parts.push(engine.searchable_pdf(&image_path, language)?);
    }

    merge_pdfs(parts)
}

/// Concatenates PDF documents page-wise. A single document is returned as is.
pub fn merge_pdfs(parts: Vec<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    if parts.len() == 1 {
        return Ok(parts.into_iter().next().unwrap_or_default());
    }
    if parts.is_empty() {
        return Err(ExportError::PdfAssembly("No pages to assemble".to_string()));
    }

    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects = std::collections::BTreeMap::new();

    for (index, bytes) in parts.iter().enumerate() {
        let mut doc = Document::load_mem(bytes).map_err(|e| {
            ExportError::PdfAssembly(format!("Failed to parse page {}: {}", index + 1, e))
        })?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, page_id) in doc.get_pages() {
            let mut page = doc
                .get_dictionary(page_id)
                .map_err(|e| ExportError::PdfAssembly(format!("Invalid page object: {}", e)))?
                .clone();
            inherit_attributes(&doc, &mut page);
            pages.push((page_id, page));
        }
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog_id = None;
    let mut pages_id = None;

    for (object_id, object) in objects {
        match type_name(&object) {
            Some(b"Catalog") => {
                catalog_id.get_or_insert(object_id);
            }
            Some(b"Pages") => {
                pages_id.get_or_insert(object_id);
            }
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let catalog_id = catalog_id
        .ok_or_else(|| ExportError::PdfAssembly("Catalog root not found".to_string()))?;
    let pages_id =
        pages_id.ok_or_else(|| ExportError::PdfAssembly("Pages root not found".to_string()))?;

    let mut kids = Vec::with_capacity(pages.len());
    for (page_id, mut page) in pages {
        page.set("Parent", pages_id);
        merged.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", kids.len() as i64);
    pages_dict.set("Kids", kids);
    merged
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", pages_id);
    merged
        .objects
        .insert(catalog_id, Object::Dictionary(catalog));

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);
    merged.renumber_objects();

    let mut out = Vec::new();
    merged
        .save_to(&mut out)
        .map_err(|e| ExportError::PdfAssembly(format!("Failed to write merged PDF: {}", e)))?;
    Ok(out)
}

fn type_name(object: &Object) -> Option<&[u8]> {
    object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()
}

/// Copies inheritable attributes down from the page tree so the page keeps
/// them once re-parented.
fn inherit_attributes(doc: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();

        depth += 1;
        if depth > 32 {
            break;
        }
    }
}
