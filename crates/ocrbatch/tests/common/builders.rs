//! Fixture builders.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::{dictionary, Document, Object, Stream};

/// A light page with a dark bar across the middle.
pub fn page_image(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([235, 235, 235]));
    let (top, bottom) = (height / 3, (2 * height / 3).max(height / 3 + 1));
    for y in top..bottom.min(height) {
        for x in width / 8..(7 * width / 8).max(width / 8 + 1).min(width) {
            img.put_pixel(x, y, Rgb([25, 25, 25]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&page_image(width, height), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&page_image(width, height), ImageFormat::Jpeg)
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode fixture image");
    bytes
}

/// A PDF with `pages` pages, each carrying the text `Page <n>`.
pub fn pdf_bytes(pages: usize) -> Vec<u8> {
    let labels: Vec<String> = (1..=pages).map(|n| format!("Page {}", n)).collect();
    pdf_with_labels(&labels)
}

/// A PDF with one page per label.
pub fn pdf_with_labels(labels: &[String]) -> Vec<u8> {
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

    let mut kids = Vec::new();
    for label in labels {
        let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", label);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => labels.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save fixture PDF");
    bytes
}
