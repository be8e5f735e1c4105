//! Minimal WordprocessingML package writer.
//!
//! The package holds a `Title` style, a title paragraph and a single body
//! paragraph. Newlines in the body become `<w:br/>` line breaks inside that
//! paragraph.

use std::fmt::Display;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:rPr><w:sz w:val="22"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="300"/></w:pPr><w:rPr><w:sz w:val="56"/></w:rPr></w:style></w:styles>"#;

/// Builds a `.docx` package with `title` as a Title paragraph followed by
/// `body`.
pub fn render_docx(title: &str, body: &str) -> Result<Vec<u8>, ExportError> {
    let document_xml = document_xml(title, body)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &[u8]); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
        ("word/styles.xml", STYLES_XML.as_bytes()),
        ("word/document.xml", &document_xml),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)
            .map_err(|e| docx_err(format!("Failed to add {}", name), e))?;
        zip.write_all(content)
            .map_err(|e| docx_err(format!("Failed to write {}", name), e))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| docx_err("Failed to finish package", e))?;
    Ok(cursor.into_inner())
}

fn document_xml(title: &str, body: &str) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )?;

    let mut document = BytesStart::new("w:document");
    document.push_attribute(("xmlns:w", WORDML_NS));
    write(&mut writer, Event::Start(document))?;
    write(&mut writer, Event::Start(BytesStart::new("w:body")))?;

    // Title paragraph
    write(&mut writer, Event::Start(BytesStart::new("w:p")))?;
    write(&mut writer, Event::Start(BytesStart::new("w:pPr")))?;
    let mut style = BytesStart::new("w:pStyle");
    style.push_attribute(("w:val", "Title"));
    write(&mut writer, Event::Empty(style))?;
    write(&mut writer, Event::End(BytesEnd::new("w:pPr")))?;
    write_run(&mut writer, title)?;
    write(&mut writer, Event::End(BytesEnd::new("w:p")))?;

    // Body paragraph
    write(&mut writer, Event::Start(BytesStart::new("w:p")))?;
    write_run(&mut writer, body)?;
    write(&mut writer, Event::End(BytesEnd::new("w:p")))?;

    write(&mut writer, Event::End(BytesEnd::new("w:body")))?;
    write(&mut writer, Event::End(BytesEnd::new("w:document")))?;

    Ok(writer.into_inner().into_inner())
}

/// One run; each line is a `<w:t>`, separated by `<w:br/>`.
fn write_run<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<(), ExportError> {
    write(writer, Event::Start(BytesStart::new("w:r")))?;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            write(writer, Event::Empty(BytesStart::new("w:br")))?;
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        let mut t = BytesStart::new("w:t");
        t.push_attribute(("xml:space", "preserve"));
        write(writer, Event::Start(t))?;
        write(writer, Event::Text(BytesText::new(line)))?;
        write(writer, Event::End(BytesEnd::new("w:t")))?;
    }

    write(writer, Event::End(BytesEnd::new("w:r")))
}

fn write<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), ExportError> {
    writer
        .write_event(event)
        .map_err(|e| docx_err("Failed to write document.xml", e))
}

fn docx_err(context: impl Display, e: impl Display) -> ExportError {
    ExportError::Docx(format!("{}: {}", context, e))
}
