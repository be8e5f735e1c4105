//! Shared helpers for router tests.
//!
//! This module provides:
//! - `TestServer`: an `AppState` over a temp directory and in-memory
//!   database, wired to fake OCR engines
//! - multipart body and request builders
//! - small PNG/PDF fixtures

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use image::{GrayImage, ImageFormat, Luma};
use lopdf::{dictionary, Document, Object};
use tempfile::TempDir;
use tower::ServiceExt;

use ocrbatch::error::{ExportError, ProcessError};
use ocrbatch::processor::{OcrEngine, OcrOutput, PageRasterizer};
use ocrbatch::{Config, Database};
use ocrbatch_server::state::AppState;

/// Recognizes every page as `<width>x<height>`.
pub struct FakeEngine;

impl OcrEngine for FakeEngine {
    fn recognize(&self, image: &GrayImage, _language: &str) -> Result<OcrOutput, ProcessError> {
        Ok(OcrOutput {
            text: format!("{}x{}", image.width(), image.height()),
            words: Vec::new(),
        })
    }

    fn searchable_pdf(&self, image_path: &Path, _language: &str) -> Result<Vec<u8>, ExportError> {
        if !image_path.is_file() {
            return Err(ExportError::SearchablePdf("missing image".to_string()));
        }
        Ok(one_page_pdf())
    }
}

/// Counts pages with lopdf; every page renders as a 24x12 PNG.
pub struct FakeRasterizer;

impl PageRasterizer for FakeRasterizer {
    fn page_count(&self, pdf_path: &Path) -> Result<usize, ProcessError> {
        Document::load(pdf_path)
            .map(|doc| doc.get_pages().len())
            .map_err(|e| ProcessError::PdfProcessing(e.to_string()))
    }

    fn render_page(&self, _pdf_path: &Path, _page: u32, _dpi: u32) -> Result<Vec<u8>, ProcessError> {
        Ok(png_bytes(24, 12))
    }
}

pub struct TestServer {
    temp_dir: TempDir,
    pub state: AppState,
}

impl TestServer {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let mut config = Config::default();
        config.storage = config.storage.rebased(temp_dir.path());
        config.preprocess.patch_radius = 1;
        config.preprocess.search_radius = 1;

        let db = Database::open_in_memory().expect("Failed to open database");
        let state = AppState::new(config, db, Arc::new(FakeEngine), Arc::new(FakeRasterizer));

        Self { temp_dir, state }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        ocrbatch_server::app(self.state.clone())
            .oneshot(request)
            .await
            .expect("Router should not fail")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Uploads `files` with `language` and returns the response.
    pub async fn upload(&self, files: &[(&str, Vec<u8>)], language: Option<&str>) -> Response<Body> {
        let mut parts: Vec<Part> = files
            .iter()
            .map(|(name, bytes)| Part::file("files[]", name, bytes.clone()))
            .collect();
        if let Some(language) = language {
            parts.push(Part::text("language", language));
        }
        self.send(multipart_request("/upload", &parts)).await
    }

    /// Uploads `files` and returns the new job id from the cookie.
    pub async fn upload_job(&self, files: &[(&str, Vec<u8>)]) -> String {
        let response = self.upload(files, Some("eng")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        job_id_from(&response).expect("Upload should set the job cookie")
    }
}

pub struct Part {
    name: String,
    filename: Option<String>,
    bytes: Vec<u8>,
}

impl Part {
    pub fn file(name: &str, filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            filename: Some(filename.to_string()),
            bytes,
        }
    }

    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            filename: None,
            bytes: value.as_bytes().to_vec(),
        }
    }
}

const BOUNDARY: &str = "ocrbatch-test-boundary";

pub fn multipart_request(uri: &str, parts: &[Part]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match &part.filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        part.name, filename
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// The `job_id` value from a `Set-Cookie` header.
pub fn job_id_from(response: &Response<Body>) -> Option<String> {
    let cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let (pair, _) = cookie.split_once(';')?;
    pair.strip_prefix("job_id=").map(str::to_string)
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("Body is not UTF-8")
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, _| {
        if x % 4 == 0 {
            Luma([20])
        } else {
            Luma([230])
        }
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes
}

pub fn pdf_bytes(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save PDF");
    bytes
}

fn one_page_pdf() -> Vec<u8> {
    pdf_bytes(1)
}
