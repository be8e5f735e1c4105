use serde::{Deserialize, Serialize};

/// One row of the engine's word-level output (Tesseract TSV layout).
///
/// Rows at levels 1-4 describe page/block/paragraph/line boxes and carry
/// empty text and a confidence of -1; level 5 rows are words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub level: u32,
    pub page_num: u32,
    pub block_num: u32,
    pub par_num: u32,
    pub line_num: u32,
    pub word_num: u32,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub conf: f32,
    pub text: String,
}

/// OCR outcome for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based, contiguous within a file.
    pub page_num: u32,
    pub text: String,
    pub ocr_data: Vec<OcrWord>,
    /// Path relative to the static directory.
    pub preview_image: String,
}

/// OCR outcome for one uploaded file. One element of a job's `results.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    /// Sanitized on-disk name.
    pub filename: String,
    /// Name shown to the user and used to name downloads.
    pub original_filename: String,
    /// Language the pages were recognized with. Absent in older documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub page_count: usize,
    pub pages: Vec<PageResult>,
}

impl FileResult {
    /// Builds a result whose `page_count` always matches `pages`.
    pub fn new(filename: impl Into<String>, language: impl Into<String>, pages: Vec<PageResult>) -> Self {
        let filename = filename.into();
        Self {
            original_filename: filename.clone(),
            filename,
            language: Some(language.into()),
            page_count: pages.len(),
            pages,
        }
    }

    pub fn with_original_filename(mut self, original_filename: impl Into<String>) -> Self {
        self.original_filename = original_filename.into();
        self
    }

    /// Page texts joined by a blank line, in page order.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
