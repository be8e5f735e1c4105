use std::path::Path;

use crate::error::ProcessError;
use crate::processor::preview::PreviewDir;
use crate::processor::result::PageResult;
use crate::processor::FileProcessor;

impl FileProcessor {
    /// Image branch: one page, previewed with the untouched original bytes.
    pub(crate) fn process_image(
        &self,
        path: &Path,
        filename: &str,
        previews: &PreviewDir,
        language: &str,
    ) -> Result<Vec<PageResult>, ProcessError> {
        let _span = tracing::info_span!("processor.image").entered();

        let image_data = std::fs::read(path).map_err(|e| ProcessError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let decoded = self.decode_page(&image_data, filename)?;

        let output = self.recognize_page(&decoded, language)?;

        let preview_image = previews.write(&format!("preview_{}", filename), &image_data)?;

        Ok(vec![PageResult {
            page_num: 1,
            text: output.text,
            ocr_data: output.words,
            preview_image,
        }])
    }
}
