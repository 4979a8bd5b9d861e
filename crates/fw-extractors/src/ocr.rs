use std::io::Write;

use filewhisperer_types::{DataPayload, ExtractError, ExtractResult, Payload};
use rusty_tesseract::{Args, Image};
use tempfile::NamedTempFile;

use crate::{Extractor, ExtractInput};

/// Shells out to the system `tesseract` binary via `rusty-tesseract` and
/// emits any recognized text as a single `OCR` data node. A recoverable
/// error is reported when the image cannot be decoded or tesseract itself
/// is unavailable; recognizing no text at all is not an error.
pub struct OcrExtractor;

fn run_ocr(bytes: &[u8]) -> ExtractResult<String> {
    let mut temp =
        NamedTempFile::new().map_err(|e| ExtractError::recoverable(format!("ocr: {e}")))?;
    temp.write_all(bytes)
        .map_err(|e| ExtractError::recoverable(format!("ocr: {e}")))?;

    let image = Image::from_path(temp.path())
        .map_err(|e| ExtractError::recoverable(format!("ocr: unreadable image: {e}")))?;
    let args = Args::default();

    rusty_tesseract::image_to_string(&image, &args)
        .map_err(|e| ExtractError::recoverable(format!("ocr: tesseract failed: {e}")))
}

impl Extractor for OcrExtractor {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn extract(&self, input: &mut ExtractInput<'_>) -> ExtractResult<Vec<Payload>> {
        let Some(file) = input.file() else {
            return Ok(Vec::new());
        };
        let text = run_ocr(&file.content)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Payload::Data(DataPayload::text("OCR", text))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_report_recoverable_error() {
        let result = run_ocr(b"not an image");
        assert!(result.is_err_and(|e| !e.is_fatal()));
    }
}
