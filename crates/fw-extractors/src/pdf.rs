use filewhisperer_types::{DataPayload, ExtractError, ExtractResult, FilePayload, Payload};
use lopdf::{Document, Object};

use crate::{Extractor, ExtractInput};

/// Decrypts (trying no password first, then each candidate in order),
/// extracts text from up to `pdf_max_pages` pages, and pulls embedded
/// raster images out of each page's image XObjects.
pub struct PdfExtractor;

enum OpenOutcome {
    Opened(Document),
    WrongPassword,
    Other(String),
}

fn try_open(bytes: &[u8], password: Option<&str>) -> OpenOutcome {
    let mut doc = match Document::load_mem(bytes) {
        Ok(d) => d,
        Err(e) => return OpenOutcome::Other(e.to_string()),
    };

    if !doc.is_encrypted() {
        return OpenOutcome::Opened(doc);
    }

    let pw = password.unwrap_or("");
    match doc.decrypt(pw) {
        Ok(()) => OpenOutcome::Opened(doc),
        Err(_) => OpenOutcome::WrongPassword,
    }
}

fn extract_images_from_page(doc: &Document, page_id: (u32, u16)) -> Vec<Vec<u8>> {
    let mut images = Vec::new();
    let (dict_opt, _) = doc.get_page_resources(page_id);
    let Some(dict) = dict_opt else {
        return images;
    };
    let Ok(xobjects) = dict.get(b"XObject").and_then(Object::as_dict) else {
        return images;
    };
    for (_, value) in xobjects.iter() {
        let Ok(reference) = value.as_reference() else {
            continue;
        };
        let Ok(object) = doc.get_object(reference) else {
            continue;
        };
        let Ok(stream) = object.as_stream() else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|n| n == b"Image")
            .unwrap_or(false);
        if !is_image {
            continue;
        }
        if let Ok(content) = stream.get_plain_content() {
            images.push(content);
        } else {
            images.push(stream.content.clone());
        }
    }
    images
}

impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, input: &mut ExtractInput<'_>) -> ExtractResult<Vec<Payload>> {
        let Some(file) = input.file() else {
            return Ok(Vec::new());
        };
        let bytes = &file.content;

        let doc = match try_open(bytes, None) {
            OpenOutcome::Opened(doc) => {
                input.meta.booleans.insert("is_encrypted".to_owned(), false);
                doc
            }
            OpenOutcome::Other(msg) => return Err(ExtractError::fatal(msg)),
            OpenOutcome::WrongPassword => {
                input.meta.booleans.insert("is_encrypted".to_owned(), true);
                let mut result = None;
                for password in input.passwords {
                    match try_open(bytes, Some(password)) {
                        OpenOutcome::Opened(doc) => {
                            input
                                .meta
                                .strings
                                .insert("correct_password".to_owned(), password.clone());
                            result = Some(doc);
                            break;
                        }
                        OpenOutcome::WrongPassword => continue,
                        OpenOutcome::Other(msg) => return Err(ExtractError::fatal(msg)),
                    }
                }
                result.ok_or_else(|| {
                    ExtractError::fatal("pdf: no supplied password decrypted this document")
                })?
            }
        };

        let page_ids: Vec<(u32, u16)> = doc.page_iter().collect();
        let page_count = page_ids.len() as u32;
        input
            .meta
            .numbers
            .insert("page_count".to_owned(), i64::from(page_count));

        let pages_to_read = input.pdf_max_pages.min(page_count.max(1)).max(1);
        let mut nodes = Vec::new();
        let mut text = String::new();

        for (index, page_id) in page_ids.iter().enumerate().take(pages_to_read as usize) {
            let page_number = (index + 1) as u32;
            if let Ok(page_text) = doc.extract_text(&[page_number]) {
                text.push_str(&page_text);
                text.push('\n');
            }

            for (k, image) in extract_images_from_page(&doc, *page_id).into_iter().enumerate() {
                let name = format!("page_{page_number}_image_{k}.png");
                nodes.push(Payload::File(FilePayload::new(name, image)));
            }
        }

        nodes.push(Payload::Data(DataPayload::text("TEXT", text)));
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unencrypted_document_reports_is_encrypted_false() {
        // A minimal structurally-valid PDF is awkward to hand-build inline;
        // this only exercises the password-state bookkeeping helper.
        assert!(matches!(
            try_open(b"%PDF-1.4 not a real document", None),
            OpenOutcome::Other(_)
        ));
    }
}
