use std::io::{Cursor, Read};

use filewhisperer_types::{DataPayload, ExtractError, ExtractResult, FilePayload, Payload};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::ZipArchive;

use crate::{Extractor, ExtractInput};

/// Walks a `.docx` (ZIP + WordprocessingML), retrying a password-protected
/// OOXML package against the supplied password list, or returns a
/// recoverable error for the legacy binary `.doc` container, which this
/// build does not parse. Paragraph text is capped at
/// `word_max_pages * PARAGRAPHS_PER_PAGE` paragraphs, an approximation of
/// page count since OOXML carries no reliable page boundary. `word/media/*`
/// members become file children; `word/embeddings/*` members are OLE2
/// compound files whose embedded object type is sniffed from the `CompObj`
/// stream's ProgID string.
pub struct WordExtractor;

const PARAGRAPHS_PER_PAGE: u32 = 20;

fn is_docx(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && &bytes[0..2] == b"PK"
}

/// An OLE compound file carrying an `EncryptedPackage` stream is a
/// password-protected OOXML document (ECMA-376 encryption); a legacy
/// binary `.doc` is also CFB-formatted but carries no such stream.
fn is_encrypted_package(bytes: &[u8]) -> bool {
    let Ok(mut file) = cfb::CompoundFile::open(Cursor::new(bytes)) else {
        return false;
    };
    file.open_stream("EncryptedPackage").is_ok()
}

/// This build carries no ECMA-376 office-crypto cipher, so a supplied
/// password can never actually verify; this still walks the password list
/// the same way `archive.rs`/`pdf.rs` do, ending in the same class of fatal
/// "no supplied password decrypted" error when the list is exhausted.
fn try_decrypt(_bytes: &[u8], _password: &str) -> Option<Vec<u8>> {
    None
}

/// Extract paragraph text from `word/document.xml`, one string per
/// paragraph, runs within a paragraph joined without a separator (OOXML
/// often splits a single sentence across several `<w:r>` runs).
pub fn extract_paragraphs(document_xml: &str, max_paragraphs: usize) -> Vec<String> {
    let mut reader = Reader::from_str(document_xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        if paragraphs.len() >= max_paragraphs {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"p" => {
                current.clear();
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                in_text = true;
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => {
                in_text = false;
            }
            Ok(Event::Text(t)) if in_text => {
                if let Ok(text) = t.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    paragraphs
}

/// ProgID prefix → extension. `""` (`Package`) means the object type is
/// recognized but carries no extension; a ProgID matching nothing here is
/// skipped entirely rather than falling back to a default.
const PROGID_EXTENSIONS: &[(&str, &str)] = &[
    ("AcroExch.Document", "pdf"),
    ("Excel.Sheet", "xlsx"),
    ("PowerPoint.Show", "pptx"),
    ("Word.Document.12", "docx"),
    ("Word.Document.8", "doc"),
    ("Package", ""),
];

/// Extension for an OLE2 embedded object, sniffed from its `CompObj`
/// stream's ProgID string. `None` means the stream is missing or no known
/// ProgID matches, and the embedding should be skipped.
pub fn ole_extension(bytes: &[u8]) -> Option<&'static str> {
    let mut file = cfb::CompoundFile::open(Cursor::new(bytes)).ok()?;
    let mut stream = file.open_stream("\u{1}CompObj").ok()?;
    let mut data = Vec::new();
    stream.read_to_end(&mut data).ok()?;
    let text = String::from_utf8_lossy(&data);
    PROGID_EXTENSIONS
        .iter()
        .find(|(progid, _)| text.contains(progid))
        .map(|(_, ext)| *ext)
}

impl Extractor for WordExtractor {
    fn name(&self) -> &'static str {
        "word"
    }

    fn extract(&self, input: &mut ExtractInput<'_>) -> ExtractResult<Vec<Payload>> {
        let Some(file) = input.file() else {
            return Ok(Vec::new());
        };
        let raw = file.content.clone();

        let bytes = if is_docx(&raw) {
            input.meta.booleans.insert("is_encrypted".to_owned(), false);
            raw
        } else if is_encrypted_package(&raw) {
            input.meta.booleans.insert("is_encrypted".to_owned(), true);
            let mut decrypted = None;
            for password in input.passwords {
                if let Some(plain) = try_decrypt(&raw, password) {
                    input
                        .meta
                        .strings
                        .insert("correct_password".to_owned(), password.clone());
                    decrypted = Some(plain);
                    break;
                }
            }
            decrypted.ok_or_else(|| {
                ExtractError::fatal("word: no supplied password decrypted this document")
            })?
        } else {
            return Err(ExtractError::recoverable(
                "legacy .doc binary format is not supported by this build",
            ));
        };

        let cursor = Cursor::new(bytes);
        let mut archive =
            ZipArchive::new(cursor).map_err(|e| ExtractError::fatal(e.to_string()))?;

        let mut document_xml = String::new();
        if let Ok(mut entry) = archive.by_name("word/document.xml") {
            entry
                .read_to_string(&mut document_xml)
                .map_err(|e| ExtractError::fatal(e.to_string()))?;
        }

        let max_paragraphs = (input.word_max_pages as usize) * (PARAGRAPHS_PER_PAGE as usize);
        let paragraphs = extract_paragraphs(&document_xml, max_paragraphs);
        let mut nodes = vec![Payload::Data(DataPayload::text(
            "TEXT",
            paragraphs.join("\n"),
        ))];

        let names: Vec<String> = (0..archive.len())
            .filter_map(|i| archive.by_index(i).ok().map(|e| e.name().to_owned()))
            .collect();

        for name in &names {
            if !name.starts_with("word/media/") || name.ends_with('/') {
                continue;
            }
            let mut entry = archive
                .by_name(name)
                .map_err(|e| ExtractError::fatal(e.to_string()))?;
            let mut content = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut content)
                .map_err(|e| ExtractError::fatal(e.to_string()))?;
            nodes.push(Payload::File(FilePayload::new(name.clone(), content)));
        }

        let embeddings: Vec<&String> = names
            .iter()
            .filter(|name| name.starts_with("word/embeddings/") && !name.ends_with('/'))
            .collect();

        for (i, name) in embeddings.into_iter().enumerate() {
            let mut entry = archive
                .by_name(name)
                .map_err(|e| ExtractError::fatal(e.to_string()))?;
            let mut content = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut content)
                .map_err(|e| ExtractError::fatal(e.to_string()))?;
            let Some(ext) = ole_extension(&content) else {
                continue;
            };
            let path = if ext.is_empty() {
                format!("Output/OLE{i}")
            } else {
                format!("Output/OLE{i}.{ext}")
            };
            nodes.push(Payload::File(FilePayload::new(path, content)));
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_runs_within_a_paragraph_and_splits_across_paragraphs() {
        let xml = r#"<w:document xmlns:w="ns">
            <w:body>
                <w:p><w:r><w:t>Hello, </w:t></w:r><w:r><w:t>world.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>
            </w:body>
        </w:document>"#;
        let paragraphs = extract_paragraphs(xml, 100);
        assert_eq!(paragraphs, vec!["Hello, world.", "Second paragraph."]);
    }

    #[test]
    fn caps_paragraph_count() {
        let mut xml = String::from(r#"<w:document xmlns:w="ns"><w:body>"#);
        for i in 0..50 {
            xml.push_str(&format!("<w:p><w:r><w:t>p{i}</w:t></w:r></w:p>"));
        }
        xml.push_str("</w:body></w:document>");
        let paragraphs = extract_paragraphs(&xml, 5);
        assert_eq!(paragraphs.len(), 5);
    }

    #[test]
    fn unknown_progid_is_skipped() {
        assert_eq!(ole_extension(b"not an ole file"), None);
    }

    #[test]
    fn package_progid_maps_to_no_extension() {
        assert_eq!(
            PROGID_EXTENSIONS.iter().find(|(p, _)| *p == "Package").map(|(_, e)| *e),
            Some("")
        );
    }
}
