use std::io::{Cursor, Read};

use filewhisperer_types::{ExtractError, ExtractResult, FilePayload, Payload};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::{Analyzer, Extractor, ExtractInput};

/// Decrypts/decompresses a compressed-file node's bytes, trying no password
/// first, then each candidate in order. On success every member becomes a
/// `FilePayload` child in archive listing order. Built on the pure-Rust
/// `zip` crate, whose `ZipArchive::by_index_decrypt` supports password
/// iteration directly. Other compressed formats (tar, tar.gz, rar, 7z,
/// bzip2, xz) are classified correctly but report a recoverable
/// "unsupported archive format" error instead of extracting.
pub struct ArchiveExtractor;

enum OpenOutcome {
    Opened(ZipArchive<Cursor<Vec<u8>>>),
    WrongPassword,
    Other(String),
}

fn try_open(bytes: &[u8], password: Option<&str>) -> OpenOutcome {
    let cursor = Cursor::new(bytes.to_vec());
    let mut archive = match ZipArchive::new(cursor) {
        Ok(a) => a,
        Err(e) => return OpenOutcome::Other(e.to_string()),
    };

    // Probe the first entry to see whether the supplied password (or lack
    // of one) actually unlocks the archive; zip entries are encrypted
    // independently, so this is the cheapest representative check.
    if archive.len() == 0 {
        return OpenOutcome::Opened(archive);
    }

    let probe = match password {
        Some(pw) => archive.by_index_decrypt(0, pw.as_bytes()),
        None => archive.by_index(0).map_err(ZipError::from).map(Ok).and_then(|r| r),
    };

    match probe {
        Ok(Ok(_)) | Ok(Err(_)) => OpenOutcome::Opened(archive),
        Err(ZipError::UnsupportedArchive(msg)) if msg.contains("Password") => {
            OpenOutcome::WrongPassword
        }
        Err(ZipError::InvalidPassword) => OpenOutcome::WrongPassword,
        Err(e) => OpenOutcome::Other(e.to_string()),
    }
}

fn read_all_members(archive: &mut ZipArchive<Cursor<Vec<u8>>>, password: Option<&str>) -> ExtractResult<Vec<(String, Vec<u8>)>> {
    let mut members = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = match password {
            Some(pw) => archive
                .by_index_decrypt(i, pw.as_bytes())
                .map_err(|e| ExtractError::fatal(e.to_string()))?
                .map_err(|_| ExtractError::fatal("Wrong password".to_owned()))?,
            None => archive
                .by_index(i)
                .map_err(|e| ExtractError::fatal(e.to_string()))?,
        };
        if entry.is_dir() {
            continue;
        }
        let mut content = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut content)
            .map_err(|e| ExtractError::fatal(e.to_string()))?;
        members.push((entry.name().to_owned(), content));
    }
    Ok(members)
}

impl Extractor for ArchiveExtractor {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn extract(&self, input: &mut ExtractInput<'_>) -> ExtractResult<Vec<Payload>> {
        let Some(file) = input.file() else {
            return Ok(Vec::new());
        };
        let bytes = &file.content;

        if !is_zip(bytes) {
            return Err(ExtractError::recoverable(
                "unsupported archive format (only zip is supported by this build)",
            ));
        }

        let members = match try_open(bytes, None) {
            OpenOutcome::Opened(mut archive) => read_all_members(&mut archive, None)?,
            OpenOutcome::Other(msg) => return Err(ExtractError::fatal(msg)),
            OpenOutcome::WrongPassword => {
                let mut result = None;
                for password in input.passwords {
                    match try_open(bytes, Some(password)) {
                        OpenOutcome::Opened(mut archive) => {
                            let members = read_all_members(&mut archive, Some(password))?;
                            input
                                .meta
                                .strings
                                .insert("correct_password".to_owned(), password.clone());
                            result = Some(members);
                            break;
                        }
                        OpenOutcome::WrongPassword => continue,
                        OpenOutcome::Other(msg) => return Err(ExtractError::fatal(msg)),
                    }
                }
                result.ok_or_else(|| {
                    ExtractError::fatal("archive: no supplied password decrypted this archive")
                })?
            }
        };

        Ok(members
            .into_iter()
            .map(|(name, content)| Payload::File(FilePayload::new(name, content)))
            .collect())
    }
}

fn is_zip(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..2] == b"PK"
}

/// Publishes only the archive metadata fields the codec can determine
/// without error, leaving the rest absent rather than guessed.
pub struct ArchiveAnalyzer;

impl Analyzer for ArchiveAnalyzer {
    fn name(&self) -> &'static str {
        "archive_analyzer"
    }

    fn analyze(&self, input: &mut ExtractInput<'_>) -> ExtractResult<()> {
        let Some(file) = input.file() else {
            return Ok(());
        };
        if !is_zip(&file.content) {
            return Err(ExtractError::recoverable("not a zip archive"));
        }

        let cursor = Cursor::new(file.content.clone());
        let archive = ZipArchive::new(cursor).map_err(|e| ExtractError::recoverable(e.to_string()))?;

        let mut files_count = 0i64;
        let mut folders_count = 0i64;
        let mut size = 0i64;
        let mut pack_size = 0i64;
        let mut is_encrypted = false;

        for i in 0..archive.len() {
            let Some(entry) = archive.clone_entry(i) else {
                continue;
            };
            if entry.is_dir() {
                folders_count += 1;
            } else {
                files_count += 1;
            }
            size += entry.size() as i64;
            pack_size += entry.compressed_size() as i64;
            is_encrypted |= entry.encrypted();
        }

        input.meta.numbers.insert("items_count".to_owned(), archive.len() as i64);
        input.meta.numbers.insert("files_count".to_owned(), files_count);
        input.meta.numbers.insert("folders_count".to_owned(), folders_count);
        input.meta.numbers.insert("size".to_owned(), size);
        input.meta.numbers.insert("pack_size".to_owned(), pack_size);
        input.meta.numbers.insert("volumes_count".to_owned(), 1);
        input.meta.booleans.insert("is_multi_volume".to_owned(), false);
        input.meta.booleans.insert("is_encrypted".to_owned(), is_encrypted);

        Ok(())
    }
}

trait ClonedEntry {
    fn clone_entry(&self, index: usize) -> Option<ZipEntryMeta>;
}

struct ZipEntryMeta {
    is_dir_flag: bool,
    size: u64,
    compressed_size: u64,
    encrypted_flag: bool,
}

impl ZipEntryMeta {
    fn is_dir(&self) -> bool {
        self.is_dir_flag
    }
    fn size(&self) -> u64 {
        self.size
    }
    fn compressed_size(&self) -> u64 {
        self.compressed_size
    }
    fn encrypted(&self) -> bool {
        self.encrypted_flag
    }
}

impl ClonedEntry for ZipArchive<Cursor<Vec<u8>>> {
    fn clone_entry(&self, index: usize) -> Option<ZipEntryMeta> {
        let entry = self.clone().by_index_raw(index).ok()?;
        Some(ZipEntryMeta {
            is_dir_flag: entry.is_dir(),
            size: entry.size(),
            compressed_size: entry.compressed_size(),
            encrypted_flag: entry.encrypted(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_zip(entries: &[(&str, &[u8])], password: Option<&str>) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            for (name, content) in entries {
                let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
                let options = if let Some(pw) = password {
                    options.with_deprecated_encryption(pw.as_bytes())
                } else {
                    options
                };
                writer.start_file(*name, options).unwrap();
                writer.write_all(content).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn extracts_unencrypted_members_in_order() {
        let bytes = build_zip(&[("a.txt", b"hello"), ("b.txt", b"world")], None);
        let mut meta = filewhisperer_types::MetaMap::new();
        let payload = Payload::File(FilePayload::new("archive.zip", bytes));
        let mut input = ExtractInput {
            payload: &payload,
            passwords: &[],
            pdf_max_pages: 10,
            word_max_pages: 10,
            meta: &mut meta,
        };
        let children = ArchiveExtractor.extract(&mut input).unwrap();
        assert_eq!(children.len(), 2);
        let names: Vec<_> = children
            .iter()
            .map(|c| c.as_file().unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn wrong_only_password_is_fatal() {
        let bytes = build_zip(&[("a.txt", b"hello")], Some("abcd"));
        let mut meta = filewhisperer_types::MetaMap::new();
        let passwords = vec!["wrong".to_owned()];
        let payload = Payload::File(FilePayload::new("archive.zip", bytes));
        let mut input = ExtractInput {
            payload: &payload,
            passwords: &passwords,
            pdf_max_pages: 10,
            word_max_pages: 10,
            meta: &mut meta,
        };
        let result = ArchiveExtractor.extract(&mut input);
        assert!(result.is_err_and(|e| e.is_fatal()));
    }

    #[test]
    fn correct_password_not_in_first_position_succeeds() {
        let bytes = build_zip(&[("a.txt", b"hello")], Some("abcd"));
        let mut meta = filewhisperer_types::MetaMap::new();
        let passwords = vec!["wrong".to_owned(), "abcd".to_owned()];
        let payload = Payload::File(FilePayload::new("archive.zip", bytes));
        let mut input = ExtractInput {
            payload: &payload,
            passwords: &passwords,
            pdf_max_pages: 10,
            word_max_pages: 10,
            meta: &mut meta,
        };
        let children = ArchiveExtractor.extract(&mut input).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(meta.strings.get("correct_password").unwrap(), "abcd");
    }
}
