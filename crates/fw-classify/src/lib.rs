//! MIME content-sniffing, single-pass hashing, and text-encoding detection.

mod encoding;
mod hash;
mod mime;

pub use encoding::detect_encoding;
pub use hash::hash_bytes;
pub use mime::sniff_mime;

use filewhisperer_types::{classify_file, DataPayload, FilePayload, Flavor};

/// Classify and hash a file payload in place.
pub fn classify_and_hash(file: &mut FilePayload) {
    file.size = file.content.len() as u64;
    file.mime_type = sniff_mime(&file.content).to_owned();
    let hashes = hash_bytes(&file.content);
    file.md5 = hashes.md5;
    file.sha1 = hashes.sha1;
    file.sha256 = hashes.sha256;
}

pub fn file_flavor(file: &FilePayload) -> Flavor {
    classify_file(&file.mime_type, &file.extension)
}

pub fn data_flavor(data: &DataPayload) -> Flavor {
    Flavor::from_data_type(&data.kind)
}
