use serde::{Deserialize, Serialize};

/// A file's identifying metadata plus its bytes. Hashes and size are filled
/// in by `HashIdentity` during digest; they are `None` until then.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilePayload {
    pub path: String,
    pub name: String,
    pub extension: String,
    pub size: u64,
    pub mime_type: String,
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl FilePayload {
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_owned();
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        Self {
            path,
            name,
            extension,
            size: content.len() as u64,
            mime_type: String::new(),
            md5: String::new(),
            sha1: String::new(),
            sha256: String::new(),
            content,
        }
    }
}

/// A typed string/bytes fragment emitted by an extractor (URL, OCR text,
/// decoded barcode, ...). `type` is a symbolic tag, e.g. `TEXT`, `URL`,
/// `OCR`, `QRCODE`, `EMAIL_HEADER`, `EMAIL_TEXT`, `EMAIL_HTML`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Vec<u8>,
}

impl DataPayload {
    pub fn new(kind: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }

    pub fn text(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(kind, text.into().into_bytes())
    }
}

/// A node carries exactly one of these.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Payload {
    File(FilePayload),
    Data(DataPayload),
}

impl Payload {
    pub fn as_file(&self) -> Option<&FilePayload> {
        match self {
            Self::File(f) => Some(f),
            Self::Data(_) => None,
        }
    }

    pub fn as_data(&self) -> Option<&DataPayload> {
        match self {
            Self::Data(d) => Some(d),
            Self::File(_) => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FilePayload> {
        match self {
            Self::File(f) => Some(f),
            Self::Data(_) => None,
        }
    }
}
