use serde::{Deserialize, Serialize};

/// The closed set of dissection categories. Classification never fails: an
/// unrecognized input simply becomes [`Flavor::Other`] and is left as a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavor {
    TextPlain,
    TextHtml,
    Image,
    CompressedFile,
    Doc,
    Docx,
    Pdf,
    Email,
    Other,
}

impl Flavor {
    /// Extension-to-flavor lookup. Extension wins over MIME when both match.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Self::TextHtml,
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" => Self::CompressedFile,
            "doc" => Self::Doc,
            "docx" => Self::Docx,
            "pdf" => Self::Pdf,
            "eml" => Self::Email,
            _ => return None,
        })
    }

    /// MIME-to-flavor lookup, consulted when the extension table misses.
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "text/plain" => Self::TextPlain,
            "text/html" => Self::TextHtml,
            m if m.starts_with("image/") => Self::Image,
            "application/zip"
            | "application/x-rar-compressed"
            | "application/vnd.rar"
            | "application/x-7z-compressed"
            | "application/x-tar"
            | "application/gzip"
            | "application/x-gzip"
            | "application/x-bzip2"
            | "application/x-xz" => Self::CompressedFile,
            "application/pdf" => Self::Pdf,
            "message/rfc822" => Self::Email,
            _ => Self::Other,
        }
    }

    /// Flavor lookup for a [`DataPayload`](crate::DataPayload)'s symbolic
    /// type tag.
    pub fn from_data_type(type_tag: &str) -> Self {
        match type_tag {
            "TEXT" | "OCR" | "QRCODE" => Self::TextPlain,
            _ => Self::Other,
        }
    }

    /// Whether siblings of this flavor are eligible for sibling batching.
    pub fn batch_eligible(self) -> bool {
        matches!(self, Self::Image | Self::Doc | Self::Docx | Self::Pdf)
    }
}

/// Resolve a file's flavor from sniffed MIME and filename extension,
/// extension taking precedence.
pub fn classify_file(mime: &str, extension: &str) -> Flavor {
    Flavor::from_extension(extension).unwrap_or_else(|| Flavor::from_mime(mime))
}
