/// Content-sniff a MIME type from raw bytes. Classification never fails:
/// unrecognized bytes fall back to a generic octet stream, which in turn
/// classifies to `Flavor::Other`.
pub fn sniff_mime(content: &[u8]) -> &'static str {
    infer::get(content)
        .map(|kind| kind.mime_type())
        .unwrap_or_else(|| {
            if !content.is_empty() && std::str::from_utf8(content).is_ok() {
                "text/plain"
            } else {
                "application/octet-stream"
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_is_octet_stream() {
        assert_eq!(sniff_mime(b""), "application/octet-stream");
    }

    #[test]
    fn zip_signature_is_detected() {
        let mut bytes = vec![0x50, 0x4B, 0x03, 0x04];
        bytes.extend(std::iter::repeat(0u8).take(32));
        assert_eq!(sniff_mime(&bytes), "application/zip");
    }

    #[test]
    fn plain_ascii_text_is_text_plain() {
        assert_eq!(sniff_mime(b"hello world"), "text/plain");
    }
}
