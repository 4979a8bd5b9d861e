use chardetng::EncodingDetector;

pub struct EncodingOutcome {
    pub encoding: String,
    pub confidence: i64,
    pub detect_msg: Option<String>,
}

/// Text-encoding detection for `DataPayload`s, intentionally skipped for
/// `FilePayload`s. Empty input records `encoding = NONE` plus a reason.
pub fn detect_encoding(content: &[u8]) -> EncodingOutcome {
    if content.is_empty() {
        return EncodingOutcome {
            encoding: "NONE".to_owned(),
            confidence: 0,
            detect_msg: Some("empty content".to_owned()),
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(content, true);
    let (encoding, confident) = detector.guess_assess(None, true);

    EncodingOutcome {
        encoding: encoding.name().to_owned(),
        confidence: if confident { 100 } else { 50 },
        detect_msg: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_reports_none() {
        let outcome = detect_encoding(b"");
        assert_eq!(outcome.encoding, "NONE");
        assert_eq!(outcome.confidence, 0);
        assert!(outcome.detect_msg.is_some());
    }

    #[test]
    fn ascii_content_detects_a_confident_encoding() {
        let outcome = detect_encoding(b"hello world, this is plain ascii text");
        assert!(!outcome.encoding.is_empty());
    }
}
