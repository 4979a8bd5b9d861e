use std::collections::HashSet;

use filewhisperer_types::{DataPayload, ExtractResult, Payload};
use regex::Regex;

use crate::{Extractor, ExtractInput};

/// Left-anchored `https?://` scan over the parent's best-effort UTF-8 text,
/// deduplicated in first-seen emission order.
pub struct UrlExtractor;

fn url_regex() -> Regex {
    Regex::new(r#"https?://[^\s"'<>{}，、]+"#).expect("static URL pattern is valid")
}

/// Find URLs in `text`, deduplicated, first occurrence order preserved.
pub fn find_urls(text: &str) -> Vec<String> {
    let re = url_regex();
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for m in re.find_iter(text) {
        let url = m.as_str().to_owned();
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
    urls
}

impl Extractor for UrlExtractor {
    fn name(&self) -> &'static str {
        "url"
    }

    fn extract(&self, input: &mut ExtractInput<'_>) -> ExtractResult<Vec<Payload>> {
        let bytes: &[u8] = match &input.payload {
            filewhisperer_types::Payload::File(f) => &f.content,
            filewhisperer_types::Payload::Data(d) => &d.content,
        };
        let text = String::from_utf8_lossy(bytes);

        Ok(find_urls(&text)
            .into_iter()
            .map(|url| Payload::Data(DataPayload::text("URL", url)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_preserving_first_seen_order() {
        let text = "visit https://a.test and http://b.test/x then https://a.test again";
        let urls = find_urls(text);
        assert_eq!(urls, vec!["https://a.test", "http://b.test/x"]);
    }

    #[test]
    fn stops_at_trailing_punctuation() {
        let text = "see <https://a.test/page> or 'https://b.test'";
        let urls = find_urls(text);
        assert_eq!(urls, vec!["https://a.test/page", "https://b.test"]);
    }
}
