use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use filewhisperer_types::{DataPayload, ExtractResult, FilePayload, Payload};
use regex::Regex;
use scraper::{Html, Selector};

use crate::{Extractor, ExtractInput};

/// Visible text, every URL reachable from the tag/attribute/CSS surface
/// below, and inline base64 images. Built on `scraper`'s CSS selector API.
pub struct HtmlExtractor;

const TAG_ATTRS: &[(&str, &[&str])] = &[
    ("a", &["href"]),
    ("img", &["src", "srcset"]),
    ("script", &["src", "data-main"]),
    ("link", &["href"]),
    ("iframe", &["src"]),
    ("video", &["src", "poster"]),
    ("audio", &["src"]),
    ("track", &["src"]),
    ("form", &["action"]),
    ("input", &["src"]),
    ("object", &["data"]),
    ("embed", &["src"]),
];

fn css_url_regex() -> Regex {
    Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("static pattern is valid")
}

fn meta_refresh_regex() -> Regex {
    Regex::new(r"(?i)url=([^;]+)").expect("static pattern is valid")
}

fn whitespace_regex() -> Regex {
    Regex::new(r"\s+").expect("static pattern is valid")
}

/// Visible text with collapsed whitespace, matching
/// `BeautifulSoup.get_text(separator=' ', strip=True)`.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let raw: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    whitespace_regex().replace_all(raw.trim(), " ").into_owned()
}

/// Every URL discoverable across the tag/meta/lazy-load/SVG/CSS surface,
/// in first-seen document order.
pub fn extract_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let mut push = |value: &str, seen: &mut HashSet<String>, urls: &mut Vec<String>| {
        let value = value.trim();
        if !value.is_empty() && seen.insert(value.to_owned()) {
            urls.push(value.to_owned());
        }
    };

    for (tag, attrs) in TAG_ATTRS {
        let Ok(selector) = Selector::parse(tag) else {
            continue;
        };
        for element in document.select(&selector) {
            for attr in *attrs {
                let Some(value) = element.value().attr(attr) else {
                    continue;
                };
                if *attr == "srcset" {
                    for part in value.split(',') {
                        if let Some(candidate) = part.trim().split(' ').next() {
                            push(candidate, &mut seen, &mut urls);
                        }
                    }
                } else {
                    push(value, &mut seen, &mut urls);
                }
            }
        }
    }

    if let Ok(meta_selector) = Selector::parse("meta") {
        for meta in document.select(&meta_selector) {
            let el = meta.value();
            if el
                .attr("property")
                .is_some_and(|p| p.trim().eq_ignore_ascii_case("og:image"))
            {
                if let Some(content) = el.attr("content") {
                    push(content, &mut seen, &mut urls);
                }
            }
            if el
                .attr("http-equiv")
                .is_some_and(|h| h.eq_ignore_ascii_case("refresh"))
            {
                if let Some(content) = el.attr("content") {
                    if let Some(caps) = meta_refresh_regex().captures(content) {
                        push(&caps[1], &mut seen, &mut urls);
                    }
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("[data-src]") {
        for element in document.select(&selector) {
            if let Some(value) = element.value().attr("data-src") {
                push(value, &mut seen, &mut urls);
            }
        }
    }

    if let Ok(selector) = Selector::parse("image") {
        for element in document.select(&selector) {
            let el = element.value();
            if let Some(value) = el.attr("xlink:href") {
                push(value, &mut seen, &mut urls);
            }
            if let Some(value) = el.attr("href") {
                push(value, &mut seen, &mut urls);
            }
        }
    }

    let css_pattern = css_url_regex();
    if let Ok(selector) = Selector::parse("[style]") {
        for element in document.select(&selector) {
            if let Some(style) = element.value().attr("style") {
                for caps in css_pattern.captures_iter(style) {
                    push(&caps[1], &mut seen, &mut urls);
                }
            }
        }
    }
    if let Ok(selector) = Selector::parse("style") {
        for style_tag in document.select(&selector) {
            let css: String = style_tag.text().collect();
            for caps in css_pattern.captures_iter(&css) {
                push(&caps[1], &mut seen, &mut urls);
            }
        }
    }

    urls
}

/// Decoded bytes of every `<img src="data:*;base64,*">` inline image.
pub fn extract_inline_images(html: &str) -> Vec<Vec<u8>> {
    let document = Html::parse_document(html);
    let mut images = Vec::new();
    let Ok(selector) = Selector::parse("img") else {
        return images;
    };
    for element in document.select(&selector) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        if !src.contains("base64") {
            continue;
        }
        let Some((_, rest)) = src.split_once(';') else {
            continue;
        };
        let Some((scheme, data)) = rest.split_once(',') else {
            continue;
        };
        if scheme != "base64" {
            continue;
        }
        if let Ok(bytes) = BASE64.decode(data) {
            images.push(bytes);
        }
    }
    images
}

impl Extractor for HtmlExtractor {
    fn name(&self) -> &'static str {
        "html"
    }

    fn extract(&self, input: &mut ExtractInput<'_>) -> ExtractResult<Vec<Payload>> {
        let bytes: &[u8] = match &input.payload {
            Payload::File(f) => &f.content,
            Payload::Data(d) => &d.content,
        };
        let html = String::from_utf8_lossy(bytes);

        let mut nodes = vec![Payload::Data(DataPayload::text(
            "TEXT",
            extract_text(&html),
        ))];

        for url in extract_urls(&html) {
            nodes.push(Payload::Data(DataPayload::text("URL", url)));
        }

        for image in extract_inline_images(&html) {
            nodes.push(Payload::File(FilePayload::new(String::new(), image)));
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_urls_and_inline_images_are_all_found() {
        let html = "<p>hi <a href='https://x'>x</a></p><img src='data:image/png;base64,AAAA'>";
        assert_eq!(extract_text(html), "hi x");
        assert_eq!(extract_urls(html), vec!["https://x"]);
        let images = extract_inline_images(html);
        assert_eq!(images, vec![BASE64.decode("AAAA").unwrap()]);
    }

    #[test]
    fn style_urls_are_found_inline_and_in_style_tags() {
        let html = r#"<div style="background: url('a.png')"></div><style>.x { background: url(b.png); }</style>"#;
        let urls = extract_urls(html);
        assert_eq!(urls, vec!["a.png", "b.png"]);
    }
}
