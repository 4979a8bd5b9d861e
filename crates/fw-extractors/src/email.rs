use filewhisperer_types::{DataPayload, ExtractError, ExtractResult, FilePayload, Payload};
use mail_parser::{MessageParser, MimeHeaders};

use crate::{Extractor, ExtractInput};

/// Parses an RFC 822/5322 message: headers become one `EMAIL_HEADER` data
/// node, each text/html body part becomes its own data node, and each
/// attachment becomes a file child.
pub struct EmailExtractor;

fn format_header_block(message: &mail_parser::Message<'_>) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(from) = message.from() {
        lines.push(format!("From: {}", format_addresses(from)));
    }
    if let Some(to) = message.to() {
        lines.push(format!("To: {}", format_addresses(to)));
    }
    if let Some(subject) = message.subject() {
        lines.push(format!("Subject: {subject}"));
    }
    if let Some(date) = message.date() {
        lines.push(format!("Date: {date}"));
    }
    if let Some(message_id) = message.message_id() {
        lines.push(format!("Message-ID: {message_id}"));
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn format_addresses(addr: &mail_parser::Address<'_>) -> String {
    addr.first()
        .and_then(|a| a.address())
        .map(str::to_owned)
        .unwrap_or_default()
}

impl Extractor for EmailExtractor {
    fn name(&self) -> &'static str {
        "email"
    }

    fn extract(&self, input: &mut ExtractInput<'_>) -> ExtractResult<Vec<Payload>> {
        let Some(file) = input.file() else {
            return Ok(Vec::new());
        };

        let message = MessageParser::default()
            .parse(&file.content)
            .ok_or_else(|| ExtractError::fatal("email: message could not be parsed"))?;

        let mut nodes = Vec::new();
        if let Some(header) = format_header_block(&message) {
            nodes.push(Payload::Data(DataPayload::text("EMAIL_HEADER", header)));
        }

        let mut attachment_count = 0i64;
        for attachment in message.attachments() {
            let name = attachment
                .attachment_name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("attachment_{attachment_count}"));
            nodes.push(Payload::File(FilePayload::new(
                name,
                attachment.contents().to_vec(),
            )));
            attachment_count += 1;
        }

        let mut body_parts_count = 0i64;
        for text in message.text_bodies() {
            if let Some(content) = text.text_contents() {
                nodes.push(Payload::Data(DataPayload::text("EMAIL_TEXT", content.to_owned())));
                body_parts_count += 1;
            }
        }
        for html in message.html_bodies() {
            if let Some(content) = html.text_contents() {
                nodes.push(Payload::Data(DataPayload::text("EMAIL_HTML", content.to_owned())));
                body_parts_count += 1;
            }
        }

        input
            .meta
            .numbers
            .insert("attachment_count".to_owned(), attachment_count);
        input
            .meta
            .numbers
            .insert("body_parts_count".to_owned(), body_parts_count);

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "From: alice@example.com\r\nTo: bob@example.com\r\nSubject: hi\r\nDate: Mon, 1 Jan 2024 00:00:00 +0000\r\nContent-Type: text/plain\r\n\r\nhello there\r\n";

    #[test]
    fn parses_headers_and_plain_body() {
        let mut meta = filewhisperer_types::MetaMap::new();
        let payload = Payload::File(FilePayload::new("msg.eml", SAMPLE.as_bytes().to_vec()));
        let mut input = ExtractInput {
            payload: &payload,
            passwords: &[],
            pdf_max_pages: 10,
            word_max_pages: 10,
            meta: &mut meta,
        };
        let nodes = EmailExtractor.extract(&mut input).unwrap();
        let header = nodes[0].as_data().unwrap();
        assert_eq!(header.kind, "EMAIL_HEADER");
        assert!(String::from_utf8_lossy(&header.content).contains("alice@example.com"));
        assert_eq!(*meta.numbers.get("body_parts_count").unwrap(), 1);
        assert_eq!(*meta.numbers.get("attachment_count").unwrap(), 0);
    }
}
