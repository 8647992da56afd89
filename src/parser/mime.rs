//! MIME decoding of stored bodies: alternatives and attachments.

use mail_parser::{MessageParser, MimeHeaders};
use tracing::debug;

use crate::error::{MailError, Result};
use crate::model::documents::{
    AlternativePart, AttachmentPart, BodyDocument, BodyParts, HeadersDocument,
};

/// Split a complete raw message (headers + body) into alternatives and attachments.
///
/// Alternatives keep their order of appearance in the message.
pub fn extract_parts(raw_message: &[u8]) -> Result<BodyParts> {
    let msg = MessageParser::default()
        .parse(raw_message)
        .ok_or_else(|| MailError::Mime("Failed to parse MIME message".into()))?;

    let mut ids: Vec<usize> = msg
        .text_body
        .iter()
        .chain(msg.html_body.iter())
        .copied()
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let mut alternatives = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(part) = msg.part(id) else { continue };
        let Some(text) = part.text_contents() else {
            continue;
        };
        alternatives.push(AlternativePart::new(content_type_of(part, "text/plain"), text));
    }

    let attachments = msg
        .attachments()
        .enumerate()
        .map(|(idx, part)| AttachmentPart {
            content_type: content_type_of(part, "application/octet-stream"),
            filename: part
                .attachment_name()
                .map(String::from)
                .unwrap_or_else(|| format!("attachment_{idx}")),
            content: part.contents().to_vec(),
        })
        .collect();

    Ok(BodyParts {
        alternatives,
        attachments,
    })
}

/// Decide how a stored body must be read.
///
/// Returns the pre-split parts when the store already provides them, or
/// decodes them when the headers declare a multipart or transfer-encoded
/// body. `None` means the raw content is the body as-is.
pub fn parts_for_document(
    headers: &HeadersDocument,
    body: &BodyDocument,
) -> Result<Option<BodyParts>> {
    if let Some(ref parts) = body.parts {
        return Ok(Some(parts.clone()));
    }

    let content_type = headers.get("content-type").unwrap_or("text/plain");
    let encoding = headers
        .get("content-transfer-encoding")
        .unwrap_or("7bit")
        .trim()
        .to_ascii_lowercase();
    let multipart = content_type.trim().to_ascii_lowercase().starts_with("multipart/");
    let encoded = matches!(encoding.as_str(), "base64" | "quoted-printable");

    if !multipart && !encoded {
        return Ok(None);
    }

    debug!(content_type, encoding = %encoding, "Decoding stored body");
    let raw = format!(
        "Content-Type: {content_type}\r\nContent-Transfer-Encoding: {encoding}\r\n\r\n{}",
        body.raw
    );
    extract_parts(raw.as_bytes()).map(Some)
}

fn content_type_of(part: &mail_parser::MessagePart<'_>, default: &str) -> String {
    part.content_type()
        .map(|ct| match ct.subtype() {
            Some(sub) => format!("{}/{sub}", ct.ctype()),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| default.to_string())
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALTERNATIVE: &str = "Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Hello plain\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Hello html</p>\r\n\
--b1--\r\n";

    #[test]
    fn test_extract_alternatives_in_order() {
        let parts = extract_parts(ALTERNATIVE.as_bytes()).unwrap();
        assert_eq!(parts.alternatives.len(), 2);
        assert_eq!(parts.alternatives[0].content_type, "text/plain");
        assert!(parts.alternatives[0].content.contains("Hello plain"));
        assert_eq!(parts.alternatives[1].content_type, "text/html");
        assert!(parts.alternatives[1].content.contains("<p>Hello html</p>"));
        assert!(parts.attachments.is_empty());
    }

    #[test]
    fn test_extract_attachment() {
        let raw = "Content-Type: multipart/mixed; boundary=\"m\"\r\n\
\r\n\
--m\r\n\
Content-Type: text/plain\r\n\
\r\n\
See attached\r\n\
--m\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0=\r\n\
--m--\r\n";
        let parts = extract_parts(raw.as_bytes()).unwrap();
        assert_eq!(parts.attachments.len(), 1);
        assert_eq!(parts.attachments[0].filename, "report.pdf");
        assert_eq!(parts.attachments[0].content_type, "application/pdf");
        assert_eq!(parts.attachments[0].content, b"%PDF-");
    }

    #[test]
    fn test_plain_document_needs_no_decoding() {
        let headers = HeadersDocument::default();
        let body = BodyDocument {
            raw: "hello".into(),
            parts: None,
        };
        assert!(parts_for_document(&headers, &body).unwrap().is_none());
    }

    #[test]
    fn test_multipart_document_is_decoded() {
        let mut headers = HeadersDocument::default();
        headers.set("Content-Type", "multipart/alternative; boundary=\"b1\"");
        let raw = ALTERNATIVE.split_once("\r\n\r\n").unwrap().1.to_string();
        let body = BodyDocument { raw, parts: None };
        let parts = parts_for_document(&headers, &body).unwrap().unwrap();
        assert_eq!(parts.alternatives.len(), 2);
    }
}
