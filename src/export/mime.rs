//! MIME multipart rendering of a mail.
//!
//! Output uses `\n` line endings; [`crate::export::smtp`] converts to CRLF
//! for the wire.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::model::address::EmailAddress;
use crate::model::documents::{AlternativePart, AttachmentPart};
use crate::model::mail::{Mail, MailBody};
use crate::parser::header::single_line;

/// Line length for base64-encoded attachment bodies (RFC 2045 §6.8).
const BASE64_LINE: usize = 76;

/// Generate a fresh multipart boundary token.
pub fn new_boundary() -> String {
    format!("==============={}==", uuid::Uuid::new_v4().simple())
}

/// A rendered MIME message: top-level headers plus the multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct MimeMessage {
    boundary: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl MimeMessage {
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace a header, or add it after the MIME headers if absent.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = single_line(&value.into());
        if let Some(slot) = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            slot.1 = value;
            return;
        }
        let position = self.headers.len().min(2);
        self.headers.insert(position, (name.to_string(), value));
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn as_string(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 512);
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out
    }
}

impl std::fmt::Display for MimeMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Render a mail as a multipart MIME message.
///
/// Several alternatives without attachments form a `multipart/alternative`
/// message. With attachments the message is `multipart/mixed`: the
/// alternatives come first (nested when there are more than one), then
/// each attachment as a sibling part in declaration order. Blank `To`,
/// `Cc`, `Bcc` and `Subject` are left out entirely.
pub fn to_mime_multipart(mail: &Mail) -> MimeMessage {
    let (boundary, alternatives, attachments) = match mail.body() {
        MailBody::Multipart(multipart) => (
            multipart.boundary().to_string(),
            multipart.alternatives.clone(),
            multipart.attachments.clone(),
        ),
        MailBody::Text(text) => (
            new_boundary(),
            vec![AlternativePart::new(text_content_type(mail), text.clone())],
            Vec::new(),
        ),
    };

    let subtype = if attachments.is_empty() && alternatives.len() > 1 {
        "alternative"
    } else {
        "mixed"
    };

    let headers = top_level_headers(mail, subtype, &boundary);

    let mut body = String::new();
    if subtype == "mixed" && alternatives.len() > 1 {
        let nested = format!("alt{boundary}");
        let mut inner = format!(
            "Content-Type: multipart/alternative; boundary=\"{nested}\"\nMIME-Version: 1.0\n\n"
        );
        for part in &alternatives {
            push_part(&mut inner, &nested, &text_part(part));
        }
        inner.push_str(&format!("--{nested}--"));
        push_part(&mut body, &boundary, &inner);
    } else {
        for part in &alternatives {
            push_part(&mut body, &boundary, &text_part(part));
        }
    }
    for attachment in &attachments {
        push_part(&mut body, &boundary, &attachment_part(attachment));
    }
    body.push_str(&format!("--{boundary}--\n"));

    MimeMessage {
        boundary,
        headers,
        body,
    }
}

fn top_level_headers(mail: &Mail, subtype: &str, boundary: &str) -> Vec<(String, String)> {
    let h = mail.headers();
    let mut headers = vec![
        (
            "Content-Type".to_string(),
            format!("multipart/{subtype}; boundary=\"{boundary}\""),
        ),
        ("MIME-Version".to_string(), "1.0".to_string()),
    ];

    if let Some(ref from) = h.from {
        headers.push(("From".into(), encode_address(from)));
    }
    for (name, list) in [("To", &h.to), ("Cc", &h.cc), ("Bcc", &h.bcc)] {
        let values: Vec<String> = list
            .iter()
            .filter(|a| !a.trim().is_empty())
            .map(|a| encode_address(a))
            .collect();
        if !values.is_empty() {
            headers.push((name.to_string(), values.join(", ")));
        }
    }
    if let Some(ref reply_to) = h.reply_to {
        headers.push(("Reply-To".into(), encode_address(reply_to)));
    }
    headers.push(("Date".into(), h.date.to_rfc2822()));
    if let Some(subject) = h.subject.as_deref().filter(|s| !s.trim().is_empty()) {
        headers.push(("Subject".into(), encode_word(subject)));
    }
    if let Some(ref id) = h.message_id {
        headers.push(("Message-ID".into(), id.clone()));
    }
    if let Some(ref id) = h.in_reply_to {
        headers.push(("In-Reply-To".into(), id.clone()));
    }
    headers
        .into_iter()
        .map(|(name, value)| (name, single_line(&value)))
        .collect()
}

fn push_part(out: &mut String, boundary: &str, part: &str) {
    out.push_str("--");
    out.push_str(boundary);
    out.push('\n');
    out.push_str(part);
    out.push('\n');
}

fn text_part(part: &AlternativePart) -> String {
    let content_type = single_line(&part.content_type);
    let mime_type = content_type.split(';').next().unwrap_or("text/plain").trim();
    let (charset, encoding) = if part.content.is_ascii() {
        ("us-ascii", "7bit")
    } else {
        ("utf-8", "8bit")
    };
    format!(
        "Content-Type: {mime_type}; charset=\"{charset}\"\nMIME-Version: 1.0\nContent-Transfer-Encoding: {encoding}\n\n{}",
        part.content
    )
}

fn attachment_part(attachment: &AttachmentPart) -> String {
    let filename = single_line(&attachment.filename).replace('"', "");
    let content_type = single_line(&attachment.content_type);
    let encoded = STANDARD.encode(&attachment.content);
    let wrapped = encoded
        .as_bytes()
        .chunks(BASE64_LINE)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Content-Type: {content_type}; name=\"{filename}\"\nMIME-Version: 1.0\nContent-Transfer-Encoding: base64\nContent-Disposition: attachment; filename=\"{filename}\"\n\n{wrapped}"
    )
}

/// Content type of a single-text body, parameters dropped.
fn text_content_type(mail: &Mail) -> String {
    mail.headers()
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| ct.starts_with("text/"))
        .unwrap_or_else(|| "text/plain".to_string())
}

/// RFC 2047 B-encode a header value when it is not plain ASCII.
pub fn encode_word(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?utf-8?b?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

fn encode_address(raw: &str) -> String {
    let addr = EmailAddress::parse(raw);
    if addr.display_name.is_ascii() {
        return addr.display();
    }
    format!("{} <{}>", encode_word(&addr.display_name), addr.address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_part_layout() {
        let part = text_part(&AlternativePart::new("text/plain", "Hello world!"));
        assert_eq!(
            part,
            "Content-Type: text/plain; charset=\"us-ascii\"\nMIME-Version: 1.0\nContent-Transfer-Encoding: 7bit\n\nHello world!"
        );
    }

    #[test]
    fn test_non_ascii_text_part_is_8bit_utf8() {
        let part = text_part(&AlternativePart::new("text/plain; charset=latin1", "Este é o corpo"));
        assert!(part.starts_with("Content-Type: text/plain; charset=\"utf-8\"\n"));
        assert!(part.contains("Content-Transfer-Encoding: 8bit"));
        assert!(part.ends_with("\n\nEste é o corpo"));
    }

    #[test]
    fn test_attachment_part_is_base64() {
        let part = attachment_part(&AttachmentPart {
            content_type: "application/pdf".into(),
            filename: "report.pdf".into(),
            content: b"%PDF-".to_vec(),
        });
        assert!(part.contains("Content-Disposition: attachment; filename=\"report.pdf\""));
        assert!(part.ends_with("\n\nJVBERi0="));
    }

    #[test]
    fn test_attachment_filename_stays_on_one_line() {
        let part = attachment_part(&AttachmentPart {
            content_type: "text/plain\r\nX-Evil: 1".into(),
            filename: "a.txt\r\nBcc: evil@x.com".into(),
            content: b"a".to_vec(),
        });
        let headers = part.split("\n\n").next().unwrap();
        assert_eq!(headers.lines().count(), 4);
        assert!(headers.contains("filename=\"a.txt Bcc: evil@x.com\""));
        assert!(!headers.lines().any(|l| l.starts_with("Bcc:") || l.starts_with("X-Evil:")));
    }

    #[test]
    fn test_encode_word() {
        assert_eq!(encode_word("Oi"), "Oi");
        assert_eq!(encode_word("é"), "=?utf-8?b?w6k=?=");
    }

    #[test]
    fn test_boundaries_are_unique() {
        assert_ne!(new_boundary(), new_boundary());
    }
}
