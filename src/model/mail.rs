//! The mail entity: one coherent view over three stored documents.
//!
//! A [`Mail`] is the result of a fallible merge: the flags, headers and
//! body documents are fetched independently and may disagree or be
//! partially populated. [`Mail::reconcile`] either produces a complete
//! entity or a [`MailError::Malformed`]; it never yields a half-built mail
//! with a defaulted date.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{MailError, Result};
use crate::export::mime::{self, MimeMessage};
use crate::export::smtp;
use crate::model::address::{normalize_address_list, EmailAddress};
use crate::model::documents::{
    AlternativePart, AttachmentPart, BodyDocument, BodyParts, FlagsDocument, HeadersDocument,
    SecurityCasing, StoredDocuments, TAGS_HEADER,
};
use crate::model::flags::{self, Flags, Status};
use crate::model::tags::{self, TagSet};
use crate::parser::{header, mime as mime_parser};
use crate::store::querier::Querier;

/// Headers this crate models explicitly. Everything else is carried in
/// [`MailHeaders::extra`].
const MODELED_HEADERS: [&str; 11] = [
    "date",
    "from",
    "reply-to",
    "subject",
    "to",
    "cc",
    "bcc",
    "content-type",
    "message-id",
    "in-reply-to",
    "x-tags",
];

/// Normalized headers of a mail.
#[derive(Debug, Clone, PartialEq)]
pub struct MailHeaders {
    /// Always present: from `Date`, else from the closing timestamp of `Received`.
    pub date: DateTime<FixedOffset>,
    pub from: Option<String>,
    pub reply_to: Option<String>,
    pub subject: Option<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub content_type: Option<String>,
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    /// Remaining raw headers, passed through on write-back.
    pub extra: BTreeMap<String, String>,
}

/// A body that was delivered as several parts.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartBody {
    boundary: String,
    pub alternatives: Vec<AlternativePart>,
    pub attachments: Vec<AttachmentPart>,
}

impl MultipartBody {
    pub fn new(parts: BodyParts) -> Self {
        Self::with_boundary(parts, mime::new_boundary())
    }

    /// Keep a boundary the stored headers already declare.
    pub fn with_boundary(parts: BodyParts, boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            alternatives: parts.alternatives,
            attachments: parts.attachments,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The alternatives joined into one multipart text, opened and closed
    /// with this body's boundary.
    pub fn compose(&self) -> String {
        let mut out = String::new();
        for part in &self.alternatives {
            out.push_str(&format!(
                "--{}\nContent-Type: {}\n\n{}\n",
                self.boundary, part.content_type, part.content
            ));
        }
        out.push_str(&format!("--{}--", self.boundary));
        out
    }

    /// First alternative of the given content type.
    pub fn alternative(&self, content_type: &str) -> Option<&AlternativePart> {
        self.alternatives
            .iter()
            .find(|p| p.content_type.eq_ignore_ascii_case(content_type))
    }
}

/// Mail body: a single text, or ordered alternatives plus attachments.
#[derive(Debug, Clone, PartialEq)]
pub enum MailBody {
    Text(String),
    Multipart(MultipartBody),
}

impl MailBody {
    /// The body as a single string (multipart bodies are composed).
    pub fn as_text(&self) -> String {
        match self {
            MailBody::Text(text) => text.clone(),
            MailBody::Multipart(multipart) => multipart.compose(),
        }
    }

    pub fn attachments(&self) -> &[AttachmentPart] {
        match self {
            MailBody::Text(_) => &[],
            MailBody::Multipart(multipart) => &multipart.attachments,
        }
    }
}

/// Reply recipients computed from a received mail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyTargets {
    /// `Reply-To` if present, else `From`.
    pub single: Option<String>,
    /// `To` minus the own address, followed by `single` if not already there.
    pub all_to: Vec<String>,
    /// `Cc` minus the own address.
    pub all_cc: Vec<String>,
}

/// One mail, reconciled from its stored documents or built for sending.
#[derive(Clone)]
pub struct Mail {
    ident: Option<String>,
    uid: u64,
    headers: MailHeaders,
    body: MailBody,
    tags: TagSet,
    flags: Flags,
    mailbox: String,
    security_casing: SecurityCasing,
    querier: Option<Arc<dyn Querier>>,
}

impl std::fmt::Debug for Mail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mail")
            .field("ident", &self.ident)
            .field("mailbox", &self.mailbox)
            .field("tags", &self.tags)
            .field("flags", &self.flags)
            .field("headers", &self.headers)
            .field("bound", &self.querier.is_some())
            .finish_non_exhaustive()
    }
}

impl Mail {
    /// Merge the three stored documents of one mail into an entity.
    ///
    /// `parts` may carry a body already decoded by the caller; otherwise the
    /// body document is decoded when its headers call for it.
    pub fn reconcile(
        flags: &FlagsDocument,
        headers: &HeadersDocument,
        body: &BodyDocument,
        parts: Option<BodyParts>,
    ) -> Result<Self> {
        let date = reconcile_date(headers)?;

        let ident = match flags.chash.as_deref().map(str::trim) {
            Some(chash) if !chash.is_empty() => chash.to_string(),
            _ => documents_hash(headers, body),
        };

        let custom_tags = parse_tags_header(headers.get(TAGS_HEADER));
        let mailbox_name = if flags.mailbox.trim().is_empty() {
            custom_tags
                .iter()
                .find(|t| tags::is_reserved(t))
                .cloned()
                .unwrap_or_else(|| tags::INBOX.to_string())
        } else {
            flags.mailbox.clone()
        };
        if let Some(conflict) = custom_tags
            .iter()
            .find(|t| tags::is_reserved(t) && !t.eq_ignore_ascii_case(mailbox_name.trim()))
        {
            warn!(ident = %ident, tag = %conflict, mailbox = %mailbox_name,
                "Stored tags name another mailbox; keeping the flags document's");
        }
        let tag_set = TagSet::classified(&mailbox_name, &custom_tags);

        let parts = match parts {
            Some(parts) => Some(parts),
            None => mime_parser::parts_for_document(headers, body)?,
        };

        let mut mail_headers = MailHeaders {
            date,
            from: scalar_header(headers, "from"),
            reply_to: scalar_header(headers, "reply-to"),
            subject: scalar_header(headers, "subject"),
            to: address_header(headers, "to"),
            cc: address_header(headers, "cc"),
            bcc: address_header(headers, "bcc"),
            content_type: scalar_header(headers, "content-type"),
            message_id: scalar_header(headers, "message-id"),
            in_reply_to: scalar_header(headers, "in-reply-to"),
            extra: headers
                .headers
                .iter()
                .filter(|(k, _)| !MODELED_HEADERS.contains(&k.to_ascii_lowercase().as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };

        let body = match parts {
            Some(parts) if parts.attachments.is_empty() && parts.alternatives.len() == 1 => {
                let mut alternatives = parts.alternatives;
                let single = alternatives.remove(0);
                mail_headers.content_type = Some(single.content_type);
                MailBody::Text(single.content)
            }
            Some(parts) if !parts.is_empty() => {
                let declared = headers
                    .get("content-type")
                    .and_then(|ct| header::header_param(ct, "boundary"));
                MailBody::Multipart(match declared {
                    Some(boundary) => MultipartBody::with_boundary(parts, boundary),
                    None => MultipartBody::new(parts),
                })
            }
            _ => MailBody::Text(body.raw.clone()),
        };

        let mail_flags = Flags::new(flags.flags.clone());
        for flag in mail_flags.as_slice() {
            if Status::from_flag(flag).is_none() {
                debug!(ident = %ident, flag = %flag, "Ignoring unrecognized flag");
            }
        }

        Ok(Self {
            ident: Some(ident),
            uid: flags.uid,
            headers: mail_headers,
            body,
            mailbox: tag_set.mailbox().unwrap_or(tags::INBOX).to_string(),
            tags: tag_set,
            flags: mail_flags,
            security_casing: headers.security_casing.clone(),
            querier: None,
        })
    }

    /// Reconcile a stored document triple.
    pub fn from_documents(docs: &StoredDocuments) -> Result<Self> {
        Self::reconcile(&docs.flags, &docs.headers, &docs.body, None)
    }

    /// A mail that has no backing documents yet. Identity is assigned on
    /// first persistence unless `ident` is given.
    pub(crate) fn outgoing(
        ident: Option<String>,
        headers: MailHeaders,
        body: MailBody,
        tags: TagSet,
    ) -> Self {
        Self {
            ident,
            uid: 0,
            headers,
            body,
            mailbox: tags.mailbox().unwrap_or(tags::DRAFTS).to_string(),
            tags,
            flags: Flags::default(),
            security_casing: SecurityCasing::default(),
            querier: None,
        }
    }

    /// Bind the mail to the store it was read from, enabling [`Mail::save`].
    pub fn bound_to(mut self, querier: Arc<dyn Querier>) -> Self {
        self.querier = Some(querier);
        self
    }

    pub fn ident(&self) -> Option<&str> {
        self.ident.as_deref()
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn headers(&self) -> &MailHeaders {
        &self.headers
    }

    pub fn date(&self) -> DateTime<FixedOffset> {
        self.headers.date
    }

    pub fn body(&self) -> &MailBody {
        &self.body
    }

    /// Lower-cased name of the mailbox the mail is filed under.
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Custom tags (the classification tag is not included).
    pub fn tags(&self) -> &BTreeSet<String> {
        self.tags.custom()
    }

    /// Every tag, classification included.
    pub fn all_tags(&self) -> BTreeSet<String> {
        self.tags.all()
    }

    pub fn tag_set(&self) -> &TagSet {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn status(&self) -> Vec<Status> {
        self.flags.status()
    }

    pub fn security_casing(&self) -> &SecurityCasing {
        &self.security_casing
    }

    /// Replace the custom tags and return the resulting custom set.
    /// Mailbox membership is unchanged.
    pub fn update_tags<I, S>(&mut self, new_tags: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.replace_custom(new_tags).clone()
    }

    /// Drop every tag, classification included. Callers re-file the mail
    /// with [`Mail::set_mailbox`] before persisting.
    pub fn remove_all_tags(&mut self) {
        self.tags.clear();
    }

    /// File the mail under `mailbox_name`, replacing its classification tag.
    pub fn set_mailbox(&mut self, mailbox_name: &str) {
        self.tags.classify(mailbox_name);
        self.mailbox = tags::mailbox_tag(mailbox_name);
    }

    /// Set `\Seen`. Returns `false` if it was already set.
    pub fn mark_as_read(&mut self) -> bool {
        self.flags.insert(flags::SEEN)
    }

    /// Clear `\Recent`. Returns `false` if it was not set.
    pub fn mark_as_not_recent(&mut self) -> bool {
        self.flags.remove(flags::RECENT)
    }

    /// Compute reply recipients. `own_address` is the receiving account's
    /// address; it never appears among the reply-all recipients.
    pub fn reply_targets(&self, own_address: &str) -> ReplyTargets {
        let me = EmailAddress::parse(own_address);
        let is_me = |addr: &str| !me.address.is_empty() && me.same_mailbox(addr);

        let single = self
            .headers
            .reply_to
            .clone()
            .or_else(|| self.headers.from.clone());

        let mut all_to: Vec<String> = self
            .headers
            .to
            .iter()
            .filter(|a| !is_me(a))
            .cloned()
            .collect();
        if let Some(ref single) = single {
            let target = EmailAddress::parse(single);
            if !all_to.iter().any(|a| target.same_mailbox(a)) {
                all_to.push(single.clone());
            }
        }

        let all_cc = self
            .headers
            .cc
            .iter()
            .filter(|a| !is_me(a))
            .cloned()
            .collect();

        ReplyTargets {
            single,
            all_to,
            all_cc,
        }
    }

    /// The outward JSON projection consumed by the HTTP layer.
    pub fn as_dict(&self, own_address: &str) -> crate::convert::MailDict {
        crate::convert::MailDict::from_mail(self, own_address)
    }

    /// Render as a MIME multipart message.
    pub fn to_mime_multipart(&self) -> MimeMessage {
        mime::to_mime_multipart(self)
    }

    /// Render the RFC 5322 byte stream handed to SMTP, with `From` set to
    /// the sending address.
    pub fn to_smtp_format(&self, from_address: &str) -> String {
        smtp::to_smtp_format(self, from_address)
    }

    /// Split the entity back into its three documents.
    pub fn to_documents(&self) -> StoredDocuments {
        let mut headers = HeadersDocument {
            headers: self.headers.extra.clone(),
            security_casing: self.security_casing.clone(),
        };
        headers.set("Date", self.headers.date.to_rfc2822());
        // The body document holds decoded text; no transfer encoding applies to it.
        headers.remove("Content-Transfer-Encoding");
        let scalars = [
            ("From", &self.headers.from),
            ("Reply-To", &self.headers.reply_to),
            ("Subject", &self.headers.subject),
            ("Message-ID", &self.headers.message_id),
            ("In-Reply-To", &self.headers.in_reply_to),
        ];
        for (name, value) in scalars {
            if let Some(value) = value {
                headers.set(name, value.clone());
            }
        }
        let lists = [
            ("To", &self.headers.to),
            ("Cc", &self.headers.cc),
            ("Bcc", &self.headers.bcc),
        ];
        for (name, values) in lists {
            if !values.is_empty() {
                headers.set(name, values.join(", "));
            }
        }
        let custom: Vec<&String> = self.tags.custom().iter().collect();
        headers.set(
            TAGS_HEADER,
            serde_json::to_string(&custom).unwrap_or_else(|_| "[]".to_string()),
        );

        let body = match &self.body {
            MailBody::Text(text) => {
                if let Some(ref ct) = self.headers.content_type {
                    headers.set("Content-Type", ct.clone());
                }
                BodyDocument {
                    raw: text.clone(),
                    parts: None,
                }
            }
            MailBody::Multipart(multipart) => {
                let subtype = if multipart.attachments.is_empty() {
                    "alternative"
                } else {
                    "mixed"
                };
                headers.set(
                    "Content-Type",
                    format!("multipart/{subtype}; boundary=\"{}\"", multipart.boundary()),
                );
                BodyDocument {
                    raw: multipart.compose(),
                    parts: Some(BodyParts {
                        alternatives: multipart.alternatives.clone(),
                        attachments: multipart.attachments.clone(),
                    }),
                }
            }
        };

        StoredDocuments {
            flags: FlagsDocument {
                uid: self.uid,
                mailbox: self.mailbox.to_uppercase(),
                flags: self.flags.as_slice().to_vec(),
                chash: self.ident.clone(),
            },
            headers,
            body,
        }
    }

    /// Persist the current state through the store the mail is bound to.
    pub fn save(&self) -> Result<()> {
        let querier = self.querier.as_ref().ok_or_else(|| {
            MailError::NoQuerier(self.ident.clone().unwrap_or_else(|| "<new>".to_string()))
        })?;
        querier.save_mail(self)
    }
}

/// Content hash of a headers + body pair, used as the mail ident.
///
/// The tags header is excluded: tags change over a mail's life, its
/// identity does not.
pub fn documents_hash(headers: &HeadersDocument, body: &BodyDocument) -> String {
    let mut hasher = Sha256::new();
    for (name, value) in &headers.headers {
        if name.eq_ignore_ascii_case(TAGS_HEADER) {
            continue;
        }
        hasher.update(name.to_ascii_lowercase().as_bytes());
        hasher.update(b":");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(b"\n");
    hasher.update(body.raw.as_bytes());
    format!("{:X}", hasher.finalize())
}

fn reconcile_date(headers: &HeadersDocument) -> Result<DateTime<FixedOffset>> {
    if let Some(date) = headers.get("date").and_then(header::parse_date) {
        return Ok(date);
    }
    if let Some(received) = headers.get("received") {
        if let Some(date) = header::date_from_received(received) {
            debug!("Date taken from Received header");
            return Ok(date);
        }
    }
    Err(MailError::Malformed(
        "no parsable Date header and no timestamp in Received".into(),
    ))
}

fn parse_tags_header(value: Option<&str>) -> Vec<String> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(value) {
        Ok(tags) => tags,
        Err(e) => {
            warn!(value, error = %e, "Unreadable tags header, ignoring it");
            Vec::new()
        }
    }
}

fn scalar_header(headers: &HeadersDocument, name: &str) -> Option<String> {
    let collapsed = header::single_line(headers.get(name)?);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn address_header(headers: &HeadersDocument, name: &str) -> Vec<String> {
    headers
        .get(name)
        .map(normalize_address_list)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(headers: &[(&str, &str)], flags: &[&str]) -> StoredDocuments {
        let mut doc = StoredDocuments::default();
        doc.flags.mailbox = "INBOX".into();
        doc.flags.chash = Some("chash".into());
        doc.flags.flags = flags.iter().map(|f| f.to_string()).collect();
        for (k, v) in headers {
            doc.headers.set(k, *v);
        }
        doc.body.raw = "body".into();
        doc
    }

    #[test]
    fn test_date_header_wins_over_received() {
        let mail = Mail::from_documents(&docs(
            &[
                ("date", "Wed, 3 Sep 2014 12:36:17 -0300"),
                ("received", "by x ; Thu, 04 Jan 2024 10:00:00 +0000"),
            ],
            &[],
        ))
        .unwrap();
        assert_eq!(mail.date().to_rfc3339(), "2014-09-03T12:36:17-03:00");
    }

    #[test]
    fn test_date_falls_back_to_received() {
        let mail = Mail::from_documents(&docs(
            &[(
                "received",
                "by bitmask.local from 127.0.0.1 with ESMTP ;\n Wed, 03 Sep 2014 13:11:15 -0300",
            )],
            &[],
        ))
        .unwrap();
        assert_eq!(mail.date().to_rfc3339(), "2014-09-03T13:11:15-03:00");
    }

    #[test]
    fn test_unparsable_date_falls_back_to_received() {
        let mail = Mail::from_documents(&docs(
            &[
                ("Date", "garbage"),
                ("Received", "from a; Thu, 04 Jan 2024 10:00:00 +0000"),
            ],
            &[],
        ))
        .unwrap();
        assert_eq!(mail.date().to_rfc3339(), "2024-01-04T10:00:00+00:00");
    }

    #[test]
    fn test_missing_date_is_malformed() {
        let err = Mail::from_documents(&docs(&[("Subject", "x")], &[])).unwrap_err();
        assert!(matches!(err, MailError::Malformed(_)));
    }

    #[test]
    fn test_update_tags_returns_current_custom_tags() {
        let mut mail = Mail::from_documents(&docs(
            &[
                ("date", "Wed, 3 Sep 2014 12:36:17 -0300"),
                ("X-tags", "[\"custom_1\", \"custom_2\"]"),
            ],
            &[],
        ))
        .unwrap();
        let current = mail.update_tags(["custom_1", "custom_3"]);
        let expected: BTreeSet<String> = ["custom_1", "custom_3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(current, expected);
        assert_eq!(mail.tags(), &expected);
        assert_eq!(mail.update_tags(["custom_1", "custom_3"]), expected);
        assert_eq!(mail.mailbox(), "inbox");
        assert!(mail.has_tag("inbox"));
    }

    #[test]
    fn test_mark_as_read_and_not_recent() {
        let date = ("date", "Wed, 3 Sep 2014 12:36:17 -0300");
        let mut mail = Mail::from_documents(&docs(&[date], &[])).unwrap();
        assert!(mail.mark_as_read());
        assert!(!mail.mark_as_read());
        assert_eq!(mail.flags().as_slice(), &[flags::SEEN.to_string()]);

        let mut mail = Mail::from_documents(&docs(&[date], &[flags::RECENT])).unwrap();
        assert!(mail.mark_as_not_recent());
        assert!(mail.flags().as_slice().is_empty());
    }

    #[test]
    fn test_ident_is_stable_when_tags_change() {
        let mut stored = docs(&[("date", "Wed, 3 Sep 2014 12:36:17 -0300")], &[]);
        stored.flags.chash = None;
        let first = Mail::from_documents(&stored).unwrap();
        stored.headers.set(TAGS_HEADER, "[\"x\"]");
        let second = Mail::from_documents(&stored).unwrap();
        assert_eq!(first.ident(), second.ident());
        assert_eq!(first.ident().map(str::len), Some(64));
    }

    #[test]
    fn test_mailbox_from_tags_when_flags_document_has_none() {
        let mut stored = docs(
            &[
                ("date", "Wed, 3 Sep 2014 12:36:17 -0300"),
                ("X-Tags", "[\"sent\", \"work\"]"),
            ],
            &[],
        );
        stored.flags.mailbox.clear();
        let mail = Mail::from_documents(&stored).unwrap();
        assert_eq!(mail.mailbox(), "sent");
        assert_eq!(mail.tags().len(), 1);
    }

    #[test]
    fn test_single_part_body_is_text() {
        let mail = Mail::reconcile(
            &FlagsDocument::default(),
            &docs(&[("date", "Wed, 3 Sep 2014 12:36:17 -0300")], &[]).headers,
            &BodyDocument::default(),
            Some(BodyParts {
                alternatives: vec![AlternativePart::new("text/html", "<b>hi</b>")],
                attachments: Vec::new(),
            }),
        )
        .unwrap();
        assert_eq!(mail.body(), &MailBody::Text("<b>hi</b>".into()));
        assert_eq!(mail.headers().content_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn test_to_documents_round_trips_tags_and_mailbox() {
        let mut mail = Mail::from_documents(&docs(
            &[("date", "Wed, 3 Sep 2014 12:36:17 -0300"), ("To", "a@b.com,\n c@d.com")],
            &[flags::RECENT],
        ))
        .unwrap();
        mail.update_tags(["work"]);
        mail.set_mailbox("TRASH");
        let stored = mail.to_documents();
        assert_eq!(stored.flags.mailbox, "TRASH");
        assert_eq!(stored.headers.get(TAGS_HEADER), Some("[\"work\"]"));
        assert_eq!(stored.headers.get("to"), Some("a@b.com, c@d.com"));

        let again = Mail::from_documents(&stored).unwrap();
        assert_eq!(again.ident(), mail.ident());
        assert_eq!(again.mailbox(), "trash");
        assert_eq!(again.tags(), mail.tags());
        assert_eq!(again.date(), mail.date());
    }

    #[test]
    fn test_to_documents_stores_decoded_body_without_transfer_encoding() {
        let mut stored = docs(
            &[
                ("date", "Wed, 3 Sep 2014 12:36:17 -0300"),
                ("Content-Type", "text/plain; charset=utf-8"),
                ("Content-Transfer-Encoding", "quoted-printable"),
            ],
            &[],
        );
        stored.body.raw = "caf=C3=A9 =3D ok\n".into();
        let mail = Mail::from_documents(&stored).unwrap();
        assert!(mail.body().as_text().starts_with("café = ok"));

        let written = mail.to_documents();
        assert_eq!(written.headers.get("content-transfer-encoding"), None);
        assert_eq!(written.body.raw, mail.body().as_text());
        assert_eq!(Mail::from_documents(&written).unwrap().body(), mail.body());
    }

    #[test]
    fn test_multipart_keeps_declared_boundary() {
        let mut headers = docs(&[("date", "Wed, 3 Sep 2014 12:36:17 -0300")], &[]).headers;
        headers.set("Content-Type", "multipart/mixed; boundary=\"outer\"");
        let parts = BodyParts {
            alternatives: vec![AlternativePart::new("text/plain", "hi")],
            attachments: vec![AttachmentPart {
                content_type: "text/plain".into(),
                filename: "a.txt".into(),
                content: b"a".to_vec(),
            }],
        };
        let mail = Mail::reconcile(&FlagsDocument::default(), &headers, &BodyDocument::default(), Some(parts))
            .unwrap();
        let MailBody::Multipart(ref multipart) = *mail.body() else {
            panic!("expected a multipart body");
        };
        assert_eq!(multipart.boundary(), "outer");

        let written = mail.to_documents();
        assert_eq!(
            written.headers.get("content-type"),
            Some("multipart/mixed; boundary=\"outer\"")
        );
        assert_eq!(Mail::from_documents(&written).unwrap().body(), mail.body());
    }

    #[test]
    fn test_save_without_store_fails() {
        let mail =
            Mail::from_documents(&docs(&[("date", "Wed, 3 Sep 2014 12:36:17 -0300")], &[])).unwrap();
        assert!(matches!(mail.save(), Err(MailError::NoQuerier(_))));
    }
}
