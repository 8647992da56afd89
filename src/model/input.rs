//! The loosely typed draft/send shape posted by the browser UI.
//!
//! ```json
//! { "header": { "to": ["a@b"], "cc": "", "bcc": [], "subject": "Hi" },
//!   "body": "text" | [{ "content-type": "plain", "raw": "text" }, ...],
//!   "tags": ["sent"],
//!   "ident": "" }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{MailError, Result};
use crate::model::address::{normalize_address_list, normalize_address_values};
use crate::model::documents::{AlternativePart, BodyParts};
use crate::model::mail::{Mail, MailBody, MailHeaders, MultipartBody};
use crate::model::tags::{self, TagSet};
use crate::parser::header::single_line;

/// An address field sent either as a list or as a single (possibly empty) string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AddressField {
    List(Vec<String>),
    Single(String),
}

impl Default for AddressField {
    fn default() -> Self {
        AddressField::List(Vec::new())
    }
}

impl AddressField {
    pub fn addresses(&self) -> Vec<String> {
        match self {
            AddressField::List(values) => normalize_address_values(values),
            AddressField::Single(value) => normalize_address_list(value),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputHeader {
    pub to: AddressField,
    pub cc: AddressField,
    pub bcc: AddressField,
    pub subject: Option<String>,
    pub from: Option<String>,
    #[serde(alias = "in-reply-to")]
    pub in_reply_to: Option<String>,
}

/// One alternative of a multipart body, as the UI names it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputBodyPart {
    /// Either a full MIME type or a bare text subtype (`"plain"`, `"html"`).
    #[serde(rename = "content-type")]
    pub content_type: String,
    pub raw: String,
}

impl InputBodyPart {
    fn mime_type(&self) -> String {
        let ct = single_line(&self.content_type).to_ascii_lowercase();
        if ct.contains('/') {
            ct
        } else {
            format!("text/{ct}")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InputBody {
    Text(String),
    Parts(Vec<InputBodyPart>),
}

impl Default for InputBody {
    fn default() -> Self {
        InputBody::Text(String::new())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputMail {
    pub header: InputHeader,
    pub body: InputBody,
    pub tags: Vec<String>,
    pub ident: Option<String>,
}

impl InputMail {
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| MailError::InvalidInput(e.to_string()))
    }

    /// `true` when the client asked for the mail to be sent, not saved.
    pub fn is_send(&self) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tags::SENT))
    }
}

impl Mail {
    /// Build an outgoing mail from the UI's draft/send shape.
    ///
    /// Blank optional fields are dropped instead of kept as empty values.
    /// The mail is filed under the reserved mailbox named among its tags,
    /// or under drafts.
    pub fn from_input(input: InputMail) -> Result<Self> {
        let blank_to_none = |value: Option<String>| {
            value
                .map(|v| single_line(&v))
                .filter(|v| !v.is_empty())
        };

        let headers = MailHeaders {
            date: Utc::now().fixed_offset(),
            from: blank_to_none(input.header.from),
            reply_to: None,
            subject: blank_to_none(input.header.subject),
            to: input.header.to.addresses(),
            cc: input.header.cc.addresses(),
            bcc: input.header.bcc.addresses(),
            content_type: None,
            message_id: None,
            in_reply_to: blank_to_none(input.header.in_reply_to),
            extra: Default::default(),
        };

        let body = match input.body {
            InputBody::Text(text) => MailBody::Text(text),
            InputBody::Parts(parts) if parts.is_empty() => {
                return Err(MailError::InvalidInput("body has no parts".into()))
            }
            InputBody::Parts(parts) => MailBody::Multipart(MultipartBody::new(BodyParts {
                alternatives: parts
                    .iter()
                    .map(|p| AlternativePart::new(p.mime_type(), p.raw.clone()))
                    .collect(),
                attachments: Vec::new(),
            })),
        };

        let mailbox = input
            .tags
            .iter()
            .find(|t| tags::is_reserved(t))
            .map(|t| t.to_lowercase())
            .unwrap_or_else(|| tags::DRAFTS.to_string());
        let tag_set = TagSet::classified(&mailbox, &input.tags);

        let ident = blank_to_none(input.ident);
        Ok(Mail::outgoing(ident, headers, body, tag_set))
    }
}
