//! Raw document shapes handed over by the document store.
//!
//! One logical mail is stored as three independently mutable documents.
//! Nothing here is validated; reconciliation happens in [`crate::model::mail`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved header carrying the JSON-encoded list of custom tags.
pub const TAGS_HEADER: &str = "X-Tags";

/// Flags facet: UID, physical mailbox name and the IMAP-style flag list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlagsDocument {
    pub uid: u64,
    /// Mailbox the store files this mail under (any case).
    #[serde(alias = "mbox")]
    pub mailbox: String,
    pub flags: Vec<String>,
    /// Content hash assigned by the store, when it has one.
    pub chash: Option<String>,
}

/// Headers facet: the raw header map as the store keeps it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeadersDocument {
    pub headers: BTreeMap<String, String>,
    pub security_casing: SecurityCasing,
}

impl HeadersDocument {
    /// Case-insensitive header lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace a header, keeping the existing key spelling if any.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let key = self
            .headers
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_string());
        self.headers.insert(key, value.into());
    }

    /// Remove a header by case-insensitive name, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let key = self
            .headers
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()?;
        self.headers.remove(&key)
    }
}

/// Body facet: raw content, optionally already split into parts by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BodyDocument {
    pub raw: String,
    pub parts: Option<BodyParts>,
}

/// A body decoded into ordered alternatives and ordered attachments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BodyParts {
    pub alternatives: Vec<AlternativePart>,
    pub attachments: Vec<AttachmentPart>,
}

impl BodyParts {
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty() && self.attachments.is_empty()
    }
}

/// One alternative rendering of the body (`text/plain`, `text/html`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlternativePart {
    pub content_type: String,
    pub content: String,
}

impl AlternativePart {
    pub fn new(content_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// A file attached to the mail. Content is already transfer-decoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentPart {
    pub content_type: String,
    pub filename: String,
    #[serde(default)]
    pub content: Vec<u8>,
}

/// Signature imprints and encryption locks found on a message.
///
/// Opaque to this crate: carried from the headers document to the
/// outward projection untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecurityCasing {
    pub imprints: Vec<serde_json::Value>,
    pub locks: Vec<serde_json::Value>,
}

/// The three documents of one stored mail, as a single serializable value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoredDocuments {
    pub flags: FlagsDocument,
    pub headers: HeadersDocument,
    pub body: BodyDocument,
}
