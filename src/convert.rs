//! Mail ↔ JSON shapes exchanged with the HTTP layer and the browser UI.

use serde::Serialize;

use crate::error::Result;
use crate::model::address::EmailAddress;
use crate::model::documents::SecurityCasing;
use crate::model::input::InputMail;
use crate::model::mail::Mail;

/// The outward projection of a mail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailDict {
    pub ident: String,
    pub mailbox: String,
    pub header: HeaderDict,
    pub tags: Vec<String>,
    pub status: Vec<String>,
    pub attachments: Vec<AttachmentDict>,
    pub security_casing: SecurityCasing,
    pub body: String,
    pub replying: ReplyingDict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderDict {
    /// ISO 8601 with offset.
    pub date: String,
    pub from: String,
    pub subject: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentDict {
    pub content_type: String,
    pub filename: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyingDict {
    pub single: String,
    pub all: ReplyAllDict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyAllDict {
    #[serde(rename = "to-field")]
    pub to_field: Vec<String>,
    #[serde(rename = "cc-field")]
    pub cc_field: Vec<String>,
}

impl MailDict {
    /// Project `mail`; `own_address` is excluded from the reply-all targets.
    pub fn from_mail(mail: &Mail, own_address: &str) -> Self {
        let headers = mail.headers();
        let replying = mail.reply_targets(own_address);
        Self {
            ident: mail.ident().unwrap_or_default().to_string(),
            mailbox: mail.mailbox().to_string(),
            header: HeaderDict {
                date: headers.date.to_rfc3339(),
                from: headers.from.clone().unwrap_or_default(),
                subject: headers.subject.clone().unwrap_or_default(),
                to: headers.to.clone(),
                cc: headers.cc.clone(),
                bcc: headers.bcc.clone(),
            },
            tags: mail.tags().iter().cloned().collect(),
            status: mail.status().iter().map(|s| s.as_str().to_string()).collect(),
            attachments: mail
                .body()
                .attachments()
                .iter()
                .map(|a| AttachmentDict {
                    content_type: a.content_type.clone(),
                    filename: a.filename.clone(),
                    size: a.content.len(),
                })
                .collect(),
            security_casing: mail.security_casing().clone(),
            body: mail.body().as_text(),
            replying: ReplyingDict {
                single: replying.single.unwrap_or_default(),
                all: ReplyAllDict {
                    to_field: replying.all_to,
                    cc_field: replying.all_cc,
                },
            },
        }
    }
}

/// A contact as the UI lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDict {
    pub name: String,
    pub address: String,
}

/// Stateless translation between entities and client JSON, for one account.
#[derive(Debug, Clone)]
pub struct MailConverter {
    self_address: String,
}

impl MailConverter {
    pub fn new(self_address: impl Into<String>) -> Self {
        Self {
            self_address: self_address.into(),
        }
    }

    pub fn from_mail(&self, mail: &Mail) -> MailDict {
        MailDict::from_mail(mail, &self.self_address)
    }

    /// Build an outgoing mail from the client's draft/send JSON.
    pub fn to_mail(&self, value: &serde_json::Value) -> Result<Mail> {
        Mail::from_input(InputMail::from_json(value)?)
    }

    pub fn from_contact(&self, contact: &EmailAddress) -> ContactDict {
        ContactDict {
            name: contact.display_name.clone(),
            address: contact.address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::documents::StoredDocuments;
    use crate::model::flags;
    use serde_json::json;

    fn received(headers: &[(&str, &str)]) -> Mail {
        let mut docs = StoredDocuments::default();
        docs.flags.chash = Some("chash".into());
        docs.flags.mailbox = "INBOX".into();
        docs.flags.flags = vec![flags::RECENT.to_string()];
        docs.headers.set("date", "Wed, 3 Sep 2014 12:36:17 -0300");
        for (k, v) in headers {
            docs.headers.set(k, *v);
        }
        docs.body.raw = "body".into();
        Mail::from_documents(&docs).unwrap()
    }

    #[test]
    fn test_as_dict_shape() {
        let mail = received(&[
            ("Subject", "The subject"),
            ("From", "someone@pixelated.org"),
            ("To", "me@pixelated.org"),
        ]);
        let value = serde_json::to_value(mail.as_dict("me@pixelated.org")).unwrap();
        assert_eq!(
            value,
            json!({
                "body": "body",
                "header": {
                    "date": "2014-09-03T12:36:17-03:00",
                    "from": "someone@pixelated.org",
                    "subject": "The subject",
                    "to": ["me@pixelated.org"],
                    "cc": [],
                    "bcc": []
                },
                "ident": "chash",
                "mailbox": "inbox",
                "security_casing": { "imprints": [], "locks": [] },
                "status": ["recent"],
                "tags": [],
                "attachments": [],
                "replying": {
                    "single": "someone@pixelated.org",
                    "all": { "to-field": ["someone@pixelated.org"], "cc-field": [] }
                }
            })
        );
    }

    #[test]
    fn test_reply_to_wins_for_replying() {
        let mail = received(&[
            ("From", "someone@pixelated.org"),
            ("Reply-To", "reply-to-this-address@pixelated.org"),
            ("To", "me@pixelated.org, \nalice@pixelated.org"),
        ]);
        let dict = MailConverter::new("me@pixelated.org").from_mail(&mail);
        assert_eq!(dict.replying.single, "reply-to-this-address@pixelated.org");
        assert_eq!(
            dict.replying.all.to_field,
            vec!["alice@pixelated.org", "reply-to-this-address@pixelated.org"]
        );
        assert!(dict.replying.all.cc_field.is_empty());
    }

    #[test]
    fn test_to_mail_and_contacts() {
        let converter = MailConverter::new("me@pixelated.org");
        let mail = converter
            .to_mail(&json!({ "header": { "to": "a@b.com" }, "body": "x", "tags": [] }))
            .unwrap();
        assert_eq!(mail.headers().to, vec!["a@b.com"]);

        let contact = converter.from_contact(&EmailAddress::parse("Alice <alice@b.com>"));
        assert_eq!(
            contact,
            ContactDict {
                name: "Alice".into(),
                address: "alice@b.com".into()
            }
        );
    }
}
