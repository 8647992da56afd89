//! Mail service: the operations the HTTP layer calls.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::AccountConfig;
use crate::convert::{ContactDict, MailConverter, MailDict};
use crate::error::{MailError, Result};
use crate::export::smtp::{Envelope, MailSender};
use crate::mailbox::registry::Mailboxes;
use crate::model::address::EmailAddress;
use crate::model::flags::Status;
use crate::model::input::InputMail;
use crate::model::mail::Mail;
use crate::model::tags;
use crate::search::index::{TagCount, TagIndex};

/// Totals over a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MailStats {
    pub total: usize,
    pub read: usize,
    pub starred: usize,
    pub replied: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailListing {
    pub stats: MailStats,
    pub mails: Vec<MailDict>,
}

/// One entry of the tag listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub name: String,
    /// Reserved mailbox tags are always listed and flagged default.
    pub default: bool,
    pub counts: TagCount,
}

pub struct MailService {
    mailboxes: Mailboxes,
    sender: Arc<dyn MailSender>,
    account: AccountConfig,
    converter: MailConverter,
}

impl MailService {
    pub fn new(mailboxes: Mailboxes, sender: Arc<dyn MailSender>, account: AccountConfig) -> Self {
        let converter = MailConverter::new(account.address.clone());
        Self {
            mailboxes,
            sender,
            account,
            converter,
        }
    }

    pub fn mailboxes(&self) -> &Mailboxes {
        &self.mailboxes
    }

    pub fn converter(&self) -> &MailConverter {
        &self.converter
    }

    /// List mails matching any of `requested`, newest first.
    ///
    /// An empty request lists everything. When the request names the
    /// inbox, mails also tagged trash are dropped.
    pub fn mails(&self, requested: &BTreeSet<String>) -> Result<MailListing> {
        let query = if requested.is_empty() {
            BTreeSet::from([tags::ALL.to_string()])
        } else {
            requested.clone()
        };
        let mut mails = self.mailboxes.mails_by_tag(&query)?;
        if query.contains(tags::INBOX) {
            mails.retain(|m| !m.has_tag(tags::TRASH));
        }
        mails.sort_by(|a, b| b.date().cmp(&a.date()));

        let mut stats = MailStats {
            total: mails.len(),
            ..Default::default()
        };
        for mail in &mails {
            let status = mail.status();
            stats.read += usize::from(status.contains(&Status::Read));
            stats.starred += usize::from(status.contains(&Status::Starred));
            stats.replied += usize::from(status.contains(&Status::Replied));
        }

        Ok(MailListing {
            stats,
            mails: mails.iter().map(|m| self.converter.from_mail(m)).collect(),
        })
    }

    pub fn mail(&self, ident: &str) -> Result<Option<Mail>> {
        self.mailboxes.mail(ident)
    }

    fn existing(&self, ident: &str) -> Result<Mail> {
        self.mailboxes
            .mail(ident)?
            .ok_or_else(|| MailError::NotFound(ident.to_string()))
    }

    /// Store a draft, replacing an earlier draft with the same ident.
    pub fn save_draft(&self, mail: Mail) -> Result<String> {
        let drafts = self.mailboxes.drafts()?;
        if let Some(ident) = mail.ident() {
            if drafts.mail(ident)?.is_some() {
                debug!(ident, "Replacing draft");
                drafts.remove(ident)?;
            }
        }
        drafts.add(&mail)
    }

    /// Hand the mail to SMTP, then file it under SENT.
    ///
    /// Nothing is stored when the transport fails. A draft with the same
    /// ident is removed once the mail is sent.
    pub fn send_draft(&self, mut mail: Mail) -> Result<String> {
        let envelope = Envelope::for_mail(&mail, &self.account.address);
        self.sender.send(&envelope)?;
        info!(recipients = envelope.recipients.len(), "Sent mail");

        if let Some(ident) = mail.ident() {
            let drafts = self.mailboxes.drafts()?;
            if drafts.mail(ident)?.is_some() {
                drafts.remove(ident)?;
            }
        }
        mail.mark_as_read();
        self.mailboxes.sent()?.add(&mail)
    }

    /// Route a client draft/send request: the `sent` tag sends.
    pub fn save_or_send(&self, value: &serde_json::Value) -> Result<String> {
        let input = InputMail::from_json(value)?;
        let send = input.is_send();
        let mail = Mail::from_input(input)?;
        if send {
            self.send_draft(mail)
        } else {
            self.save_draft(mail)
        }
    }

    pub fn delete_mail(&self, ident: &str) -> Result<Option<Mail>> {
        self.mailboxes.move_to_trash(ident)
    }

    pub fn mark_as_read(&self, ident: &str) -> Result<()> {
        let mut mail = self.existing(ident)?;
        if mail.mark_as_read() {
            mail.save()?;
        }
        Ok(())
    }

    pub fn mail_tags(&self, ident: &str) -> Result<Vec<String>> {
        Ok(self.existing(ident)?.tags().iter().cloned().collect())
    }

    /// Replace the custom tags of a mail and persist them.
    pub fn update_tags(&self, ident: &str, new_tags: &[String]) -> Result<BTreeSet<String>> {
        let mut mail = self.existing(ident)?;
        let current = mail.update_tags(new_tags);
        mail.save()?;
        Ok(current)
    }

    /// The draft answering `ident`, matched on its `In-Reply-To`.
    pub fn draft_reply_for(&self, ident: &str) -> Result<Option<Mail>> {
        let Some(original) = self.mailboxes.mail(ident)? else {
            return Ok(None);
        };
        let Some(message_id) = original.headers().message_id.clone() else {
            return Ok(None);
        };
        Ok(self
            .mailboxes
            .drafts()?
            .mails()?
            .into_iter()
            .find(|d| d.headers().in_reply_to.as_deref() == Some(message_id.as_str())))
    }

    /// Every tag with its counts. Counts come from the background index
    /// when one runs, and may trail the latest writes.
    pub fn tags(&self) -> Result<Vec<TagSummary>> {
        let counts: BTreeMap<String, TagCount> = match self.mailboxes.indexer() {
            Some(indexer) => indexer.index().tag_counts(),
            None => {
                let mut index = TagIndex::new();
                for mail in self.mailboxes.mails_by_tag(&BTreeSet::from([tags::ALL.to_string()]))? {
                    index.upsert(&mail);
                }
                index.tag_counts()
            }
        };

        let mut summaries: Vec<TagSummary> = tags::RESERVED
            .iter()
            .map(|name| TagSummary {
                name: name.to_string(),
                default: true,
                counts: counts.get(*name).copied().unwrap_or_default(),
            })
            .collect();
        summaries.extend(
            counts
                .into_iter()
                .filter(|(name, _)| !tags::is_reserved(name))
                .map(|(name, counts)| TagSummary {
                    name,
                    default: false,
                    counts,
                }),
        );
        Ok(summaries)
    }

    /// Addresses seen in `From`, `To` and `Cc` of every mail, de-duplicated
    /// and optionally filtered by a case-insensitive substring.
    pub fn contacts(&self, filter: Option<&str>) -> Result<Vec<ContactDict>> {
        let needle = filter.map(|f| f.trim().to_lowercase()).filter(|f| !f.is_empty());
        let mut seen = BTreeSet::new();
        let mut contacts = Vec::new();
        for mail in self.mailboxes.mails_by_tag(&BTreeSet::from([tags::ALL.to_string()]))? {
            let headers = mail.headers();
            let candidates = headers
                .from
                .iter()
                .chain(headers.to.iter())
                .chain(headers.cc.iter());
            for raw in candidates {
                let address = EmailAddress::parse(raw);
                if address.address.is_empty() {
                    continue;
                }
                if let Some(ref needle) = needle {
                    let matches = address.address.to_lowercase().contains(needle)
                        || address.display_name.to_lowercase().contains(needle);
                    if !matches {
                        continue;
                    }
                }
                if seen.insert(address.address.to_lowercase()) {
                    contacts.push(self.converter.from_contact(&address));
                }
            }
        }
        Ok(contacts)
    }
}
