//! Tag index over the mails of the watched mailboxes.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::flags::Status;
use crate::model::mail::Mail;

/// What the index remembers about one mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedMail {
    pub mailbox: String,
    /// Every tag, classification included.
    pub tags: BTreeSet<String>,
    pub status: Vec<Status>,
}

/// Per-tag totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub total: usize,
    pub read: usize,
    pub starred: usize,
    pub replied: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagIndex {
    entries: BTreeMap<String, IndexedMail>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a mail. Mails without an ident are ignored.
    pub fn upsert(&mut self, mail: &Mail) {
        let Some(ident) = mail.ident() else { return };
        self.entries.insert(
            ident.to_string(),
            IndexedMail {
                mailbox: mail.mailbox().to_string(),
                tags: mail.all_tags(),
                status: mail.status(),
            },
        );
    }

    pub fn remove(&mut self, ident: &str) -> bool {
        self.entries.remove(ident).is_some()
    }

    /// Replace every entry of `mailbox_tag` with `mails`.
    pub fn replace_mailbox(&mut self, mailbox_tag: &str, mails: &[Mail]) {
        self.entries.retain(|_, e| e.mailbox != mailbox_tag);
        for mail in mails {
            self.upsert(mail);
        }
    }

    pub fn get(&self, ident: &str) -> Option<&IndexedMail> {
        self.entries.get(ident)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Idents carrying `tag`, in ident order.
    pub fn idents_with_tag(&self, tag: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.tags.contains(tag))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn tag_counts(&self) -> BTreeMap<String, TagCount> {
        let mut counts: BTreeMap<String, TagCount> = BTreeMap::new();
        for entry in self.entries.values() {
            for tag in &entry.tags {
                let count = counts.entry(tag.clone()).or_default();
                count.total += 1;
                for status in &entry.status {
                    match status {
                        Status::Read => count.read += 1,
                        Status::Starred => count.starred += 1,
                        Status::Replied => count.replied += 1,
                        _ => {}
                    }
                }
            }
        }
        counts
    }
}
