//! One virtual mailbox.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::{MailError, Result};
use crate::model::mail::Mail;
use crate::model::tags;
use crate::store::querier::Querier;

/// A named view over the mails whose classification tag is this
/// mailbox's lower-cased name.
#[derive(Clone)]
pub struct Mailbox {
    name: String,
    tag: String,
    querier: Arc<dyn Querier>,
}

impl std::fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox").field("name", &self.name).finish()
    }
}

impl Mailbox {
    pub fn new(name: &str, querier: Arc<dyn Querier>) -> Self {
        Self {
            name: name.trim().to_uppercase(),
            tag: tags::mailbox_tag(name),
            querier,
        }
    }

    /// Upper-cased mailbox name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased classification tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Every mail of the mailbox, bound to the store.
    pub fn mails(&self) -> Result<Vec<Mail>> {
        Ok(self
            .querier
            .all_mails_by_mailbox(&self.name)?
            .into_iter()
            .map(|m| m.bound_to(Arc::clone(&self.querier)))
            .collect())
    }

    /// Mails matching any of `requested` tags.
    ///
    /// The wildcard `all` or this mailbox's own tag returns the mailbox
    /// unfiltered. Several tags are a union, never a conjunction.
    pub fn mails_by_tags(&self, requested: &BTreeSet<String>) -> Result<Vec<Mail>> {
        let mails = self.mails()?;
        if requested.contains(tags::ALL) || requested.contains(&self.tag) {
            return Ok(mails);
        }
        Ok(mails
            .into_iter()
            .filter(|m| m.tag_set().intersects(requested))
            .collect())
    }

    /// Look up a mail, but only if it is filed in this mailbox.
    pub fn mail(&self, ident: &str) -> Result<Option<Mail>> {
        Ok(self
            .querier
            .mail(ident)?
            .filter(|m| m.mailbox() == self.tag)
            .map(|m| m.bound_to(Arc::clone(&self.querier))))
    }

    /// File a mail in this mailbox and return its ident.
    pub fn add(&self, mail: &Mail) -> Result<String> {
        let ident = self.querier.create_mail(mail, &self.name)?;
        debug!(ident = %ident, mailbox = %self.name, "Added mail to mailbox");
        Ok(ident)
    }

    /// Delete a mail of this mailbox from the store.
    pub fn remove(&self, ident: &str) -> Result<()> {
        let mut mail = self
            .mail(ident)?
            .ok_or_else(|| MailError::NotFound(ident.to_string()))?;
        mail.remove_all_tags();
        self.querier.remove_mail(&mail)?;
        debug!(ident, mailbox = %self.name, "Removed mail from mailbox");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn raw(subject: &str, tags: &str) -> String {
        format!(
            "Date: Wed, 3 Sep 2014 12:36:17 -0300\nSubject: {subject}\nX-Tags: {tags}\n\nbody of {subject}\n"
        )
    }

    fn inbox_with_three() -> (Arc<InMemoryStore>, Mailbox) {
        let store = Arc::new(InMemoryStore::new());
        store.import_raw(&raw("one", "[\"work\"]"), "INBOX").unwrap();
        store.import_raw(&raw("two", "[\"home\"]"), "INBOX").unwrap();
        store.import_raw(&raw("three", "[]"), "INBOX").unwrap();
        store.import_raw(&raw("elsewhere", "[\"work\"]"), "SENT").unwrap();
        let mailbox = Mailbox::new("inbox", store.clone());
        (store, mailbox)
    }

    fn tags(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_names_are_normalized() {
        let (_, mailbox) = inbox_with_three();
        assert_eq!(mailbox.name(), "INBOX");
        assert_eq!(mailbox.tag(), "inbox");
    }

    #[test]
    fn test_wildcard_and_own_tag_return_everything() {
        let (_, mailbox) = inbox_with_three();
        assert_eq!(mailbox.mails_by_tags(&tags(&["all"])).unwrap().len(), 3);
        assert_eq!(mailbox.mails_by_tags(&tags(&["inbox"])).unwrap().len(), 3);
    }

    #[test]
    fn test_custom_tags_are_a_union() {
        let (_, mailbox) = inbox_with_three();
        let work = mailbox.mails_by_tags(&tags(&["work"])).unwrap();
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].headers().subject.as_deref(), Some("one"));
        assert_eq!(
            mailbox.mails_by_tags(&tags(&["work", "home"])).unwrap().len(),
            2
        );
        assert!(mailbox.mails_by_tags(&tags(&["none"])).unwrap().is_empty());
    }

    #[test]
    fn test_mail_lookup_is_scoped_to_mailbox() {
        let (store, mailbox) = inbox_with_three();
        let sent = store.all_mails_by_mailbox("SENT").unwrap();
        let sent_id = sent[0].ident().unwrap();
        assert!(mailbox.mail(sent_id).unwrap().is_none());
        let inbox_id = mailbox.mails().unwrap()[0].ident().unwrap().to_string();
        assert!(mailbox.mail(&inbox_id).unwrap().is_some());
    }

    #[test]
    fn test_listed_mails_can_be_saved() {
        let (store, mailbox) = inbox_with_three();
        let mut mail = mailbox.mails().unwrap().remove(0);
        mail.update_tags(["urgent"]);
        mail.save().unwrap();
        let ident = mail.ident().unwrap();
        let reread = store.mail(ident).unwrap().unwrap();
        assert_eq!(reread.tags(), &tags(&["urgent"]));
    }

    #[test]
    fn test_add_and_remove() {
        let (store, mailbox) = inbox_with_three();
        let trash = Mailbox::new("TRASH", store.clone());
        let mail = mailbox.mails().unwrap().remove(0);
        let ident = trash.add(&mail).unwrap();
        assert!(trash.mail(&ident).unwrap().is_some());
        trash.remove(&ident).unwrap();
        assert!(store.mail(&ident).unwrap().is_none());
        assert!(matches!(trash.remove(&ident), Err(MailError::NotFound(_))));
    }
}
