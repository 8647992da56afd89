//! The account's set of virtual mailboxes.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::error::{MailError, Result};
use crate::mailbox::mailbox::Mailbox;
use crate::model::mail::Mail;
use crate::model::tags;
use crate::search::listener::MailboxIndexer;
use crate::store::querier::Querier;

/// Registry of an account's mailboxes.
///
/// Mailboxes are created lazily by [`Mailboxes::ensure_exists`]; wiring a
/// mailbox to the indexer is a separate step, [`Mailboxes::attach_listener`].
/// The reserved accessors do both.
pub struct Mailboxes {
    names: RwLock<Vec<String>>,
    querier: Arc<dyn Querier>,
    indexer: Option<Arc<MailboxIndexer>>,
}

impl Mailboxes {
    /// Create a registry holding the reserved mailboxes followed by `initial`.
    pub fn new<S: AsRef<str>>(
        querier: Arc<dyn Querier>,
        initial: &[S],
        indexer: Option<Arc<MailboxIndexer>>,
    ) -> Self {
        let mut names: Vec<String> = Vec::new();
        let reserved = tags::RESERVED.iter().map(|r| r.to_uppercase());
        for name in reserved.chain(initial.iter().map(|n| n.as_ref().trim().to_uppercase())) {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        Self {
            names: RwLock::new(names),
            querier,
            indexer,
        }
    }

    pub fn querier(&self) -> &Arc<dyn Querier> {
        &self.querier
    }

    pub fn indexer(&self) -> Option<&Arc<MailboxIndexer>> {
        self.indexer.as_ref()
    }

    /// Return the mailbox named `name`, registering it first if needed.
    pub fn ensure_exists(&self, name: &str) -> Result<Mailbox> {
        let upper = name.trim().to_uppercase();
        if upper.is_empty() {
            return Err(MailError::InvalidInput("empty mailbox name".into()));
        }
        let mut names = self
            .names
            .write()
            .map_err(|_| MailError::StoreUnavailable("mailbox registry lock poisoned".into()))?;
        if !names.contains(&upper) {
            info!(mailbox = %upper, "Creating mailbox");
            names.push(upper.clone());
        }
        Ok(Mailbox::new(&upper, Arc::clone(&self.querier)))
    }

    /// Have the indexer follow `mailbox`. Returns `false` when there is no
    /// indexer or it already follows the mailbox.
    pub fn attach_listener(&self, mailbox: &Mailbox) -> bool {
        match self.indexer {
            Some(ref indexer) => indexer.listen(mailbox.name()),
            None => false,
        }
    }

    /// [`ensure_exists`](Self::ensure_exists) followed by
    /// [`attach_listener`](Self::attach_listener).
    pub fn open(&self, name: &str) -> Result<Mailbox> {
        let mailbox = self.ensure_exists(name)?;
        self.attach_listener(&mailbox);
        Ok(mailbox)
    }

    pub fn inbox(&self) -> Result<Mailbox> {
        self.open(tags::INBOX)
    }

    pub fn drafts(&self) -> Result<Mailbox> {
        self.open(tags::DRAFTS)
    }

    pub fn trash(&self) -> Result<Mailbox> {
        self.open(tags::TRASH)
    }

    pub fn sent(&self) -> Result<Mailbox> {
        self.open(tags::SENT)
    }

    /// Every registered mailbox, reserved ones first, then in creation order.
    pub fn mailboxes(&self) -> Result<Vec<Mailbox>> {
        let names = self
            .names
            .read()
            .map_err(|_| MailError::StoreUnavailable("mailbox registry lock poisoned".into()))?
            .clone();
        Ok(names
            .iter()
            .map(|name| {
                let mailbox = Mailbox::new(name, Arc::clone(&self.querier));
                self.attach_listener(&mailbox);
                mailbox
            })
            .collect())
    }

    /// Mails matching `requested` in every mailbox, grouped by mailbox in
    /// enumeration order. No sorting happens here.
    pub fn mails_by_tag(&self, requested: &BTreeSet<String>) -> Result<Vec<Mail>> {
        let mut mails = Vec::new();
        for mailbox in self.mailboxes()? {
            mails.extend(mailbox.mails_by_tags(requested)?);
        }
        Ok(mails)
    }

    /// Account-wide lookup: the first mailbox holding `ident` wins.
    pub fn mail(&self, ident: &str) -> Result<Option<Mail>> {
        for mailbox in self.mailboxes()? {
            if let Some(mail) = mailbox.mail(ident)? {
                return Ok(Some(mail));
            }
        }
        Ok(None)
    }

    /// Move a mail to the trash: clear its tags, file it under TRASH, persist.
    ///
    /// Returns the moved mail, or `None` if no mailbox holds `ident`. A
    /// failed write leaves the stored mail untouched; the in-memory copy
    /// is dropped.
    pub fn move_to_trash(&self, ident: &str) -> Result<Option<Mail>> {
        let Some(mut mail) = self.mail(ident)? else {
            debug!(ident, "Nothing to move to trash");
            return Ok(None);
        };
        let trash = self.trash()?;
        mail.remove_all_tags();
        mail.set_mailbox(trash.name());
        mail.save()?;
        info!(ident, "Moved mail to trash");
        Ok(Some(mail))
    }
}
