//! In-memory document store.
//!
//! Keeps each mail as its three documents and re-materializes entities
//! through [`Mail::reconcile`] on every read, so reads see exactly what a
//! document-backed store would hand back. Used by the CLI and tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use tracing::{debug, warn};

use crate::error::{MailError, Result};
use crate::model::documents::StoredDocuments;
use crate::model::mail::{documents_hash, Mail};
use crate::parser::header;
use crate::store::querier::{Querier, StoreEvent, StoreListener};

/// Documents of every mail, keyed by ident, in insertion order.
#[derive(Default)]
pub struct InMemoryStore {
    documents: RwLock<Vec<(String, StoredDocuments)>>,
    next_uid: AtomicU64,
    listeners: Mutex<Vec<StoreListener>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backing store going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a document triple as delivered by sync. The documents are
    /// validated by reconciling them once; the ident is the stored
    /// `chash` or the content hash.
    pub fn insert_documents(&self, mut docs: StoredDocuments) -> Result<String> {
        self.check_available()?;
        let mail = Mail::from_documents(&docs)?;
        let ident = mail.ident().unwrap_or_default().to_string();
        docs.flags.chash = Some(ident.clone());
        if docs.flags.uid == 0 {
            docs.flags.uid = self.next_uid();
        }
        let mailbox = mail.mailbox().to_string();
        self.upsert(ident.clone(), docs)?;
        self.notify(&StoreEvent::Saved {
            ident: ident.clone(),
            mailbox,
        });
        Ok(ident)
    }

    /// Import a raw RFC 5322 message into `mailbox_name`.
    pub fn import_raw(&self, raw: &str, mailbox_name: &str) -> Result<String> {
        let mut docs = StoredDocuments::default();
        docs.headers = header::headers_document_from_raw(raw);
        docs.body.raw = split_body(raw).to_string();
        docs.flags.mailbox = mailbox_name.to_uppercase();
        self.insert_documents(docs)
    }

    /// Number of subscribed change listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Stored documents of one mail, as last written.
    pub fn documents(&self, ident: &str) -> Result<Option<StoredDocuments>> {
        self.check_available()?;
        let docs = self.read_lock()?;
        Ok(docs
            .iter()
            .find(|(id, _)| id == ident)
            .map(|(_, d)| d.clone()))
    }

    fn next_uid(&self) -> u64 {
        self.next_uid.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn check_available(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(MailError::StoreUnavailable("store is offline".into()));
        }
        Ok(())
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<(String, StoredDocuments)>>> {
        self.documents
            .read()
            .map_err(|_| MailError::StoreUnavailable("document lock poisoned".into()))
    }

    fn write_lock(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, Vec<(String, StoredDocuments)>>> {
        self.documents
            .write()
            .map_err(|_| MailError::StoreUnavailable("document lock poisoned".into()))
    }

    fn upsert(&self, ident: String, docs: StoredDocuments) -> Result<()> {
        let mut all = self.write_lock()?;
        match all.iter_mut().find(|(id, _)| *id == ident) {
            Some(slot) => slot.1 = docs,
            None => all.push((ident, docs)),
        }
        Ok(())
    }

    fn notify(&self, event: &StoreEvent) {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|listener| listener(event));
                if listeners.len() < before {
                    debug!(dropped = before - listeners.len(), "Store listeners unsubscribed");
                }
            }
            Err(_) => warn!("Store listener registry poisoned, dropping event"),
        }
    }
}

impl Querier for InMemoryStore {
    fn all_mails_by_mailbox(&self, mailbox_name: &str) -> Result<Vec<Mail>> {
        self.check_available()?;
        let docs = self.read_lock()?;
        let mut mails = Vec::new();
        for (ident, stored) in docs.iter() {
            if !stored.flags.mailbox.eq_ignore_ascii_case(mailbox_name) {
                continue;
            }
            match Mail::from_documents(stored) {
                Ok(mail) => mails.push(mail),
                Err(e) if e.is_per_mail() => {
                    warn!(ident = %ident, error = %e, "Skipping unreadable mail");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(mailbox = mailbox_name, count = mails.len(), "Listed mailbox");
        Ok(mails)
    }

    fn mail(&self, ident: &str) -> Result<Option<Mail>> {
        self.check_available()?;
        let docs = self.read_lock()?;
        docs.iter()
            .find(|(id, _)| id == ident)
            .map(|(_, stored)| Mail::from_documents(stored))
            .transpose()
    }

    fn create_mail(&self, mail: &Mail, mailbox_name: &str) -> Result<String> {
        self.check_available()?;
        let mut mail = mail.clone();
        mail.set_mailbox(mailbox_name);
        let mut docs = mail.to_documents();
        let ident = match mail.ident() {
            Some(ident) => ident.to_string(),
            None => documents_hash(&docs.headers, &docs.body),
        };
        docs.flags.chash = Some(ident.clone());
        docs.flags.uid = self.next_uid();
        self.upsert(ident.clone(), docs)?;
        debug!(ident = %ident, mailbox = mailbox_name, "Created mail");
        self.notify(&StoreEvent::Saved {
            ident: ident.clone(),
            mailbox: mail.mailbox().to_string(),
        });
        Ok(ident)
    }

    fn save_mail(&self, mail: &Mail) -> Result<()> {
        self.check_available()?;
        let ident = mail
            .ident()
            .ok_or_else(|| MailError::NotFound("mail has no ident".into()))?;
        {
            let mut all = self.write_lock()?;
            let slot = all
                .iter_mut()
                .find(|(id, _)| id == ident)
                .ok_or_else(|| MailError::NotFound(ident.to_string()))?;
            let uid = slot.1.flags.uid;
            let mut docs = mail.to_documents();
            docs.flags.uid = uid;
            slot.1 = docs;
        }
        debug!(ident = %ident, mailbox = mail.mailbox(), "Saved mail");
        self.notify(&StoreEvent::Saved {
            ident: ident.to_string(),
            mailbox: mail.mailbox().to_string(),
        });
        Ok(())
    }

    fn remove_mail(&self, mail: &Mail) -> Result<()> {
        self.check_available()?;
        let ident = mail
            .ident()
            .ok_or_else(|| MailError::NotFound("mail has no ident".into()))?;
        {
            let mut all = self.write_lock()?;
            let before = all.len();
            all.retain(|(id, _)| id != ident);
            if all.len() == before {
                return Err(MailError::NotFound(ident.to_string()));
            }
        }
        debug!(ident = %ident, "Removed mail");
        self.notify(&StoreEvent::Removed {
            ident: ident.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self, listener: StoreListener) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                listeners.push(listener);
                true
            }
            Err(_) => false,
        }
    }
}

/// Everything after the first blank line of a raw message, whichever
/// line ending it uses.
fn split_body(raw: &str) -> &str {
    let crlf = raw.find("\r\n\r\n").map(|pos| pos + 4);
    let lf = raw.find("\n\n").map(|pos| pos + 2);
    match crlf.into_iter().chain(lf).min() {
        Some(start) => &raw[start..],
        None => "",
    }
}
