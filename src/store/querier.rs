//! The narrow contract through which mails are read from and written to
//! the document store.

use crate::error::Result;
use crate::model::mail::Mail;

/// A change the store reports after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A mail was created or updated and is now filed under `mailbox`.
    Saved { ident: String, mailbox: String },
    /// A mail was deleted.
    Removed { ident: String },
}

/// Callback invoked for every [`StoreEvent`]. Returning `false`
/// unsubscribes it.
pub type StoreListener = Box<dyn Fn(&StoreEvent) -> bool + Send + Sync>;

/// Document store operations used by the mailbox layer.
///
/// Mails returned by reads are not bound to the querier; callers that
/// hold an `Arc<dyn Querier>` bind them with [`Mail::bound_to`].
/// Failures of the store itself surface as
/// [`MailError::StoreUnavailable`](crate::error::MailError::StoreUnavailable)
/// and are never retried here.
pub trait Querier: Send + Sync {
    /// Every mail filed under `mailbox_name` (case-insensitive), in store order.
    fn all_mails_by_mailbox(&self, mailbox_name: &str) -> Result<Vec<Mail>>;

    /// Look a mail up by ident. Absence is `Ok(None)`.
    fn mail(&self, ident: &str) -> Result<Option<Mail>>;

    /// Persist a new mail under `mailbox_name` and return its ident.
    fn create_mail(&self, mail: &Mail, mailbox_name: &str) -> Result<String>;

    /// Write the current state of an existing mail back to the store.
    fn save_mail(&self, mail: &Mail) -> Result<()>;

    fn remove_mail(&self, mail: &Mail) -> Result<()>;

    /// Register for change notifications. Returns `false` when the store
    /// does not publish events.
    fn subscribe(&self, _listener: StoreListener) -> bool {
        false
    }
}
