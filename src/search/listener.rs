//! Background indexer: keeps a [`TagIndex`] current from store events.
//!
//! The indexer owns one worker thread fed through an mpsc channel. Store
//! events and reindex requests are queued and applied in order; failures
//! are logged and the index is simply left stale. Nothing on the request
//! path ever waits on the worker.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::model::tags;
use crate::search::index::TagIndex;
use crate::store::querier::{Querier, StoreEvent};

/// How long [`MailboxIndexer::sync`] waits for the worker.
const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

enum Command {
    Event(StoreEvent),
    Reindex(String),
    Barrier(Sender<()>),
    Shutdown,
}

pub struct MailboxIndexer {
    commands: Sender<Command>,
    watched: Arc<RwLock<BTreeSet<String>>>,
    index: Arc<RwLock<TagIndex>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MailboxIndexer {
    /// Start the worker and subscribe it to `querier`'s change events.
    pub fn start(querier: Arc<dyn Querier>) -> Self {
        let (tx, rx) = mpsc::channel();
        let watched = Arc::new(RwLock::new(BTreeSet::new()));
        let index = Arc::new(RwLock::new(TagIndex::new()));

        let events = Mutex::new(tx.clone());
        // Once the worker is gone the send fails and the store drops us.
        let subscribed = querier.subscribe(Box::new(move |event| match events.lock() {
            Ok(sender) => sender.send(Command::Event(event.clone())).is_ok(),
            Err(_) => false,
        }));
        if !subscribed {
            warn!("Store publishes no change events; index refreshes on reindex only");
        }

        let worker = {
            let watched = Arc::clone(&watched);
            let index = Arc::clone(&index);
            thread::Builder::new()
                .name("tagbox-indexer".into())
                .spawn(move || worker_loop(querier, rx, watched, index))
        };
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Could not start indexer thread; index stays empty");
                None
            }
        };

        Self {
            commands: tx,
            watched,
            index,
            worker: Mutex::new(worker),
        }
    }

    /// Start indexing a mailbox. Returns `false` if it was already watched.
    pub fn listen(&self, mailbox_name: &str) -> bool {
        let tag = tags::mailbox_tag(mailbox_name);
        let added = match self.watched.write() {
            Ok(mut watched) => watched.insert(tag.clone()),
            Err(_) => false,
        };
        if added {
            info!(mailbox = %tag, "Indexer listening to mailbox");
            let _ = self.commands.send(Command::Reindex(tag));
        }
        added
    }

    pub fn is_listening(&self, mailbox_name: &str) -> bool {
        self.watched
            .read()
            .map(|w| w.contains(&tags::mailbox_tag(mailbox_name)))
            .unwrap_or(false)
    }

    /// Snapshot of the current index.
    pub fn index(&self) -> TagIndex {
        self.index.read().map(|i| i.clone()).unwrap_or_default()
    }

    /// Wait until every queued command has been applied. Returns `false`
    /// when the worker is gone or does not answer in time.
    pub fn sync(&self) -> bool {
        let (tx, rx) = mpsc::channel();
        if self.commands.send(Command::Barrier(tx)).is_err() {
            return false;
        }
        rx.recv_timeout(SYNC_TIMEOUT).is_ok()
    }
}

impl Drop for MailboxIndexer {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Ok(mut worker) = self.worker.lock() {
            if let Some(handle) = worker.take() {
                let _ = handle.join();
            }
        }
    }
}

fn worker_loop(
    querier: Arc<dyn Querier>,
    rx: Receiver<Command>,
    watched: Arc<RwLock<BTreeSet<String>>>,
    index: Arc<RwLock<TagIndex>>,
) {
    debug!("Indexer started");
    while let Ok(command) = rx.recv() {
        match command {
            Command::Event(StoreEvent::Saved { ident, mailbox }) => {
                let is_watched = watched.read().map(|w| w.contains(&mailbox)).unwrap_or(false);
                if !is_watched {
                    // Moved out of every indexed mailbox.
                    if let Ok(mut index) = index.write() {
                        index.remove(&ident);
                    }
                    continue;
                }
                match querier.mail(&ident) {
                    Ok(Some(mail)) => {
                        if let Ok(mut index) = index.write() {
                            index.upsert(&mail);
                        }
                    }
                    Ok(None) => debug!(ident = %ident, "Saved mail vanished before indexing"),
                    Err(e) => warn!(ident = %ident, error = %e, "Indexing failed"),
                }
            }
            Command::Event(StoreEvent::Removed { ident }) => {
                if let Ok(mut index) = index.write() {
                    index.remove(&ident);
                }
            }
            Command::Reindex(mailbox) => match querier.all_mails_by_mailbox(&mailbox) {
                Ok(mails) => {
                    debug!(mailbox = %mailbox, count = mails.len(), "Reindexed mailbox");
                    if let Ok(mut index) = index.write() {
                        index.replace_mailbox(&mailbox, &mails);
                    }
                }
                Err(e) => warn!(mailbox = %mailbox, error = %e, "Reindex failed"),
            },
            Command::Barrier(done) => {
                let _ = done.send(());
            }
            Command::Shutdown => break,
        }
    }
    debug!("Indexer stopped");
}
