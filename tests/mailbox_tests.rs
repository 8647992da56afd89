//! Integration tests for tag queries, the mailbox registry and the indexer.

use std::collections::BTreeSet;
use std::sync::Arc;

use tagbox::mailbox::Mailboxes;
use tagbox::search::MailboxIndexer;
use tagbox::store::{InMemoryStore, Querier};

fn raw(subject: &str, date: &str, tags: &str) -> String {
    format!("Date: {date}\nFrom: someone@pixelated.org\nSubject: {subject}\nX-Tags: {tags}\n\n{subject}\n")
}

fn set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

fn subjects(mails: &[tagbox::model::mail::Mail]) -> Vec<String> {
    mails
        .iter()
        .filter_map(|m| m.headers().subject.clone())
        .collect()
}

/// Inbox: a (work), b (home), c (work, home). Sent: d (work).
fn populated() -> (Arc<InMemoryStore>, Mailboxes) {
    let store = Arc::new(InMemoryStore::new());
    let date = "Wed, 3 Sep 2014 12:36:17 -0300";
    store.import_raw(&raw("a", date, "[\"work\"]"), "INBOX").unwrap();
    store.import_raw(&raw("b", date, "[\"home\"]"), "INBOX").unwrap();
    store
        .import_raw(&raw("c", date, "[\"work\", \"home\"]"), "INBOX")
        .unwrap();
    store.import_raw(&raw("d", date, "[\"work\"]"), "SENT").unwrap();
    let registry = Mailboxes::new(store.clone(), &[] as &[&str], None);
    (store, registry)
}

#[test]
fn test_all_and_own_tag_are_unfiltered() {
    let (_, registry) = populated();
    let inbox = registry.inbox().unwrap();
    let everything = subjects(&inbox.mails().unwrap());
    assert_eq!(everything, vec!["a", "b", "c"]);
    assert_eq!(subjects(&inbox.mails_by_tags(&set(&["all"])).unwrap()), everything);
    assert_eq!(subjects(&inbox.mails_by_tags(&set(&["inbox"])).unwrap()), everything);
}

#[test]
fn test_custom_tag_selects_exact_subset() {
    let (_, registry) = populated();
    let inbox = registry.inbox().unwrap();
    assert_eq!(subjects(&inbox.mails_by_tags(&set(&["work"])).unwrap()), vec!["a", "c"]);
    assert_eq!(
        subjects(&inbox.mails_by_tags(&set(&["work", "home"])).unwrap()),
        vec!["a", "b", "c"]
    );
}

#[test]
fn test_registry_query_spans_mailboxes_in_order() {
    let (_, registry) = populated();
    assert_eq!(
        subjects(&registry.mails_by_tag(&set(&["work"])).unwrap()),
        vec!["a", "c", "d"]
    );
    assert_eq!(subjects(&registry.mails_by_tag(&set(&["sent"])).unwrap()), vec!["d"]);
}

#[test]
fn test_move_to_trash_leaves_exactly_one_mailbox() {
    let (store, registry) = populated();
    let ident = registry.inbox().unwrap().mails().unwrap()[2]
        .ident()
        .unwrap()
        .to_string();

    let moved = registry.move_to_trash(&ident).unwrap().unwrap();
    assert!(moved.tags().is_empty());
    assert_eq!(moved.mailbox(), "trash");

    let reread = store.mail(&ident).unwrap().unwrap();
    assert!(reread.tags().is_empty());
    assert_eq!(reread.mailbox(), "trash");

    let holders: Vec<String> = registry
        .mailboxes()
        .unwrap()
        .into_iter()
        .filter(|mb| mb.mail(&ident).unwrap().is_some())
        .map(|mb| mb.name().to_string())
        .collect();
    assert_eq!(holders, vec!["TRASH"]);
    assert!(registry.mails_by_tag(&set(&["work"])).unwrap().iter().all(|m| m.ident() != Some(ident.as_str())));
}

#[test]
fn test_account_wide_lookup() {
    let (store, registry) = populated();
    let sent = store.all_mails_by_mailbox("SENT").unwrap();
    let ident = sent[0].ident().unwrap();
    let found = registry.mail(ident).unwrap().unwrap();
    assert_eq!(found.mailbox(), "sent");
    assert!(registry.mail("no-such-mail").unwrap().is_none());
}

#[test]
fn test_listener_attachment_is_explicit() {
    let (store, _) = populated();
    let indexer = Arc::new(MailboxIndexer::start(store.clone()));
    let registry = Mailboxes::new(store.clone(), &["ARCHIVE"], Some(Arc::clone(&indexer)));

    let archive = registry.ensure_exists("archive").unwrap();
    assert!(!indexer.is_listening("ARCHIVE"));
    assert!(registry.attach_listener(&archive));
    assert!(indexer.is_listening("ARCHIVE"));
    assert!(!registry.attach_listener(&archive));
}

#[test]
fn test_indexer_follows_moves() {
    let (store, _) = populated();
    let indexer = Arc::new(MailboxIndexer::start(store.clone()));
    let registry = Mailboxes::new(store.clone(), &[] as &[&str], Some(Arc::clone(&indexer)));
    registry.mailboxes().unwrap();
    assert!(indexer.sync());

    let counts = indexer.index().tag_counts();
    assert_eq!(counts["inbox"].total, 3);
    assert_eq!(counts["work"].total, 3);

    let ident = registry.inbox().unwrap().mails().unwrap()[0]
        .ident()
        .unwrap()
        .to_string();
    registry.move_to_trash(&ident).unwrap();
    assert!(indexer.sync());

    let counts = indexer.index().tag_counts();
    assert_eq!(counts["inbox"].total, 2);
    assert_eq!(counts["trash"].total, 1);
    assert_eq!(counts["work"].total, 2);
}
