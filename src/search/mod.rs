//! Search support: the tag index and the background indexer feeding it.

pub mod index;
pub mod listener;

pub use index::{TagCount, TagIndex};
pub use listener::MailboxIndexer;
