//! Virtual mailboxes: tag-derived views over the store and the account registry.

#[allow(clippy::module_inception)]
pub mod mailbox;
pub mod registry;

pub use mailbox::Mailbox;
pub use registry::Mailboxes;
