//! Core data model: stored documents, the reconciled mail entity, tags and flags.

pub mod address;
pub mod documents;
pub mod flags;
pub mod input;
pub mod mail;
pub mod tags;
