//! `tagbox`: the mail reconciliation and tagging core of a webmail backend.
//!
//! A mail is stored as three independent documents (flags, headers, body).
//! This crate reconciles them into one [`model::mail::Mail`], keeps the tag
//! set that doubles as virtual-mailbox membership consistent, and renders
//! mails to the JSON the UI consumes and to MIME for sending.

pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod mailbox;
pub mod model;
pub mod parser;
pub mod search;
pub mod service;
pub mod store;
