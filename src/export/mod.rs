//! Outbound rendering: MIME multipart messages and the SMTP hand-off.

pub mod mime;
pub mod smtp;
