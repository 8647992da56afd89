//! Decoding of stored mail: header values, dates, and MIME bodies.

pub mod header;
pub mod mime;
