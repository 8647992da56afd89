//! IMAP-style flags and the status vocabulary derived from them.

use serde::{Deserialize, Serialize};

pub const SEEN: &str = "\\Seen";
pub const ANSWERED: &str = "\\Answered";
pub const FLAGGED: &str = "\\Flagged";
pub const DELETED: &str = "\\Deleted";
pub const DRAFT: &str = "\\Draft";
pub const RECENT: &str = "\\Recent";

/// A status surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Read,
    Replied,
    Starred,
    Deleted,
    Draft,
    Recent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Read => "read",
            Status::Replied => "replied",
            Status::Starred => "starred",
            Status::Deleted => "deleted",
            Status::Draft => "draft",
            Status::Recent => "recent",
        }
    }

    /// Map a stored flag to its status. Unknown flags have none.
    pub fn from_flag(flag: &str) -> Option<Self> {
        let status = match flag.to_ascii_lowercase().as_str() {
            "\\seen" => Status::Read,
            "\\answered" => Status::Replied,
            "\\flagged" => Status::Starred,
            "\\deleted" => Status::Deleted,
            "\\draft" => Status::Draft,
            "\\recent" => Status::Recent,
            _ => return None,
        };
        Some(status)
    }
}

/// The flag list of one mail, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flags(Vec<String>);

impl Flags {
    pub fn new(flags: Vec<String>) -> Self {
        let mut result = Self::default();
        for flag in flags {
            result.insert(&flag);
        }
        result
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.0.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    /// Add a flag. Returns `false` if it was already set.
    pub fn insert(&mut self, flag: &str) -> bool {
        if self.contains(flag) {
            return false;
        }
        self.0.push(flag.to_string());
        true
    }

    /// Remove a flag. Returns `false` if it was not set.
    pub fn remove(&mut self, flag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|f| !f.eq_ignore_ascii_case(flag));
        self.0.len() != before
    }

    /// Statuses for the recognized flags, in stored order.
    pub fn status(&self) -> Vec<Status> {
        self.0.iter().filter_map(|f| Status::from_flag(f)).collect()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ignores_unknown_flags() {
        let flags = Flags::new(vec![
            RECENT.to_string(),
            "List".to_string(),
            "$Junk".to_string(),
            SEEN.to_string(),
        ]);
        assert_eq!(flags.status(), vec![Status::Recent, Status::Read]);
    }

    #[test]
    fn test_insert_and_remove_are_idempotent() {
        let mut flags = Flags::default();
        assert!(flags.insert(SEEN));
        assert!(!flags.insert("\\seen"));
        assert_eq!(flags.as_slice(), &[SEEN.to_string()]);
        assert!(flags.remove(SEEN));
        assert!(!flags.remove(SEEN));
        assert!(flags.as_slice().is_empty());
    }

    #[test]
    fn test_new_drops_duplicate_flags() {
        let flags = Flags::new(vec![SEEN.into(), SEEN.into(), FLAGGED.into()]);
        assert_eq!(flags.as_slice().len(), 2);
    }
}
