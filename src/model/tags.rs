//! Tag sets and the virtual-mailbox classification they carry.
//!
//! A mailbox is not a place: a mail belongs to a mailbox because its tag
//! set holds that mailbox's lower-cased name. The set therefore has two
//! roles, free-form labels and exactly one classification tag, and the
//! classification can only be changed through [`TagSet::classify`].

use std::collections::BTreeSet;

pub const INBOX: &str = "inbox";
pub const DRAFTS: &str = "drafts";
pub const SENT: &str = "sent";
pub const TRASH: &str = "trash";

/// Wildcard accepted by tag queries: matches every mail of a mailbox.
pub const ALL: &str = "all";

/// Tags that name the reserved mailboxes.
pub const RESERVED: [&str; 4] = [INBOX, DRAFTS, SENT, TRASH];

pub fn is_reserved(tag: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(tag))
}

/// Classification tag for a mailbox name (`"INBOX"` → `"inbox"`).
pub fn mailbox_tag(mailbox_name: &str) -> String {
    mailbox_name.trim().to_lowercase()
}

/// The tags of one mail: custom labels plus the classification tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    classification: Option<String>,
    custom: BTreeSet<String>,
}

impl TagSet {
    /// Build a tag set filed under `mailbox_name`. Reserved names among
    /// `custom` are dropped: they would contradict the classification.
    pub fn classified<I, S>(mailbox_name: &str, custom: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.replace_custom(custom);
        set.classify(mailbox_name);
        set
    }

    /// The classification tag, if any.
    pub fn mailbox(&self) -> Option<&str> {
        self.classification.as_deref()
    }

    /// The free-form labels, classification excluded.
    pub fn custom(&self) -> &BTreeSet<String> {
        &self.custom
    }

    /// Every tag, classification included.
    pub fn all(&self) -> BTreeSet<String> {
        let mut all = self.custom.clone();
        if let Some(ref c) = self.classification {
            all.insert(c.clone());
        }
        all
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.classification.as_deref() == Some(tag) || self.custom.contains(tag)
    }

    /// `true` when at least one requested tag is present (union semantics).
    pub fn intersects(&self, requested: &BTreeSet<String>) -> bool {
        requested.iter().any(|t| self.contains(t))
    }

    /// Replace the custom labels. The classification is left alone.
    pub fn replace_custom<I, S>(&mut self, tags: I) -> &BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.custom = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty() && !is_reserved(t))
            .collect();
        &self.custom
    }

    /// Drop every tag, classification included.
    pub fn clear(&mut self) {
        self.classification = None;
        self.custom.clear();
    }

    /// File the set under `mailbox_name`, replacing any previous classification.
    pub fn classify(&mut self, mailbox_name: &str) {
        let tag = mailbox_tag(mailbox_name);
        self.custom.remove(&tag);
        self.classification = Some(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_classified_drops_reserved_custom_tags() {
        let tags = TagSet::classified("INBOX", ["work", "trash", "Sent"]);
        assert_eq!(tags.mailbox(), Some("inbox"));
        assert_eq!(tags.custom(), &set(&["work"]));
        assert_eq!(tags.all(), set(&["inbox", "work"]));
    }

    #[test]
    fn test_replace_custom_keeps_classification() {
        let mut tags = TagSet::classified("DRAFTS", ["a"]);
        tags.replace_custom(["b", "c"]);
        assert_eq!(tags.mailbox(), Some("drafts"));
        assert_eq!(tags.custom(), &set(&["b", "c"]));
    }

    #[test]
    fn test_classify_replaces_previous_mailbox() {
        let mut tags = TagSet::classified("INBOX", ["archive"]);
        tags.classify("ARCHIVE");
        assert_eq!(tags.mailbox(), Some("archive"));
        assert!(tags.custom().is_empty());
        assert!(!tags.contains("inbox"));
    }

    #[test]
    fn test_intersects_is_a_union() {
        let tags = TagSet::classified("INBOX", ["work"]);
        assert!(tags.intersects(&set(&["work", "home"])));
        assert!(tags.intersects(&set(&["inbox"])));
        assert!(!tags.intersects(&set(&["home"])));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut tags = TagSet::classified("SENT", ["x"]);
        tags.clear();
        assert_eq!(tags.mailbox(), None);
        assert!(tags.all().is_empty());
    }
}
