//! Email address parsing (RFC 5322 §3.4) and address-list normalization.

use crate::parser::header::single_line;

/// A parsed email address.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Parse a single email address from a header value.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    ///
    /// If parsing fails, the raw string is stored as `address`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self {
                display_name: String::new(),
                address: String::new(),
            };
        }

        if let Some(angle_start) = trimmed.rfind('<') {
            if let Some(angle_end) = trimmed.rfind('>') {
                if angle_end > angle_start {
                    let addr = trimmed[angle_start + 1..angle_end].trim().to_string();
                    let name_part = trimmed[..angle_start].trim();
                    return Self {
                        display_name: strip_quotes(name_part),
                        address: addr,
                    };
                }
            }
        }

        Self {
            display_name: String::new(),
            address: trimmed.to_string(),
        }
    }

    /// Parse a comma-separated list of addresses.
    ///
    /// Handles quoted commas: `"Last, First" <a@b.com>, other@c.com`
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let mut results = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut in_angle = false;

        for ch in raw.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(ch);
                }
                '<' if !in_quotes => {
                    in_angle = true;
                    current.push(ch);
                }
                '>' if !in_quotes => {
                    in_angle = false;
                    current.push(ch);
                }
                ',' if !in_quotes && !in_angle => {
                    let addr = Self::parse(&current);
                    if !addr.address.is_empty() {
                        results.push(addr);
                    }
                    current.clear();
                }
                _ => current.push(ch),
            }
        }

        let addr = Self::parse(&current);
        if !addr.address.is_empty() {
            results.push(addr);
        }

        results
    }

    /// Format for display: `"Display Name <address>"` or just `"address"`.
    ///
    /// Display names carrying list separators are quoted so the result
    /// never contains a bare comma.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else if self
            .display_name
            .contains(|c: char| matches!(c, ',' | ';' | '<' | '>' | '"'))
        {
            let escaped = self.display_name.replace('"', "\\\"");
            format!("\"{escaped}\" <{}>", self.address)
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }

    /// Case-insensitive comparison of the bare addresses.
    pub fn same_mailbox(&self, other: &str) -> bool {
        let other = EmailAddress::parse(other);
        self.address.eq_ignore_ascii_case(&other.address)
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Normalize a raw address-bearing header value into clean address strings.
///
/// Folded line breaks are collapsed, the value is split on unquoted commas,
/// and repeated addresses (same bare address, case-insensitive) keep only
/// their first occurrence.
pub fn normalize_address_list(raw: &str) -> Vec<String> {
    let unfolded = single_line(raw);
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();

    for addr in EmailAddress::parse_list(&unfolded) {
        let key = addr.address.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        result.push(addr.display());
    }

    result
}

/// Normalize a list of already-separated values (e.g. from a JSON array),
/// which may themselves carry folded or comma-joined entries.
pub fn normalize_address_values<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let joined = values
        .iter()
        .map(|v| v.as_ref())
        .filter(|v| !v.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    normalize_address_list(&joined)
}
