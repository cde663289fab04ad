//! Server version numbers

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Version of a FOSSology server
///
/// Development checkouts report `unknown`; those are treated as newer than
/// any release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ServerVersion {
    Unknown,
    Release(Vec<u64>),
}

impl ServerVersion {
    /// Parse `3.6.0`, `3.6.0-rc1`, `3.5.0-12-gabcdef` or `unknown`
    ///
    /// Returns `None` when the text does not start with a number.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("unknown") {
            return Some(ServerVersion::Unknown);
        }

        let mut parts = Vec::new();
        for piece in text.split('.') {
            let digits: String = piece.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                break;
            }
            parts.push(digits.parse().ok()?);
            if digits.len() != piece.len() {
                break;
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(ServerVersion::Release(parts))
        }
    }

    /// Whether this server is at least `minimum` (e.g. `"3.5.0"`)
    pub fn is_at_least(&self, minimum: &str) -> bool {
        match (self, ServerVersion::parse(minimum)) {
            (ServerVersion::Unknown, _) => true,
            (_, None) => true,
            (_, Some(ServerVersion::Unknown)) => false,
            (ServerVersion::Release(have), Some(ServerVersion::Release(want))) => {
                compare_parts(have, &want) != Ordering::Less
            }
        }
    }
}

fn compare_parts(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerVersion::Unknown => write!(f, "unknown"),
            ServerVersion::Release(parts) => {
                let joined: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", joined.join("."))
            }
        }
    }
}
