//! Validated exit-relay address set

use serde::Serialize;
use std::collections::HashSet;
use std::collections::hash_set;

use crate::error::InvalidAddress;

/// Check a candidate against the IPv4 dotted-quad grammar
///
/// Exactly four dot-separated segments, each a non-empty run of ASCII
/// digits whose value is in [0, 255]. Leading zeros are accepted.
pub fn is_ipv4(candidate: &str) -> bool {
    let mut segments = 0;

    for segment in candidate.split('.') {
        segments += 1;
        if segments > 4 {
            return false;
        }

        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        match segment.parse::<u32>() {
            Ok(value) if value <= 255 => {}
            _ => return false,
        }
    }

    segments == 4
}

/// Result of parsing a newline-separated address list
#[derive(Debug, Default)]
pub struct ParsedList {
    /// Lines that passed validation
    pub addresses: AddressSet,
    /// Non-blank lines that failed validation, trimmed
    pub rejected: Vec<String>,
}

/// A set of textual IPv4 addresses
///
/// Every member satisfies [`is_ipv4`]. An empty set means "no data",
/// not "no relays".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressSet {
    inner: HashSet<String>,
}

impl AddressSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse newline-separated text, skipping blank and malformed lines
    pub fn parse_lines(text: &str) -> ParsedList {
        let mut parsed = ParsedList::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if is_ipv4(line) {
                parsed.addresses.inner.insert(line.to_string());
            } else {
                parsed.rejected.push(line.to_string());
            }
        }

        parsed
    }

    /// Build a set from candidates, failing on the first invalid one
    pub fn try_from_iter<I, S>(iter: I) -> Result<Self, InvalidAddress>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for address in iter {
            set.insert(address)?;
        }
        Ok(set)
    }

    /// Insert an address; returns whether it was newly added
    pub fn insert(&mut self, address: impl Into<String>) -> Result<bool, InvalidAddress> {
        let address = address.into();
        if !is_ipv4(&address) {
            return Err(InvalidAddress(address));
        }
        Ok(self.inner.insert(address))
    }

    pub fn contains(&self, address: &str) -> bool {
        self.inner.contains(address)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, String> {
        self.inner.iter()
    }

    /// Members in ascending lexical order
    pub fn sorted(&self) -> Vec<&str> {
        let mut addresses: Vec<&str> = self.inner.iter().map(String::as_str).collect();
        addresses.sort_unstable();
        addresses
    }

    /// Render as newline-terminated text, one address per line, sorted
    pub fn to_lines(&self) -> String {
        let mut out = String::with_capacity(self.inner.len() * 16);
        for address in self.sorted() {
            out.push_str(address);
            out.push('\n');
        }
        out
    }
}

impl<'a> IntoIterator for &'a AddressSet {
    type Item = &'a String;
    type IntoIter = hash_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
