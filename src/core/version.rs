//! Version identifiers for package references.
//!
//! A version is a numeric core of one to four components plus an optional
//! free-text label (`1.2.0-beta1`). Only the numeric core takes part in
//! equality and ordering; the label is descriptive.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::FinderError;

/// Maximum number of numeric components.
pub const MAX_COMPONENTS: usize = 4;

/// A parsed version: numeric core plus descriptive label.
#[derive(Debug, Clone)]
pub struct VersionIdentifier {
    numeric: Vec<u64>,
    label: String,
}

impl VersionIdentifier {
    /// Parse a version string such as `1.2`, `4.0.1.7` or `1.2.0-beta1`.
    pub fn parse(text: &str) -> Result<Self, FinderError> {
        let text = text.trim();
        let malformed = |message: &str| FinderError::MalformedVersion {
            input: text.to_string(),
            message: message.to_string(),
        };

        let (core, label) = match text.split_once('-') {
            Some((core, label)) => (core, label),
            None => (text, ""),
        };

        if core.is_empty() {
            return Err(malformed("missing numeric component"));
        }

        let mut numeric = Vec::with_capacity(MAX_COMPONENTS);
        for segment in core.split('.') {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed(&format!("`{}` is not a number", segment)));
            }
            let value = segment
                .parse::<u64>()
                .map_err(|e| malformed(&e.to_string()))?;
            numeric.push(value);
        }

        if numeric.len() > MAX_COMPONENTS {
            return Err(malformed("more than 4 numeric components"));
        }

        Ok(VersionIdentifier {
            numeric,
            label: label.to_string(),
        })
    }

    /// The numeric components as written (not padded).
    pub fn numeric(&self) -> &[u64] {
        &self.numeric
    }

    /// The label after the first `-`, or an empty string.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the version carries a label.
    pub fn is_prerelease(&self) -> bool {
        !self.label.is_empty()
    }

    /// Compare numeric cores, padding the shorter one with zeros.
    pub fn compare(a: &VersionIdentifier, b: &VersionIdentifier) -> Ordering {
        (0..MAX_COMPONENTS)
            .map(|i| {
                let x = a.numeric.get(i).copied().unwrap_or(0);
                let y = b.numeric.get(i).copied().unwrap_or(0);
                x.cmp(&y)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Numeric core without trailing zeros; equal versions share it.
    fn significant(&self) -> &[u64] {
        let len = self
            .numeric
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |i| i + 1);
        &self.numeric[..len]
    }
}

impl PartialEq for VersionIdentifier {
    fn eq(&self, other: &Self) -> bool {
        Self::compare(self, other) == Ordering::Equal
    }
}

impl Eq for VersionIdentifier {}

impl PartialOrd for VersionIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        Self::compare(self, other)
    }
}

impl Hash for VersionIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl fmt::Display for VersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, n) in self.numeric.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", n)?;
        }
        if !self.label.is_empty() {
            write!(f, "-{}", self.label)?;
        }
        Ok(())
    }
}

impl FromStr for VersionIdentifier {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionIdentifier::parse(s)
    }
}

impl Serialize for VersionIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
