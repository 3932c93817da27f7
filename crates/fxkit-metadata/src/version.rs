//! Markup format versions
//!
//! Dotted numeric versions ("1", "8.0.171"). Missing trailing components
//! compare as zero, so "8" == "8.0".

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MetadataError;

/// Markup format version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormatVersion(Vec<u32>);

impl FormatVersion {
    /// The first format version; everything without an explicit `since` has it
    pub fn initial() -> Self {
        Self(vec![1])
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Major component
    pub fn major(&self) -> u32 {
        self.0.first().copied().unwrap_or(0)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::initial()
    }
}

impl FromStr for FormatVersion {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MetadataError::InvalidVersion(s.to_string()));
        }
        s.split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|_| MetadataError::InvalidVersion(s.to_string()))
    }
}

impl TryFrom<String> for FormatVersion {
    type Error = MetadataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FormatVersion> for String {
    fn from(value: FormatVersion) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl Ord for FormatVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let a = self.0.get(i).copied().unwrap_or(0);
            let b = other.0.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for FormatVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FormatVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FormatVersion {}
