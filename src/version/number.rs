//! Dotted-numeric version ordering
//!
//! Versions are compared component by component as unsigned integers.
//! Each component contributes its leading decimal digits (`"3-rc1"` reads as
//! `3`, `"beta"` as `0`) and missing trailing components count as zero, so
//! `"1.2"` and `"1.2.0"` are equal.

use std::cmp::Ordering;

/// A parsed dotted-numeric version
#[derive(Debug, Clone, Eq)]
pub struct VersionNumber(Vec<u64>);

impl VersionNumber {
    pub fn parse(version: &str) -> Self {
        Self(version.split('.').map(leading_number).collect())
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

fn leading_number(component: &str) -> u64 {
    let digits: String = component
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    // Saturate absurdly long components instead of wrapping
    digits.parse().unwrap_or(if digits.is_empty() { 0 } else { u64::MAX })
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0);
                let b = other.0.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

/// Compare two dotted-numeric version strings
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    VersionNumber::parse(a).cmp(&VersionNumber::parse(b))
}
