//! Structural fingerprint of a device list.
//!
//! Two imports of the same panel produce the same fingerprint as long as
//! the reference codes and protection ratings match, whatever order the
//! devices were listed in and however their designations were worded.

use std::cmp::Ordering;

use crate::compiler::components::{ExtractedComponent, ParsedComponent};

/// Anything that carries a reference code and a protection rating
pub trait Fingerprint {
    fn repere(&self) -> &str;
    fn protection(&self) -> &str;
}

impl Fingerprint for ParsedComponent {
    fn repere(&self) -> &str {
        &self.repere
    }

    fn protection(&self) -> &str {
        &self.protection
    }
}

impl Fingerprint for ExtractedComponent {
    fn repere(&self) -> &str {
        &self.repere
    }

    fn protection(&self) -> &str {
        &self.protection
    }
}

/// Numeric sort key of a reference code: "Q2.1" -> (2, 1), "Q2" -> (2, -1).
///
/// A code without a leading integer sorts after every numbered code.
fn repere_key(repere: &str) -> (i64, i64) {
    let digits = repere.trim_start_matches(|c: char| c.is_alphabetic());
    let mut parts = digits.split('.');
    let major = parts
        .next()
        .and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(i64::MAX);
    let minor = parts
        .next()
        .and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(-1);
    (major, minor)
}

/// Numeric-aware ordering of reference codes, parents before children
pub fn compare_reperes(a: &str, b: &str) -> Ordering {
    repere_key(a).cmp(&repere_key(b)).then_with(|| a.cmp(b))
}

/// Upper-case with all whitespace removed
pub fn normalize_protection(protection: &str) -> String {
    protection
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Canonical signature of a device list
pub fn compute_fingerprint<T: Fingerprint>(components: &[T]) -> String {
    let mut segments: Vec<(&str, String)> = components
        .iter()
        .map(|c| (c.repere(), normalize_protection(c.protection())))
        .collect();

    segments.sort_by(|(ra, pa), (rb, pb)| compare_reperes(ra, rb).then_with(|| pa.cmp(pb)));

    segments
        .iter()
        .map(|(repere, protection)| format!("{}:{}", repere, protection))
        .collect::<Vec<_>>()
        .join("|")
}

/// Whether two device lists describe the same panel structure
pub fn same_structure<A: Fingerprint, B: Fingerprint>(a: &[A], b: &[B]) -> bool {
    compute_fingerprint(a) == compute_fingerprint(b)
}
