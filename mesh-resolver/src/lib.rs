//! Pure functions mapping a dependency descriptor (or a discovery-query
//! filter) to matching agents/capabilities.
//!
//! Everything in this crate is deterministic and does no I/O: given the same
//! `(descriptor, agent snapshot)` it returns byte-identical output every
//! time. The Registry API (`mesh-registry`) is the only caller that mutates
//! anything; this crate only ever reads.

#![warn(missing_docs, clippy::pedantic)]

mod filter;
mod resolve;

pub use filter::{AgentFilter, CapabilityFilter};
pub use resolve::resolve_dependency;

/// Computes a normalized case-insensitive substring/edit-distance score used
/// by fuzzy discovery queries. Lower is a better match; `None` means no
/// match at all (the needle is not a substring and is not within 2 edits of
/// any substring-positioned window).
///
/// This is deliberately a small hand-rolled Levenshtein implementation
/// rather than a dependency: the alphabet is plain UTF-8 agent/capability
/// names and the inputs are short, so a crate buys nothing here.
#[must_use]
pub fn fuzzy_score(haystack: &str, needle: &str) -> Option<i64> {
    let haystack_lower = haystack.to_lowercase();
    let needle_lower = needle.to_lowercase();

    if needle_lower.is_empty() {
        return Some(0);
    }

    if let Some(pos) = haystack_lower.find(&needle_lower) {
        // Exact substring: score favors earlier, shorter matches.
        return Some(-((haystack_lower.len() - needle_lower.len()) as i64) - pos as i64);
    }

    let distance = edit_distance(&haystack_lower, &needle_lower);
    let max_len = haystack_lower.chars().count().max(needle_lower.chars().count());
    if max_len == 0 {
        return Some(0);
    }
    // Accept only reasonably close matches; otherwise this is noise.
    if distance * 3 > max_len {
        return None;
    }
    Some(-(1000 + distance as i64))
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut prev_diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cur = row[j + 1];
            row[j + 1] = if ca == cb {
                prev_diag
            } else {
                1 + prev_diag.min(row[j]).min(row[j + 1])
            };
            prev_diag = cur;
        }
    }

    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzzy_score_prefers_substring_match() {
        let exact = fuzzy_score("greeting-service", "greet").unwrap();
        let fuzzy = fuzzy_score("gereting-service", "greet").unwrap();
        assert!(exact > fuzzy, "substring match should outrank edit-distance match");
    }

    #[test]
    fn fuzzy_score_rejects_unrelated_strings() {
        assert!(fuzzy_score("greeting-service", "xyzxyzxyz").is_none());
    }

    #[test]
    fn edit_distance_known_values() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("paris", "paris"), 0);
    }
}
