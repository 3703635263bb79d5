/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Pure version logic: extract a comparable version string
    from a release tag and order two dotted version strings.

  Security / Safety Notes:
    Pure string handling; no I/O performed in this module.

  Dependencies:
    regex + once_cell for the tag pattern.

  Operational Scope:
    Called by the checker on every release fetch. Malformed
    input degrades to "not newer" rather than failing, so a
    bad upstream tag can never abort a check.

  Revision History:
    2025-06-12 COD  Authored version extraction and ordering.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Total functions over panicking parsers
    - Deterministic ordering semantics
    - Exhaustive unit coverage for boundary cases
============================================================*/

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v?(\d+\.\d+\.\d+)").expect("tag version pattern is valid"));

/// Extract a version string from a release tag.
///
/// The first `v?<int>.<int>.<int>` substring wins (`"release-2.0.0-beta"`
/// yields `"2.0.0"`). Tags without a numeric triple fall back to the whole
/// tag with a single leading `v` stripped.
pub fn extract_version(tag: &str) -> String {
    if let Some(captures) = TAG_VERSION.captures(tag) {
        return captures[1].to_string();
    }
    tag.strip_prefix('v').unwrap_or(tag).to_string()
}

/// Strict "candidate is newer than baseline" ordering over dotted
/// version strings.
///
/// Segments are compared most-significant first across the longer of the
/// two segment counts; a missing or non-numeric segment counts as 0, so
/// `"1.2.1"` is newer than `"1.2"` and a garbage candidate is never newer.
/// Equal versions are not newer.
pub fn is_newer_version(candidate: &str, baseline: &str) -> bool {
    let candidate_parts: Vec<u64> = candidate.split('.').map(parse_segment).collect();
    let baseline_parts: Vec<u64> = baseline.split('.').map(parse_segment).collect();

    let length = candidate_parts.len().max(baseline_parts.len());
    for index in 0..length {
        let left = candidate_parts.get(index).copied().unwrap_or(0);
        let right = baseline_parts.get(index).copied().unwrap_or(0);
        if left > right {
            return true;
        }
        if left < right {
            return false;
        }
    }
    false
}

fn parse_segment(segment: &str) -> u64 {
    segment.trim().parse::<u64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_patch() {
        assert!(is_newer_version("0.3.2", "0.3.1"));
    }

    #[test]
    fn newer_minor() {
        assert!(is_newer_version("0.4.0", "0.3.9"));
    }

    #[test]
    fn newer_major_beats_high_minor() {
        assert!(is_newer_version("2.0.0", "1.9.9"));
    }

    #[test]
    fn same_version_is_not_newer() {
        assert!(!is_newer_version("0.3.1", "0.3.1"));
        assert!(!is_newer_version("1.4.0", "1.4.0"));
    }

    #[test]
    fn older_version_is_not_newer() {
        assert!(!is_newer_version("0.3.0", "0.3.1"));
        assert!(!is_newer_version("0.9.9", "1.0.0"));
    }

    #[test]
    fn shorter_baseline_pads_with_zero() {
        assert!(is_newer_version("1.2.1", "1.2"));
        assert!(!is_newer_version("1.2", "1.2.1"));
    }

    #[test]
    fn trailing_zero_padding_is_equal() {
        assert!(!is_newer_version("1.2.0", "1.2"));
        assert!(!is_newer_version("1.2", "1.2.0"));
    }

    #[test]
    fn non_numeric_segments_count_as_zero() {
        assert!(!is_newer_version("latest", "1.0.0"));
        assert!(is_newer_version("1.0.0", "latest"));
        assert!(!is_newer_version("a.b.c", "x.y.z"));
    }

    #[test]
    fn extracts_plain_triple() {
        assert_eq!(extract_version("1.4.0"), "1.4.0");
    }

    #[test]
    fn extracts_v_prefixed_triple() {
        assert_eq!(extract_version("v1.4.0"), "1.4.0");
    }

    #[test]
    fn extracts_first_triple_from_decorated_tag() {
        assert_eq!(extract_version("release-2.0.0-beta"), "2.0.0");
    }

    #[test]
    fn falls_back_to_whole_tag() {
        assert_eq!(extract_version("latest"), "latest");
        assert_eq!(extract_version("vnext"), "next");
    }
}
