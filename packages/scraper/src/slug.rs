//! Offering-name slugification.
//!
//! GMP pages live under URLs derived from the offering's display name, so
//! `"Patel Retail Ltd"` becomes `patel-retail`. The pipeline:
//!
//! 1. Strip one trailing corporate-form word (`Ltd`, `Limited`, ...)
//! 2. Trim and lowercase
//! 3. Drop everything outside `[a-z0-9\s-]`
//! 4. Collapse whitespace and hyphen runs into single hyphens
//! 5. Trim hyphens from both ends

use regex::Regex;
use std::sync::LazyLock;

/// A single trailing corporate-form word, preceded by whitespace.
static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s+(?:Limited|Ltd|Industries|Corporation|Company|Enterprises|Private|Public)\s*$",
    )
    .expect("valid regex")
});

static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid regex"));

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]*\s[\s-]*|-{2,}").expect("valid regex"));

/// Converts an offering display name into a URL slug.
///
/// Never fails; input that contains nothing slug-worthy yields an empty
/// string.
#[must_use]
pub fn slugify(name: &str) -> String {
    let stripped = SUFFIX_RE.replace(name, "");
    let lower = stripped.trim().to_lowercase();
    let cleaned = DISALLOWED_RE.replace_all(&lower, "");
    let hyphenated = SEPARATOR_RE.replace_all(&cleaned, "-");
    hyphenated.trim_matches('-').to_owned()
}
