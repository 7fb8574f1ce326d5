// src/authors.rs
// Byline parsing: raw provider strings like "By John Doe, Jane Smith and
// Bob Lee" become an ordered, deduplicated list of display names.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::text::title_case;

/// Parse a raw byline into individual author names.
///
/// Strips one leading case-insensitive "by" token, splits on the standalone
/// conjunction "and" and on commas, trims and title-cases each piece, drops
/// empties and keeps first-seen order without duplicates. `None` or blank
/// input yields an empty list.
pub fn parse(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    static RE_LEADING_BY: OnceCell<Regex> = OnceCell::new();
    let re_by = RE_LEADING_BY.get_or_init(|| Regex::new(r"(?i)^by\s+").unwrap());

    // Word boundaries keep names like "Sandy" or "Alexander" intact.
    static RE_AND: OnceCell<Regex> = OnceCell::new();
    let re_and = RE_AND.get_or_init(|| Regex::new(r"(?i)\band\b").unwrap());

    let cleaned = re_by.replace(trimmed, "");

    let mut names: Vec<String> = Vec::new();
    for segment in re_and.split(&cleaned) {
        for part in segment.split(',') {
            let name = title_case(part.trim());
            if name.is_empty() || names.contains(&name) {
                continue;
            }
            names.push(name);
        }
    }
    names
}
