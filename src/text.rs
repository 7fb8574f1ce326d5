// src/text.rs
// Small text helpers shared by the fetchers, the persistence layer and the
// seeder. Slugs are the join key between raw provider names and the curated
// allow-list, so both sides must use the same function.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Lowercase, replace every non-alphanumeric run with a single dash, trim
/// leading/trailing dashes. `"The New York Times"` -> `"the-new-york-times"`.
pub fn slugify(s: &str) -> String {
    static RE_NON_ALNUM: OnceCell<Regex> = OnceCell::new();
    let re = RE_NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());

    let lowered = s.to_lowercase();
    re.replace_all(&lowered, "-").trim_matches('-').to_string()
}

/// Title-case each whitespace-separated word: first letter uppercased, the
/// rest lowered. Used for author and category display names.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut out: String = first.to_uppercase().collect();
                    out.push_str(&chars.as_str().to_lowercase());
                    out
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode HTML entities, drop tags, collapse whitespace.
pub fn strip_tags(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());

    let decoded = html_escape::decode_html_entities(s).to_string();
    let stripped = re_tags.replace_all(&decoded, "");
    re_ws.replace_all(&stripped, " ").trim().to_string()
}

/// Truncate to at most `max` characters, appending an ellipsis when anything
/// was cut. Counts chars, not bytes, so multibyte input never splits.
pub fn limit(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}
