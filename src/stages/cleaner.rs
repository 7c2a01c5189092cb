//! Regex text cleaning for raw person fields.
//!
//! Strips emoji, zero-width characters, and decoration from names,
//! extracts profile links, and merges the various about fields into
//! one. Patterns are compiled once.

use regex::Regex;
use std::sync::LazyLock;

static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "[",
        "\u{1F600}-\u{1F64F}", // emoticons
        "\u{1F300}-\u{1F5FF}", // symbols and pictographs
        "\u{1F680}-\u{1F6FF}", // transport and map symbols
        "\u{1F1E0}-\u{1F1FF}", // flags
        "\u{2700}-\u{27BF}",   // dingbats
        "\u{1F900}-\u{1F9FF}", // supplemental symbols
        "]+",
    ))
    .unwrap()
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|t\.me/\S+|@[\w_]+").unwrap());

static NON_ENRU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-zА-Яа-яЁё\s-]+").unwrap());

static DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[|/\\\[\]{}(),*+=<>^~"]+"#).unwrap());

static ZERO_WIDTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{200b}\u{200c}\u{200d}\u{feff}]").unwrap());

static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

static BRACKET_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\[\d+\]\s*").unwrap());

/// Collapse empty and whitespace-only values to None.
pub fn normalize_empty(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn clean_common(value: &str, remove_non_enru: bool, keep_symbols: bool) -> Option<String> {
    if value.is_empty() {
        return None;
    }

    let mut cleaned = EMOJI.replace_all(value, "").into_owned();
    if remove_non_enru {
        cleaned = NON_ENRU.replace_all(&cleaned, "").into_owned();
    }
    if !keep_symbols {
        cleaned = DECORATION.replace_all(&cleaned, " ").into_owned();
    }
    cleaned = ZERO_WIDTH.replace_all(&cleaned, "").into_owned();
    let cleaned = MULTI_SPACE.replace_all(&cleaned, " ").trim().to_string();

    // Anything shorter than two characters is noise, not a name.
    if cleaned.chars().count() >= 2 {
        Some(cleaned)
    } else {
        None
    }
}

/// Clean a first-name field: emoji, decoration, and anything outside
/// latin/cyrillic letters goes.
pub fn clean_name_field(value: Option<&str>) -> Option<String> {
    clean_common(value.unwrap_or(""), true, false)
}

/// Clean a last-name field: emoji and zero-width only, since last names
/// double as link dumps often enough that symbols must survive for
/// link extraction.
pub fn clean_second_name_field(value: Option<&str>) -> Option<String> {
    clean_common(value.unwrap_or(""), false, true)
}

/// Extract unique links (URLs, t.me paths, @handles) from the given
/// fields, preserving first-seen order.
pub fn extract_links(fields: &[Option<&str>]) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for field in fields.iter().flatten() {
        for found in URL.find_iter(field) {
            let link = found.as_str().to_string();
            if !links.contains(&link) {
                links.push(link);
            }
        }
    }
    links
}

/// Merge about-like fields into one ` | `-separated string, cleaning
/// each part and dropping duplicates.
pub fn merge_about_fields(fields: &[Option<&str>]) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for field in fields.iter().flatten() {
        if let Some(cleaned) = clean_common(field, false, true)
            && !parts.contains(&cleaned)
        {
            parts.push(cleaned);
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// Strip numeric citation markers like `[1]` from a search summary.
pub fn clean_summary(text: &str) -> String {
    let cleaned = BRACKET_REF.replace_all(text, " ");
    MULTI_SPACE.replace_all(&cleaned, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_empty_collapses_blank_values() {
        assert_eq!(normalize_empty(None), None);
        assert_eq!(normalize_empty(Some("")), None);
        assert_eq!(normalize_empty(Some("   ")), None);
        assert_eq!(normalize_empty(Some(" abc ")), Some("abc".to_string()));
    }

    #[test]
    fn name_field_drops_emoji_and_symbols() {
        assert_eq!(
            clean_name_field(Some("Мария 🌸 (HR)")),
            Some("Мария HR".to_string())
        );
        assert_eq!(clean_name_field(Some("🔥")), None);
        assert_eq!(clean_name_field(Some("A")), None);
    }

    #[test]
    fn second_name_keeps_link_material() {
        assert_eq!(
            clean_second_name_field(Some("Smith | t.me/smith")),
            Some("Smith | t.me/smith".to_string())
        );
    }

    #[test]
    fn extracts_unique_links_in_order() {
        let links = extract_links(&[
            Some("see https://example.com and @handle"),
            Some("again @handle, also t.me/chan"),
        ]);
        assert_eq!(
            links,
            vec!["https://example.com", "@handle", "t.me/chan"]
        );
    }

    #[test]
    fn merges_about_fields_without_duplicates() {
        let merged = merge_about_fields(&[
            Some("Developer"),
            Some("Developer"),
            Some("Based in Berlin"),
            None,
        ]);
        assert_eq!(merged, Some("Developer | Based in Berlin".to_string()));
    }

    #[test]
    fn summary_loses_citation_markers() {
        assert_eq!(
            clean_summary("Known speaker [1] and author [12]."),
            "Known speaker and author ."
        );
    }
}
