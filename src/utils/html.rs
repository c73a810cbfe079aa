/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe tags (like <b>, <p>) are kept, dangerous tags
/// (like <script>, <iframe>) are removed together with their content,
/// and malicious attributes (like onclick) are stripped.
///
/// The output is serialized HTML, so `&` and `<` in plain text come back
/// as entities. Only use it on fields that are rendered as markup.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Trims and sanitizes a markup field (descriptions, explanations).
pub fn clean_markup(input: &str) -> String {
    clean_html(input.trim()).trim().to_string()
}

/// Normalizes a plain-text field (names, titles, question and choice text).
/// Stored verbatim apart from surrounding whitespace; escaping is left to
/// whoever renders it.
pub fn plain_text(input: &str) -> String {
    input.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_script_and_handlers() {
        assert_eq!(clean_markup(" <script>x()</script>Hello "), "Hello");
        let link = clean_html("<a href=\"https://example.com\" onclick=\"x()\">link</a>");
        assert!(link.contains("href=\"https://example.com\""));
        assert!(!link.contains("onclick"));
    }

    #[test]
    fn plain_text_keeps_special_characters() {
        assert_eq!(plain_text("  Tom & Jerry <3 "), "Tom & Jerry <3");
    }
}
