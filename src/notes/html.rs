//! Conversions between a note's plain text and its editable HTML form.

use std::sync::OnceLock;

use regex::Regex;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

/// Render plain text as editor HTML: one escaped paragraph per line.
pub fn text_to_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    text.split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                "<p><br></p>".to_string()
            } else {
                format!("<p>{}</p>", html_escape::encode_text(line))
            }
        })
        .collect()
}

/// Extract plain text from editor HTML.
///
/// Strips `<script>` and `<style>` elements and all remaining tags, turns
/// block boundaries into newlines, decodes entities and normalizes
/// whitespace.
pub fn html_to_text(html: &str) -> String {
    static SCRIPT: OnceLock<Regex> = OnceLock::new();
    static STYLE: OnceLock<Regex> = OnceLock::new();
    static BLOCK_END: OnceLock<Regex> = OnceLock::new();
    static BREAK: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();

    let text = regex(&SCRIPT, r"(?is)<script[^>]*>.*?</script>").replace_all(html, "");
    let text = regex(&STYLE, r"(?is)<style[^>]*>.*?</style>").replace_all(&text, "");
    let text = regex(&BREAK, r"(?i)<br\s*/?>").replace_all(&text, "");
    let text = regex(
        &BLOCK_END,
        r"(?i)</(div|p|h[1-6]|li|tr|blockquote|pre|section|article)>",
    )
    .replace_all(&text, "\n");
    let text = regex(&TAG, r"<[^>]+>").replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);
    let text = regex(&SPACES, r"[ \t]+").replace_all(&text, " ");

    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}
