use notevault::notes::{Note, NoteColor, NoteRecord};

pub const LOCKED_PLACEHOLDER: &str = "[Encrypted note. Unlock with your password to view.]";

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

fn paint(text: &str, code: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", code, text, Color::RESET)
    } else {
        text.to_string()
    }
}

fn card_color(color: NoteColor) -> &'static str {
    match color {
        NoteColor::Yellow => Color::YELLOW,
        NoteColor::Blue => Color::BLUE,
        NoteColor::Green => Color::GREEN,
        NoteColor::Pink => Color::MAGENTA,
        NoteColor::Purple => Color::CYAN,
        NoteColor::Default | NoteColor::Unknown => Color::RESET,
    }
}

/// One-line listing entry: markers, title, id
pub fn note_line(note: &Note, use_color: bool) -> String {
    let mut markers = String::new();
    if note.is_pinned {
        markers.push('*');
    }
    if note.is_encrypted() {
        markers.push_str("[locked]");
    }

    let title = paint(&note.title, card_color(note.color), use_color);
    let id = paint(&note.id.to_string(), Color::GRAY, use_color);
    if markers.is_empty() {
        format!("  {}  {}", title, id)
    } else {
        format!("{} {}  {}", markers, title, id)
    }
}

/// Full note view. `content` is the text to show; `None` shows the
/// locked placeholder.
pub fn render_note(note: &Note, content: Option<&str>, use_color: bool) -> String {
    let mut lines = vec![paint(&note.title, Color::BOLD, use_color)];

    if !note.tags.is_empty() {
        let tags = note
            .tags
            .iter()
            .map(|t| format!("#{}", t))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(paint(&tags, Color::DIM, use_color));
    }

    let updated = note.updated_at.format("%Y-%m-%d %H:%M").to_string();
    lines.push(paint(
        &format!("{} | {} | updated {}", note.id, note.color.name(), updated),
        Color::GRAY,
        use_color,
    ));

    if let Some(summary) = &note.summary {
        lines.push(String::new());
        lines.push(paint(&format!("Summary: {}", summary), Color::DIM, use_color));
    }

    lines.push(String::new());
    match content {
        Some(text) => lines.extend(wrap_lines(text, "", 80)),
        None => lines.push(paint(LOCKED_PLACEHOLDER, Color::YELLOW, use_color)),
    }

    lines.join("\n")
}

/// The note as its persisted record
pub fn note_json(note: &Note) -> serde_json::Value {
    serde_json::to_value(NoteRecord::from(note)).unwrap_or(serde_json::Value::Null)
}

/// Simple word-wrapping for terminal output
pub fn wrap_lines(text: &str, prefix: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let effective_width = max_width.saturating_sub(prefix.len());

    for line in text.lines() {
        if line.chars().count() <= effective_width {
            lines.push(format!("{}{}", prefix, line));
            continue;
        }

        let mut current_line = String::new();
        for word in line.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.chars().count() + 1 + word.chars().count() <= effective_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(format!("{}{}", prefix, current_line));
                current_line = word.to_string();
            }
        }
        if !current_line.is_empty() {
            lines.push(format!("{}{}", prefix, current_line));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use notevault::notes::NewNote;

    #[test]
    fn test_wrap_lines() {
        let lines = wrap_lines("one two three four", "", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert_eq!(wrap_lines("a\n\nb", "> ", 80), vec!["> a", "> ", "> b"]);
    }

    #[test]
    fn test_render_locked_note() {
        let note = NewNote::new("u1", "Plans", "secret plan").into_note();
        let rendered = render_note(&note, None, false);
        assert!(rendered.starts_with("Plans"));
        assert!(rendered.contains(LOCKED_PLACEHOLDER));
        assert!(!rendered.contains("secret plan"));
    }

    #[test]
    fn test_note_line_markers() {
        let mut note = NewNote::new("u1", "Plans", "text").into_note();
        note.is_pinned = true;
        let line = note_line(&note, false);
        assert!(line.starts_with("* Plans"));
        assert!(line.contains(&note.id.to_string()));
    }
}
