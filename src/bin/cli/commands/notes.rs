use anyhow::{anyhow, Context, Result};

use notevault::notes::{NewNote, Note, NoteBody, NoteColor};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

fn parse_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|tag_str| {
        tag_str
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn parse_color(color: &str) -> Result<NoteColor> {
    color.parse::<NoteColor>().map_err(|e| {
        let names = NoteColor::ALL.iter().map(|c| c.value()).collect::<Vec<_>>();
        anyhow!("{}. Available colors: {}", e, names.join(", "))
    })
}

fn print_note_result(note: &Note, message: &str, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&terminal::note_json(note))?),
        OutputFormat::Plain => {
            println!("{} \"{}\"", message, note.title);
            println!("  ID: {}", note.id);
        }
    }
    Ok(())
}

pub async fn run_new(
    app: &App,
    title: String,
    content: Option<String>,
    tags: Option<&str>,
    color: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let mut new_note = NewNote::new(app.user_id.clone(), title, content.unwrap_or_default());
    new_note.tags = parse_tags(tags);
    if let Some(color) = color {
        new_note.color = parse_color(color)?;
    }
    new_note.validate().map_err(|e| anyhow!(e))?;

    let note = app.notes.create_note(new_note).await.context("Failed to create note")?;
    print_note_result(&note, "Created note", format)
}

pub async fn run_list(app: &App, archived: bool, format: &OutputFormat, use_color: bool) -> Result<()> {
    let lists = app.list_notes().await?;
    let notes = if archived { lists.archived } else { lists.active };

    match format {
        OutputFormat::Json => {
            let output: Vec<_> = notes.iter().map(terminal::note_json).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if notes.is_empty() {
                println!("(no notes)");
            }
            for note in &notes {
                println!("{}", terminal::note_line(note, use_color));
            }
        }
    }
    Ok(())
}

pub async fn run_show(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let note = app.find_note(query).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&terminal::note_json(&note))?),
        OutputFormat::Plain => {
            let content = match &note.body {
                NoteBody::Plaintext { content, .. } => Some(content.as_str()),
                NoteBody::Encrypted { .. } => None,
            };
            println!("{}", terminal::render_note(&note, content, use_color));
        }
    }
    Ok(())
}

pub async fn run_pin(app: &App, query: &str, format: &OutputFormat) -> Result<()> {
    let note = app.find_note(query).await?;
    let note = app.notes.toggle_pin(note.id).await?;
    let message = if note.is_pinned { "Pinned" } else { "Unpinned" };
    print_note_result(&note, message, format)
}

pub async fn run_archive(app: &App, query: &str, format: &OutputFormat) -> Result<()> {
    let note = app.find_note(query).await?;
    let note = app.notes.toggle_archive(note.id).await?;
    let message = if note.is_archived { "Archived" } else { "Restored" };
    print_note_result(&note, message, format)
}

pub async fn run_color(app: &App, query: &str, color: &str, format: &OutputFormat) -> Result<()> {
    let color = parse_color(color)?;
    let note = app.find_note(query).await?;
    let note = app.notes.change_color(note.id, color).await?;
    print_note_result(&note, &format!("Colored {}", color.name()), format)
}

pub async fn run_delete(app: &App, query: &str, format: &OutputFormat) -> Result<()> {
    let note = app.find_note(query).await?;
    app.notes.delete_note(note.id).await?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "id": note.id.to_string(), "deleted": true });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Deleted note \"{}\"", note.title),
    }
    Ok(())
}
