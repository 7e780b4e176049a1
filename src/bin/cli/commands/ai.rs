use anyhow::{anyhow, bail, Result};

use notevault::ai::AiError;
use notevault::notes::Note;

use crate::app::App;
use crate::OutputFormat;

fn friendly(e: AiError) -> anyhow::Error {
    anyhow!(e.user_message())
}

/// Text of a plaintext note. Encrypted notes are never sent to the model.
fn note_text(note: &Note) -> Result<&str> {
    match note.body.content() {
        Some(content) => Ok(content),
        None => bail!("Note \"{}\" is encrypted. Remove encryption first.", note.title),
    }
}

fn print_text(key: &str, text: &str, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ key: text });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("{}", text),
    }
    Ok(())
}

pub async fn run_summarize(app: &App, query: &str, save: bool, format: &OutputFormat) -> Result<()> {
    let note = app.find_note(query).await?;
    let summary = app.ai.summarize(note_text(&note)?).await.map_err(friendly)?;

    if save {
        app.notes.set_summary(note.id, Some(summary.clone())).await?;
    }
    print_text("summary", &summary, format)
}

pub async fn run_enhance(app: &App, query: &str, apply: bool, format: &OutputFormat) -> Result<()> {
    let note = app.find_note(query).await?;
    let enhanced = app.ai.enhance(note_text(&note)?).await.map_err(friendly)?;

    if apply {
        app.notes.update_content(note.id, enhanced.clone(), None).await?;
    }
    print_text("content", &enhanced, format)
}

pub async fn run_define(app: &App, word: &str, format: &OutputFormat) -> Result<()> {
    let word = word.trim();
    if word.is_empty() {
        bail!("Nothing to define");
    }
    let definition = app.ai.define(word).await.map_err(friendly)?;
    print_text("definition", &definition, format)
}
