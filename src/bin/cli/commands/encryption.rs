use anyhow::{anyhow, bail, Result};

use notevault::encryption::{assess_password, generate_secure_password, PasswordStrength};
use notevault::notes::LifecycleError;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

fn friendly(e: LifecycleError) -> anyhow::Error {
    anyhow!(e.user_message())
}

fn ensure_available(app: &App) -> Result<()> {
    if !app.notes.is_encryption_available() {
        bail!(notevault::encryption::UNSUPPORTED_MESSAGE);
    }
    Ok(())
}

pub async fn run_encrypt(app: &App, query: &str, password: &str, format: &OutputFormat) -> Result<()> {
    ensure_available(app)?;
    let note = app.find_note(query).await?;

    let strength = assess_password(password);
    if matches!(strength, PasswordStrength::Empty | PasswordStrength::Weak) {
        eprintln!("Warning: {} password", strength.label());
    }

    let note = app.notes.apply_password(note.id, password).await.map_err(friendly)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&terminal::note_json(&note))?),
        OutputFormat::Plain => {
            println!("Encrypted note \"{}\"", note.title);
            println!("  The password cannot be recovered. Keep it somewhere safe.");
        }
    }
    Ok(())
}

pub async fn run_unlock(app: &App, query: &str, password: &str, format: &OutputFormat) -> Result<()> {
    ensure_available(app)?;
    let note = app.find_note(query).await?;
    let plaintext = app.notes.unlock(note.id, password).await.map_err(friendly)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": note.id.to_string(),
                "title": note.title,
                "content": plaintext.as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::render_note(&note, Some(plaintext.as_str()), false));
        }
    }

    app.notes.lock(note.id);
    Ok(())
}

pub async fn run_decrypt(app: &App, query: &str, password: &str, format: &OutputFormat) -> Result<()> {
    ensure_available(app)?;
    let note = app.find_note(query).await?;
    app.notes.unlock(note.id, password).await.map_err(friendly)?;
    let note = app.notes.remove_encryption(note.id).await.map_err(friendly)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&terminal::note_json(&note))?),
        OutputFormat::Plain => println!("Removed encryption from note \"{}\"", note.title),
    }
    Ok(())
}

pub fn run_gen_password(length: usize, format: &OutputFormat) -> Result<()> {
    if length == 0 {
        bail!("Password length must be greater than zero");
    }
    let password = generate_secure_password(length);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "password": password,
                "strength": assess_password(&password).label(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("{}", password),
    }
    Ok(())
}
