use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::encryption::EncryptedPayload;

use super::html::{html_to_text, text_to_html};

/// Color label of a note card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Default,
    Yellow,
    Blue,
    Green,
    Pink,
    Purple,
    /// Any value written by a newer client; read back as the default color
    #[serde(other)]
    Unknown,
}

impl NoteColor {
    pub const ALL: [NoteColor; 6] = [
        Self::Default,
        Self::Yellow,
        Self::Blue,
        Self::Green,
        Self::Pink,
        Self::Purple,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Default | Self::Unknown => "Default",
            Self::Yellow => "Yellow",
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Pink => "Pink",
            Self::Purple => "Purple",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            Self::Default | Self::Unknown => "default",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Pink => "pink",
            Self::Purple => "purple",
        }
    }

    fn normalized(self) -> Self {
        match self {
            Self::Unknown => Self::Default,
            other => other,
        }
    }
}

impl std::str::FromStr for NoteColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|color| color.value().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown color: {}", s))
    }
}

/// The authoritative body of a note: either editable text or a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteBody {
    Plaintext { content: String, html_content: String },
    Encrypted { payload: EncryptedPayload },
}

impl NoteBody {
    /// Plaintext body with the HTML form rendered from `content`
    pub fn from_text(content: impl Into<String>) -> Self {
        let content = content.into();
        let html_content = text_to_html(&content);
        Self::Plaintext {
            content,
            html_content,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted { .. })
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Plaintext { content, .. } => Some(content),
            Self::Encrypted { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&EncryptedPayload> {
        match self {
            Self::Plaintext { .. } => None,
            Self::Encrypted { payload } => Some(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub body: NoteBody,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub color: NoteColor,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn is_encrypted(&self) -> bool {
        self.body.is_encrypted()
    }

    /// Apply a partial update. Returns false when the update was empty.
    pub fn apply(&mut self, update: NoteUpdate) -> bool {
        if update.is_empty() {
            return false;
        }

        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(body) = update.body {
            self.body = body;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(summary) = update.summary {
            self.summary = summary;
        }
        if let Some(color) = update.color {
            self.color = color.normalized();
        }
        if let Some(is_pinned) = update.is_pinned {
            self.is_pinned = is_pinned;
        }
        if let Some(is_archived) = update.is_archived {
            self.is_archived = is_archived;
        }
        self.updated_at = Utc::now();
        true
    }
}

/// Creation input. New notes are always plaintext.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub html_content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub color: NoteColor,
    #[serde(default)]
    pub is_pinned: bool,
}

impl NewNote {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("Note must belong to a user".to_string());
        }
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err("Tags cannot be empty".to_string());
        }
        Ok(())
    }

    /// Build the stored note, filling whichever text form is missing
    pub fn into_note(self) -> Note {
        let (content, html_content) = match (self.content.is_empty(), self.html_content.is_empty()) {
            (false, true) => {
                let html = text_to_html(&self.content);
                (self.content, html)
            }
            (true, false) => (html_to_text(&self.html_content), self.html_content),
            _ => (self.content, self.html_content),
        };

        let now = Utc::now();
        Note {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            title: self.title,
            body: NoteBody::Plaintext {
                content,
                html_content,
            },
            tags: self.tags,
            summary: self.summary,
            color: self.color.normalized(),
            is_pinned: self.is_pinned,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a note. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub body: Option<NoteBody>,
    pub tags: Option<Vec<String>>,
    pub summary: Option<Option<String>>,
    pub color: Option<NoteColor>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
}

impl NoteUpdate {
    pub fn body(body: NoteBody) -> Self {
        Self {
            body: Some(body),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.tags.is_none()
            && self.summary.is_none()
            && self.color.is_none()
            && self.is_pinned.is_none()
            && self.is_archived.is_none()
    }
}

/// The flat document persisted by note stores
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub html_content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub color: NoteColor,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_data: Option<EncryptedPayload>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Note> for NoteRecord {
    fn from(note: &Note) -> Self {
        let (content, html_content, encrypted_data) = match &note.body {
            NoteBody::Plaintext {
                content,
                html_content,
            } => (content.clone(), html_content.clone(), None),
            // No plaintext residue is ever written next to a payload
            NoteBody::Encrypted { payload } => (String::new(), String::new(), Some(payload.clone())),
        };

        Self {
            id: note.id,
            user_id: note.user_id.clone(),
            title: note.title.clone(),
            content,
            html_content,
            tags: note.tags.clone(),
            summary: note.summary.clone(),
            color: note.color,
            is_pinned: note.is_pinned,
            is_archived: note.is_archived,
            is_encrypted: note.body.is_encrypted(),
            encrypted_data,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

impl TryFrom<NoteRecord> for Note {
    type Error = String;

    fn try_from(record: NoteRecord) -> Result<Self, Self::Error> {
        let body = match (record.is_encrypted, record.encrypted_data) {
            (true, Some(payload)) => NoteBody::Encrypted { payload },
            (false, None) => NoteBody::Plaintext {
                content: record.content,
                html_content: record.html_content,
            },
            (true, None) => {
                return Err(format!("note {} is marked encrypted but has no encrypted data", record.id))
            }
            (false, Some(_)) => {
                return Err(format!("note {} has encrypted data but is not marked encrypted", record.id))
            }
        };

        Ok(Note {
            id: record.id,
            user_id: record.user_id,
            title: record.title,
            body,
            tags: record.tags,
            summary: record.summary,
            color: record.color.normalized(),
            is_pinned: record.is_pinned,
            is_archived: record.is_archived,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Active and archived notes of one user, each in display order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteLists {
    pub active: Vec<Note>,
    pub archived: Vec<Note>,
}

impl NoteLists {
    pub fn split(notes: Vec<Note>) -> Self {
        let (archived, active) = notes.into_iter().partition(|note| note.is_archived);
        Self { active, archived }
    }
}

/// Pinned notes first, then most recently updated
pub fn sort_for_display(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn payload() -> EncryptedPayload {
        EncryptedPayload::new("Y2lwaGVy".into(), "c2FsdA==".into(), "aXY=".into())
    }

    #[test]
    fn test_new_note_fills_html() {
        let note = NewNote::new("user-1", "Plan", "secret plan").into_note();
        assert_eq!(
            note.body,
            NoteBody::Plaintext {
                content: "secret plan".into(),
                html_content: "<p>secret plan</p>".into(),
            }
        );
        assert!(!note.is_archived);
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_new_note_fills_content_from_html() {
        let mut input = NewNote::new("user-1", "Plan", "");
        input.html_content = "<p>from <em>html</em></p>".into();
        let note = input.into_note();
        assert_eq!(note.body.content(), Some("from html"));
    }

    #[test]
    fn test_new_note_validation() {
        assert!(NewNote::new("user-1", "t", "c").validate().is_ok());
        assert!(NewNote::new("  ", "t", "c").validate().is_err());

        let mut blank_tag = NewNote::new("user-1", "t", "c");
        blank_tag.tags = vec!["ok".into(), " ".into()];
        assert!(blank_tag.validate().is_err());
    }

    #[test]
    fn test_encrypted_record_has_no_plaintext() {
        let mut note = NewNote::new("user-1", "Plan", "secret plan").into_note();
        note.body = NoteBody::Encrypted { payload: payload() };

        let record = NoteRecord::from(&note);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["isEncrypted"], true);
        assert_eq!(json["content"], "");
        assert_eq!(json["htmlContent"], "");
        assert_eq!(json["encryptedData"]["encryptedContent"], "Y2lwaGVy");
        assert!(!json.to_string().contains("secret plan"));
    }

    #[test]
    fn test_plaintext_record_omits_encrypted_data() {
        let note = NewNote::new("user-1", "Plan", "open").into_note();
        let json = serde_json::to_value(NoteRecord::from(&note)).unwrap();
        assert_eq!(json["isEncrypted"], false);
        assert!(json.get("encryptedData").is_none());
    }

    #[test]
    fn test_record_roundtrip() {
        let mut note = NewNote::new("user-1", "Plan", "x").into_note();
        note.body = NoteBody::Encrypted { payload: payload() };
        note.tags = vec!["work".into()];
        note.color = NoteColor::Purple;

        let json = serde_json::to_string(&NoteRecord::from(&note)).unwrap();
        let record: NoteRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(Note::try_from(record).unwrap(), note);
    }

    #[test]
    fn test_inconsistent_records_rejected() {
        let note = NewNote::new("user-1", "Plan", "x").into_note();

        let mut flagged = NoteRecord::from(&note);
        flagged.is_encrypted = true;
        assert!(Note::try_from(flagged).is_err());

        let mut orphan = NoteRecord::from(&note);
        orphan.encrypted_data = Some(payload());
        assert!(Note::try_from(orphan).is_err());
    }

    #[test]
    fn test_record_defaults() {
        let json = r#"{
            "id": "6f1c3c36-2a55-4f0e-9d7e-0b8b7f3f1a10",
            "userId": "u",
            "title": "old",
            "content": "hi",
            "color": "teal",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;
        let record: NoteRecord = serde_json::from_str(json).unwrap();
        let note = Note::try_from(record).unwrap();

        assert_eq!(note.color, NoteColor::Default);
        assert!(!note.is_pinned);
        assert!(!note.is_encrypted());
        assert!(note.tags.is_empty());
    }

    #[test]
    fn test_apply_update() {
        let mut note = NewNote::new("user-1", "Plan", "x").into_note();
        let before = note.updated_at;

        assert!(!note.apply(NoteUpdate::default()));
        assert_eq!(note.updated_at, before);

        assert!(note.apply(NoteUpdate {
            is_pinned: Some(true),
            color: Some(NoteColor::Green),
            summary: Some(Some("short".into())),
            ..Default::default()
        }));
        assert!(note.is_pinned);
        assert_eq!(note.color, NoteColor::Green);
        assert_eq!(note.summary.as_deref(), Some("short"));
        assert!(note.updated_at >= before);
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("Pink".parse::<NoteColor>().unwrap(), NoteColor::Pink);
        assert!("teal".parse::<NoteColor>().is_err());
        assert_eq!(NoteColor::ALL.len(), 6);
    }

    #[test]
    fn test_sort_for_display() {
        let base = Utc::now();
        let mut old_pinned = NewNote::new("u", "old pinned", "").into_note();
        old_pinned.is_pinned = true;
        old_pinned.updated_at = base - Duration::hours(3);
        let mut newest = NewNote::new("u", "newest", "").into_note();
        newest.updated_at = base;
        let mut older = NewNote::new("u", "older", "").into_note();
        older.updated_at = base - Duration::hours(1);

        let mut notes = vec![older, newest, old_pinned];
        sort_for_display(&mut notes);
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["old pinned", "newest", "older"]);
    }

    #[test]
    fn test_split_lists() {
        let active = NewNote::new("u", "a", "").into_note();
        let mut archived = NewNote::new("u", "b", "").into_note();
        archived.is_archived = true;

        let lists = NoteLists::split(vec![active, archived]);
        assert_eq!(lists.active.len(), 1);
        assert_eq!(lists.archived.len(), 1);
        assert_eq!(lists.archived[0].title, "b");
    }
}
