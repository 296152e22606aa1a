//! Read-only session inspection
//!
//! Reads the session manager's store and the per-project conversation
//! records it points at. Nothing in this module ever writes either; the
//! store belongs to the session manager and the records belong to the
//! agent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the session store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub id: String,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub project_path: String,

    #[serde(default)]
    pub group_path: String,

    /// One of `idle`, `waiting`, `running`
    #[serde(default = "default_status")]
    pub status: String,

    #[serde(default)]
    pub user_active: bool,

    #[serde(default)]
    pub created_at: String,
}

fn default_title() -> String {
    "Unknown".to_string()
}

fn default_status() -> String {
    "idle".to_string()
}

impl Session {
    /// tmux pane name, derived the same way the session manager derives it:
    /// spaces to underscores, non-alphanumerics dropped, title capped at
    /// twenty characters, id at eight.
    pub fn tmux_name(&self) -> String {
        let safe: String = self
            .title
            .replace(' ', "_")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .take(20)
            .collect();
        let short_id: String = self.id.chars().take(8).collect();
        format!("aoe_{}_{}", safe, short_id)
    }

    /// Whether the session is waiting for user input
    pub fn is_waiting(&self) -> bool {
        self.status == "waiting"
    }

    /// Conversation directory for this session's project.
    ///
    /// The agent flattens the project path into a single directory name with
    /// slashes replaced by dashes.
    pub fn project_dir(&self, projects_dir: &Path) -> PathBuf {
        projects_dir.join(self.project_path.replace('/', "-"))
    }
}

/// List sessions from the store. A missing or unreadable store reads as no
/// sessions, not as an error.
pub fn list_sessions(store: &Path) -> Vec<Session> {
    let Ok(contents) = fs::read_to_string(store) else {
        return Vec::new();
    };
    serde_json::from_str(&contents).unwrap_or_default()
}

/// Find a session by title: exact match first, then partial,
/// case-insensitive.
pub fn find_session(store: &Path, name: &str) -> Option<Session> {
    let sessions = list_sessions(store);
    let name_lower = name.to_lowercase();

    sessions
        .iter()
        .find(|s| s.title.to_lowercase() == name_lower)
        .or_else(|| {
            sessions
                .iter()
                .find(|s| s.title.to_lowercase().contains(&name_lower))
        })
        .cloned()
}

/// Most recently modified conversation record in a project directory.
pub fn latest_record_file(project_dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(project_dir).ok()?;

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
        .max_by_key(|path| {
            fs::metadata(path)
                .and_then(|meta| meta.modified())
                .ok()
        })
}

/// One displayable message from a conversation record
#[derive(Debug, Clone, Serialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
}

/// Last `count` displayable messages of a conversation record.
///
/// Records are newline-delimited JSON; lines that do not parse or carry no
/// displayable content are skipped.
pub fn tail_messages(file: &Path, count: usize) -> Vec<SessionMessage> {
    let Ok(contents) = fs::read_to_string(file) else {
        return Vec::new();
    };

    let mut messages: Vec<SessionMessage> =
        contents.lines().filter_map(message_from_line).collect();
    messages.split_off(messages.len().saturating_sub(count))
}

fn message_from_line(line: &str) -> Option<SessionMessage> {
    let value: Value = serde_json::from_str(line).ok()?;
    let role = value.get("type")?.as_str()?;
    if role != "user" && role != "assistant" {
        return None;
    }

    let content = value.get("message")?.get("content")?.as_array()?;
    let mut text = String::new();
    let mut tools = Vec::new();

    for block in content {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                text.push_str(block.get("text").and_then(Value::as_str).unwrap_or_default());
            }
            Some("tool_use") => {
                tools.push(
                    block
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                );
            }
            _ => {}
        }
    }

    if text.is_empty() && !tools.is_empty() {
        text = format!("Using: {}", tools.join(", "));
    }
    if text.is_empty() {
        return None;
    }

    Some(SessionMessage {
        role: role.to_string(),
        content: text.chars().take(500).collect(),
    })
}
