//! Reader for the transcription log
//!
//! The voice loop appends one JSON record per line as speech is recognized.
//! This module only ever reads the log: it counts lines to fix a session's
//! offset, and re-scans everything after that offset on each polling tick.
//! Records it cannot parse, records with an unknown tag, and records with
//! empty text are skipped without aborting the scan.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Number of most-recent records considered in a single polling tick.
const CANDIDATES_PER_TICK: usize = 3;

/// One record of the transcription log.
///
/// The producer writes other record kinds to the same log; only records
/// tagged `transcription` carry speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEvent {
    /// Record tag, `transcription` for recognized speech
    #[serde(rename = "type")]
    pub kind: String,

    /// Recognized utterance; may be empty
    #[serde(default)]
    pub text: String,

    /// Producer timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TranscriptEvent {
    /// Whether this record carries recognized speech
    pub fn is_transcription(&self) -> bool {
        self.kind == "transcription"
    }
}

/// Read-only view of the transcription log.
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    /// Create a view of the log at `path`. The file does not have to exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current number of lines in the log.
    ///
    /// A missing or unreadable log reads as zero lines, so a session started
    /// before the voice loop has produced anything records offset 0.
    pub fn line_count(&self) -> usize {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents.lines().count(),
            Err(_) => 0,
        }
    }

    /// Most recent non-empty utterance strictly after `offset`.
    ///
    /// Only the newest `CANDIDATES_PER_TICK` transcription records past the
    /// offset are examined, favoring recency when utterances arrive in a
    /// burst. Returns `None` when nothing new and parseable has appeared.
    pub fn latest_utterance(&self, offset: usize) -> Option<String> {
        let contents = fs::read_to_string(&self.path).ok()?;

        let candidates: Vec<TranscriptEvent> = contents
            .lines()
            .skip(offset)
            .filter_map(|line| serde_json::from_str::<TranscriptEvent>(line).ok())
            .filter(TranscriptEvent::is_transcription)
            .collect();

        candidates
            .into_iter()
            .rev()
            .take(CANDIDATES_PER_TICK)
            .map(|event| event.text.trim().to_string())
            .find(|text| !text.is_empty())
    }
}
