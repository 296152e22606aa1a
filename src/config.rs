//! Configuration loading and management
//!
//! All paths, ports, and timing knobs live here and are handed explicitly to
//! the components that need them. Environment variables override the
//! defaults; nothing reads ambient state after startup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

/// Number of one-second polling ticks in the decision window.
pub const DEFAULT_DECISION_TICKS: u32 = 30;

/// Hook configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Transcription log appended to by the voice loop (read-only here)
    pub transcript_log: PathBuf,

    /// Advisory marker consulted by the transcription router
    pub lock_path: PathBuf,

    /// Keyword file overriding the built-in approve/deny sets, if present
    pub keywords_path: Option<PathBuf>,

    /// Speech endpoint used to announce permission prompts
    pub tts_url: String,

    /// Voice preset passed to the speech endpoint
    pub tts_voice: String,

    /// Delay between polling ticks
    pub tick_interval: Duration,

    /// Number of polling ticks before the session times out
    pub decision_ticks: u32,

    /// Session manager store (read-only)
    pub sessions_file: PathBuf,

    /// Directory of per-project conversation records (read-only)
    pub projects_dir: PathBuf,

    /// Local port of the speech-to-text service
    pub stt_port: u16,

    /// Local port of the text-to-speech service
    pub tts_port: u16,

    /// Local port of the audio transport
    pub transport_port: u16,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = PathBuf::from(std::env::var("HOME")?);
        let data_dir = home.join(".voicehook");

        let keywords_path =
            path_from_env("VOICEHOOK_KEYWORDS", data_dir.join("keywords.json"));

        Ok(Self {
            transcript_log: path_from_env(
                "VOICEHOOK_TRANSCRIPT_LOG",
                data_dir.join("transcript.jsonl"),
            ),
            lock_path: path_from_env(
                "VOICEHOOK_LOCK_PATH",
                std::env::temp_dir().join("voicehook-arbitration.lock"),
            ),
            keywords_path: keywords_path.exists().then_some(keywords_path),
            tts_url: string_from_env(
                "VOICEHOOK_TTS_URL",
                "http://127.0.0.1:8880/v1/audio/speech",
            ),
            tts_voice: string_from_env("VOICEHOOK_TTS_VOICE", "af_heart"),
            tick_interval: Duration::from_secs(1),
            decision_ticks: u32_from_env("VOICEHOOK_DECISION_TICKS", DEFAULT_DECISION_TICKS),
            sessions_file: home
                .join(".agent-of-empires")
                .join("profiles")
                .join("default")
                .join("sessions.json"),
            projects_dir: home.join(".claude").join("projects"),
            stt_port: port_from_env("VOICEHOOK_STT_PORT", 2022),
            tts_port: port_from_env("VOICEHOOK_TTS_PORT", 8880),
            transport_port: port_from_env("VOICEHOOK_TRANSPORT_PORT", 7880),
        })
    }
}

fn string_from_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn path_from_env(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn port_from_env(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn u32_from_env(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
