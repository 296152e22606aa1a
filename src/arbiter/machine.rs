//! Arbitration session state machine
//!
//! Drives one permission request from lock acquisition through announce,
//! poll, and classify to a decision, then releases the advisory marker
//! before the decision is handed to the host. One session per request; the
//! host never issues a second request while one is outstanding.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::announce::{permission_prompt, Announcer};
use crate::config::Config;
use crate::hook::{Decision, DENIED_VIA_VOICE};
use crate::transcript::TranscriptLog;

use super::classifier::{Classifier, Verdict};
use super::lock::ArbitrationLock;

/// Phases of an arbitration session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Session not yet started
    Idle,
    /// Advisory marker created, log offset recorded
    LockHeld,
    /// Spoken prompt dispatched
    Announcing,
    /// Watching the transcription log for a reply
    Polling,
    /// A spoken reply classified as approve or deny
    Decided,
    /// Decision window elapsed without a classifiable reply
    TimedOut,
    /// Advisory marker removed
    Released,
    /// Session finished, outcome handed to the host
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::LockHeld => write!(f, "LockHeld"),
            Phase::Announcing => write!(f, "Announcing"),
            Phase::Polling => write!(f, "Polling"),
            Phase::Decided => write!(f, "Decided"),
            Phase::TimedOut => write!(f, "TimedOut"),
            Phase::Released => write!(f, "Released"),
            Phase::Done => write!(f, "Done"),
        }
    }
}

/// One complete arbitration run for a single permission request
pub struct ArbitrationSession {
    log: TranscriptLog,
    classifier: Classifier,
    announcer: Announcer,
    lock_path: PathBuf,
    tick_interval: Duration,
    decision_ticks: u32,
    phase: Phase,
}

impl ArbitrationSession {
    pub fn new(config: &Config, classifier: Classifier, announcer: Announcer) -> Self {
        Self {
            log: TranscriptLog::new(&config.transcript_log),
            classifier,
            announcer,
            lock_path: config.lock_path.clone(),
            tick_interval: config.tick_interval,
            decision_ticks: config.decision_ticks,
            phase: Phase::Idle,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run one session for the named action.
    ///
    /// The advisory marker is held from before the prompt is spoken until
    /// the decision is known, and is removed on every exit path. Replies
    /// recorded before the offset captured here can never influence the
    /// outcome.
    pub async fn run(&mut self, action: &str) -> Decision {
        let mut lock = match ArbitrationLock::acquire(&self.lock_path) {
            Ok(lock) => lock,
            Err(e) => {
                // Without the marker the router would echo the reply into
                // the session, so hand the request back to the host instead.
                warn!(?e, "cannot create arbitration marker, deferring to host");
                return Decision::Indeterminate;
            }
        };
        self.advance(Phase::LockHeld);

        let offset = self.log.line_count();
        debug!(offset, log = %self.log.path().display(), "log offset recorded");

        self.advance(Phase::Announcing);
        self.announcer.announce(&permission_prompt(action));

        self.advance(Phase::Polling);
        let decision = self.poll(offset).await;

        self.advance(match decision {
            Decision::Indeterminate => Phase::TimedOut,
            _ => Phase::Decided,
        });

        lock.release();
        self.advance(Phase::Released);

        info!(decision = %decision, "arbitration finished");
        self.advance(Phase::Done);

        decision
    }

    /// Poll the transcription log once per tick until a reply classifies or
    /// the decision window closes.
    async fn poll(&self, offset: usize) -> Decision {
        for tick in 1..=self.decision_ticks {
            tokio::time::sleep(self.tick_interval).await;

            let Some(utterance) = self.log.latest_utterance(offset) else {
                continue;
            };

            match self.classifier.classify(&utterance) {
                Verdict::Approve => {
                    info!(tick, utterance = %utterance, "approved by voice");
                    return Decision::Allow;
                }
                Verdict::Deny => {
                    info!(tick, utterance = %utterance, "denied by voice");
                    return Decision::Deny {
                        reason: DENIED_VIA_VOICE.to_string(),
                    };
                }
                Verdict::Unclassified => {
                    // An ambiguous reply does not consume the window; the
                    // same offset is re-scanned next tick, so a clearer
                    // reply can still land.
                    debug!(tick, utterance = %utterance, "reply not classifiable, waiting");
                }
            }
        }

        Decision::Indeterminate
    }

    fn advance(&mut self, next: Phase) {
        if next != self.phase {
            info!(from = %self.phase, to = %next, "phase transition");
            self.phase = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::classifier::KeywordSets;

    use std::fs::OpenOptions;
    use std::io::Write;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::{sleep, Instant};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn test_config(tag: &str) -> Config {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let base = std::env::temp_dir().join(format!(
            "voicehook-machine-test-{}-{}-{}",
            std::process::id(),
            tag,
            n
        ));
        Config {
            transcript_log: base.join("transcript.jsonl"),
            lock_path: base.join("arbitration.lock"),
            keywords_path: None,
            tts_url: "http://127.0.0.1:9/v1/audio/speech".to_string(),
            tts_voice: "af_heart".to_string(),
            tick_interval: Duration::from_secs(1),
            decision_ticks: 30,
            sessions_file: base.join("sessions.json"),
            projects_dir: base.join("projects"),
            stt_port: 2022,
            tts_port: 8880,
            transport_port: 7880,
        }
    }

    fn test_session(config: &Config) -> ArbitrationSession {
        ArbitrationSession::new(
            config,
            Classifier::new(KeywordSets::default()),
            Announcer::new(config.tts_url.clone(), config.tts_voice.clone()),
        )
    }

    fn append_line(path: &Path, line: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        writeln!(file, "{}", line).unwrap();
    }

    fn cleanup(config: &Config) {
        if let Some(base) = config.transcript_log.parent() {
            let _ = std::fs::remove_dir_all(base);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_approval_at_tick_five() {
        let config = test_config("allow");
        let log_path = config.transcript_log.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(4500)).await;
            append_line(&log_path, r#"{"type":"transcription","text":"yes okay"}"#);
        });

        let mut session = test_session(&config);
        assert_eq!(session.phase(), Phase::Idle);

        let decision = session.run("Bash").await;

        assert_eq!(decision, Decision::Allow);
        assert_eq!(session.phase(), Phase::Done);
        assert!(!config.lock_path.exists());
        cleanup(&config);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denial_at_tick_ten() {
        let config = test_config("deny");
        let log_path = config.transcript_log.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(9500)).await;
            append_line(
                &log_path,
                r#"{"type":"transcription","text":"no, cancel that"}"#,
            );
        });

        let mut session = test_session(&config);
        let decision = session.run("Bash").await;

        assert_eq!(
            decision,
            Decision::Deny {
                reason: "Denied via voice".to_string()
            }
        );
        assert!(!config.lock_path.exists());
        cleanup(&config);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_exactly_thirty_ticks() {
        let config = test_config("timeout");
        let mut session = test_session(&config);

        let start = Instant::now();
        let decision = session.run("Bash").await;

        assert_eq!(decision, Decision::Indeterminate);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert_eq!(session.phase(), Phase::Done);
        assert!(!config.lock_path.exists());
        cleanup(&config);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transcription_records_are_ignored() {
        let config = test_config("other-kind");
        let log_path = config.transcript_log.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(2500)).await;
            append_line(&log_path, r#"{"type":"other","text":"yes"}"#);
            sleep(Duration::from_secs(4)).await;
            append_line(&log_path, r#"{"type":"transcription","text":"yes"}"#);
        });

        let mut session = test_session(&config);
        let start = Instant::now();
        let decision = session.run("Bash").await;

        // The "other" record at tick 3 must not decide anything; only the
        // transcription record at tick 7 can.
        assert_eq!(decision, Decision::Allow);
        assert!(start.elapsed() >= Duration::from_secs(7));
        cleanup(&config);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_records_never_influence_the_session() {
        let mut config = test_config("stale");
        config.decision_ticks = 3;

        // Written before the session starts, so it sits at or below the
        // recorded offset.
        append_line(
            &config.transcript_log,
            r#"{"type":"transcription","text":"yes do it"}"#,
        );

        let mut session = test_session(&config);
        let decision = session.run("Bash").await;

        assert_eq!(decision, Decision::Indeterminate);
        cleanup(&config);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ambiguous_reply_does_not_consume_the_window() {
        let config = test_config("ambiguous");
        let log_path = config.transcript_log.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(1500)).await;
            append_line(
                &log_path,
                r#"{"type":"transcription","text":"maybe later"}"#,
            );
            sleep(Duration::from_secs(2)).await;
            append_line(&log_path, r#"{"type":"transcription","text":"sure"}"#);
        });

        let mut session = test_session(&config);
        let decision = session.run("Bash").await;

        // The ambiguous reply at tick 2 keeps the session polling; the
        // clearer reply at tick 4 decides it.
        assert_eq!(decision, Decision::Allow);
        cleanup(&config);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unwritable_marker_defers_to_host() {
        let mut config = test_config("unwritable");
        std::fs::create_dir_all(config.transcript_log.parent().unwrap()).unwrap();

        // A plain file where the marker's parent directory should go makes
        // acquisition fail.
        let blocker = config.transcript_log.parent().unwrap().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        config.lock_path = blocker.join("arbitration.lock");

        let mut session = test_session(&config);
        let decision = session.run("Bash").await;

        assert_eq!(decision, Decision::Indeterminate);
        cleanup(&config);
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_released_when_session_is_cancelled() {
        let config = test_config("cancelled");
        let mut session = test_session(&config);

        {
            let fut = session.run("Bash");
            tokio::pin!(fut);

            tokio::select! {
                _ = &mut fut => panic!("session should still be polling"),
                _ = sleep(Duration::from_secs(5)) => {}
            }

            // Mid-poll the marker is held; dropping the future simulates
            // abnormal termination of the session.
            assert!(config.lock_path.exists());
        }

        assert!(!config.lock_path.exists());
        cleanup(&config);
    }
}
