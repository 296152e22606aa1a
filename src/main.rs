//! voicehook: voice arbitration for automation permission prompts
//!
//! Invoked by a coding agent's permission hook. It speaks the name of the
//! pending action, watches the transcription log for a spoken reply, and
//! answers the host with an allow or deny record on stdout. If nothing
//! classifiable is heard within the decision window it prints nothing, and
//! the host falls back to its normal manual confirmation path.
//!
//! Two read-only helper surfaces ride along:
//! - `sessions`: inspect the session manager's store
//! - `status`: probe the collaborating audio services
//!
//! Audio capture, speech recognition, and speech synthesis all live in
//! separate processes; this binary only reads their log, toggles the
//! advisory marker, and posts one speech request.

mod announce;
mod arbiter;
mod config;
mod hook;
mod lifecycle;
mod services;
mod sessions;
mod transcript;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::announce::Announcer;
use crate::arbiter::{ArbitrationSession, Classifier, KeywordSets};
use crate::config::Config;
use crate::hook::{Decision, PermissionRequest};
use crate::lifecycle::ShutdownSignal;

#[derive(Parser, Debug)]
#[command(
    name = "voicehook",
    version,
    about = "Voice arbitration for automation permission prompts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Arbitrate one permission request delivered on stdin
    Approve {
        /// Arbitrate a literal action name instead of reading stdin
        #[arg(long)]
        action: Option<String>,

        /// Override the decision window, in seconds
        #[arg(long)]
        timeout: Option<u32>,
    },

    /// List sessions from the session manager's store (read-only)
    Sessions {
        /// Only sessions waiting for input
        #[arg(long)]
        waiting: bool,

        /// Show one session by title and tail its conversation
        #[arg(long)]
        name: Option<String>,
    },

    /// Probe the collaborating audio services
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout is reserved for the decision record.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Command::Approve { action, timeout } => run_approve(config, action, timeout).await,
        Command::Sessions { waiting, name } => run_sessions(&config, waiting, name),
        Command::Status => run_status(&config).await,
    }
}

async fn run_approve(mut config: Config, action: Option<String>, timeout: Option<u32>) -> Result<()> {
    if let Some(secs) = timeout {
        // One tick per second, so the window in ticks equals the window in
        // seconds.
        config.decision_ticks = secs;
    }

    let action = match action {
        Some(name) => name,
        None => match PermissionRequest::from_reader(io::stdin()) {
            Ok(request) => request.tool_name,
            Err(e) => {
                // An unusable descriptor is not fatal to the host: emit no
                // decision and let it confirm manually.
                warn!(%e, "skipping arbitration");
                return Ok(());
            }
        },
    };

    info!(action = %action, "voice arbitration requested");

    let classifier = Classifier::new(load_keywords(&config));
    let announcer = Announcer::new(config.tts_url.clone(), config.tts_voice.clone());
    let mut session = ArbitrationSession::new(&config, classifier, announcer);

    let shutdown = ShutdownSignal::new();
    let decision = tokio::select! {
        decision = session.run(&action) => decision,
        _ = shutdown.wait() => {
            // Dropping the session future releases the advisory marker; the
            // missing decision record sends the host to its manual path.
            info!("interrupted before a decision");
            Decision::Indeterminate
        }
    };

    if let Some(record) = decision.to_record() {
        println!("{}", serde_json::to_string(&record)?);
    }

    Ok(())
}

fn load_keywords(config: &Config) -> KeywordSets {
    match &config.keywords_path {
        Some(path) => match KeywordSets::load(path) {
            Ok(sets) => {
                info!(path = %path.display(), "keyword sets loaded");
                sets
            }
            Err(e) => {
                warn!(%e, "keyword file unusable, using built-in sets");
                KeywordSets::default()
            }
        },
        None => KeywordSets::default(),
    }
}

fn run_sessions(config: &Config, waiting: bool, name: Option<String>) -> Result<()> {
    if let Some(name) = name {
        let Some(session) = sessions::find_session(&config.sessions_file, &name) else {
            println!("no session matching '{}'", name);
            return Ok(());
        };

        println!(
            "{} [{}] {}",
            session.title, session.status, session.project_path
        );
        println!("tmux: {}", session.tmux_name());

        let project_dir = session.project_dir(&config.projects_dir);
        if let Some(file) = sessions::latest_record_file(&project_dir) {
            for message in sessions::tail_messages(&file, 5) {
                println!("  {}: {}", message.role, message.content);
            }
        }
        return Ok(());
    }

    let mut all = sessions::list_sessions(&config.sessions_file);
    if waiting {
        all.retain(|session| session.is_waiting());
    }

    if all.is_empty() {
        println!("no sessions");
        return Ok(());
    }
    for session in &all {
        println!(
            "{:<10} {:<30} {}",
            session.status, session.title, session.group_path
        );
    }
    Ok(())
}

async fn run_status(config: &Config) -> Result<()> {
    for status in services::check_all(config).await {
        let state = if status.running { "running" } else { "down" };
        println!("{:<16} port {:<6} {}", status.name, status.port, state);
    }

    let state = if config.transcript_log.exists() {
        "present"
    } else {
        "missing"
    };
    println!(
        "{:<16} {} ({})",
        "transcript log",
        state,
        config.transcript_log.display()
    );
    Ok(())
}
