//! Arbitration of a single permission request
//!
//! Holds the advisory marker, announces the prompt, polls the transcription
//! log, and classifies the spoken reply:
//! - Approve or Deny ends the session with a decision
//! - thirty silent ticks end it with no decision at all

mod classifier;
mod lock;
mod machine;

pub use classifier::{Classifier, KeywordError, KeywordSets, Verdict};
pub use lock::ArbitrationLock;
pub use machine::{ArbitrationSession, Phase};
