//! Spoken prompt announcements
//!
//! Fire-and-forget speech requests to the local TTS endpoint. The outcome is
//! never awaited: a prompt that fails to render only lowers the chance of a
//! timely reply, and the arbitration session times out on its own either way.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

/// Build the spoken prompt for a permission request.
///
/// Only the action name is spoken; arguments and other detail stay out of
/// the audio channel.
pub fn permission_prompt(action: &str) -> String {
    format!("Permission requested: {}. Say yes or no.", action)
}

#[derive(Debug, Serialize)]
struct SpeechRequest {
    model: &'static str,
    input: String,
    voice: String,
    response_format: &'static str,
}

/// Client for the text-to-speech endpoint.
#[derive(Clone)]
pub struct Announcer {
    client: Client,
    url: String,
    voice: String,
}

impl Announcer {
    pub fn new(url: String, voice: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            url,
            voice,
        }
    }

    /// Issue the speech request without waiting for the outcome.
    pub fn announce(&self, text: &str) {
        let client = self.client.clone();
        let url = self.url.clone();
        let body = SpeechRequest {
            model: "kokoro",
            input: text.to_string(),
            voice: self.voice.clone(),
            response_format: "pcm",
        };

        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("prompt announced");
                }
                Ok(resp) => {
                    warn!(status = %resp.status(), "speech endpoint rejected prompt");
                }
                Err(e) => {
                    warn!(?e, "speech request failed");
                }
            }
        });
    }
}
