//! Permission-hook wire protocol
//!
//! The automation host delivers a permission-request descriptor on stdin and
//! reads at most one decision record from stdout. An allow or deny outcome
//! produces a record; a timed-out session produces nothing, which the host
//! treats as "arbitrate manually".

use std::io::Read;

use serde::{Deserialize, Serialize};

/// Fixed reason attached to spoken denials.
pub const DENIED_VIA_VOICE: &str = "Denied via voice";

/// Errors in the incoming descriptor. None of these are fatal to the host:
/// the hook exits without a decision and the host falls back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("descriptor is not a permission prompt (type: {0})")]
    NotAPermissionPrompt(String),

    #[error("descriptor has no action name")]
    MissingAction,

    #[error("failed to parse permission request: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Descriptor delivered by the automation host.
///
/// Only the action name is used here; every other field is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionRequest {
    /// Name of the action awaiting approval
    #[serde(default)]
    pub tool_name: String,

    /// Hook event tag; anything other than `permission_prompt` is skipped
    #[serde(default)]
    pub notification_type: Option<String>,
}

impl PermissionRequest {
    /// Parse and validate a descriptor from a stream.
    pub fn from_reader(reader: impl Read) -> Result<Self, ProtocolError> {
        let request: Self = serde_json::from_reader(reader)?;

        if let Some(kind) = &request.notification_type {
            if kind != "permission_prompt" {
                return Err(ProtocolError::NotAPermissionPrompt(kind.clone()));
            }
        }
        if request.tool_name.trim().is_empty() {
            return Err(ProtocolError::MissingAction);
        }

        Ok(request)
    }
}

/// Outcome of one arbitration session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Spoken approval
    Allow,
    /// Spoken denial, with the reason reported to the host
    Deny { reason: String },
    /// No classifiable reply within the decision window
    Indeterminate,
}

impl Decision {
    /// The structured record for the host, or `None` for Indeterminate,
    /// which is signalled by the absence of a record.
    pub fn to_record(&self) -> Option<DecisionRecord> {
        match self {
            Decision::Allow => Some(DecisionRecord {
                behavior: Behavior::Allow,
                message: None,
            }),
            Decision::Deny { reason } => Some(DecisionRecord {
                behavior: Behavior::Deny,
                message: Some(reason.clone()),
            }),
            Decision::Indeterminate => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Allow => write!(f, "allow"),
            Decision::Deny { reason } => write!(f, "deny ({})", reason),
            Decision::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// Decision record understood by the host's permission-hook protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub behavior: Behavior,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Host-facing behavior tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Allow,
    Deny,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parse_ignores_extra_fields() {
        let json = r#"{"tool_name":"Bash","tool_input":{"command":"npm install"},"session_id":"abc"}"#;
        let request = PermissionRequest::from_reader(json.as_bytes()).unwrap();
        assert_eq!(request.tool_name, "Bash");
    }

    #[test]
    fn test_request_rejects_other_notification_types() {
        let json = r#"{"notification_type":"idle","tool_name":"Bash"}"#;
        assert!(matches!(
            PermissionRequest::from_reader(json.as_bytes()),
            Err(ProtocolError::NotAPermissionPrompt(_))
        ));
    }

    #[test]
    fn test_request_accepts_permission_prompt_type() {
        let json = r#"{"notification_type":"permission_prompt","tool_name":"WebFetch"}"#;
        let request = PermissionRequest::from_reader(json.as_bytes()).unwrap();
        assert_eq!(request.tool_name, "WebFetch");
    }

    #[test]
    fn test_request_requires_action_name() {
        assert!(matches!(
            PermissionRequest::from_reader(r#"{}"#.as_bytes()),
            Err(ProtocolError::MissingAction)
        ));
        assert!(matches!(
            PermissionRequest::from_reader(r#"{"tool_name":"  "}"#.as_bytes()),
            Err(ProtocolError::MissingAction)
        ));
    }

    #[test]
    fn test_request_parse_error_on_malformed_input() {
        assert!(matches!(
            PermissionRequest::from_reader("not json".as_bytes()),
            Err(ProtocolError::Parse(_))
        ));
    }

    #[test]
    fn test_allow_record() {
        let record = Decision::Allow.to_record().unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"behavior":"allow"}"#);
    }

    #[test]
    fn test_deny_record_carries_fixed_message() {
        let decision = Decision::Deny {
            reason: DENIED_VIA_VOICE.to_string(),
        };
        let record = decision.to_record().unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"behavior":"deny","message":"Denied via voice"}"#);
    }

    #[test]
    fn test_indeterminate_has_no_record() {
        assert!(Decision::Indeterminate.to_record().is_none());
    }
}
