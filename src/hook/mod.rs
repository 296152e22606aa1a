//! Permission-hook protocol between the automation host and this tool

mod protocol;

pub use protocol::{
    Behavior, Decision, DecisionRecord, PermissionRequest, ProtocolError, DENIED_VIA_VOICE,
};
