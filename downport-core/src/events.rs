//! Typed inbound event payloads.
//!
//! Webhook bodies are validated into these shapes at the boundary before
//! anything touches the state machine; nothing downstream ever sees an
//! untyped JSON mapping.

use serde::{Deserialize, Serialize};

use crate::types::PrNumber;

/// Notification that a new change request was opened upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestEvent {
    pub change_request_id: PrNumber,
    pub title: String,
    pub body: String,
}

/// CI status state as reported by the hosting service.
///
/// States other than `pending`/`passed` are preserved verbatim so the reactor
/// can log what it ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusState {
    Pending,
    Passed,
    Other(String),
}

impl From<String> for StatusState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => StatusState::Pending,
            "passed" => StatusState::Passed,
            _ => StatusState::Other(s),
        }
    }
}

impl From<StatusState> for String {
    fn from(state: StatusState) -> Self {
        match state {
            StatusState::Pending => "pending".to_owned(),
            StatusState::Passed => "passed".to_owned(),
            StatusState::Other(s) => s,
        }
    }
}

/// A CI status notification for a specific revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// CI context string, e.g. `continuous-integration/travis-ci/pr`.
    pub context: String,
    pub state: StatusState,
    /// Revision the status applies to (the change request's head).
    pub sha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_request_event_uses_wire_field_names() {
        let event: ChangeRequestEvent = serde_json::from_str(
            r#"{"changeRequestId": 9, "title": "Test PR", "body": "blah blah body"}"#,
        )
        .expect("deserialize");
        assert_eq!(event.change_request_id, PrNumber(9));
        assert_eq!(event.title, "Test PR");
    }

    #[test]
    fn status_state_preserves_unknown_values() {
        let event: StatusEvent = serde_json::from_str(
            r#"{"context": "ci/x", "state": "errored", "sha": "abc"}"#,
        )
        .expect("deserialize");
        assert_eq!(event.state, StatusState::Other("errored".to_owned()));

        let round: String = serde_json::to_string(&event.state).expect("serialize");
        assert_eq!(round, r#""errored""#);
    }

    #[test]
    fn status_state_known_values() {
        assert_eq!(StatusState::from("pending".to_owned()), StatusState::Pending);
        assert_eq!(StatusState::from("passed".to_owned()), StatusState::Passed);
    }
}
