//! Result records produced by the command processor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::command::{Command, CorrelationId};

/// Outcome status of one executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// The executor accepted the command.
    Success,
    /// The executor rejected the command and the batch carried on.
    Error,
}

/// Outcome record for one command, serialised as one NDJSON line.
///
/// ```json
/// {"id":1,"status":"success","$anchor":"user-a","data":{"id":"user_1"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    id: CorrelationId,
    status: ResultStatus,
    #[serde(rename = "$anchor", default, skip_serializing_if = "Option::is_none")]
    anchor: Option<String>,
    data: Value,
}

impl CommandResult {
    /// Creates a success record for the command with the executor's payload.
    #[must_use]
    pub fn success(command: &Command, data: Value) -> Self {
        Self {
            id: command.id(),
            status: ResultStatus::Success,
            anchor: command.anchor().map(str::to_owned),
            data,
        }
    }

    /// Creates an error record for the command.
    #[must_use]
    pub fn failure(command: &Command, detail: &ErrorDetail) -> Self {
        Self {
            id: command.id(),
            status: ResultStatus::Error,
            anchor: command.anchor().map(str::to_owned),
            data: detail.to_value(),
        }
    }

    /// Returns the correlation id of the originating command.
    #[must_use]
    pub const fn id(&self) -> CorrelationId {
        self.id
    }

    /// Returns the outcome status.
    #[must_use]
    pub const fn status(&self) -> ResultStatus {
        self.status
    }

    /// Returns `true` when the command succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, ResultStatus::Success)
    }

    /// Returns the client correlation reference echoed from the command.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Returns the result payload.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }
}

/// Serialisable description of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    kind: String,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<usize>,
}

impl ErrorDetail {
    /// Creates a detail record.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>, position: Option<usize>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            position,
        }
    }

    /// Returns the error class name.
    #[must_use]
    pub const fn kind(&self) -> &str {
        self.kind.as_str()
    }

    /// Returns the human-readable message.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the batch position the failure refers to, if any.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        self.position
    }

    /// Renders the detail as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut members = Map::new();
        members.insert("kind".to_owned(), Value::from(self.kind.as_str()));
        members.insert("message".to_owned(), Value::from(self.message.as_str()));
        if let Some(position) = self.position {
            members.insert("position".to_owned(), Value::from(position));
        }
        Value::Object(members)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::ANCHOR_KEY;

    #[test]
    fn anchor_serialises_under_reserved_key() {
        assert_eq!(ANCHOR_KEY, "$anchor");
        let command = Command::from_value(
            CorrelationId::new(2),
            json!(["create", "user", {"name": "a", "$anchor": "user-a"}]),
        )
        .expect("valid command");
        let result = CommandResult::success(&command, json!({"id": "user_2"}));

        let encoded = serde_json::to_value(&result).expect("serialise result");
        assert_eq!(
            encoded,
            json!({"id": 2, "status": "success", "$anchor": "user-a", "data": {"id": "user_2"}})
        );
    }

    #[test]
    fn failure_embeds_error_detail() {
        let command = Command::from_value(CorrelationId::new(0), json!(["config", {}]))
            .expect("valid command");
        let detail = ErrorDetail::new("execution", "store offline", Some(0));
        let result = CommandResult::failure(&command, &detail);

        assert!(!result.is_success());
        assert_eq!(
            result.data(),
            &json!({"kind": "execution", "message": "store offline", "position": 0})
        );
        assert!(result.anchor().is_none());
    }
}
