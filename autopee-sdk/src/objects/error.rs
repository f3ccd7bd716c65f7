use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON body of every non-2xx response.
///
/// `trace_id` is only set for internal errors; the same id is written to
/// the server log next to the underlying cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Uuid>,
}

impl ErrorBody {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            trace_id: None,
        }
    }

    pub fn internal(trace_id: Uuid) -> Self {
        Self {
            error_code: "internal_error".to_string(),
            message: "internal server error".to_string(),
            trace_id: Some(trace_id),
        }
    }
}
