use crate::types::Content;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// State scope prefixes
pub const KEY_PREFIX_APP: &str = "app:";
pub const KEY_PREFIX_TEMP: &str = "temp:";
pub const KEY_PREFIX_USER: &str = "user:";

/// A single interaction in a conversation: a user message, a model turn, or a
/// tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub invocation_id: String,
    pub author: String,
    pub content: Option<Content>,
    #[serde(default)]
    pub partial: bool,
    pub actions: EventActions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventActions {
    pub state_delta: HashMap<String, serde_json::Value>,
    pub skip_summarization: bool,
    pub escalate: bool,
}

impl Event {
    pub fn new(invocation_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            invocation_id: invocation_id.into(),
            author: String::new(),
            content: None,
            partial: false,
            actions: EventActions::default(),
            error_code: None,
            error_message: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    /// Whether this event ends the agent's turn from the caller's point of view.
    ///
    /// Tool-call requests, tool results and partial chunks are intermediate;
    /// `skip_summarization` marks a tool result as the final answer.
    pub fn is_final_response(&self) -> bool {
        if self.actions.skip_summarization {
            return true;
        }
        if self.partial {
            return false;
        }
        match &self.content {
            Some(content) => {
                content.function_calls().next().is_none() && !content.has_function_responses()
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Part;
    use serde_json::json;

    #[test]
    fn test_event_creation() {
        let event = Event::new("inv-123");
        assert_eq!(event.invocation_id, "inv-123");
        assert!(!event.id.is_empty());
        assert!(event.content.is_none());
    }

    #[test]
    fn test_text_event_is_final() {
        let event = Event::new("inv").with_content(Content::new("model").with_text("done"));
        assert!(event.is_final_response());
    }

    #[test]
    fn test_function_call_is_not_final() {
        let content = Content::new("model").with_part(Part::FunctionCall {
            name: "get_current_time".into(),
            args: json!({"city": "Paris"}),
        });
        let event = Event::new("inv").with_content(content);
        assert!(!event.is_final_response());
    }

    #[test]
    fn test_function_response_is_not_final_unless_skipped() {
        let content = Content::new("function")
            .with_part(Part::FunctionResponse { name: "f".into(), response: json!({}) });
        let mut event = Event::new("inv").with_content(content);
        assert!(!event.is_final_response());

        event.actions.skip_summarization = true;
        assert!(event.is_final_response());
    }

    #[test]
    fn test_partial_is_not_final() {
        let mut event = Event::new("inv").with_content(Content::new("model").with_text("par"));
        event.partial = true;
        assert!(!event.is_final_response());
    }

    #[test]
    fn test_state_prefixes() {
        assert_eq!(KEY_PREFIX_APP, "app:");
        assert_eq!(KEY_PREFIX_TEMP, "temp:");
        assert_eq!(KEY_PREFIX_USER, "user:");
    }
}
