//! One-shot helpers for scripted conversations.

use crate::runner::Runner;
use futures::StreamExt;
use launchpad_core::{Content, LaunchpadError, Result};
use launchpad_session::{CreateRequest, GetRequest, SessionService};

pub const NO_FINAL_RESPONSE: &str = "Agent did not produce a final response.";
pub const NO_ESCALATION_MESSAGE: &str = "No specific message.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Created,
    Existing,
}

/// Looks the session up and creates it if it does not exist yet.
pub async fn ensure_session(
    service: &dyn SessionService,
    app_name: &str,
    user_id: &str,
    session_id: &str,
) -> Result<SessionStatus> {
    match service.get(GetRequest::new(app_name, user_id, session_id)).await {
        Ok(_) => Ok(SessionStatus::Existing),
        Err(LaunchpadError::SessionNotFound { .. }) => {
            service.create(CreateRequest::new(app_name, user_id, session_id)).await?;
            Ok(SessionStatus::Created)
        }
        Err(e) => Err(e),
    }
}

/// Sends `query` and returns the text of the agent's final response.
///
/// Events are consumed until the first final response or escalation. Its
/// first part's text wins; an escalation without text reports the escalation
/// instead. An escalating event ends the exchange even when it is not a
/// final response.
pub async fn call_agent(
    runner: &Runner,
    query: &str,
    user_id: &str,
    session_id: &str,
) -> Result<String> {
    let mut events =
        runner.run(user_id.to_string(), session_id.to_string(), Content::user(query)).await?;

    let mut final_response = NO_FINAL_RESPONSE.to_string();
    while let Some(event) = events.next().await {
        let event = event?;
        if !event.is_final_response() && !event.actions.escalate {
            continue;
        }

        let first_text = event
            .content
            .as_ref()
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text())
            .map(str::to_string);

        if let Some(text) = first_text {
            final_response = text;
        } else if event.actions.escalate {
            final_response = format!(
                "Agent escalated: {}",
                event.error_message.as_deref().unwrap_or(NO_ESCALATION_MESSAGE)
            );
        }
        break;
    }

    Ok(final_response)
}
