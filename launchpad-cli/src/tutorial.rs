//! The Halloween-character tutorial agent and its scripted conversation.

use launchpad_agent::{FunctionTool, LlmAgent, LlmAgentBuilder};
use launchpad_core::{Llm, Result, Tool};
use serde_json::{Value, json};
use std::sync::Arc;

pub const APP_NAME: &str = "weather_tutorial_app";
pub const DEFAULT_USER_ID: &str = "user_1";
pub const DEFAULT_SESSION_ID: &str = "session_001";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

pub const AGENT_NAME: &str = "root_agent";
pub const AGENT_DESCRIPTION: &str = "Creates a fictional Halloween character.";
pub const AGENT_INSTRUCTION: &str = "You are a helpful assistant that helps a user to \
create a fictional Halloween character.\n\
Guide the user to choose some details for their character \
like gender, age, country of origin etc.\n\
When user have provided sufficient details or requested \
the character generation, use the details to create both a compelling \
background and image of the character.\n";

pub const DEFAULT_QUERIES: [&str; 3] =
    ["What is time in Rotterdam?", "How about Paris?", "Tell me about it in New York"];

/// Mock clock: every city is at 10:30 AM.
pub fn current_time(args: &Value) -> Value {
    match args.get("city").and_then(Value::as_str).map(str::trim) {
        Some(city) if !city.is_empty() => {
            json!({"status": "success", "city": city, "time": "10:30 AM"})
        }
        _ => json!({"status": "error", "error_message": "a city name is required"}),
    }
}

pub fn get_current_time_tool() -> Arc<dyn Tool> {
    Arc::new(
        FunctionTool::new(
            "get_current_time",
            "Returns the current time in a specified city.",
            |_ctx, args| async move { Ok(current_time(&args)) },
        )
        .with_parameters_schema(json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "Name of the city"}
            },
            "required": ["city"]
        })),
    )
}

pub fn root_agent(model: Arc<dyn Llm>) -> Result<LlmAgent> {
    LlmAgentBuilder::new(AGENT_NAME)
        .description(AGENT_DESCRIPTION)
        .instruction(AGENT_INSTRUCTION)
        .model(model)
        .tool(get_current_time_tool())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::{Agent, LaunchpadError, LlmRequest, LlmResponse};

    struct NullModel;

    #[async_trait::async_trait]
    impl Llm for NullModel {
        fn name(&self) -> &str {
            "null"
        }

        async fn generate_content(&self, _req: LlmRequest) -> Result<LlmResponse> {
            Err(LaunchpadError::Model("offline".into()))
        }
    }

    #[test]
    fn test_current_time_for_city() {
        assert_eq!(
            current_time(&json!({"city": "Rotterdam"})),
            json!({"status": "success", "city": "Rotterdam", "time": "10:30 AM"})
        );
    }

    #[test]
    fn test_current_time_requires_city() {
        for args in [json!({}), json!({"city": "  "}), json!({"city": 7})] {
            assert_eq!(current_time(&args)["status"], "error");
        }
    }

    #[test]
    fn test_root_agent_shape() {
        let agent = root_agent(Arc::new(NullModel)).unwrap();
        assert_eq!(agent.name(), "root_agent");
        assert_eq!(agent.description(), AGENT_DESCRIPTION);
        assert!(agent.instruction().unwrap().contains("fictional Halloween character"));
        assert_eq!(agent.tools()[0].name(), "get_current_time");
        assert!(agent.tools()[0].declaration().parameters.is_some());
    }
}
