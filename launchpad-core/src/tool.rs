use crate::{EventActions, FunctionDeclaration, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// JSON schema (OpenAPI subset) of the arguments object.
    fn parameters_schema(&self) -> Option<Value> {
        None
    }

    fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value>;
}

/// What a tool can see of, and do to, the invocation that called it.
pub trait ToolContext: Send + Sync {
    fn invocation_id(&self) -> &str;
    fn function_call_id(&self) -> &str;
    fn app_name(&self) -> &str;
    fn user_id(&self) -> &str;
    fn session_id(&self) -> &str;
    fn actions(&self) -> EventActions;
    fn set_actions(&self, actions: EventActions);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoTool;

    struct TestContext {
        actions: Mutex<EventActions>,
    }

    impl ToolContext for TestContext {
        fn invocation_id(&self) -> &str {
            "inv"
        }
        fn function_call_id(&self) -> &str {
            "call-1"
        }
        fn app_name(&self) -> &str {
            "app"
        }
        fn user_id(&self) -> &str {
            "user"
        }
        fn session_id(&self) -> &str {
            "session"
        }
        fn actions(&self) -> EventActions {
            self.actions.lock().unwrap().clone()
        }
        fn set_actions(&self, actions: EventActions) {
            *self.actions.lock().unwrap() = actions;
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes its arguments"
        }

        async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value> {
            let mut actions = ctx.actions();
            actions.escalate = true;
            ctx.set_actions(actions);
            Ok(args)
        }
    }

    #[test]
    fn test_default_declaration() {
        let decl = EchoTool.declaration();
        assert_eq!(decl.name, "echo");
        assert_eq!(decl.description, "echoes its arguments");
        assert!(decl.parameters.is_none());
    }

    #[tokio::test]
    async fn test_tool_can_update_actions() {
        let ctx = Arc::new(TestContext { actions: Mutex::new(EventActions::default()) });
        let result = EchoTool
            .execute(ctx.clone() as Arc<dyn ToolContext>, serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(result["a"], 1);
        assert!(ctx.actions().escalate);
    }
}
