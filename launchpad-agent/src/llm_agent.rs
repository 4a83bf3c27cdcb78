use async_stream::stream;
use async_trait::async_trait;
use launchpad_core::{
    Agent, Content, Event, EventActions, EventStream, FunctionDeclaration, InvocationContext,
    LaunchpadError, Llm, LlmRequest, Part, Result, Tool, ToolContext,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// An agent that alternates model turns and tool calls until the model
/// answers without requesting a tool.
pub struct LlmAgent {
    name: String,
    description: String,
    model: Arc<dyn Llm>,
    instruction: Option<String>,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: usize,
}

impl std::fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAgent")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("model", &self.model.name())
            .field("instruction", &self.instruction)
            .field("tools_count", &self.tools.len())
            .finish()
    }
}

pub struct LlmAgentBuilder {
    name: String,
    description: Option<String>,
    model: Option<Arc<dyn Llm>>,
    instruction: Option<String>,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: usize,
}

impl LlmAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            model: None,
            instruction: None,
            tools: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn model(mut self, model: Arc<dyn Llm>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Upper bound on model calls per invocation.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> Result<LlmAgent> {
        let model = self
            .model
            .ok_or_else(|| LaunchpadError::Agent(format!("agent `{}` has no model", self.name)))?;

        Ok(LlmAgent {
            name: self.name,
            description: self.description.unwrap_or_default(),
            model,
            instruction: self.instruction,
            tools: self.tools,
            max_iterations: self.max_iterations,
        })
    }
}

impl LlmAgent {
    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn model(&self) -> &Arc<dyn Llm> {
        &self.model
    }
}

struct AgentToolContext {
    parent_ctx: Arc<dyn InvocationContext>,
    function_call_id: String,
    actions: Mutex<EventActions>,
}

impl AgentToolContext {
    fn new(parent_ctx: Arc<dyn InvocationContext>, function_call_id: String) -> Self {
        Self { parent_ctx, function_call_id, actions: Mutex::new(EventActions::default()) }
    }
}

impl ToolContext for AgentToolContext {
    fn invocation_id(&self) -> &str {
        self.parent_ctx.invocation_id()
    }

    fn function_call_id(&self) -> &str {
        &self.function_call_id
    }

    fn app_name(&self) -> &str {
        self.parent_ctx.app_name()
    }

    fn user_id(&self) -> &str {
        self.parent_ctx.user_id()
    }

    fn session_id(&self) -> &str {
        self.parent_ctx.session_id()
    }

    fn actions(&self) -> EventActions {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn set_actions(&self, actions: EventActions) {
        if let Ok(mut current) = self.actions.lock() {
            *current = actions;
        }
    }
}

fn merge_actions(into: &mut EventActions, from: EventActions) {
    into.state_delta.extend(from.state_delta);
    into.escalate |= from.escalate;
    into.skip_summarization |= from.skip_summarization;
}

async fn call_tool(
    tools: &[Arc<dyn Tool>],
    ctx: &Arc<dyn InvocationContext>,
    call_id: String,
    name: &str,
    args: Value,
) -> (Value, EventActions) {
    let Some(tool) = tools.iter().find(|t| t.name() == name) else {
        launchpad_telemetry::warn!(tool = name, "model called an unknown tool");
        return (json!({ "error": format!("Tool {name} not found") }), EventActions::default());
    };

    let tool_ctx = Arc::new(AgentToolContext::new(ctx.clone(), call_id));
    launchpad_telemetry::info!(tool = name, "executing tool");
    let result = match tool.execute(tool_ctx.clone() as Arc<dyn ToolContext>, args).await {
        Ok(result) => result,
        Err(e) => {
            launchpad_telemetry::warn!(tool = name, error = %e, "tool failed");
            json!({ "error": e.to_string() })
        }
    };
    (result, tool_ctx.actions())
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, ctx: Arc<dyn InvocationContext>) -> Result<EventStream> {
        let agent_name = self.name.clone();
        let model = self.model.clone();
        let instruction = self.instruction.clone();
        let tools = self.tools.clone();
        let max_iterations = self.max_iterations;
        let declarations: Vec<FunctionDeclaration> =
            tools.iter().map(|t| t.declaration()).collect();

        let s = stream! {
            let invocation_id = ctx.invocation_id().to_string();
            let mut history: Vec<Content> = ctx.history().to_vec();
            let mut iteration = 0;

            loop {
                iteration += 1;
                if iteration > max_iterations {
                    yield Err(LaunchpadError::Agent(
                        format!("Max iterations ({max_iterations}) exceeded")
                    ));
                    return;
                }

                let mut request = LlmRequest::new(model.name(), history.clone())
                    .with_tools(declarations.clone());
                if let Some(instruction) = &instruction {
                    request = request.with_system_instruction(instruction.clone());
                }

                launchpad_telemetry::debug!(agent = %agent_name, iteration, "calling model");
                let response = match model.generate_content(request).await {
                    Ok(response) => response,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                let calls: Vec<(String, Value)> = response
                    .content
                    .as_ref()
                    .map(|c| c.function_calls().map(|(n, a)| (n.to_string(), a.clone())).collect())
                    .unwrap_or_default();

                let mut model_event = Event::new(&invocation_id).with_author(&agent_name);
                model_event.error_code = response.error_code;
                model_event.error_message = response.error_message;
                if let Some(content) = response.content {
                    history.push(content.clone());
                    model_event.content = Some(content);
                }
                yield Ok(model_event);

                if calls.is_empty() {
                    break;
                }

                // Every call of one model turn is answered in a single `function` turn.
                let mut responses = Content::new("function");
                let mut actions = EventActions::default();
                for (index, (name, args)) in calls.into_iter().enumerate() {
                    let call_id = format!("{invocation_id}_{name}_{index}");
                    let (response, tool_actions) =
                        call_tool(&tools, &ctx, call_id, &name, args).await;
                    merge_actions(&mut actions, tool_actions);
                    responses = responses.with_part(Part::FunctionResponse { name, response });
                }

                let terminate = actions.escalate || actions.skip_summarization;
                history.push(responses.clone());
                let mut tool_event = Event::new(&invocation_id)
                    .with_author(&agent_name)
                    .with_content(responses);
                tool_event.actions = actions;
                yield Ok(tool_event);

                if terminate {
                    break;
                }
            }
        };

        Ok(Box::pin(s))
    }
}
