use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use launchpad_core::{
    Agent, Content, Event, EventStream, InvocationContext, LaunchpadError, Part, Result,
};
use launchpad_runner::{
    NO_FINAL_RESPONSE, Runner, SessionStatus, call_agent, ensure_session,
};
use launchpad_session::{GetRequest, InMemorySessionService, SessionService};
use serde_json::json;
use std::sync::{Arc, Mutex};

const APP: &str = "weather_tutorial_app";
const USER: &str = "user_1";
const SESSION: &str = "session_001";

/// Emits a fixed list of events and remembers how much history it was given.
struct ScriptedAgent {
    script: Vec<Event>,
    seen_history: Mutex<Vec<usize>>,
}

impl ScriptedAgent {
    fn new(script: Vec<Event>) -> Arc<Self> {
        Arc::new(Self { script, seen_history: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        "root_agent"
    }

    fn description(&self) -> &str {
        "scripted"
    }

    async fn run(&self, ctx: Arc<dyn InvocationContext>) -> Result<EventStream> {
        self.seen_history.lock().unwrap().push(ctx.history().len());
        let invocation_id = ctx.invocation_id().to_string();
        let script = self.script.clone();
        let s = stream! {
            for mut event in script {
                event.invocation_id = invocation_id.clone();
                yield Ok(event);
            }
        };
        Ok(Box::pin(s))
    }
}

fn model_text(text: &str) -> Event {
    Event::new("").with_author("root_agent").with_content(Content::new("model").with_text(text))
}

fn model_call() -> Event {
    Event::new("").with_author("root_agent").with_content(Content::new("model").with_part(
        Part::FunctionCall { name: "get_current_time".into(), args: json!({"city": "Paris"}) },
    ))
}

fn tool_result() -> Event {
    let response = Part::FunctionResponse {
        name: "get_current_time".into(),
        response: json!({"time": "10:30 AM"}),
    };
    Event::new("")
        .with_author("root_agent")
        .with_content(Content::new("function").with_part(response))
}

async fn setup(agent: Arc<dyn Agent>) -> (Runner, Arc<InMemorySessionService>) {
    let service = Arc::new(InMemorySessionService::default());
    let status = ensure_session(service.as_ref(), APP, USER, SESSION).await.unwrap();
    assert_eq!(status, SessionStatus::Created);
    (Runner::new(APP, agent, service.clone()), service)
}

async fn stored_events(service: &InMemorySessionService) -> Vec<Event> {
    service.get(GetRequest::new(APP, USER, SESSION)).await.unwrap().events().to_vec()
}

#[tokio::test]
async fn test_ensure_session_is_idempotent() {
    let service = InMemorySessionService::default();
    assert_eq!(ensure_session(&service, APP, USER, SESSION).await.unwrap(), SessionStatus::Created);
    let status = ensure_session(&service, APP, USER, SESSION).await.unwrap();
    assert_eq!(status, SessionStatus::Existing);
}

#[tokio::test]
async fn test_run_requires_existing_session() {
    let service = Arc::new(InMemorySessionService::default());
    let runner = Runner::new(APP, ScriptedAgent::new(vec![model_text("hi")]), service);

    let mut events =
        runner.run(USER.into(), "missing".into(), Content::user("hello")).await.unwrap();
    let first = events.next().await.unwrap();

    assert!(matches!(first, Err(LaunchpadError::SessionNotFound { .. })));
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn test_run_persists_user_and_agent_events() {
    let agent = ScriptedAgent::new(vec![model_call(), tool_result(), model_text("10:30 AM")]);
    let (runner, service) = setup(agent.clone()).await;

    let events: Vec<Event> = runner
        .run(USER.into(), SESSION.into(), Content::user("How about Paris?"))
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    let stored = stored_events(&service).await;
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0].author, "user");
    assert_eq!(stored[0].content.as_ref().unwrap().text().as_deref(), Some("How about Paris?"));
    assert!(stored.iter().all(|e| e.invocation_id == stored[0].invocation_id));
}

#[tokio::test]
async fn test_second_turn_sees_prior_history() {
    let agent = ScriptedAgent::new(vec![model_text("Noted.")]);
    let (runner, _service) = setup(agent.clone()).await;

    call_agent(&runner, "What is time in Rotterdam?", USER, SESSION).await.unwrap();
    call_agent(&runner, "How about Paris?", USER, SESSION).await.unwrap();

    // first: the question; second: question, answer, new question
    assert_eq!(*agent.seen_history.lock().unwrap(), vec![1, 3]);
}

#[tokio::test]
async fn test_partial_events_are_yielded_but_not_stored() {
    let mut partial = model_text("Bo");
    partial.partial = true;
    let agent = ScriptedAgent::new(vec![partial, model_text("Boo!")]);
    let (runner, service) = setup(agent).await;

    let events: Vec<_> = runner
        .run(USER.into(), SESSION.into(), Content::user("scare me"))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events.len(), 2);
    assert_eq!(stored_events(&service).await.len(), 2);
}

#[tokio::test]
async fn test_call_agent_returns_final_text() {
    let agent =
        ScriptedAgent::new(vec![model_call(), tool_result(), model_text("It is 10:30 AM.")]);
    let (runner, _service) = setup(agent).await;

    let answer = call_agent(&runner, "How about Paris?", USER, SESSION).await.unwrap();

    assert_eq!(answer, "It is 10:30 AM.");
}

#[tokio::test]
async fn test_call_agent_reports_escalation() {
    let mut escalation = Event::new("").with_author("root_agent");
    escalation.actions.escalate = true;
    escalation.error_message = Some("cannot help".into());
    let (runner, _service) = setup(ScriptedAgent::new(vec![escalation])).await;

    let answer = call_agent(&runner, "help", USER, SESSION).await.unwrap();

    assert_eq!(answer, "Agent escalated: cannot help");
}

#[tokio::test]
async fn test_call_agent_escalation_without_message() {
    let mut escalation = tool_result();
    escalation.actions.escalate = true;
    let (runner, _service) = setup(ScriptedAgent::new(vec![escalation])).await;

    let answer = call_agent(&runner, "help", USER, SESSION).await.unwrap();

    assert_eq!(answer, "Agent escalated: No specific message.");
}

#[tokio::test]
async fn test_call_agent_without_final_response() {
    let (runner, _service) = setup(ScriptedAgent::new(vec![model_call(), tool_result()])).await;

    let answer = call_agent(&runner, "anyone?", USER, SESSION).await.unwrap();

    assert_eq!(answer, NO_FINAL_RESPONSE);
}
