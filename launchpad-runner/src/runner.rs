use crate::context::InvocationContext;
use async_stream::stream;
use futures::StreamExt;
use launchpad_core::{Agent, Content, Event, EventStream, Result};
use launchpad_session::{GetRequest, SessionService};
use std::sync::Arc;

/// Runs an agent against stored sessions, persisting every event it emits.
pub struct Runner {
    app_name: String,
    root_agent: Arc<dyn Agent>,
    session_service: Arc<dyn SessionService>,
}

impl Runner {
    pub fn new(
        app_name: impl Into<String>,
        root_agent: Arc<dyn Agent>,
        session_service: Arc<dyn SessionService>,
    ) -> Self {
        Self { app_name: app_name.into(), root_agent, session_service }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn root_agent(&self) -> &Arc<dyn Agent> {
        &self.root_agent
    }

    pub fn session_service(&self) -> &Arc<dyn SessionService> {
        &self.session_service
    }

    /// Sends `user_content` to the root agent within an existing session.
    ///
    /// The user message is stored before the agent runs; each non-partial
    /// agent event is stored before it is yielded.
    pub async fn run(
        &self,
        user_id: String,
        session_id: String,
        user_content: Content,
    ) -> Result<EventStream> {
        let app_name = self.app_name.clone();
        let session_service = self.session_service.clone();
        let root_agent = self.root_agent.clone();

        let s = stream! {
            let session = match session_service
                .get(GetRequest::new(&app_name, &user_id, &session_id))
                .await
            {
                Ok(s) => s,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let prior: Vec<Content> =
                session.events().iter().filter_map(|e| e.content.clone()).collect();

            let invocation_id = format!("inv-{}", uuid::Uuid::new_v4());
            launchpad_telemetry::info!(
                app = %app_name,
                user = %user_id,
                session = %session_id,
                invocation = %invocation_id,
                agent = root_agent.name(),
                "starting invocation"
            );

            let ctx = Arc::new(InvocationContext::new(
                invocation_id.clone(),
                app_name.clone(),
                user_id.clone(),
                session_id.clone(),
                prior,
                user_content.clone(),
            ));

            let user_event =
                Event::new(&invocation_id).with_author("user").with_content(user_content);
            if let Err(e) = session_service
                .append_event(&app_name, &user_id, &session_id, user_event)
                .await
            {
                yield Err(e);
                return;
            }

            let mut agent_stream = match root_agent.run(ctx).await {
                Ok(s) => s,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            while let Some(result) = agent_stream.next().await {
                match result {
                    Ok(event) => {
                        if !event.partial {
                            if let Err(e) = session_service
                                .append_event(&app_name, &user_id, &session_id, event.clone())
                                .await
                            {
                                yield Err(e);
                                return;
                            }
                        }
                        yield Ok(event);
                    }
                    Err(e) => {
                        launchpad_telemetry::error!(error = %e, "agent failed");
                        yield Err(e);
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(s))
    }
}
