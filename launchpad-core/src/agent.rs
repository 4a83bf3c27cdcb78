use crate::{Result, event::Event, types::Content};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<Event>> + Send>>;

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    async fn run(&self, ctx: Arc<dyn InvocationContext>) -> Result<EventStream>;
}

pub trait InvocationContext: Send + Sync {
    fn invocation_id(&self) -> &str;
    fn app_name(&self) -> &str;
    fn user_id(&self) -> &str;
    fn session_id(&self) -> &str;
    fn user_content(&self) -> &Content;

    /// Prior conversation turns, oldest first, ending with the current user message.
    fn history(&self) -> &[Content];
}
