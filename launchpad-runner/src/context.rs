use launchpad_core::{Content, InvocationContext as InvocationContextTrait};

/// The context handed to the root agent for one `Runner::run` call.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    invocation_id: String,
    app_name: String,
    user_id: String,
    session_id: String,
    /// Prior turns followed by the current user message.
    history: Vec<Content>,
}

impl InvocationContext {
    pub fn new(
        invocation_id: String,
        app_name: String,
        user_id: String,
        session_id: String,
        prior: Vec<Content>,
        user_content: Content,
    ) -> Self {
        let mut history = prior;
        history.push(user_content);
        Self { invocation_id, app_name, user_id, session_id, history }
    }
}

impl InvocationContextTrait for InvocationContext {
    fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn user_content(&self) -> &Content {
        // `new` always pushes the user message last.
        &self.history[self.history.len() - 1]
    }

    fn history(&self) -> &[Content] {
        &self.history
    }
}
