use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    FunctionCall { name: String, args: serde_json::Value },
    FunctionResponse { name: String, response: serde_json::Value },
}

impl Content {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into(), parts: Vec::new() }
    }

    /// Shorthand for a single-text user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user").with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text { text: text.into() });
        self
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Concatenation of every text part, or `None` when there is none.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self.parts.iter().filter_map(Part::text).collect();
        if texts.is_empty() { None } else { Some(texts.concat()) }
    }

    pub fn function_calls(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.parts.iter().filter_map(|p| match p {
            Part::FunctionCall { name, args } => Some((name.as_str(), args)),
            _ => None,
        })
    }

    pub fn has_function_responses(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::FunctionResponse { .. }))
    }
}

impl Part {
    /// Returns the text content if this is a Text part, None otherwise
    pub fn text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }
}
