use crate::{Result, types::Content};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait Llm: Send + Sync {
    fn name(&self) -> &str;
    async fn generate_content(&self, req: LlmRequest) -> Result<LlmResponse>;
}

/// A function the model is allowed to call, in Gemini's declaration shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
    pub tools: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: Option<Content>,
    pub usage_metadata: Option<UsageMetadata>,
    pub finish_reason: Option<FinishReason>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_token_count: i32,
    pub candidates_token_count: i32,
    pub total_token_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self { model: model.into(), system_instruction: None, contents, tools: Vec::new() }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<FunctionDeclaration>) -> Self {
        self.tools = tools;
        self
    }
}

impl LlmResponse {
    pub fn new(content: Content) -> Self {
        Self { content: Some(content), finish_reason: Some(FinishReason::Stop), ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_request_creation() {
        let req = LlmRequest::new("test-model", vec![]).with_system_instruction("be brief");
        assert_eq!(req.model, "test-model");
        assert!(req.contents.is_empty());
        assert_eq!(req.system_instruction.as_deref(), Some("be brief"));
    }

    #[test]
    fn test_llm_response_creation() {
        let resp = LlmResponse::new(Content::new("model"));
        assert!(resp.content.is_some());
        assert_eq!(resp.finish_reason, Some(FinishReason::Stop));
        assert!(resp.error_message.is_none());
    }

    #[test]
    fn test_declaration_omits_missing_parameters() {
        let decl = FunctionDeclaration {
            name: "noop".into(),
            description: "does nothing".into(),
            parameters: None,
        };
        let json = serde_json::to_value(&decl).unwrap();
        assert!(json.get("parameters").is_none());
    }
}
