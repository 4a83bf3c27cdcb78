//! JSON shapes of the `generateContent` REST call.

use launchpad_core::{
    Content, FinishReason, FunctionDeclaration, LlmRequest, LlmResponse, Part, UsageMetadata,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<WireFunctionResponse>,
    /// Set on thought summaries from thinking models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionResponse {
    pub name: String,
    #[serde(default)]
    pub response: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<WireUsage>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<WireContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUsage {
    pub prompt_token_count: Option<i32>,
    pub candidates_token_count: Option<i32>,
    pub total_token_count: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

fn part_to_wire(part: &Part) -> WirePart {
    match part {
        Part::Text { text } => WirePart { text: Some(text.clone()), ..WirePart::default() },
        Part::FunctionCall { name, args } => WirePart {
            function_call: Some(WireFunctionCall { name: name.clone(), args: args.clone() }),
            ..WirePart::default()
        },
        Part::FunctionResponse { name, response } => WirePart {
            function_response: Some(WireFunctionResponse {
                name: name.clone(),
                response: response.clone(),
            }),
            ..WirePart::default()
        },
    }
}

fn part_from_wire(part: WirePart) -> Option<Part> {
    if part.thought == Some(true) {
        return None;
    }
    if let Some(call) = part.function_call {
        return Some(Part::FunctionCall { name: call.name, args: call.args });
    }
    if let Some(response) = part.function_response {
        return Some(Part::FunctionResponse { name: response.name, response: response.response });
    }
    part.text.map(|text| Part::Text { text })
}

/// Gemini only knows `user` and `model`; tool results travel as `user` turns.
fn wire_role(role: &str) -> &'static str {
    match role {
        "model" => "model",
        _ => "user",
    }
}

impl From<&LlmRequest> for GenerateContentRequest {
    fn from(req: &LlmRequest) -> Self {
        let contents = req
            .contents
            .iter()
            .filter(|c| !c.parts.is_empty())
            .map(|c| WireContent {
                role: Some(wire_role(&c.role).to_string()),
                parts: c.parts.iter().map(part_to_wire).collect(),
            })
            .collect();

        let system_instruction = req.system_instruction.as_ref().filter(|s| !s.is_empty()).map(|s| {
            WireContent {
                role: None,
                parts: vec![WirePart { text: Some(s.clone()), ..WirePart::default() }],
            }
        });

        let tools = if req.tools.is_empty() {
            Vec::new()
        } else {
            vec![WireTool { function_declarations: req.tools.clone() }]
        };

        Self { contents, system_instruction, tools }
    }
}

fn finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" => FinishReason::Safety,
        "RECITATION" => FinishReason::Recitation,
        _ => FinishReason::Other,
    }
}

impl From<GenerateContentResponse> for LlmResponse {
    fn from(resp: GenerateContentResponse) -> Self {
        let usage_metadata = resp.usage_metadata.map(|u| UsageMetadata {
            prompt_token_count: u.prompt_token_count.unwrap_or(0),
            candidates_token_count: u.candidates_token_count.unwrap_or(0),
            total_token_count: u.total_token_count.unwrap_or(0),
        });

        let Some(candidate) = resp.candidates.into_iter().next() else {
            let reason = resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "NO_CANDIDATES".to_string());
            return LlmResponse {
                content: None,
                usage_metadata,
                finish_reason: Some(FinishReason::Other),
                error_message: Some(format!("Gemini returned no candidates ({reason})")),
                error_code: Some(reason),
            };
        };

        let raw_reason = candidate.finish_reason;
        let content = candidate
            .content
            .map(|c| Content {
                role: "model".to_string(),
                parts: c.parts.into_iter().filter_map(part_from_wire).collect(),
            })
            .filter(|c| !c.parts.is_empty());

        let (error_code, error_message) = match (&content, raw_reason.as_deref()) {
            (None, Some(reason)) if reason != "STOP" => {
                (Some(reason.to_string()), Some(format!("generation stopped: {reason}")))
            }
            _ => (None, None),
        };

        LlmResponse {
            content,
            usage_metadata,
            finish_reason: raw_reason.as_deref().map(finish_reason),
            error_code,
            error_message,
        }
    }
}
