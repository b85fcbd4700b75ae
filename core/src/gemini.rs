use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    #[must_use]
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: Option<String>,
}

/// Concatenate the text parts of the first candidate.
#[must_use]
pub fn extract_text(resp: &GenerateResponse) -> Option<String> {
    let content = resp.candidates.as_ref()?.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

/// Why a response carried no text, for error reporting.
#[must_use]
pub fn empty_reason(resp: &GenerateResponse) -> String {
    if let Some(reason) = resp
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return format!("prompt blocked ({reason})");
    }
    match resp
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.finish_reason.as_deref())
    {
        Some(reason) => format!("no text in response (finish reason {reason})"),
        None => "no text in response".to_string(),
    }
}

/// Error message for a non-success response, taken from the JSON body when
/// it has one.
#[must_use]
pub fn error_message(status: u16, body: &str) -> String {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map_or_else(
            || body.trim().to_string(),
            |e| match e.status {
                Some(s) => format!("{s}: {}", e.message),
                None => e.message,
            },
        );
    format!("Gemini API error ({status}): {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(GenerateRequest::from_prompt("hi")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Squats "},{"text":"x3"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(&resp).as_deref(), Some("Squats x3"));
    }

    #[test]
    fn test_extract_text_missing() {
        let resp: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(extract_text(&resp).is_none());
        assert_eq!(empty_reason(&resp), "prompt blocked (SAFETY)");

        let resp: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#).unwrap();
        assert!(extract_text(&resp).is_none());
        assert!(empty_reason(&resp).contains("MAX_TOKENS"));
    }

    #[test]
    fn test_error_message_from_json() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            error_message(429, body),
            "Gemini API error (429): RESOURCE_EXHAUSTED: Resource has been exhausted"
        );
    }

    #[test]
    fn test_error_message_plain_body() {
        assert_eq!(
            error_message(502, "Bad Gateway\n"),
            "Gemini API error (502): Bad Gateway"
        );
    }
}
