use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use fitflow_core::gemini::{
    GenerateRequest, GenerateResponse, empty_reason, error_message, extract_text,
};
use fitflow_core::generation::TextGenerator;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Self::with_base_url(api_key, model, BASE_URL)
    }

    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "fitflow/{} (workout and dinner planner)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    pub async fn generate_async(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "calling Gemini");
        // The request URL ends in "generateContent", which would otherwise
        // match the "rate" rate-limit probe on every transport error.
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to reach Gemini API")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read Gemini response")?;

        if !status.is_success() {
            return Err(anyhow!(error_message(status.as_u16(), &body)));
        }

        let data: GenerateResponse =
            serde_json::from_str(&body).context("Failed to parse Gemini response")?;
        extract_text(&data).ok_or_else(|| anyhow!("Gemini returned {}", empty_reason(&data)))
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_async(prompt).await
    }
}
