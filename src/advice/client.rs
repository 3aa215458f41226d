use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::FocusData;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Focus metrics attached to one advice request.
#[derive(Debug, Clone)]
pub struct AdviceRequest {
    pub focus_duration: f64,
    pub distraction_count: u32,
    pub avg_distraction_time: f64,
    pub focused: bool,
    pub direction: String,
}

impl From<&FocusData> for AdviceRequest {
    fn from(data: &FocusData) -> Self {
        Self {
            focus_duration: data.focus_duration,
            distraction_count: data.distraction_count,
            avg_distraction_time: data.avg_distraction_time,
            focused: data.focused,
            direction: data.direction.as_str().to_string(),
        }
    }
}

/// Text-generation backend behind the advice worker.
#[async_trait]
pub trait AdviceModel: Send + Sync {
    async fn generate(&self, request: &AdviceRequest) -> Result<String>;
}

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    pub fn new() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?;
        Ok(Self::with_key(api_key))
    }

    pub fn with_key(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl AdviceModel for GeminiClient {
    async fn generate(&self, request: &AdviceRequest) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(request),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Gemini API request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Gemini API returned {status}: {error_text}");
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .context("failed to parse Gemini response")?;

        payload
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.trim().to_string())
            .ok_or_else(|| anyhow!("Gemini response contained no advice text"))
    }
}

fn build_prompt(request: &AdviceRequest) -> String {
    let minutes_focused = request.focus_duration / 60.0;
    let current_status = if request.focused {
        "focused"
    } else {
        "distracted"
    };

    format!(
        "You are a focus assistant. Provide 2-3 tips for improving focus. \
         User has been focused for {minutes_focused:.1} minutes with {distraction_count} distractions. \
         Average distraction time is {avg_distraction_time:.1} seconds. \
         User is currently {current_status} and looking {direction}. \
         Keep your advice brief, clear, and practical.",
        distraction_count = request.distraction_count,
        avg_distraction_time = request.avg_distraction_time,
        direction = request.direction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GazeDirection;
    use chrono::Utc;

    #[test]
    fn prompt_reports_metrics_in_minutes() {
        let request = AdviceRequest {
            focus_duration: 150.0,
            distraction_count: 3,
            avg_distraction_time: 4.25,
            focused: true,
            direction: "CENTER".to_string(),
        };

        let prompt = build_prompt(&request);
        assert!(prompt.contains("focused for 2.5 minutes with 3 distractions"));
        assert!(prompt.contains("Average distraction time is 4.2 seconds"));
        assert!(prompt.contains("currently focused and looking CENTER"));
    }

    #[test]
    fn prompt_marks_distracted_state() {
        let request = AdviceRequest {
            focus_duration: 0.0,
            distraction_count: 0,
            avg_distraction_time: 0.0,
            focused: false,
            direction: "LEFT".to_string(),
        };

        let prompt = build_prompt(&request);
        assert!(prompt.contains("currently distracted and looking LEFT"));
    }

    #[test]
    fn request_copies_focus_snapshot() {
        let data = FocusData {
            focused: false,
            direction: GazeDirection::Right,
            blinking: false,
            focus_duration: 30.0,
            distraction_count: 2,
            avg_distraction_time: 1.5,
            timestamp: Utc::now(),
        };

        let request = AdviceRequest::from(&data);
        assert_eq!(request.direction, "RIGHT");
        assert!(!request.focused);
        assert_eq!(request.distraction_count, 2);
    }
}
