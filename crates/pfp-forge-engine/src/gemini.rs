use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};

use crate::config::ForgeConfig;
use crate::service::{GenerativeService, ImageGenerationRequest, InlineImage, StructuredTextRequest};

/// Gemini `generateContent` transport. One attempt per call, no request
/// timeout.
pub struct GeminiService {
    api_base: String,
    api_key: Option<String>,
    image_model: String,
    text_model: String,
    http: HttpClient,
}

impl GeminiService {
    pub fn new(config: &ForgeConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(None::<Duration>)
            .build()
            .context("failed to build Gemini HTTP client")?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
            http,
        })
    }

    fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!("API_KEY or GEMINI_API_KEY or GOOGLE_API_KEY not set"),
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn image_payload(request: &ImageGenerationRequest) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": {
                    "aspectRatio": request.aspect_ratio,
                },
            },
        })
    }

    fn structured_payload(request: &StructuredTextRequest) -> Value {
        json!({
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }],
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.response_schema,
            },
        })
    }

    fn post(&self, model: &str, payload: &Value) -> Result<Value> {
        let api_key = self.api_key()?;
        let endpoint = self.endpoint_for_model(model);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(payload)
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        response_json_or_error("Gemini", response)
    }

    fn first_candidate_parts(response_payload: &Value) -> Vec<Value> {
        response_payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    fn extract_inline_image(response_payload: &Value) -> Option<InlineImage> {
        Self::first_candidate_parts(response_payload)
            .into_iter()
            .find_map(|part| {
                let inline = part
                    .get("inlineData")
                    .or_else(|| part.get("inline_data"))
                    .and_then(Value::as_object)?;
                let data = inline
                    .get("data")
                    .and_then(Value::as_str)
                    .filter(|data| !data.is_empty())?;
                let mime_type = inline
                    .get("mimeType")
                    .or_else(|| inline.get("mime_type"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Some(InlineImage {
                    mime_type,
                    data: data.to_string(),
                })
            })
    }

    fn extract_text(response_payload: &Value) -> String {
        Self::first_candidate_parts(response_payload)
            .iter()
            .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<&str>>()
            .join("")
    }
}

impl GenerativeService for GeminiService {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate_image(&self, request: &ImageGenerationRequest) -> Result<Option<InlineImage>> {
        let payload = Self::image_payload(request);
        let response_payload = self.post(&self.image_model, &payload)?;
        Ok(Self::extract_inline_image(&response_payload))
    }

    fn generate_structured_text(&self, request: &StructuredTextRequest) -> Result<String> {
        let payload = Self::structured_payload(request);
        let response_payload = self.post(&self.text_model, &payload)?;
        Ok(Self::extract_text(&response_payload))
    }
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{truncate_text, GeminiService};
    use crate::config::ForgeConfig;
    use crate::service::{
        GenerativeService, ImageGenerationRequest, InlineImage, StructuredTextRequest,
    };

    fn service(api_key: Option<&str>) -> anyhow::Result<GeminiService> {
        GeminiService::new(&ForgeConfig {
            api_key: api_key.map(str::to_string),
            api_base: "http://127.0.0.1:9/v1beta/".to_string(),
            ..ForgeConfig::default()
        })
    }

    #[test]
    fn endpoint_prefixes_models_path_once() -> anyhow::Result<()> {
        let gemini = service(Some("k"))?;
        assert_eq!(
            gemini.endpoint_for_model("gemini-2.5-flash-image"),
            "http://127.0.0.1:9/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(
            gemini.endpoint_for_model(" models/gemini-3-flash-preview "),
            "http://127.0.0.1:9/v1beta/models/gemini-3-flash-preview:generateContent"
        );
        Ok(())
    }

    #[test]
    fn image_payload_forces_requested_aspect_ratio() {
        let payload = GeminiService::image_payload(&ImageGenerationRequest {
            prompt: "ape".to_string(),
            aspect_ratio: "1:1".to_string(),
        });
        assert_eq!(payload["contents"][0]["parts"][0]["text"], json!("ape"));
        assert_eq!(
            payload["generationConfig"]["imageConfig"]["aspectRatio"],
            json!("1:1")
        );
        assert_eq!(
            payload["generationConfig"]["responseModalities"],
            json!(["IMAGE"])
        );
    }

    #[test]
    fn structured_payload_carries_instruction_and_schema() {
        let schema = json!({"type": "OBJECT"});
        let payload = GeminiService::structured_payload(&StructuredTextRequest {
            system_instruction: "be a curator".to_string(),
            prompt: "Subject: ape, Style: Retro 8-Bit Pixel Punk".to_string(),
            response_schema: schema.clone(),
        });
        assert_eq!(
            payload["systemInstruction"]["parts"][0]["text"],
            json!("be a curator")
        );
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(payload["generationConfig"]["responseSchema"], schema);
    }

    #[test]
    fn extract_inline_image_takes_first_inline_part_of_first_candidate() {
        let response = json!({
            "candidates": [
                {"content": {"parts": [
                    {"text": "here is your ape"},
                    {"inlineData": {"mimeType": "image/jpeg", "data": "Zmlyc3Q="}},
                    {"inlineData": {"mimeType": "image/png", "data": "c2Vjb25k"}},
                ]}},
                {"content": {"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "b3RoZXI="}},
                ]}},
            ]
        });
        assert_eq!(
            GeminiService::extract_inline_image(&response),
            Some(InlineImage {
                mime_type: Some("image/jpeg".to_string()),
                data: "Zmlyc3Q=".to_string(),
            })
        );
    }

    #[test]
    fn extract_inline_image_accepts_snake_case_and_skips_empty_data() {
        let response = json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": ""}},
                {"inline_data": {"data": "QUJD"}},
            ]}}]
        });
        assert_eq!(
            GeminiService::extract_inline_image(&response),
            Some(InlineImage {
                mime_type: None,
                data: "QUJD".to_string(),
            })
        );
    }

    #[test]
    fn extract_inline_image_none_when_only_text_or_no_candidates() {
        let text_only = json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot draw that"}]}}]
        });
        assert_eq!(GeminiService::extract_inline_image(&text_only), None);
        assert_eq!(GeminiService::extract_inline_image(&json!({})), None);
        assert_eq!(
            GeminiService::extract_inline_image(&json!({"candidates": []})),
            None
        );
    }

    #[test]
    fn extract_text_joins_non_thought_parts() {
        let response = json!({
            "candidates": [{"content": {"parts": [
                {"text": "thinking...", "thought": true},
                {"text": "{\"name\": \"A\","},
                {"text": " \"description\": \"B\", \"traits\": []}"},
            ]}}]
        });
        assert_eq!(
            GeminiService::extract_text(&response),
            "{\"name\": \"A\", \"description\": \"B\", \"traits\": []}"
        );
        assert_eq!(GeminiService::extract_text(&Value::Null), "");
    }

    #[test]
    fn missing_credential_fails_before_any_request() -> anyhow::Result<()> {
        let gemini = service(None)?;
        let err = gemini
            .generate_image(&ImageGenerationRequest {
                prompt: "ape".to_string(),
                aspect_ratio: "1:1".to_string(),
            })
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert!(err.contains("API_KEY"));

        let err = gemini
            .generate_structured_text(&StructuredTextRequest {
                system_instruction: String::new(),
                prompt: "ape".to_string(),
                response_schema: json!({}),
            })
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert!(err.contains("API_KEY"));
        Ok(())
    }

    #[test]
    fn truncate_text_appends_ellipsis() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("abcdef", 3), "abc…");
    }
}
