use anyhow::Result;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredTextRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub response_schema: Value,
}

/// Base64 image payload exactly as the service returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: Option<String>,
    pub data: String,
}

/// The external generative backend. `generate_image` answers `Ok(None)` when
/// the service replied but carried no inline image.
pub trait GenerativeService: Send + Sync {
    fn name(&self) -> &str;
    fn generate_image(&self, request: &ImageGenerationRequest) -> Result<Option<InlineImage>>;
    fn generate_structured_text(&self, request: &StructuredTextRequest) -> Result<String>;
}
