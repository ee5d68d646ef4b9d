use std::sync::Arc;
use std::thread;

use pfp_forge_contracts::{DataUri, Metadata, StyleOption};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::PFP_ASPECT_RATIO;
use crate::prompts::{compose_image_prompt, compose_metadata_prompt};
use crate::service::{GenerativeService, ImageGenerationRequest, StructuredTextRequest};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("no image data found in response")]
    NoImageData,
    #[error("generative service failed: {0:#}")]
    Service(anyhow::Error),
    #[error("metadata response was not valid JSON: {0}")]
    MalformedMetadata(#[from] serde_json::Error),
}

/// Both halves of one generate action. The image half carries its own error;
/// the metadata half has already been recovered.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub image: Result<String, GenerationError>,
    pub metadata: Metadata,
}

#[derive(Clone)]
pub struct GenerationClient {
    service: Arc<dyn GenerativeService>,
}

impl GenerationClient {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self { service }
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    /// Returns the image as a `data:{mime};base64,{payload}` URI. Failures
    /// surface to the caller; nothing is retried.
    pub fn request_image(
        &self,
        user_text: &str,
        style: StyleOption,
        aspect_ratio: &str,
    ) -> Result<String, GenerationError> {
        let request = ImageGenerationRequest {
            prompt: compose_image_prompt(user_text, style),
            aspect_ratio: aspect_ratio.to_string(),
        };
        let inline = self
            .service
            .generate_image(&request)
            .map_err(GenerationError::Service)?
            .ok_or(GenerationError::NoImageData)?;
        debug!(
            service = self.service.name(),
            mime_type = inline.mime_type.as_deref().unwrap_or("image/png"),
            payload_len = inline.data.len(),
            "image payload received"
        );
        Ok(DataUri::new(inline.mime_type.as_deref(), inline.data).to_string())
    }

    /// Never fails: any service or parse error yields `Metadata::fallback()`.
    pub fn request_metadata(&self, user_text: &str, style: StyleOption) -> Metadata {
        match self.try_request_metadata(user_text, style) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(
                    service = self.service.name(),
                    error = %err,
                    "metadata generation failed; using fallback metadata"
                );
                Metadata::fallback()
            }
        }
    }

    fn try_request_metadata(
        &self,
        user_text: &str,
        style: StyleOption,
    ) -> Result<Metadata, GenerationError> {
        let prompt = compose_metadata_prompt(user_text, style);
        let request = StructuredTextRequest {
            system_instruction: prompt.system_instruction.to_string(),
            prompt: prompt.subject,
            response_schema: metadata_response_schema(),
        };
        let text = self
            .service
            .generate_structured_text(&request)
            .map_err(GenerationError::Service)?;
        Ok(Metadata::from_json_text(&text)?)
    }

    /// Starts the image and metadata calls together and waits for both,
    /// whichever settles first.
    pub fn request_pair(&self, user_text: &str, style: StyleOption) -> GenerationOutcome {
        thread::scope(|scope| {
            let image = scope.spawn(|| self.request_image(user_text, style, PFP_ASPECT_RATIO));
            let metadata = scope.spawn(|| self.request_metadata(user_text, style));

            let image = image.join().unwrap_or_else(|_| {
                Err(GenerationError::Service(anyhow::anyhow!(
                    "image request worker panicked"
                )))
            });
            let metadata = metadata.join().unwrap_or_else(|_| {
                warn!("metadata request worker panicked; using fallback metadata");
                Metadata::fallback()
            });
            GenerationOutcome { image, metadata }
        })
    }
}

pub(crate) fn metadata_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "description": { "type": "STRING" },
            "traits": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "trait_type": { "type": "STRING" },
                        "value": { "type": "STRING" },
                    },
                    "required": ["trait_type", "value"],
                },
            },
        },
        "required": ["name", "description", "traits"],
    })
}
