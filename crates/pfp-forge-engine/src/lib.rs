mod client;
mod config;
mod gemini;
mod orchestrator;
mod prompts;
mod service;

#[cfg(test)]
mod testing;

pub use client::{GenerationClient, GenerationError, GenerationOutcome};
pub use config::{
    ForgeConfig, DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL, DEFAULT_MINT_DELAY, DEFAULT_TEXT_MODEL,
    PFP_ASPECT_RATIO,
};
pub use gemini::GeminiService;
pub use orchestrator::{
    ForgeController, GenerationTicket, MintReceipt, MintTicket, MINT_CONFIRMATION,
    SYNTHESIS_FAILURE_MESSAGE,
};
pub use prompts::{
    compose_image_prompt, compose_metadata_prompt, MetadataPrompt, METADATA_CURATOR_INSTRUCTION,
};
pub use service::{GenerativeService, ImageGenerationRequest, InlineImage, StructuredTextRequest};
