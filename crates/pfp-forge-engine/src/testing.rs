use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde_json::json;

use crate::service::{GenerativeService, ImageGenerationRequest, InlineImage, StructuredTextRequest};

#[derive(Debug, Clone)]
pub(crate) enum ImageScript {
    Inline {
        mime_type: Option<String>,
        data: String,
    },
    Empty,
    Fail(String),
}

#[derive(Debug, Clone)]
pub(crate) enum MetadataScript {
    Text(String),
    Fail(String),
}

/// In-memory stand-in for the generative backend. Scripts can be swapped
/// between calls to drive multi-step controller scenarios.
pub(crate) struct ScriptedService {
    image: Mutex<ImageScript>,
    metadata: Mutex<MetadataScript>,
    latency: Duration,
    image_requests: Mutex<Vec<ImageGenerationRequest>>,
    metadata_requests: Mutex<Vec<StructuredTextRequest>>,
    in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
    pub(crate) image_calls: AtomicUsize,
    pub(crate) metadata_calls: AtomicUsize,
}

impl ScriptedService {
    pub(crate) fn new(image: ImageScript, metadata: MetadataScript) -> Self {
        Self {
            image: Mutex::new(image),
            metadata: Mutex::new(metadata),
            latency: Duration::ZERO,
            image_requests: Mutex::new(Vec::new()),
            metadata_requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn succeeding() -> Self {
        Self::new(
            ImageScript::Inline {
                mime_type: Some("image/png".to_string()),
                data: "iVBORw0KGgo=".to_string(),
            },
            MetadataScript::Text(sample_metadata_json()),
        )
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn set_image(&self, script: ImageScript) {
        if let Ok(mut guard) = self.image.lock() {
            *guard = script;
        }
    }

    pub(crate) fn image_requests(&self) -> Vec<ImageGenerationRequest> {
        self.image_requests
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    pub(crate) fn metadata_requests(&self) -> Vec<StructuredTextRequest> {
        self.metadata_requests
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GenerativeService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate_image(&self, request: &ImageGenerationRequest) -> Result<Option<InlineImage>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut rows) = self.image_requests.lock() {
            rows.push(request.clone());
        }
        self.enter();
        let script = self
            .image
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(ImageScript::Empty);
        self.leave();
        match script {
            ImageScript::Inline { mime_type, data } => Ok(Some(InlineImage { mime_type, data })),
            ImageScript::Empty => Ok(None),
            ImageScript::Fail(message) => Err(anyhow!(message)),
        }
    }

    fn generate_structured_text(&self, request: &StructuredTextRequest) -> Result<String> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut rows) = self.metadata_requests.lock() {
            rows.push(request.clone());
        }
        self.enter();
        let script = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(MetadataScript::Text(String::new()));
        self.leave();
        match script {
            MetadataScript::Text(text) => Ok(text),
            MetadataScript::Fail(message) => Err(anyhow!(message)),
        }
    }
}

pub(crate) fn sample_metadata_json() -> String {
    json!({
        "name": "Captain Cog #17",
        "description": "A clockwork buccaneer charting the seven data streams.",
        "traits": [
            {"trait_type": "Background", "value": "Pastel Teal"},
            {"trait_type": "Eyes", "value": "Brass Monocle"},
            {"trait_type": "Mouth", "value": "Grin"},
            {"trait_type": "Accessory", "value": "Tricorn Hat"},
        ]
    })
    .to_string()
}
