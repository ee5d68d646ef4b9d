use std::mem;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use pfp_forge_contracts::{
    GeneratedArtifact, History, SessionEvent, SessionLog, StyleOption, ViewState,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::client::{GenerationClient, GenerationOutcome};
use crate::config::{ForgeConfig, DEFAULT_MINT_DELAY};
use crate::gemini::GeminiService;

pub const SYNTHESIS_FAILURE_MESSAGE: &str = "Synthesis failure. Please try a different prompt.";
pub const MINT_CONFIRMATION: &str = "Artifact finalized on the blockchain!";

/// Proof that a generation was admitted. At most one exists at a time.
///
/// The controller stays in `Generating` until the ticket is handed back to
/// `complete_generation` or `cancel_generation`. Dropping it instead leaves
/// every later generate ignored.
#[derive(Debug)]
#[must_use = "hand the ticket to complete_generation or cancel_generation"]
pub struct GenerationTicket {
    prompt: String,
    style: StyleOption,
    started: Instant,
    previous: ViewState,
}

impl GenerationTicket {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn style(&self) -> StyleOption {
        self.style
    }
}

#[derive(Debug)]
pub struct MintTicket {
    artifact_id: String,
    started_at: DateTime<Utc>,
}

impl MintTicket {
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MintReceipt {
    pub artifact_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub message: &'static str,
}

/// Owns the view state, history and selected style. The presentation layer
/// reads state from here and calls generate / select_style / mint.
pub struct ForgeController {
    client: GenerationClient,
    selected_style: StyleOption,
    view_state: ViewState,
    history: History,
    minting: bool,
    mint_delay: Duration,
    events: Option<SessionLog>,
}

impl ForgeController {
    pub fn new(client: GenerationClient) -> Self {
        Self {
            client,
            selected_style: StyleOption::default(),
            view_state: ViewState::Idle,
            history: History::new(),
            minting: false,
            mint_delay: DEFAULT_MINT_DELAY,
            events: None,
        }
    }

    pub fn from_config(config: &ForgeConfig) -> Result<Self> {
        if !config.has_credential() {
            warn!("no API credential configured; image generation will fail");
        }
        let service = GeminiService::new(config)?;
        Ok(Self::new(GenerationClient::new(Arc::new(service))).with_mint_delay(config.mint_delay))
    }

    pub fn with_mint_delay(mut self, delay: Duration) -> Self {
        self.mint_delay = delay;
        self
    }

    pub fn with_style(mut self, style: StyleOption) -> Self {
        self.selected_style = style;
        self
    }

    pub fn with_events(mut self, events: SessionLog) -> Self {
        self.events = Some(events);
        self.emit(SessionEvent::SessionStarted {
            service: self.client.service_name().to_string(),
            style: self.selected_style,
        });
        self
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view_state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected_style(&self) -> StyleOption {
        self.selected_style
    }

    pub fn is_minting(&self) -> bool {
        self.minting
    }

    pub fn mint_delay(&self) -> Duration {
        self.mint_delay
    }

    pub fn service_name(&self) -> &str {
        self.client.service_name()
    }

    pub fn active_artifact(&self) -> Option<&Arc<GeneratedArtifact>> {
        self.view_state.artifact()
    }

    pub fn select_style(&mut self, style: StyleOption) {
        self.selected_style = style;
        self.emit(SessionEvent::StyleSelected { style });
    }

    /// Admits a generate action. Blank prompts and requests made while a
    /// generation is in flight are ignored without touching state.
    ///
    /// The returned ticket must come back through `complete_generation` (or
    /// `run_generation`) or `cancel_generation`.
    pub fn begin_generation(&mut self, prompt: &str) -> Option<GenerationTicket> {
        if prompt.trim().is_empty() {
            debug!("generate ignored: empty prompt");
            return None;
        }
        if self.view_state.is_generating() {
            debug!("generate ignored: generation already in flight");
            return None;
        }

        let ticket = GenerationTicket {
            prompt: prompt.to_string(),
            style: self.selected_style,
            started: Instant::now(),
            previous: mem::replace(&mut self.view_state, ViewState::Generating),
        };
        self.emit(SessionEvent::GenerationStarted {
            prompt: ticket.prompt.clone(),
            style: ticket.style,
        });
        Some(ticket)
    }

    /// Gives up an admitted generation without calling the service. The view
    /// returns to whatever it showed before `begin_generation`.
    pub fn cancel_generation(&mut self, ticket: GenerationTicket) -> &ViewState {
        debug!(prompt = %ticket.prompt, "generation cancelled");
        self.view_state = ticket.previous;
        &self.view_state
    }

    /// Issues both generation calls for an admitted ticket and applies the
    /// outcome.
    pub fn run_generation(&mut self, ticket: GenerationTicket) -> &ViewState {
        let outcome = self.client.request_pair(&ticket.prompt, ticket.style);
        self.complete_generation(ticket, outcome)
    }

    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        outcome: GenerationOutcome,
    ) -> &ViewState {
        let elapsed_ms = ticket.started.elapsed().as_millis() as u64;
        match outcome.image {
            Ok(image_url) => {
                let artifact = Arc::new(GeneratedArtifact {
                    id: Uuid::new_v4().simple().to_string(),
                    image_url,
                    prompt: ticket.prompt,
                    style: ticket.style,
                    created_at: Utc::now(),
                    metadata: outcome.metadata,
                });
                let evicted = self.history.record(artifact.clone());
                info!(
                    artifact_id = %artifact.id,
                    style = artifact.style.slug(),
                    traits = artifact.metadata.traits.len(),
                    elapsed_ms,
                    "artifact forged"
                );
                self.emit(SessionEvent::ArtifactCreated {
                    artifact_id: artifact.id.clone(),
                    prompt: artifact.prompt.clone(),
                    style: artifact.style,
                    name: artifact.metadata.name.clone(),
                    traits: artifact.metadata.traits.clone(),
                    history_len: self.history.len(),
                    evicted_ids: evicted.iter().map(|row| row.id.clone()).collect(),
                    elapsed_ms,
                });
                self.view_state = ViewState::Result(artifact);
            }
            Err(err) => {
                error!(error = %err, elapsed_ms, "image generation failed");
                self.emit(SessionEvent::GenerationFailed {
                    prompt: ticket.prompt,
                    style: ticket.style,
                    error: err.to_string(),
                    elapsed_ms,
                });
                self.view_state = ViewState::Error(SYNTHESIS_FAILURE_MESSAGE.to_string());
            }
        }
        &self.view_state
    }

    /// Returns whether a generation actually ran.
    pub fn generate(&mut self, prompt: &str) -> bool {
        match self.begin_generation(prompt) {
            Some(ticket) => {
                self.run_generation(ticket);
                true
            }
            None => false,
        }
    }

    /// Starts the simulated mint for an artifact in history. Ignored while a
    /// mint is already running.
    pub fn begin_mint(&mut self, artifact_id: &str) -> Option<MintTicket> {
        if self.minting {
            debug!("mint ignored: already minting");
            return None;
        }
        if self.history.get(artifact_id).is_none() {
            debug!(artifact_id, "mint ignored: unknown artifact");
            return None;
        }
        self.minting = true;
        let ticket = MintTicket {
            artifact_id: artifact_id.to_string(),
            started_at: Utc::now(),
        };
        self.emit(SessionEvent::MintStarted {
            artifact_id: ticket.artifact_id.clone(),
        });
        Some(ticket)
    }

    pub fn finish_mint(&mut self, ticket: MintTicket) -> MintReceipt {
        self.minting = false;
        let receipt = MintReceipt {
            artifact_id: ticket.artifact_id,
            started_at: ticket.started_at,
            finished_at: Utc::now(),
            message: MINT_CONFIRMATION,
        };
        self.emit(SessionEvent::MintFinished {
            artifact_id: receipt.artifact_id.clone(),
            message: receipt.message.to_string(),
        });
        receipt
    }

    /// Stub mint: flag on, fixed delay, flag off. No chain is touched.
    pub fn mint(&mut self, artifact_id: &str) -> Option<MintReceipt> {
        let ticket = self.begin_mint(artifact_id)?;
        if !self.mint_delay.is_zero() {
            thread::sleep(self.mint_delay);
        }
        Some(self.finish_mint(ticket))
    }

    fn emit(&self, event: SessionEvent) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        let kind = event.kind();
        if let Err(err) = events.record(event) {
            warn!(event = kind, error = %err, "failed to write session event");
        }
    }
}
