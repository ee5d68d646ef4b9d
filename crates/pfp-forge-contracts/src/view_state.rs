use std::sync::Arc;

use crate::artifacts::GeneratedArtifact;

/// Which panel the presentation layer renders. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Generating,
    Result(Arc<GeneratedArtifact>),
    Error(String),
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Generating => "generating",
            ViewState::Result(_) => "result",
            ViewState::Error(_) => "error",
        }
    }

    pub fn is_generating(&self) -> bool {
        matches!(self, ViewState::Generating)
    }

    pub fn artifact(&self) -> Option<&Arc<GeneratedArtifact>> {
        match self {
            ViewState::Result(artifact) => Some(artifact),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}
