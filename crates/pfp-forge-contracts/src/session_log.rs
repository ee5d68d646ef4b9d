use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifacts::Trait;
use crate::styles::StyleOption;

/// Everything a forge session can record, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        service: String,
        style: StyleOption,
    },
    StyleSelected {
        style: StyleOption,
    },
    GenerationStarted {
        prompt: String,
        style: StyleOption,
    },
    ArtifactCreated {
        artifact_id: String,
        prompt: String,
        style: StyleOption,
        name: String,
        traits: Vec<Trait>,
        history_len: usize,
        evicted_ids: Vec<String>,
        elapsed_ms: u64,
    },
    GenerationFailed {
        prompt: String,
        style: StyleOption,
        error: String,
        elapsed_ms: u64,
    },
    MintStarted {
        artifact_id: String,
    },
    MintFinished {
        artifact_id: String,
        message: String,
    },
}

impl SessionEvent {
    /// The `type` tag this event is written under.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "session_started",
            SessionEvent::StyleSelected { .. } => "style_selected",
            SessionEvent::GenerationStarted { .. } => "generation_started",
            SessionEvent::ArtifactCreated { .. } => "artifact_created",
            SessionEvent::GenerationFailed { .. } => "generation_failed",
            SessionEvent::MintStarted { .. } => "mint_started",
            SessionEvent::MintFinished { .. } => "mint_finished",
        }
    }
}

/// One line of the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub event: SessionEvent,
}

/// Append-only JSONL log of one forge session. The file is opened on the
/// first write and held for the rest of the session.
#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    session_id: String,
    file: Mutex<Option<File>>,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: session_id.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn record(&self, event: SessionEvent) -> Result<SessionRecord> {
        let record = SessionRecord {
            session_id: self.session_id.clone(),
            ts: Utc::now(),
            event,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut guard = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("session log lock poisoned"))?;
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(line.as_bytes())
                .with_context(|| format!("failed to append to {}", self.path.display()))?;
        }
        Ok(record)
    }

    fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open session log {}", self.path.display()))
    }
}

/// Reads a session log back in write order. Blank lines are skipped.
pub fn read_session_log(path: &Path) -> Result<Vec<SessionRecord>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("{}:{} is not a session record", path.display(), idx + 1))?;
        records.push(record);
    }
    Ok(records)
}
