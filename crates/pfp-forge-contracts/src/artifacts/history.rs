use std::sync::Arc;

use super::GeneratedArtifact;

pub const HISTORY_LIMIT: usize = 10;

/// Most-recent-first record of the artifacts forged this session.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Arc<GeneratedArtifact>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `artifact` and drops whatever falls past `HISTORY_LIMIT`.
    /// Returns the evicted entries, oldest last.
    pub fn record(&mut self, artifact: Arc<GeneratedArtifact>) -> Vec<Arc<GeneratedArtifact>> {
        self.entries.insert(0, artifact);
        if self.entries.len() > HISTORY_LIMIT {
            return self.entries.split_off(HISTORY_LIMIT);
        }
        Vec::new()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&Arc<GeneratedArtifact>> {
        self.entries.first()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<GeneratedArtifact>> {
        self.entries.iter().find(|artifact| artifact.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<GeneratedArtifact>> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|artifact| artifact.id.clone()).collect()
    }
}
