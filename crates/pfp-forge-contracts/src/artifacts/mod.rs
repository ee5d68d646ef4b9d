mod data_uri;
mod history;
mod metadata;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::styles::StyleOption;

pub use data_uri::DataUri;
pub use history::{History, HISTORY_LIMIT};
pub use metadata::{Metadata, Trait, FALLBACK_DESCRIPTION, FALLBACK_NAME};

/// A forged profile picture: image reference plus its collectible metadata.
/// Created only when both generation calls settle with an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub id: String,
    pub image_url: String,
    pub prompt: String,
    pub style: StyleOption,
    pub created_at: DateTime<Utc>,
    pub metadata: Metadata,
}

impl GeneratedArtifact {
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(9)
            .map(|(idx, _)| idx)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }

    pub fn image(&self) -> anyhow::Result<DataUri> {
        DataUri::parse(&self.image_url)
    }
}
