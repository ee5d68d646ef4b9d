use serde::{Deserialize, Serialize};

pub const FALLBACK_NAME: &str = "Legacy Specimen";
pub const FALLBACK_DESCRIPTION: &str = "A rare digital artifact from the neural collection.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub trait_type: String,
    pub value: String,
}

impl Trait {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Collectible metadata. Three to five traits are expected from the curator
/// prompt but the count is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub traits: Vec<Trait>,
}

impl Metadata {
    pub fn fallback() -> Self {
        Self {
            name: FALLBACK_NAME.to_string(),
            description: FALLBACK_DESCRIPTION.to_string(),
            traits: vec![Trait::new("Edition", "Genesis")],
        }
    }

    /// Parses the structured-output text of the metadata call. Blank text is
    /// read as `{}`, which fails on the missing required fields.
    pub fn from_json_text(text: &str) -> Result<Self, serde_json::Error> {
        let trimmed = text.trim();
        let body = if trimmed.is_empty() { "{}" } else { trimmed };
        serde_json::from_str(body)
    }
}
