use std::fmt;

use pfp_forge_contracts::StyleOption;

const IMAGE_PROMPT_PREAMBLE: &str = "Generate a high-end NFT Profile Picture (PFP).";

const IMAGE_TECHNICAL_REQUIREMENTS: &str = "Centered composition, head and shoulders portrait, solid flat color background, clean professional lines, no text, no blurry edges, iconic digital collectible aesthetic.";

pub const METADATA_CURATOR_INSTRUCTION: &str = "You are an expert NFT curator for a top-tier PFP collection. Create a unique name (e.g., 'Bored Drake #402'), creative description, and 3-5 traits (Background, Fur, Eyes, Mouth, Accessory) for an NFT artwork based on the provided prompt and style.";

pub fn compose_image_prompt(user_text: &str, style: StyleOption) -> String {
    format!(
        "{IMAGE_PROMPT_PREAMBLE}\nSubject: {}.\nStyle: {}\nTechnical requirements: {IMAGE_TECHNICAL_REQUIREMENTS}",
        user_text.trim(),
        style.keywords(),
    )
}

/// Curator persona plus the subject line. The transport sends the two halves
/// separately; `Display` renders them as one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPrompt {
    pub system_instruction: &'static str,
    pub subject: String,
}

impl fmt::Display for MetadataPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.system_instruction, self.subject)
    }
}

pub fn compose_metadata_prompt(user_text: &str, style: StyleOption) -> MetadataPrompt {
    MetadataPrompt {
        system_instruction: METADATA_CURATOR_INSTRUCTION,
        subject: format!("Subject: {}, Style: {}", user_text.trim(), style.label()),
    }
}
