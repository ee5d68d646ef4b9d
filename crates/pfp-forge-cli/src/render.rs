use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pfp_forge_contracts::{GeneratedArtifact, History, StyleOption, ViewState};

pub const IDLE_TITLE: &str = "Create Your Avatar";
pub const GENERATING_TITLE: &str = "Sequencing...";
pub const MINTING_LABEL: &str = "Minting on Ethereum...";
pub const MINT_LABEL: &str = "Mint as NFT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    pub bytes: usize,
    pub dimensions: Option<(u32, u32)>,
}

pub fn style_selector(selected: StyleOption) -> String {
    let mut out = String::from("Styles:\n");
    for style in StyleOption::ALL {
        let marker = if style == selected { '*' } else { ' ' };
        out.push_str(&format!(
            " {marker} {}. {} {:<8} {} (/style {})\n",
            style.position(),
            style.icon(),
            style.short_label(),
            style.label(),
            style.slug(),
        ));
    }
    out
}

pub fn idle_panel(selected: StyleOption) -> String {
    format!(
        "{IDLE_TITLE}\nDescribe a character concept to forge a {} avatar.\n",
        selected.label()
    )
}

pub fn generating_panel(prompt: &str, style: StyleOption) -> String {
    format!(
        "{GENERATING_TITLE}\n  concept: {}\n  style:   {}\n",
        prompt.trim(),
        style.label()
    )
}

pub fn error_panel(message: &str) -> String {
    format!("! {message}\n")
}

/// Result display. `saved` is the downloaded image, when one was written.
pub fn result_card(artifact: &GeneratedArtifact, saved: Option<&SavedImage>) -> String {
    let metadata = &artifact.metadata;
    let mut out = format!(
        "[{} {}] #{}\n{}\n{}\n",
        artifact.style.icon(),
        artifact.style.short_label(),
        artifact.short_id(),
        metadata.name,
        metadata.description,
    );
    if !metadata.traits.is_empty() {
        out.push_str("Traits:\n");
        for row in &metadata.traits {
            out.push_str(&format!("  - {}: {}\n", row.trait_type, row.value));
        }
    }
    match saved {
        Some(image) => out.push_str(&format!("Image: {}\n", describe_saved(image))),
        None => out.push_str(&format!("Image: {} chars inline\n", artifact.image_url.len())),
    }
    out.push_str(&format!("{MINT_LABEL}: /mint   Download: /download [path]\n"));
    out
}

pub fn view_panel(state: &ViewState, selected: StyleOption) -> String {
    match state {
        ViewState::Idle => idle_panel(selected),
        ViewState::Generating => format!("{GENERATING_TITLE}\n"),
        ViewState::Result(artifact) => result_card(artifact, None),
        ViewState::Error(message) => error_panel(message),
    }
}

pub fn history_list(history: &History, active_id: Option<&str>) -> String {
    if history.is_empty() {
        return "History is empty.\n".to_string();
    }
    let mut out = format!("History ({}):\n", history.len());
    for (idx, artifact) in history.iter().enumerate() {
        let marker = if Some(artifact.id.as_str()) == active_id {
            '*'
        } else {
            ' '
        };
        out.push_str(&format!(
            " {marker} {:>2}. {} {} [{}] {}\n",
            idx + 1,
            artifact.short_id(),
            artifact.metadata.name,
            artifact.style.short_label(),
            artifact.created_at.format("%H:%M:%S"),
        ));
    }
    out
}

pub fn describe_saved(image: &SavedImage) -> String {
    match image.dimensions {
        Some((width, height)) => format!(
            "{} ({width}x{height}, {} bytes)",
            image.path.display(),
            image.bytes
        ),
        None => format!("{} ({} bytes)", image.path.display(), image.bytes),
    }
}

/// Writes the artifact's image to `dest`. A directory destination (existing,
/// or without a file extension) gets `pfp-{short_id}.{ext}` inside it.
pub fn save_image(artifact: &GeneratedArtifact, dest: &Path) -> Result<SavedImage> {
    let image = artifact.image()?;
    let bytes = image.decode()?;
    let path = if dest.is_dir() || dest.extension().is_none() {
        dest.join(format!("pfp-{}.{}", artifact.short_id(), image.extension()))
    } else {
        dest.to_path_buf()
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    fs::write(&path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    let dimensions = image::load_from_memory(&bytes)
        .ok()
        .map(|decoded| (decoded.width(), decoded.height()));
    Ok(SavedImage {
        path,
        bytes: bytes.len(),
        dimensions,
    })
}
