use std::fmt;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

const DEFAULT_MIME: &str = "image/png";

/// An inline image reference of the form `data:{mime};base64,{payload}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub payload: String,
}

impl DataUri {
    /// Keeps `payload` verbatim; a blank MIME type falls back to `image/png`.
    pub fn new(mime_type: Option<&str>, payload: impl Into<String>) -> Self {
        let mime_type = mime_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_MIME)
            .to_string();
        Self {
            mime_type,
            payload: payload.into(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let Some(rest) = raw.trim().strip_prefix("data:") else {
            bail!("image reference is not a data URI");
        };
        let Some((header, payload)) = rest.split_once(',') else {
            bail!("data URI has no payload separator");
        };
        let Some(mime_type) = header.strip_suffix(";base64") else {
            bail!("data URI payload is not base64 encoded");
        };
        Ok(Self::new(Some(mime_type), payload))
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.payload.as_bytes())
            .context("image payload base64 decode failed")
    }

    pub fn extension(&self) -> &'static str {
        let lowered = self.mime_type.to_ascii_lowercase();
        if lowered.contains("jpeg") || lowered.contains("jpg") {
            return "jpg";
        }
        if lowered.contains("webp") {
            return "webp";
        }
        if lowered.contains("gif") {
            return "gif";
        }
        "png"
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;

    use super::{DataUri, BASE64};

    #[test]
    fn display_assembles_mime_and_payload_verbatim() {
        let uri = DataUri::new(Some("image/jpeg"), "QUJD");
        assert_eq!(uri.to_string(), "data:image/jpeg;base64,QUJD");
        assert_eq!(uri.extension(), "jpg");
    }

    #[test]
    fn missing_mime_defaults_to_png() {
        assert_eq!(
            DataUri::new(None, "QUJD").to_string(),
            "data:image/png;base64,QUJD"
        );
        assert_eq!(DataUri::new(Some("  "), "QUJD").mime_type, "image/png");
    }

    #[test]
    fn parse_and_decode_inline_payload() -> anyhow::Result<()> {
        let raw = format!("data:image/webp;base64,{}", BASE64.encode(b"pixels"));
        let uri = DataUri::parse(&raw)?;
        assert_eq!(uri.mime_type, "image/webp");
        assert_eq!(uri.extension(), "webp");
        assert_eq!(uri.decode()?, b"pixels".to_vec());
        Ok(())
    }

    #[test]
    fn parse_rejects_remote_and_non_base64_references() {
        assert!(DataUri::parse("https://example.com/ape.png").is_err());
        assert!(DataUri::parse("data:image/png,rawbytes").is_err());
        assert!(DataUri::parse("data:image/png;base64").is_err());
    }
}
