use std::{collections::BTreeMap, fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = ErrorCode;

    /// Parses a scanned payload as a base-10, non-negative id.
    ///
    /// Surrounding ASCII whitespace is ignored because handheld scanners and
    /// some camera decoders terminate payloads with CR/LF. Anything else that
    /// is not a plain run of digits (signs, separators, fractions) is rejected.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let digits = raw.trim_matches(|c: char| c.is_ascii_whitespace());
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ErrorCode::InvalidPayload);
        }
        digits
            .parse::<u64>()
            .map(ItemId)
            .map_err(|_| ErrorCode::InvalidPayload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Qr,
    Pdf417,
    Ean13,
    Code128,
    #[serde(untagged)]
    Other(String),
}

impl Symbology {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "qr" => Self::Qr,
            "pdf417" => Self::Pdf417,
            "ean13" => Self::Ean13,
            "code128" => Self::Code128,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::Qr => "qr",
            Self::Pdf417 => "pdf417",
            Self::Ean13 => "ean13",
            Self::Code128 => "code128",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// One detection event from the camera collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedCode {
    pub payload: String,
    pub symbology: Symbology,
}

impl DecodedCode {
    pub fn new(payload: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            payload: payload.into(),
            symbology,
        }
    }

    pub fn qr(payload: impl Into<String>) -> Self {
        Self::new(payload, Symbology::Qr)
    }

    pub fn item_id(&self) -> Result<ItemId, ErrorCode> {
        self.payload.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    /// Decoded thumbnail bytes; the service sends them base64-encoded.
    pub thumbnail: Option<Vec<u8>>,
    /// Every other field of the service row, kept as sent.
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl ItemRecord {
    pub fn thumbnail_data_uri(&self) -> Option<String> {
        self.thumbnail
            .as_ref()
            .map(|bytes| format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)))
    }

    pub fn extension(&self, name: &str) -> Option<String> {
        match self.extensions.get(name)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) if text.is_empty() => None,
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}
