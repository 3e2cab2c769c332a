//! Wire contract with the item lookup service.
//!
//! Requests are a GET carrying the credentials and the scanned id as query
//! parameters named `APIKEY`, `UID`, `UPW`, `P1`..`P4`. `P1` and `P2` both
//! carry the id (lower and upper bound of the id range), `P3`/`P4` are sent
//! empty. This is the only parameter scheme spoken; the lower-case
//! `api_key`/`uid`/`upw`/`id` variant is not supported.
//!
//! Responses are a JSON array of rows. Each row has `ItmID`, `ItmName` and an
//! optional base64 `ItmThmbnl`; every other column is carried through as an
//! extension field.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ItemId, ItemRecord},
    error::LookupError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupQuery {
    #[serde(rename = "APIKEY")]
    pub api_key: String,
    #[serde(rename = "UID")]
    pub user_id: String,
    #[serde(rename = "UPW")]
    pub user_secret: String,
    #[serde(rename = "P1")]
    pub range_start: String,
    #[serde(rename = "P2")]
    pub range_end: String,
    #[serde(rename = "P3")]
    pub p3: String,
    #[serde(rename = "P4")]
    pub p4: String,
}

impl LookupQuery {
    pub fn for_item(
        api_key: impl Into<String>,
        user_id: impl Into<String>,
        user_secret: impl Into<String>,
        item_id: ItemId,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            user_id: user_id.into(),
            user_secret: user_secret.into(),
            range_start: item_id.to_string(),
            range_end: item_id.to_string(),
            p3: String::new(),
            p4: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawItemId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemRow {
    #[serde(rename = "ItmID")]
    item_id: RawItemId,
    #[serde(rename = "ItmName")]
    pub item_name: String,
    #[serde(rename = "ItmThmbnl", default)]
    pub thumbnail_b64: Option<String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<ItemRow> for ItemRecord {
    type Error = LookupError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let id = match row.item_id {
            RawItemId::Number(value) => ItemId(value),
            RawItemId::Text(text) => text.parse().map_err(|_| {
                LookupError::MalformedBody(format!("ItmID {text:?} is not a numeric id"))
            })?,
        };

        let thumbnail = match row.thumbnail_b64.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(encoded) => Some(STANDARD.decode(encoded).map_err(|e| {
                LookupError::MalformedBody(format!("invalid ItmThmbnl for item {id}: {e}"))
            })?),
        };

        Ok(Self {
            id,
            name: row.item_name,
            thumbnail,
            extensions: row.extensions,
        })
    }
}

/// Decodes a lookup response body, preserving the service's row order.
pub fn decode_item_rows(body: &str) -> Result<Vec<ItemRecord>, LookupError> {
    let rows: Vec<ItemRow> = serde_json::from_str(body)
        .map_err(|e| LookupError::MalformedBody(format!("expected a JSON array of items: {e}")))?;
    rows.into_iter().map(ItemRecord::try_from).collect()
}
