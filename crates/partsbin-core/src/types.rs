//! Wire types exchanged with the inventory REST API.
//!
//! Field names follow the API's camelCase JSON. Optional fields the server
//! omits deserialize to `None` (or an empty `Vec`).

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// One result from the external part search, identified by its MPN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCandidate {
    pub mpn: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub datasheet_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Raw `"Name: Value"` strings, in source order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub specs: Vec<String>,
}

/// A candidate image for a part.
///
/// `url` is the identity used for selection and transfer; `thumbnail_url`
/// (falling back to `url`) is what gets rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSuggestion {
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ImageSuggestion {
    /// The URL to render on screen, before proxy resolution.
    #[must_use]
    pub fn display_source(&self) -> &str {
        self.thumbnail_url.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecDataType {
    Text,
    Number,
    Boolean,
    Select,
}

/// A category-independent, typed specification field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDefinition {
    pub id: i64,
    pub name: String,
    pub data_type: SpecDataType,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub display_order: i32,
}

impl SpecDefinition {
    /// Units offered for a `NUMBER` field. The API stores alternatives as a
    /// comma-separated list (`"V,mV"`); the first entry is the primary unit.
    #[must_use]
    pub fn units(&self) -> Vec<&str> {
        self.unit
            .as_deref()
            .map(|u| {
                u.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Body of `POST parts/quick-add`: a part and its first stock entry.
///
/// Blank optional text fields are omitted. `unit_price` is always sent and
/// serializes to `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAddRequest {
    pub part_number: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasheet_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs: Option<BTreeMap<String, String>>,
    pub location_id: i64,
    pub quantity: i32,
    pub minimum_quantity: i32,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPart {
    pub id: i64,
    pub part_number: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedStockEntry {
    pub id: i64,
    pub part_id: i64,
    pub location_id: i64,
    pub quantity: i32,
    pub minimum_quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAddResponse {
    pub part: CreatedPart,
    pub stock_entry: CreatedStockEntry,
}

/// An image stored against a part. The server reports local timestamps
/// without an offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartImage {
    pub id: i64,
    pub part_id: i64,
    pub display_order: i32,
    pub created_at: NaiveDateTime,
}

/// The API sends `null` rather than `[]` for absent lists.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
