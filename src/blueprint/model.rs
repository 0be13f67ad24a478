use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Requirement {
    #[serde(deserialize_with = "null_as_default")]
    pub item: String,
    #[serde(deserialize_with = "lenient_quantity")]
    pub quantity: u64,
}

/// What a blueprint produces. Anything that is neither an intermediate nor a
/// piece of equipment keeps its raw name for display.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Variant {
    Intermediate,
    Equipment,
    Other(String),
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Other(String::new())
    }
}

impl From<String> for Variant {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "intermediate" => Variant::Intermediate,
            "equipment" => Variant::Equipment,
            _ => Variant::Other(raw),
        }
    }
}

impl From<Variant> for String {
    fn from(variant: Variant) -> Self {
        variant.as_str().to_string()
    }
}

impl Variant {
    pub fn as_str(&self) -> &str {
        match self {
            Variant::Intermediate => "intermediate",
            Variant::Equipment => "equipment",
            Variant::Other(raw) => raw,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Blueprint {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub variant: Variant,
    /// Where the blueprint is made, e.g. `"fabricator"`.
    #[serde(deserialize_with = "null_as_default")]
    pub medium: String,
    #[serde(deserialize_with = "null_as_default")]
    pub required: Vec<Requirement>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Resource {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
}

pub type Blueprints = HashMap<String, Blueprint>;
pub type Resources = HashMap<String, Resource>;

/// A game data document before its entries are checked one by one.
pub type RawEntries = HashMap<String, serde_json::Value>;

/// Parses every entry on its own. Entries that still do not fit are logged
/// and dropped; the rest of the document survives.
pub fn parse_entries<T: DeserializeOwned>(kind: &str, raw: RawEntries) -> HashMap<String, T> {
    raw.into_iter()
        .filter_map(|(id, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((id, entry)),
            Err(e) => {
                tracing::warn!("Skipping malformed {} {}: {}", kind, id, e);
                None
            }
        })
        .collect()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whole numbers, numeric strings and floats (truncated) are accepted.
/// Anything else, negatives included, counts as 0.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let quantity = match &value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(quantity.unwrap_or_default())
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub blueprints: Blueprints,
    pub resources: Resources,
}

impl Catalog {
    pub fn new(blueprints: Blueprints, resources: Resources) -> Self {
        Self {
            blueprints,
            resources,
        }
    }

    pub fn blueprint(&self, id: &str) -> Option<&Blueprint> {
        self.blueprints.get(id)
    }

    /// Any item that has a blueprint of its own is built, not gathered.
    pub fn is_intermediate_item(&self, id: &str) -> bool {
        self.blueprints.contains_key(id)
    }

    pub fn blueprint_name(&self, id: &str) -> String {
        display_name(self.blueprints.get(id).map(|bp| bp.name.as_str()), id)
    }

    pub fn resource_name(&self, id: &str) -> String {
        display_name(self.resources.get(id).map(|res| res.name.as_str()), id)
    }

    pub fn resource_location(&self, id: &str) -> String {
        format_location(
            self.resources
                .get(id)
                .map(|res| res.location.as_str())
                .unwrap_or_default(),
        )
    }
}

fn display_name(name: Option<&str>, id: &str) -> String {
    match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => id.to_string(),
    }
}

/// `"junk_planetoid"` -> `"Junk Planetoid"`; empty input reads as `"Unknown"`.
pub fn format_location(raw: &str) -> String {
    if raw.is_empty() {
        return "Unknown".to_string();
    }
    title_case(&raw.replace('_', " "))
}

/// Uppercases the first letter of every alphabetic run and lowercases the rest.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_word = false;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}
