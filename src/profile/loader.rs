//! Profile artefact loading.
//!
//! The vendor SDK export is a JSON document with string-keyed number maps
//! and a few loose spellings: `units`, `scale`, and `offset` may each be a
//! scalar or a per-element array. This module deserializes the raw shape
//! and normalizes it into the strict [`Profile`] model:
//!
//! - a units array collapses to its unique non-empty value; disagreement
//!   keeps the first non-empty entry and logs a warning
//! - scale and offset arrays must be uniform; disagreement is fatal

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{FieldInfo, MessageInfo, Profile, ReferenceCondition, SubFieldInfo};
use crate::{FitError, Result};

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default)]
    messages: HashMap<String, RawMessage>,
    #[serde(default)]
    types: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    name: String,
    #[serde(default)]
    fields: HashMap<String, RawField>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    units: Option<OneOrMany<String>>,
    #[serde(default)]
    scale: Option<OneOrMany<f64>>,
    #[serde(default)]
    offset: Option<OneOrMany<f64>>,
    #[serde(default)]
    sub_fields: Vec<RawSubField>,
    #[serde(default)]
    components: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSubField {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    units: Option<OneOrMany<String>>,
    #[serde(default)]
    scale: Option<OneOrMany<f64>>,
    #[serde(default)]
    offset: Option<OneOrMany<f64>>,
    #[serde(default, rename = "map")]
    map: Vec<RawCondition>,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    num: u8,
    raw_value: i64,
}

/// Scalar-or-array spelling used by several artefact attributes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl Profile {
    /// Load a profile artefact from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)
            .map_err(|e| FitError::file_error(path.as_ref().to_path_buf(), e))?;
        Self::from_json_str(&text)
    }

    /// Parse a profile artefact from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawProfile = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Convert an already-parsed JSON value into a profile.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawProfile = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawProfile) -> Result<Self> {
        let mut messages = HashMap::with_capacity(raw.messages.len());
        for (num_key, raw_message) in raw.messages {
            let mesg_num: u16 = num_key.parse().map_err(|_| {
                FitError::profile(format!("message key '{}' is not a number", num_key))
            })?;

            let mut fields = HashMap::with_capacity(raw_message.fields.len());
            for (id_key, raw_field) in raw_message.fields {
                let field_id: u8 = id_key.parse().map_err(|_| {
                    FitError::profile(format!(
                        "field key '{}' of message {} is not a number",
                        id_key, mesg_num
                    ))
                })?;
                fields.insert(field_id, convert_field(&raw_message.name, raw_field)?);
            }

            messages.insert(mesg_num, MessageInfo { name: raw_message.name, fields });
        }

        let mut types = HashMap::with_capacity(raw.types.len());
        for (type_name, raw_table) in raw.types {
            let mut table = HashMap::with_capacity(raw_table.len());
            for (raw_key, label) in raw_table {
                let raw: i64 = raw_key.parse().map_err(|_| {
                    FitError::profile(format!(
                        "value key '{}' of type '{}' is not a number",
                        raw_key, type_name
                    ))
                })?;
                table.insert(raw, label);
            }
            types.insert(type_name, table);
        }

        let profile = Profile { messages, types };
        profile.validate()?;
        debug!(
            "Loaded profile: {} messages, {} types",
            profile.messages.len(),
            profile.types.len()
        );
        Ok(profile)
    }
}

fn convert_field(message_name: &str, raw: RawField) -> Result<FieldInfo> {
    let context = format!("{}.{}", message_name, raw.name);
    let sub_fields = raw
        .sub_fields
        .into_iter()
        .map(|sub| convert_sub_field(message_name, sub))
        .collect::<Result<Vec<_>>>()?;

    Ok(FieldInfo {
        units: normalize_units(&context, raw.units),
        scale: normalize_numeric(&context, "scale", raw.scale, 1.0)?,
        offset: normalize_numeric(&context, "offset", raw.offset, 0.0)?,
        name: raw.name,
        type_name: raw.type_name,
        sub_fields,
        has_components: !raw.components.is_empty(),
    })
}

fn convert_sub_field(message_name: &str, raw: RawSubField) -> Result<SubFieldInfo> {
    let context = format!("{}.{}", message_name, raw.name);
    Ok(SubFieldInfo {
        units: normalize_units(&context, raw.units),
        scale: normalize_numeric(&context, "scale", raw.scale, 1.0)?,
        offset: normalize_numeric(&context, "offset", raw.offset, 0.0)?,
        name: raw.name,
        type_name: raw.type_name,
        conditions: raw
            .map
            .into_iter()
            .map(|c| ReferenceCondition { field_id: c.num, raw_value: c.raw_value })
            .collect(),
    })
}

fn normalize_units(context: &str, units: Option<OneOrMany<String>>) -> String {
    match units {
        None => String::new(),
        Some(OneOrMany::One(unit)) => unit,
        Some(OneOrMany::Many(entries)) => {
            let mut non_empty = entries.iter().filter(|u| !u.is_empty());
            let Some(first) = non_empty.next() else {
                return String::new();
            };
            if non_empty.any(|u| u != first) {
                warn!(
                    "Field {} declares disagreeing per-element units; keeping '{}'",
                    context, first
                );
            }
            first.clone()
        }
    }
}

fn normalize_numeric(
    context: &str,
    attribute: &str,
    value: Option<OneOrMany<f64>>,
    default: f64,
) -> Result<f64> {
    match value {
        None => Ok(default),
        Some(OneOrMany::One(v)) => Ok(v),
        Some(OneOrMany::Many(entries)) => {
            let Some(first) = entries.first().copied() else {
                return Ok(default);
            };
            if entries.iter().any(|v| *v != first) {
                return Err(FitError::profile(format!(
                    "field {} declares a non-uniform {} vector {:?}",
                    context, attribute, entries
                )));
            }
            Ok(first)
        }
    }
}
