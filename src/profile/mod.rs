//! Global FIT profile model.
//!
//! The profile is the schema catalog extracted from the vendor SDK: it maps
//! global message numbers to named messages, field ids to field records
//! (name, units, scale, offset, semantic type, sub-fields), and semantic
//! type names to enum label tables. It is immutable after loading and may
//! be shared across any number of decoders.
//!
//! Loading from the JSON artefact lives in [`loader`]; the model itself is
//! plain data with O(1) lookups.

pub mod loader;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{BaseType, DataMessage};
use crate::{FitError, Result};

/// Schema catalog for profile-driven decoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Global message number to message record (O(1) lookup).
    pub messages: HashMap<u16, MessageInfo>,
    /// Semantic type name to its raw-value/label table.
    pub types: HashMap<String, HashMap<i64, String>>,
}

impl Profile {
    /// Message record for a global message number.
    pub fn message(&self, global_mesg_num: u16) -> Option<&MessageInfo> {
        self.messages.get(&global_mesg_num)
    }

    /// Whether a semantic type name has an enum table.
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Label for a raw value of a semantic type, if the table knows it.
    pub fn type_label(&self, type_name: &str, raw: i64) -> Option<&str> {
        self.types.get(type_name).and_then(|table| table.get(&raw)).map(String::as_str)
    }

    /// Validate the profile for consistency.
    ///
    /// Scale values must be finite and non-zero for every field and
    /// sub-field; a violation indicates a corrupt artefact.
    pub fn validate(&self) -> Result<()> {
        for (num, message) in &self.messages {
            for (id, field) in &message.fields {
                validate_scale(&field.name, *num, field.scale)?;
                for sub_field in &field.sub_fields {
                    validate_scale(&sub_field.name, *num, sub_field.scale)?;
                }
                if field.name.is_empty() {
                    return Err(FitError::profile(format!(
                        "field {} of message {} has an empty name",
                        id, num
                    )));
                }
                // Scale never applies to non-numeric values.
                if field.scale != 1.0 {
                    if let Some(base_type) = BaseType::from_name(&field.type_name) {
                        if !base_type.is_numeric() {
                            warn!(
                                "Field '{}' of message {} declares scale {} on non-numeric type {}",
                                field.name, num, field.scale, field.type_name
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of message records.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

fn validate_scale(name: &str, mesg_num: u16, scale: f64) -> Result<()> {
    if scale == 0.0 || !scale.is_finite() {
        return Err(FitError::profile(format!(
            "field '{}' of message {} has unusable scale {}",
            name, mesg_num, scale
        )));
    }
    Ok(())
}

/// One message of the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Message name as defined by the vendor profile
    pub name: String,
    /// Field records keyed by field definition number
    pub fields: HashMap<u8, FieldInfo>,
}

impl MessageInfo {
    /// Field record for a field definition number.
    pub fn field(&self, field_id: u8) -> Option<&FieldInfo> {
        self.fields.get(&field_id)
    }
}

/// One field record of a profile message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Field name as defined by the vendor profile
    pub name: String,
    /// Semantic type name: a base type name or a profile enum type
    pub type_name: String,
    /// Units of measurement (possibly empty)
    pub units: String,
    /// Divisor applied to raw numeric values (never zero)
    pub scale: f64,
    /// Subtrahend applied after division
    pub offset: f64,
    /// Alternate interpretations gated on other raw field values
    pub sub_fields: Vec<SubFieldInfo>,
    /// Whether the vendor profile declares component expansion for this
    /// field (bit-unpacking itself is not performed)
    pub has_components: bool,
}

impl FieldInfo {
    /// Plain field record without sub-fields or components.
    pub fn simple(
        name: impl Into<String>,
        type_name: impl Into<String>,
        units: impl Into<String>,
        scale: f64,
        offset: f64,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            units: units.into(),
            scale,
            offset,
            sub_fields: Vec::new(),
            has_components: false,
        }
    }
}

/// An alternate field interpretation, selected when its reference
/// conditions hold against the raw values of the same message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubFieldInfo {
    pub name: String,
    pub type_name: String,
    pub units: String,
    pub scale: f64,
    pub offset: f64,
    /// Conditions over other fields. Conditions sharing a field id combine
    /// with OR; across distinct ids they combine with AND.
    pub conditions: Vec<ReferenceCondition>,
}

impl SubFieldInfo {
    /// Evaluate this sub-field's conditions against a data message's raw
    /// values.
    ///
    /// A sub-field with no conditions never matches, and a reference field
    /// absent from the message fails its group.
    pub fn matches(&self, message: &DataMessage) -> bool {
        if self.conditions.is_empty() {
            return false;
        }

        let mut seen_ids: Vec<u8> = Vec::new();
        for condition in &self.conditions {
            if seen_ids.contains(&condition.field_id) {
                continue;
            }
            seen_ids.push(condition.field_id);

            let raw = match message
                .raw_by_field_id(condition.field_id)
                .and_then(|value| value.as_i64())
            {
                Some(raw) => raw,
                None => return false,
            };

            let group_holds = self
                .conditions
                .iter()
                .filter(|c| c.field_id == condition.field_id)
                .any(|c| c.raw_value == raw);
            if !group_holds {
                return false;
            }
        }
        true
    }
}

/// A single sub-field map condition: the referenced field must hold
/// `raw_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCondition {
    pub field_id: u8,
    pub raw_value: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BaseType, DefinitionMessage, Endianness, FieldDefinition, RawValue,
    };
    use std::sync::Arc;

    fn message_with_raw(pairs: &[(u8, RawValue)]) -> DataMessage {
        let definition = Arc::new(DefinitionMessage {
            local_slot: 0,
            endianness: Endianness::Little,
            global_mesg_num: 21,
            fields: pairs
                .iter()
                .map(|(id, _)| FieldDefinition { field_id: *id, size: 1, base_type: BaseType::Enum })
                .collect(),
            developer_fields: Vec::new(),
        });
        DataMessage {
            definition,
            values: pairs.iter().map(|(_, value)| value.clone()).collect(),
            developer_values: Vec::new(),
        }
    }

    fn sub_field(conditions: Vec<ReferenceCondition>) -> SubFieldInfo {
        SubFieldInfo {
            name: "rider_position".into(),
            type_name: "rider_position_type".into(),
            units: String::new(),
            scale: 1.0,
            offset: 0.0,
            conditions,
        }
    }

    #[test]
    fn lookups_are_by_number_and_name() {
        let mut fields = HashMap::new();
        fields.insert(0, FieldInfo::simple("event", "event", "", 1.0, 0.0));
        let mut messages = HashMap::new();
        messages.insert(21, MessageInfo { name: "event".into(), fields });
        let mut types = HashMap::new();
        types.insert("event".to_string(), HashMap::from([(0i64, "timer".to_string())]));
        let profile = Profile { messages, types };

        assert_eq!(profile.message(21).unwrap().name, "event");
        assert!(profile.message(99).is_none());
        assert_eq!(profile.message(21).unwrap().field(0).unwrap().name, "event");
        assert_eq!(profile.type_label("event", 0), Some("timer"));
        assert_eq!(profile.type_label("event", 5), None);
        assert!(!profile.has_type("sport"));
    }

    #[test]
    fn validation_rejects_zero_scale() {
        let mut fields = HashMap::new();
        fields.insert(0, FieldInfo::simple("speed", "uint16", "m/s", 0.0, 0.0));
        let mut messages = HashMap::new();
        messages.insert(20, MessageInfo { name: "record".into(), fields });
        let profile = Profile { messages, types: HashMap::new() };

        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("scale"));
    }

    #[test]
    fn scale_on_a_non_numeric_type_is_advisory_only() {
        let mut fields = HashMap::new();
        fields.insert(8, FieldInfo::simple("product_name", "string", "", 10.0, 0.0));
        let mut messages = HashMap::new();
        messages.insert(20, MessageInfo { name: "record".into(), fields });
        let profile = Profile { messages, types: HashMap::new() };

        // Logged, not fatal.
        profile.validate().unwrap();
    }

    #[test]
    fn conditions_on_one_field_combine_with_or() {
        let sub = sub_field(vec![
            ReferenceCondition { field_id: 0, raw_value: 41 },
            ReferenceCondition { field_id: 0, raw_value: 42 },
        ]);
        assert!(sub.matches(&message_with_raw(&[(0, RawValue::Enum(42))])));
        assert!(sub.matches(&message_with_raw(&[(0, RawValue::Enum(41))])));
        assert!(!sub.matches(&message_with_raw(&[(0, RawValue::Enum(40))])));
    }

    #[test]
    fn conditions_across_fields_combine_with_and() {
        let sub = sub_field(vec![
            ReferenceCondition { field_id: 0, raw_value: 41 },
            ReferenceCondition { field_id: 0, raw_value: 42 },
            ReferenceCondition { field_id: 1, raw_value: 7 },
        ]);
        assert!(sub.matches(&message_with_raw(&[
            (0, RawValue::Enum(42)),
            (1, RawValue::Enum(7))
        ])));
        assert!(!sub.matches(&message_with_raw(&[
            (0, RawValue::Enum(42)),
            (1, RawValue::Enum(8))
        ])));
        assert!(!sub.matches(&message_with_raw(&[
            (0, RawValue::Enum(40)),
            (1, RawValue::Enum(7))
        ])));
    }

    #[test]
    fn absent_reference_fields_fail_their_group() {
        let sub = sub_field(vec![ReferenceCondition { field_id: 9, raw_value: 1 }]);
        assert!(!sub.matches(&message_with_raw(&[(0, RawValue::Enum(1))])));
    }

    #[test]
    fn a_sub_field_without_conditions_never_matches() {
        let sub = sub_field(Vec::new());
        assert!(!sub.matches(&message_with_raw(&[(0, RawValue::Enum(1))])));
    }
}
