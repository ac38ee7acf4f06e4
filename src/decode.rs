//! Profile-driven value decoding.
//!
//! Turns the raw values of a [`DataMessage`] into named, unit-annotated
//! field values by consulting the global profile. Per field, in declaration
//! order:
//!
//! 1. profile lookup (unknown messages and fields keep synthetic names)
//! 2. sub-field resolution against the message's raw values
//! 3. invalid-sentinel masking to null
//! 4. enum label lookup
//! 5. scale and offset (`physical = raw / scale - offset`)
//! 6. FIT-epoch date-time conversion
//! 7. numeric promotion to 64-bit representations
//!
//! Steps 3, 5, and 6 are individually switchable through [`DecodeConfig`].

use chrono::DateTime;
use tracing::trace;

use crate::decoded::{DecodedField, DecodedMessage};
use crate::profile::{FieldInfo, Profile};
use crate::types::{DataMessage, DecodedValue, RawValue};
use crate::{FitError, Result};

/// Seconds from the Unix epoch to the FIT epoch, 1989-12-31T00:00:00Z.
pub const FIT_EPOCH_OFFSET: i64 = 631_065_600;

/// Switches for the per-field transform pipeline. All stages default on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Convert `date_time` values to calendar timestamps.
    pub convert_datetime: bool,
    /// Mask invalid sentinels to null.
    pub process_invalids: bool,
    /// Apply profile scale and offset to numeric values.
    pub apply_scale_offset: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self { convert_datetime: true, process_invalids: true, apply_scale_offset: true }
    }
}

/// Decodes data messages against a profile and a configuration.
///
/// The profile is borrowed immutably, so one profile can back any number of
/// decoders.
pub struct MessageDecoder<'a> {
    profile: &'a Profile,
    config: DecodeConfig,
}

impl<'a> MessageDecoder<'a> {
    pub fn new(profile: &'a Profile, config: DecodeConfig) -> Self {
        Self { profile, config }
    }

    pub fn config(&self) -> DecodeConfig {
        self.config
    }

    /// Decode a single data message.
    pub fn decode(&self, message: &DataMessage) -> Result<DecodedMessage> {
        let mesg_num = message.global_mesg_num();
        let message_info = self.profile.message(mesg_num);
        let name = match message_info {
            Some(info) => info.name.clone(),
            None => format!("unknown_msg_{}", mesg_num),
        };
        trace!("Decoding {} ({} fields)", name, message.values.len());

        let mut decoded = DecodedMessage::new(name);
        for (field_def, raw) in message.definition.fields.iter().zip(&message.values) {
            let field_info = message_info.and_then(|info| info.field(field_def.field_id));
            let (field_name, field) = match field_info {
                Some(info) => self.decode_known_field(message, info, raw)?,
                None => (
                    format!("unknown_field_{}", field_def.field_id),
                    DecodedField { value: self.mask_and_promote(raw), units: String::new() },
                ),
            };
            decoded.insert(field_name, field);
        }

        // Developer fields carry no profile semantics; they get the same
        // reduced pipeline as unknown fields.
        for (dev_def, raw) in
            message.definition.developer_fields.iter().zip(&message.developer_values)
        {
            decoded.insert(
                format!("dev_field_{}", dev_def.field_number),
                DecodedField { value: self.mask_and_promote(raw), units: String::new() },
            );
        }
        Ok(decoded)
    }

    fn decode_known_field(
        &self,
        message: &DataMessage,
        info: &FieldInfo,
        raw: &RawValue,
    ) -> Result<(String, DecodedField)> {
        // The first matching sub-field, in declaration order, takes over the
        // whole pipeline for this field.
        let (name, type_name, units, scale, offset) =
            match info.sub_fields.iter().find(|sub| sub.matches(message)) {
                Some(sub) => (&sub.name, &sub.type_name, &sub.units, sub.scale, sub.offset),
                None => (&info.name, &info.type_name, &info.units, info.scale, info.offset),
            };

        let mut value = self.mask_and_label(raw, type_name);

        if self.config.apply_scale_offset && value.is_numeric() {
            if scale == 0.0 {
                return Err(FitError::decode(format!("field '{}' has zero scale", name)));
            }
            if scale != 1.0 || offset != 0.0 {
                value = map_numeric(value, &|v| v / scale - offset);
            }
        }

        let mut units = units.clone();
        if self.config.convert_datetime && type_name == "date_time" {
            if let Some(timestamp) = to_timestamp(&value) {
                value = timestamp;
                units.clear();
            }
        }

        Ok((name.clone(), DecodedField { value, units }))
    }

    /// Masking plus enum lookup, element-wise over arrays.
    fn mask_and_label(&self, raw: &RawValue, type_name: &str) -> DecodedValue {
        match raw {
            RawValue::Array(elements) => DecodedValue::Array(
                elements.iter().map(|element| self.mask_and_label_scalar(element, type_name)).collect(),
            ),
            scalar => self.mask_and_label_scalar(scalar, type_name),
        }
    }

    fn mask_and_label_scalar(&self, raw: &RawValue, type_name: &str) -> DecodedValue {
        if self.config.process_invalids && raw.is_invalid() {
            return DecodedValue::Null;
        }
        if let Some(raw_int) = raw.as_i64() {
            if let Some(label) = self.profile.type_label(type_name, raw_int) {
                return DecodedValue::Label(label.to_string());
            }
        }
        raw.promote()
    }

    /// The reduced pipeline for fields the profile does not know: masking
    /// and promotion only.
    fn mask_and_promote(&self, raw: &RawValue) -> DecodedValue {
        match raw {
            RawValue::Array(elements) => DecodedValue::Array(
                elements.iter().map(|element| self.mask_and_promote(element)).collect(),
            ),
            scalar if self.config.process_invalids && scalar.is_invalid() => DecodedValue::Null,
            scalar => scalar.promote(),
        }
    }
}

fn map_numeric(value: DecodedValue, transform: &impl Fn(f64) -> f64) -> DecodedValue {
    match value {
        DecodedValue::Null => DecodedValue::Null,
        DecodedValue::Array(values) => DecodedValue::Array(
            values.into_iter().map(|v| map_numeric(v, transform)).collect(),
        ),
        other => match other.as_f64() {
            Some(v) => DecodedValue::Float(transform(v)),
            None => other,
        },
    }
}

/// Convert a non-null numeric value to a calendar timestamp.
///
/// Returns `None` when the value is null, non-numeric, or outside the
/// representable range; the caller then leaves the value untouched.
fn to_timestamp(value: &DecodedValue) -> Option<DecodedValue> {
    let seconds = match value {
        DecodedValue::SInt(v) => *v,
        DecodedValue::UInt(v) => i64::try_from(*v).ok()?,
        DecodedValue::Float(v) => *v as i64,
        _ => return None,
    };
    DateTime::from_timestamp(FIT_EPOCH_OFFSET.checked_add(seconds)?, 0)
        .map(DecodedValue::Timestamp)
}
