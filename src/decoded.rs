//! Decoded result model: fields, messages, and whole files.

use std::collections::HashMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::decode::{DecodeConfig, MessageDecoder};
use crate::fit::FitReader;
use crate::profile::Profile;
use crate::types::{DecodedValue, Message};
use crate::Result;

/// A decoded field: interpreted value plus its unit (possibly empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedField {
    pub value: DecodedValue,
    pub units: String,
}

/// A decoded message: resolved name and a field map preserving declaration
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedMessage {
    name: String,
    order: Vec<String>,
    fields: HashMap<String, DecodedField>,
}

impl DecodedMessage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), order: Vec::new(), fields: HashMap::new() }
    }

    /// Resolved message name (`unknown_msg_<n>` when not in the profile).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a decoded field, replacing any previous value under the name.
    pub fn insert(&mut self, name: impl Into<String>, field: DecodedField) {
        let name = name.into();
        if !self.fields.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.fields.insert(name, field);
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&DecodedField> {
        self.fields.get(name)
    }

    /// Decoded value of a field, when present.
    pub fn value(&self, name: &str) -> Option<&DecodedValue> {
        self.get(name).map(|field| &field.value)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecodedField)> {
        self.order.iter().map(|name| (name.as_str(), &self.fields[name]))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Index<&str> for DecodedMessage {
    type Output = DecodedField;

    fn index(&self, name: &str) -> &Self::Output {
        &self.fields[name]
    }
}

/// A decoded file: messages grouped by name, names in order of first
/// appearance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodedFitFile {
    order: Vec<String>,
    groups: HashMap<String, Vec<DecodedMessage>>,
}

impl DecodedFitFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every data message a reader produces, grouped by name.
    pub fn decode_reader(
        reader: &mut FitReader,
        profile: &Profile,
        config: DecodeConfig,
    ) -> Result<Self> {
        let decoder = MessageDecoder::new(profile, config);
        let mut file = Self::new();
        while let Some(message) = reader.read_next_message()? {
            if let Message::Data(data) = message {
                file.push(decoder.decode(&data)?);
            }
        }
        Ok(file)
    }

    /// Append a decoded message to its name group.
    pub fn push(&mut self, message: DecodedMessage) {
        let name = message.name().to_string();
        match self.groups.get_mut(&name) {
            Some(group) => group.push(message),
            None => {
                self.order.push(name.clone());
                self.groups.insert(name, vec![message]);
            }
        }
    }

    /// Distinct message names in order of first appearance.
    pub fn message_names(&self) -> &[String] {
        &self.order
    }

    /// The ordered messages of one name.
    pub fn get(&self, name: &str) -> Option<&[DecodedMessage]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Groups in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DecodedMessage])> {
        self.order.iter().map(|name| (name.as_str(), self.groups[name].as_slice()))
    }

    /// Total number of decoded messages across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Index<&str> for DecodedFitFile {
    type Output = [DecodedMessage];

    fn index(&self, name: &str) -> &Self::Output {
        &self.groups[name]
    }
}
