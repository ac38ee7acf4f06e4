//! Record-level wire structures: headers, definitions, and data messages.

use std::sync::Arc;

use super::{BaseType, RawValue};

/// Byte order declared by a definition message's architecture byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// The one-byte header that introduces every record.
///
/// Bit 7 marks a compressed-timestamp record (recognized but unsupported),
/// bit 6 a definition message, bit 5 the presence of developer field
/// definitions, and the low four bits the local message slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader(pub u8);

impl RecordHeader {
    pub fn is_compressed_timestamp(&self) -> bool {
        self.0 & 0x80 != 0
    }

    pub fn is_definition(&self) -> bool {
        !self.is_compressed_timestamp() && self.0 & 0x40 != 0
    }

    pub fn has_developer_fields(&self) -> bool {
        self.is_definition() && self.0 & 0x20 != 0
    }

    pub fn is_data(&self) -> bool {
        !self.is_compressed_timestamp() && !self.is_definition()
    }

    /// Local message slot in `0..16`.
    pub fn local_slot(&self) -> u8 {
        self.0 & 0x0F
    }
}

/// One field of a definition message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Profile key within the owning message.
    pub field_id: u8,
    /// Total bytes this field occupies on the wire.
    pub size: u8,
    /// Wire type of each element.
    pub base_type: BaseType,
}

impl FieldDefinition {
    /// Number of elements this field carries (`size / base_type.size()`).
    pub fn num_elements(&self) -> usize {
        self.size as usize / self.base_type.size()
    }
}

/// One developer field of a definition message. Passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub field_number: u8,
    pub size: u8,
    pub developer_data_index: u8,
}

/// A parsed definition message: the schema for data messages bound to its
/// local slot until a later definition replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionMessage {
    pub local_slot: u8,
    pub endianness: Endianness,
    pub global_mesg_num: u16,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

impl DefinitionMessage {
    /// Payload bytes of one data message governed by this definition.
    pub fn data_size(&self) -> usize {
        let fields: usize = self.fields.iter().map(|f| f.size as usize).sum();
        let developer: usize = self.developer_fields.iter().map(|f| f.size as usize).sum();
        fields + developer
    }
}

/// A data message: raw values in declaration order plus the definition that
/// shaped them.
#[derive(Debug, Clone)]
pub struct DataMessage {
    pub definition: Arc<DefinitionMessage>,
    /// One raw value per field definition, in declaration order.
    pub values: Vec<RawValue>,
    /// One raw value per developer field definition, undecoded bytes.
    pub developer_values: Vec<RawValue>,
}

impl DataMessage {
    pub fn global_mesg_num(&self) -> u16 {
        self.definition.global_mesg_num
    }

    /// Raw value of the field with the given profile id, if the message
    /// carries that field.
    pub fn raw_by_field_id(&self, field_id: u8) -> Option<&RawValue> {
        self.definition
            .fields
            .iter()
            .position(|f| f.field_id == field_id)
            .and_then(|index| self.values.get(index))
    }
}

/// A message emitted by the reader, in file order.
#[derive(Debug, Clone)]
pub enum Message {
    Definition(Arc<DefinitionMessage>),
    Data(DataMessage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_header_classification() {
        assert!(RecordHeader(0x40).is_definition());
        assert!(!RecordHeader(0x40).has_developer_fields());
        assert!(RecordHeader(0x60).has_developer_fields());
        assert!(RecordHeader(0x00).is_data());
        assert!(RecordHeader(0x0F).is_data());
        assert!(RecordHeader(0x80).is_compressed_timestamp());
        // A compressed header is never misread as a definition.
        assert!(!RecordHeader(0xC0).is_definition());
    }

    #[test]
    fn local_slot_is_the_low_nibble() {
        assert_eq!(RecordHeader(0x43).local_slot(), 3);
        assert_eq!(RecordHeader(0x0F).local_slot(), 15);
        assert_eq!(RecordHeader(0x10).local_slot(), 0);
    }

    #[test]
    fn element_count_derives_from_sizes() {
        let field = FieldDefinition { field_id: 0, size: 12, base_type: BaseType::UInt32 };
        assert_eq!(field.num_elements(), 3);
        let scalar = FieldDefinition { field_id: 1, size: 2, base_type: BaseType::UInt16 };
        assert_eq!(scalar.num_elements(), 1);
    }

    #[test]
    fn definition_data_size_sums_both_field_kinds() {
        let definition = DefinitionMessage {
            local_slot: 0,
            endianness: Endianness::Little,
            global_mesg_num: 20,
            fields: vec![
                FieldDefinition { field_id: 0, size: 4, base_type: BaseType::UInt32 },
                FieldDefinition { field_id: 1, size: 2, base_type: BaseType::UInt16 },
            ],
            developer_fields: vec![DeveloperFieldDefinition {
                field_number: 0,
                size: 3,
                developer_data_index: 0,
            }],
        };
        assert_eq!(definition.data_size(), 9);
    }

    #[test]
    fn raw_lookup_follows_declaration_order() {
        let definition = Arc::new(DefinitionMessage {
            local_slot: 0,
            endianness: Endianness::Little,
            global_mesg_num: 21,
            fields: vec![
                FieldDefinition { field_id: 0, size: 1, base_type: BaseType::Enum },
                FieldDefinition { field_id: 3, size: 4, base_type: BaseType::UInt32 },
            ],
            developer_fields: Vec::new(),
        });
        let message = DataMessage {
            definition,
            values: vec![RawValue::Enum(42), RawValue::UInt32(7)],
            developer_values: Vec::new(),
        };
        assert_eq!(message.raw_by_field_id(0), Some(&RawValue::Enum(42)));
        assert_eq!(message.raw_by_field_id(3), Some(&RawValue::UInt32(7)));
        assert_eq!(message.raw_by_field_id(9), None);
    }
}
