//! FIT file format structures and parsing
//!
//! Defines the binary structures of the FIT container and provides parsing
//! functions for the file header and for definition and data records.
//!
//! ## FIT File Structure
//!
//! A FIT file is a self-describing record stream:
//!
//! 1. **File Header** (12 or 14 bytes) - sizes, versions, `.FIT` signature,
//!    optional header CRC
//! 2. **Records** - alternating definition and data messages, each led by a
//!    one-byte record header
//! 3. **Trailer** (2 bytes) - little-endian CRC over everything before it
//!
//! Definition messages declare the field layout and byte order for a local
//! message slot; data messages bound to that slot are undecodable without
//! it. Parsing here is purely structural: profile semantics (names, units,
//! scaling) are applied later by the value decoder.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::crc::Crc16;
use crate::stream::ByteStream;
use crate::types::{
    BaseType, DataMessage, DefinitionMessage, DeveloperFieldDefinition, Endianness,
    FieldDefinition, RawValue, RecordHeader,
};
use crate::{FitError, Result};

/// The four signature bytes every FIT header carries.
pub const FIT_SIGNATURE: [u8; 4] = *b".FIT";

/// Short (no header CRC) and long header sizes.
pub const HEADER_SIZE_SHORT: u8 = 12;
pub const HEADER_SIZE_LONG: u8 = 14;

/// Parsed FIT file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Declared header length, 12 or 14.
    pub header_size: u8,
    /// Protocol version byte (major in the high nibble).
    pub protocol_version: u8,
    /// Profile version the file was written against.
    pub profile_version: u16,
    /// Bytes of record data between the header and the trailing CRC.
    pub data_size: u32,
    /// CRC over the first twelve header bytes; only present in 14-byte
    /// headers, and a stored zero means "not computed".
    pub header_crc: Option<u16>,
}

impl FileHeader {
    /// Parse a file header at the stream's current position.
    ///
    /// With `validate_crc`, a 14-byte header's non-zero stored CRC must
    /// match the CRC of the first twelve header bytes. With `seek_back`,
    /// the pre-call position is restored whether or not parsing succeeds;
    /// use this when inspecting a header without starting a scan.
    pub fn parse(stream: &mut ByteStream, validate_crc: bool, seek_back: bool) -> Result<Self> {
        let start = stream.position();
        let result = Self::parse_at(stream, validate_crc, start);
        if seek_back {
            stream.seek(start)?;
        }
        result
    }

    fn parse_at(stream: &mut ByteStream, validate_crc: bool, start: usize) -> Result<Self> {
        let header_size = stream.read_byte()?;
        if header_size != HEADER_SIZE_SHORT && header_size != HEADER_SIZE_LONG {
            return Err(FitError::decode_at(
                format!("unsupported header size {}", header_size),
                start,
            ));
        }

        let protocol_version = stream.read_byte()?;
        let profile_version = stream.read_u16(Endianness::Little)?;
        let data_size = stream.read_u32(Endianness::Little)?;

        let signature = stream.read_bytes(4)?;
        if signature != FIT_SIGNATURE {
            return Err(FitError::decode_at("missing .FIT signature", start + 8));
        }

        let header_crc = if header_size == HEADER_SIZE_LONG {
            Some(stream.read_u16(Endianness::Little)?)
        } else {
            None
        };

        if validate_crc {
            if let Some(stored) = header_crc.filter(|crc| *crc != 0) {
                let computed = Crc16::calculate(stream.slice(start, 12)?);
                if stored != computed {
                    return Err(FitError::decode_at(
                        format!(
                            "header CRC mismatch: stored {:#06X}, computed {:#06X}",
                            stored, computed
                        ),
                        start,
                    ));
                }
            }
        }

        debug!(
            "Parsed FIT header: size={}, protocol={}, profile={}, data_size={}",
            header_size, protocol_version, profile_version, data_size
        );

        Ok(Self { header_size, protocol_version, profile_version, data_size, header_crc })
    }

    /// Offset one past the last record byte (`header_size + data_size`).
    pub fn data_end(&self) -> usize {
        self.header_size as usize + self.data_size as usize
    }
}

/// Read a definition message at the stream's current position.
///
/// The record header byte is consumed here and must denote a definition.
/// Irregular field declarations are not fatal: an unknown base-type
/// identifier, a zero size, or a size that is not a multiple of the element
/// size downgrade the field to `uint8` so the payload stays walkable.
pub fn read_definition(stream: &mut ByteStream) -> Result<DefinitionMessage> {
    let start = stream.position();
    let header = RecordHeader(stream.read_byte()?);
    if !header.is_definition() {
        return Err(FitError::decode_at(
            format!("expected definition record, found header byte {:#04X}", header.0),
            start,
        ));
    }

    let reserved = stream.read_byte()?;
    if reserved != 0 {
        return Err(FitError::decode_at(
            format!("non-zero reserved byte {:#04X} in definition", reserved),
            start + 1,
        ));
    }

    let endianness = match stream.read_byte()? {
        0 => Endianness::Little,
        1 => Endianness::Big,
        other => {
            return Err(FitError::decode_at(
                format!("unsupported architecture byte {:#04X}", other),
                start + 2,
            ));
        }
    };

    let global_mesg_num = stream.read_u16(endianness)?;
    let num_fields = stream.read_byte()?;

    let mut fields = Vec::with_capacity(num_fields as usize);
    for _ in 0..num_fields {
        let field_id = stream.read_byte()?;
        let size = stream.read_byte()?;
        let declared = stream.read_byte()?;

        let base_type = match BaseType::from_id(declared) {
            None => {
                warn!(
                    "Unknown base type {:#04X} for field {} of message {}; reading as uint8",
                    declared, field_id, global_mesg_num
                );
                BaseType::UInt8
            }
            Some(base_type) if size == 0 || size as usize % base_type.size() != 0 => {
                warn!(
                    "Field {} of message {} declares {} bytes, not a multiple of {} ({}); reading as uint8",
                    field_id,
                    global_mesg_num,
                    size,
                    base_type.size(),
                    base_type.name()
                );
                BaseType::UInt8
            }
            Some(base_type) => base_type,
        };

        fields.push(FieldDefinition { field_id, size, base_type });
    }

    let mut developer_fields = Vec::new();
    if header.has_developer_fields() {
        let num_developer_fields = stream.read_byte()?;
        for _ in 0..num_developer_fields {
            developer_fields.push(DeveloperFieldDefinition {
                field_number: stream.read_byte()?,
                size: stream.read_byte()?,
                developer_data_index: stream.read_byte()?,
            });
        }
    }

    trace!(
        "Definition: slot={}, global={}, fields={}, developer_fields={}",
        header.local_slot(),
        global_mesg_num,
        fields.len(),
        developer_fields.len()
    );

    Ok(DefinitionMessage {
        local_slot: header.local_slot(),
        endianness,
        global_mesg_num,
        fields,
        developer_fields,
    })
}

/// Read a data message governed by `definition` at the stream's current
/// position.
///
/// The record header byte is consumed here and must denote a regular data
/// message. Endianness comes from the definition; each field consumes
/// exactly its declared size.
pub fn read_data(stream: &mut ByteStream, definition: &Arc<DefinitionMessage>) -> Result<DataMessage> {
    let start = stream.position();
    let header = RecordHeader(stream.read_byte()?);
    if !header.is_data() {
        return Err(FitError::decode_at(
            format!("expected data record, found header byte {:#04X}", header.0),
            start,
        ));
    }

    let mut values = Vec::with_capacity(definition.fields.len());
    for field in &definition.fields {
        values.push(read_field_value(stream, field, definition.endianness)?);
    }

    let mut developer_values = Vec::with_capacity(definition.developer_fields.len());
    for field in &definition.developer_fields {
        // Developer payloads are opaque: raw octets, no profile semantics.
        let bytes = stream.read_bytes(field.size as usize)?;
        developer_values.push(match bytes {
            [single] => RawValue::Byte(*single),
            many => RawValue::Array(many.iter().map(|b| RawValue::Byte(*b)).collect()),
        });
    }

    Ok(DataMessage { definition: Arc::clone(definition), values, developer_values })
}

fn read_field_value(
    stream: &mut ByteStream,
    field: &FieldDefinition,
    endianness: Endianness,
) -> Result<RawValue> {
    if field.base_type == BaseType::String {
        let position = stream.position();
        let bytes = stream.read_string(field.size as usize)?.to_vec();
        let text = String::from_utf8(bytes).map_err(|e| {
            FitError::decode_at(format!("ill-formed UTF-8 in string field: {}", e), position)
        })?;
        return Ok(RawValue::String(text));
    }

    let count = field.num_elements();
    if count == 1 {
        return read_element(stream, field.base_type, endianness);
    }

    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        elements.push(read_element(stream, field.base_type, endianness)?);
    }
    Ok(RawValue::Array(elements))
}

fn read_element(
    stream: &mut ByteStream,
    base_type: BaseType,
    endianness: Endianness,
) -> Result<RawValue> {
    let position = stream.position();
    let size = base_type.size();
    let bytes = stream.read_bytes(size)?;

    let mut buf = [0u8; 8];
    match endianness {
        Endianness::Little => buf[..size].copy_from_slice(bytes),
        Endianness::Big => {
            for (index, byte) in bytes.iter().rev().enumerate() {
                buf[index] = *byte;
            }
        }
    }
    let bits = u64::from_le_bytes(buf);

    Ok(match base_type {
        BaseType::Enum => RawValue::Enum(bits as u8),
        BaseType::SInt8 => RawValue::SInt8(bits as u8 as i8),
        BaseType::UInt8 => RawValue::UInt8(bits as u8),
        BaseType::SInt16 => RawValue::SInt16(bits as u16 as i16),
        BaseType::UInt16 => RawValue::UInt16(bits as u16),
        BaseType::SInt32 => RawValue::SInt32(bits as u32 as i32),
        BaseType::UInt32 => RawValue::UInt32(bits as u32),
        BaseType::Float32 => RawValue::Float32(f32::from_bits(bits as u32)),
        BaseType::Float64 => RawValue::Float64(f64::from_bits(bits)),
        BaseType::UInt8z => RawValue::UInt8z(bits as u8),
        BaseType::UInt16z => RawValue::UInt16z(bits as u16),
        BaseType::UInt32z => RawValue::UInt32z(bits as u32),
        BaseType::Byte => RawValue::Byte(bits as u8),
        BaseType::SInt64 => RawValue::SInt64(bits as i64),
        BaseType::UInt64 => RawValue::UInt64(bits),
        BaseType::UInt64z => RawValue::UInt64z(bits),
        BaseType::String => {
            return Err(FitError::decode_at("string field read as element", position));
        }
    })
}
