//! Shared fixtures for the decode pipeline tests: synthetic FIT byte
//! images and a small but representative profile.

#![allow(dead_code)]

use headunit::crc::Crc16;
use headunit::Profile;

/// Builder for complete FIT file byte images with valid CRCs.
pub struct FitFileBuilder {
    protocol_version: u8,
    profile_version: u16,
    records: Vec<u8>,
}

impl FitFileBuilder {
    pub fn new() -> Self {
        Self { protocol_version: 0x20, profile_version: 2150, records: Vec::new() }
    }

    /// Append a little-endian definition message from `(field_id, size,
    /// base_type_id)` triples.
    pub fn definition(mut self, slot: u8, global_mesg_num: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.records.push(0x40 | (slot & 0x0F));
        self.records.push(0x00);
        self.records.push(0x00);
        self.records.extend_from_slice(&global_mesg_num.to_le_bytes());
        self.records.push(fields.len() as u8);
        for (field_id, size, base_type) in fields {
            self.records.extend_from_slice(&[*field_id, *size, *base_type]);
        }
        self
    }

    /// Append a definition message that also declares developer fields
    /// (`(field_number, size, developer_data_index)` triples).
    pub fn definition_with_developer(
        mut self,
        slot: u8,
        global_mesg_num: u16,
        fields: &[(u8, u8, u8)],
        developer_fields: &[(u8, u8, u8)],
    ) -> Self {
        self.records.push(0x60 | (slot & 0x0F));
        self.records.push(0x00);
        self.records.push(0x00);
        self.records.extend_from_slice(&global_mesg_num.to_le_bytes());
        self.records.push(fields.len() as u8);
        for (field_id, size, base_type) in fields {
            self.records.extend_from_slice(&[*field_id, *size, *base_type]);
        }
        self.records.push(developer_fields.len() as u8);
        for (field_number, size, index) in developer_fields {
            self.records.extend_from_slice(&[*field_number, *size, *index]);
        }
        self
    }

    /// Append a data message: record header byte plus the raw payload.
    pub fn data(mut self, slot: u8, payload: &[u8]) -> Self {
        self.records.push(slot & 0x0F);
        self.records.extend_from_slice(payload);
        self
    }

    /// Append arbitrary record bytes verbatim.
    pub fn raw_record(mut self, bytes: &[u8]) -> Self {
        self.records.extend_from_slice(bytes);
        self
    }

    /// Produce the full image: 14-byte header, records, trailing CRC.
    pub fn build(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(14 + self.records.len() + 2);
        bytes.push(14);
        bytes.push(self.protocol_version);
        bytes.extend_from_slice(&self.profile_version.to_le_bytes());
        bytes.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
        bytes.extend_from_slice(b".FIT");
        let header_crc = Crc16::calculate(&bytes);
        bytes.extend_from_slice(&header_crc.to_le_bytes());
        bytes.extend_from_slice(&self.records);
        let file_crc = Crc16::calculate(&bytes);
        bytes.extend_from_slice(&file_crc.to_le_bytes());
        bytes
    }
}

/// A profile covering the message kinds the pipeline tests exercise:
/// `record` (timestamp, heart rate, scaled distance, sport enum) and
/// `event` (sub-field gated on the event kind).
pub fn sample_profile() -> Profile {
    Profile::from_json_str(
        r#"{
            "messages": {
                "20": {
                    "name": "record",
                    "fields": {
                        "253": {"name": "timestamp", "type": "date_time", "units": "s"},
                        "3": {"name": "heart_rate", "type": "uint8", "units": "bpm"},
                        "5": {"name": "distance", "type": "uint32", "units": "m", "scale": 100},
                        "6": {"name": "sport", "type": "sport"}
                    }
                },
                "21": {
                    "name": "event",
                    "fields": {
                        "0": {"name": "event", "type": "event"},
                        "3": {
                            "name": "data", "type": "uint32",
                            "sub_fields": [{
                                "name": "rider_position", "type": "rider_position_type",
                                "map": [{"num": 0, "raw_value": 42}]
                            }]
                        }
                    }
                }
            },
            "types": {
                "event": {"0": "timer", "42": "rider_position_change"},
                "sport": {"0": "generic", "2": "cycling"},
                "rider_position_type": {"7": "standing"}
            }
        }"#,
    )
    .expect("sample profile must load")
}
