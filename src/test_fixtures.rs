//! Test support: synthetic FIT byte images.
//!
//! Builds well-formed files (correct header, sizes, and CRCs) from record
//! fragments so decoding tests do not depend on on-disk fixtures.

use crate::crc::Crc16;

/// Builder for complete FIT file byte images.
pub struct FitFileBuilder {
    protocol_version: u8,
    profile_version: u16,
    records: Vec<u8>,
}

impl FitFileBuilder {
    pub fn new() -> Self {
        Self { protocol_version: 0x20, profile_version: 2150, records: Vec::new() }
    }

    /// Append a little-endian definition message.
    ///
    /// `fields` are `(field_id, size, base_type_id)` triples.
    pub fn definition(self, slot: u8, global_mesg_num: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_record(slot, global_mesg_num, fields, &[], false)
    }

    /// Append a big-endian definition message.
    pub fn definition_be(self, slot: u8, global_mesg_num: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_record(slot, global_mesg_num, fields, &[], true)
    }

    /// Append a definition message with developer field definitions.
    pub fn definition_with_developer(
        self,
        slot: u8,
        global_mesg_num: u16,
        fields: &[(u8, u8, u8)],
        developer_fields: &[(u8, u8, u8)],
    ) -> Self {
        self.definition_record(slot, global_mesg_num, fields, developer_fields, false)
    }

    fn definition_record(
        mut self,
        slot: u8,
        global_mesg_num: u16,
        fields: &[(u8, u8, u8)],
        developer_fields: &[(u8, u8, u8)],
        big_endian: bool,
    ) -> Self {
        let mut header = 0x40 | (slot & 0x0F);
        if !developer_fields.is_empty() {
            header |= 0x20;
        }
        self.records.push(header);
        self.records.push(0x00);
        self.records.push(if big_endian { 0x01 } else { 0x00 });
        if big_endian {
            self.records.extend_from_slice(&global_mesg_num.to_be_bytes());
        } else {
            self.records.extend_from_slice(&global_mesg_num.to_le_bytes());
        }
        self.records.push(fields.len() as u8);
        for (field_id, size, base_type) in fields {
            self.records.extend_from_slice(&[*field_id, *size, *base_type]);
        }
        if !developer_fields.is_empty() {
            self.records.push(developer_fields.len() as u8);
            for (field_number, size, index) in developer_fields {
                self.records.extend_from_slice(&[*field_number, *size, *index]);
            }
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

    /// Produce the full file image: 14-byte header (with valid header CRC),
    /// records, and a valid trailing CRC.
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
