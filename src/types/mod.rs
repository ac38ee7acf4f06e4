//! Core types for FIT data representation.
//!
//! This module provides the foundational data structures for handling FIT
//! records, from the wire up:
//!
//! - [`BaseType`] maps the format's primitive type identifiers to size,
//!   signedness, and invalid-sentinel information
//! - [`RawValue`] holds a field value exactly as read, before profile-driven
//!   interpretation; [`DecodedValue`] is the fully interpreted sum
//! - [`RecordHeader`], [`DefinitionMessage`], and [`DataMessage`] model the
//!   alternating definition/data record stream
//!
//! ## Invariants
//!
//! - A [`DataMessage`] holds exactly one raw value per field definition of
//!   its governing [`DefinitionMessage`], in declaration order
//! - Endianness is fixed per definition message and inherited by every data
//!   message bound to its slot
//! - Invalid sentinels are representable: masking happens in the decoder,
//!   never during the wire read

mod base_type;
mod record;
mod value;

pub use base_type::{ALL_BASE_TYPES, BaseType};
pub use record::{
    DataMessage, DefinitionMessage, DeveloperFieldDefinition, Endianness, FieldDefinition,
    Message, RecordHeader,
};
pub use value::{DecodedValue, RawValue};
