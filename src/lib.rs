//! Type-safe Rust library for Garmin FIT activity files.
//!
//! Headunit decodes the FIT container format into structured, typed
//! records: it walks the definition/data record stream, verifies both CRCs,
//! and interprets raw field values against the global profile (names,
//! units, scale/offset, enumerations, sub-fields, timestamps).
//!
//! # Features
//!
//! - **Integrity first**: header and file CRCs are verified before any
//!   message is produced
//! - **Lazy iteration**: messages decode one at a time, in file order
//! - **Profile-driven**: field semantics come from a shared, immutable
//!   profile that many decoders can borrow concurrently
//! - **Faithful nulls**: invalid sentinels become nulls, inside arrays too
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use headunit::{DecodeConfig, Fit, Profile};
//!
//! fn main() -> headunit::Result<()> {
//!     let profile = Profile::from_path("profile.json")?;
//!     let decoded = Fit::decode_file("ride.fit", &profile, DecodeConfig::default())?;
//!
//!     for record in &decoded["record"] {
//!         if let Some(heart_rate) = record.value("heart_rate") {
//!             println!("hr: {:?}", heart_rate);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod decoded;
mod error;
pub mod types;

// Byte-level layers
pub mod crc;
pub mod stream;

// Container reading
pub mod fit;

// Profile semantics
pub mod decode;
pub mod profile;

#[cfg(test)]
mod test_fixtures;

// Core exports
pub use decoded::{DecodedField, DecodedFitFile, DecodedMessage};
pub use error::{FitError, Result};
pub use types::{
    BaseType, DataMessage, DecodedValue, DefinitionMessage, Endianness, Message, RawValue,
};

// Container exports
pub use fit::{FileHeader, FitReader};

// Semantic exports
pub use decode::{DecodeConfig, MessageDecoder};
pub use profile::Profile;

use std::path::Path;

/// Unified entry point for FIT decoding.
///
/// This factory provides a consistent API for the two common workflows:
/// opening a file for lazy message iteration, and decoding a whole file
/// into grouped messages in one call.
///
/// # Examples
///
/// ## Lazy iteration
/// ```rust,no_run
/// use headunit::{Fit, Message};
///
/// fn main() -> headunit::Result<()> {
///     let mut reader = Fit::open("ride.fit")?;
///     while let Some(message) = reader.read_next_message()? {
///         if let Message::Data(data) = message {
///             println!("message {}", data.global_mesg_num());
///         }
///     }
///     Ok(())
/// }
/// ```
///
/// ## Whole-file decode
/// ```rust,no_run
/// use headunit::{DecodeConfig, Fit, Profile};
///
/// fn main() -> headunit::Result<()> {
///     let profile = Profile::from_path("profile.json")?;
///     let decoded = Fit::decode_file("ride.fit", &profile, DecodeConfig::default())?;
///     println!("{} message kinds", decoded.message_names().len());
///     Ok(())
/// }
/// ```
pub struct Fit;

impl Fit {
    /// Open a FIT file for lazy message iteration.
    ///
    /// The file is read into memory and its header and trailing CRC are
    /// verified before the reader is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a FIT file, or
    /// fails either CRC check.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FitReader> {
        FitReader::open(path)
    }

    /// Decode a whole FIT file into messages grouped by name.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Fit::open`], plus
    /// any record-level decoding failure (data before definition,
    /// unsupported record kinds, corrupt profile entries).
    pub fn decode_file<P: AsRef<Path>>(
        path: P,
        profile: &Profile,
        config: DecodeConfig,
    ) -> Result<DecodedFitFile> {
        let mut reader = FitReader::open(path)?;
        DecodedFitFile::decode_reader(&mut reader, profile, config)
    }
}
