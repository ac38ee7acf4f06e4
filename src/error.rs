//! Error types for FIT decoding.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context, in particular the byte offset at which decoding failed whenever
//! one is known.
//!
//! ## Error Categories
//!
//! - **Stream Errors**: the byte cursor was asked to read or seek outside
//!   the buffer (truncated files, bad seeks, unreadable headers)
//! - **Decode Errors**: the bytes were readable but not interpretable (CRC
//!   mismatch, data message before its definition, unsupported record kind,
//!   corrupt profile entries)
//! - **File Errors**: I/O failures opening or reading a FIT file from disk
//! - **Profile Errors**: the profile artefact could not be parsed
//!
//! ## Helper Constructors
//!
//! Use helper methods for common error scenarios:
//!
//! ```rust
//! use headunit::FitError;
//!
//! let eof = FitError::stream_at("read past end of buffer", 142);
//! let crc = FitError::decode("file CRC mismatch");
//! assert_eq!(eof.position(), Some(142));
//! assert_eq!(crc.position(), None);
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for FIT decoding operations.
pub type Result<T, E = FitError> = std::result::Result<T, E>;

/// Main error type for FIT decoding operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FitError {
    #[error("Stream error: {message}{}", fmt_position(.position))]
    Stream { message: String, position: Option<usize> },

    #[error("Decode error: {message}{}", fmt_position(.position))]
    Decode { message: String, position: Option<usize> },

    #[error("FIT file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Profile error: {details}")]
    Profile {
        details: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

fn fmt_position(position: &Option<usize>) -> String {
    match position {
        Some(p) => format!(" (at byte {})", p),
        None => String::new(),
    }
}

impl FitError {
    /// Byte offset at which the error was raised, when one is known.
    pub fn position(&self) -> Option<usize> {
        match self {
            FitError::Stream { position, .. } => *position,
            FitError::Decode { position, .. } => *position,
            FitError::File { .. } | FitError::Profile { .. } => None,
        }
    }

    /// Helper constructor for stream errors without a position.
    pub fn stream(message: impl Into<String>) -> Self {
        FitError::Stream { message: message.into(), position: None }
    }

    /// Helper constructor for stream errors at a byte offset.
    pub fn stream_at(message: impl Into<String>, position: usize) -> Self {
        FitError::Stream { message: message.into(), position: Some(position) }
    }

    /// Helper constructor for decode errors without a position.
    pub fn decode(message: impl Into<String>) -> Self {
        FitError::Decode { message: message.into(), position: None }
    }

    /// Helper constructor for decode errors at a byte offset.
    pub fn decode_at(message: impl Into<String>, position: usize) -> Self {
        FitError::Decode { message: message.into(), position: Some(position) }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        FitError::File { path, source }
    }

    /// Helper constructor for profile errors.
    pub fn profile(details: impl Into<String>) -> Self {
        FitError::Profile { details: details.into(), source: None }
    }
}

impl From<std::io::Error> for FitError {
    fn from(err: std::io::Error) -> Self {
        FitError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_json::Error> for FitError {
    fn from(err: serde_json::Error) -> Self {
        FitError::Profile { details: "malformed profile JSON".to_string(), source: Some(err) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_contain_their_context(
                message in "[a-zA-Z0-9 ]*",
                position in 0usize..0x10000usize
            ) {
                let stream_err = FitError::stream_at(message.clone(), position);
                let decode_err = FitError::decode(message.clone());

                let stream_msg = stream_err.to_string();
                prop_assert!(stream_msg.contains(&message));
                prop_assert!(stream_msg.contains(&position.to_string()));
                prop_assert_eq!(stream_err.position(), Some(position));

                let decode_msg = decode_err.to_string();
                prop_assert!(decode_msg.contains(&message));
                prop_assert_eq!(decode_err.position(), None);
            }

            #[test]
            fn io_conversions_preserve_source_message(reason in "[a-zA-Z0-9 ]*") {
                let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, reason.clone());
                let converted: FitError = io_err.into();
                match converted {
                    FitError::File { source, .. } => {
                        prop_assert_eq!(source.to_string(), reason);
                    }
                    _ => prop_assert!(false, "Expected File error from io::Error conversion"),
                }
            }
        }
    }

    #[test]
    fn error_constructors_validation() {
        let file_error = FitError::file_error(
            PathBuf::from("/test.fit"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "test"),
        );
        assert!(matches!(file_error, FitError::File { .. }));

        let stream_error = FitError::stream("eof");
        assert!(matches!(stream_error, FitError::Stream { position: None, .. }));

        let decode_error = FitError::decode_at("bad record header", 14);
        assert_eq!(decode_error.position(), Some(14));
    }

    #[test]
    fn error_traits_validation() {
        // Compile-time check: FitError must be Send + Sync + 'static
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<FitError>();

        let error = FitError::decode("test");
        let _: &dyn std::error::Error = &error;
    }
}
