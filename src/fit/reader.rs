//! FIT file reader: integrity checks and lazy message iteration
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use headunit::fit::FitReader;
//! use headunit::Message;
//!
//! fn read_messages() -> headunit::Result<()> {
//!     let mut reader = FitReader::open("activity.fit")?;
//!     println!("protocol {}, {} data bytes", reader.header().protocol_version,
//!         reader.header().data_size);
//!
//!     while let Some(message) = reader.read_next_message()? {
//!         match message {
//!             Message::Definition(def) => println!("definition for slot {}", def.local_slot),
//!             Message::Data(data) => println!("data for message {}", data.global_mesg_num()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Performance Notes
//!
//! - File data is loaded into memory at construction time; header and file
//!   CRC are verified before the first message is returned
//! - Messages are produced lazily; nothing is decoded until asked for
//! - The sixteen local message slots are a direct-indexed array, so the
//!   definition lookup per data message is O(1)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::format::{self, FileHeader};
use crate::crc::{CRC_SIZE, Crc16};
use crate::stream::ByteStream;
use crate::types::{DefinitionMessage, Message, RecordHeader};
use crate::{FitError, Result};

/// Number of local message slots a record header can address.
pub const LOCAL_SLOTS: usize = 16;

/// Stateful FIT message walker.
///
/// Owns the byte stream and the slot table binding local message numbers to
/// their most recent definitions. Installing a definition in one slot never
/// disturbs the bindings of other slots.
#[derive(Debug)]
pub struct FitReader {
    stream: ByteStream,
    path: PathBuf,
    header: FileHeader,
    definitions: [Option<Arc<DefinitionMessage>>; LOCAL_SLOTS],
    data_end: usize,
}

impl FitReader {
    /// Open a FIT file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(&path)
            .map_err(|e| FitError::file_error(path.as_ref().to_path_buf(), e))?;
        Self::from_bytes_with_path(data, path.as_ref().to_path_buf())
    }

    /// Create a reader over an in-memory buffer.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_path(data, PathBuf::from("<memory>"))
    }

    fn from_bytes_with_path(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        let mut stream = ByteStream::new(data);
        let header = FileHeader::parse(&mut stream, true, false)?;

        let data_end = header.data_end();
        let expected_len = data_end + CRC_SIZE;
        if stream.len() < expected_len {
            return Err(FitError::stream(format!(
                "file is {} bytes but the header declares {}",
                stream.len(),
                expected_len
            )));
        }
        if stream.len() > expected_len {
            warn!(
                "File carries {} bytes beyond the declared trailer; chained FIT data is not read",
                stream.len() - expected_len
            );
        }

        let stored = Crc16::extract_trailer(stream.slice(data_end, CRC_SIZE)?)?;
        let computed = Crc16::calculate(stream.slice(0, data_end)?);
        if stored != computed {
            return Err(FitError::decode_at(
                format!("file CRC mismatch: stored {:#06X}, computed {:#06X}", stored, computed),
                data_end,
            ));
        }

        debug!(
            "Opened {}: profile {}, {} record bytes",
            path.display(),
            header.profile_version,
            header.data_size
        );

        Ok(Self {
            stream,
            path,
            header,
            definitions: Default::default(),
            data_end,
        })
    }

    /// Parsed file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Path the reader was opened from (`<memory>` for buffers).
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Current byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.stream.position()
    }

    /// Offset one past the last record byte.
    pub fn data_end(&self) -> usize {
        self.data_end
    }

    /// Definition currently bound to a local slot.
    pub fn definition(&self, slot: u8) -> Option<&Arc<DefinitionMessage>> {
        self.definitions.get(slot as usize).and_then(|d| d.as_ref())
    }

    /// Read the next message, or `None` once the record region is consumed.
    ///
    /// Definitions are installed in the slot table and also emitted, so
    /// callers observe records in file order.
    pub fn read_next_message(&mut self) -> Result<Option<Message>> {
        if self.stream.position() >= self.data_end {
            return Ok(None);
        }

        let position = self.stream.position();
        let record_header = RecordHeader(self.stream.peek_byte()?);

        let message = if record_header.is_compressed_timestamp() {
            return Err(FitError::decode_at(
                "compressed timestamp records are not supported",
                position,
            ));
        } else if record_header.is_definition() {
            let definition = Arc::new(format::read_definition(&mut self.stream)?);
            self.definitions[definition.local_slot as usize] = Some(Arc::clone(&definition));
            Message::Definition(definition)
        } else {
            let slot = record_header.local_slot();
            let definition = self.definition(slot).cloned().ok_or_else(|| {
                FitError::decode_at(
                    format!("data message in slot {} before any definition", slot),
                    position,
                )
            })?;
            Message::Data(format::read_data(&mut self.stream, &definition)?)
        };

        if self.stream.position() > self.data_end {
            return Err(FitError::decode_at(
                "record overran the declared data region",
                position,
            ));
        }

        Ok(Some(message))
    }

    /// Iterator over the remaining messages.
    pub fn messages(&mut self) -> Messages<'_> {
        Messages { reader: self }
    }
}

/// Iterator adapter over [`FitReader::read_next_message`].
pub struct Messages<'a> {
    reader: &'a mut FitReader,
}

impl Iterator for Messages<'_> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_next_message().transpose()
    }
}
