//! Unified error type for the controller core.
//!
//! Four failure classes reach a caller: malformed input, storage failure,
//! resource exhaustion and rejected commands.  Dangling references inside a
//! valid model are not errors; the rule that holds one is simply inert.

use core::fmt;

use crate::app::ports::StorageError;
use crate::codec::DecodeError;
use crate::drivers::dht::DhtFailure;
use crate::relay_cmd::RelayCommandError;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input document or field update could not be applied.  Nothing changed.
    Decode(DecodeError),
    /// Persisted storage could not be read or written.
    Storage(StorageError),
    /// A document would exceed the memory ceiling.  Nothing was written.
    ResourceExhausted { needed: usize, limit: usize },
    /// A relay command was rejected.
    Command(&'static str),
    /// A sensor read failed.  The engine stores NaN; callers only log it.
    Sensor(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "malformed input: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::ResourceExhausted { needed, limit } => {
                write!(f, "insufficient memory: {needed} bytes needed, limit {limit}")
            }
            Self::Command(msg) => write!(f, "command rejected: {msg}"),
            Self::Sensor(msg) => write!(f, "sensor: {msg}"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<RelayCommandError> for Error {
    fn from(e: RelayCommandError) -> Self {
        Self::Command(e.as_str())
    }
}

impl From<DhtFailure> for Error {
    fn from(e: DhtFailure) -> Self {
        Self::Sensor(e.as_str())
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
