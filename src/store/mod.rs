//! Persisted device store and the boot policy.
//!
//! The store is one JSON blob under [`NAMESPACE`]/[`DOCUMENT_KEY`]: a single
//! device object or an array of them.  Only the selected profile is
//! hydrated; the rest ride along as raw documents.
//!
//! Boot policy:
//!
//! | Stored blob         | Result                                          |
//! |---------------------|-------------------------------------------------|
//! | absent              | factory default, persisted                      |
//! | decodes             | selected profile (first `isl`, else index 0)    |
//! | unreadable / broken | factory default in memory, blob left untouched  |

pub mod factory;

use log::{info, warn};
use serde_json::Value;

use crate::app::events::BootSource;
use crate::app::ports::StoragePort;
use crate::codec;
use crate::error::{Error, Result};
use crate::model::Device;

pub const NAMESPACE: &str = "relaymini";
pub const DOCUMENT_KEY: &str = "devices";

/// Outcome of [`DocumentStore::boot`].
#[derive(Debug, Clone, PartialEq)]
pub struct BootedStore {
    pub device: Device,
    pub profiles: Vec<Value>,
    pub active_index: usize,
    pub source: BootSource,
}

impl BootedStore {
    fn factory(source: BootSource) -> Self {
        let device = factory::factory_device();
        let profiles = vec![codec::encode_device(&device)];
        Self {
            device,
            profiles,
            active_index: 0,
            source,
        }
    }
}

pub struct DocumentStore<S: StoragePort> {
    storage: S,
    max_bytes: usize,
}

impl<S: StoragePort> DocumentStore<S> {
    pub fn new(storage: S, max_bytes: usize) -> Self {
        Self { storage, max_bytes }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn document_exists(&self) -> bool {
        self.storage.exists(NAMESPACE, DOCUMENT_KEY)
    }

    pub fn load_document(&self) -> Result<Vec<u8>> {
        Ok(self.storage.read(NAMESPACE, DOCUMENT_KEY)?)
    }

    /// Encode and write `document`.  Nothing is written when the encoding
    /// exceeds the size ceiling.  Returns the bytes written.
    pub fn save_document(&mut self, document: &Value) -> Result<usize> {
        let bytes = serde_json::to_vec(document).map_err(codec::DecodeError::from)?;
        if bytes.len() > self.max_bytes {
            return Err(Error::ResourceExhausted {
                needed: bytes.len(),
                limit: self.max_bytes,
            });
        }
        self.storage.write(NAMESPACE, DOCUMENT_KEY, &bytes)?;
        Ok(bytes.len())
    }

    pub fn delete_document(&mut self) -> Result<()> {
        Ok(self.storage.delete(NAMESPACE, DOCUMENT_KEY)?)
    }

    /// Apply the boot policy.  Never fails: every error path ends in the
    /// factory default.
    pub fn boot(&mut self) -> BootedStore {
        if !self.document_exists() {
            let booted = BootedStore::factory(BootSource::FirstBoot);
            match self.save_document(&codec::join_profiles(booted.profiles.clone())) {
                Ok(n) => info!("No stored devices, factory default written ({} bytes)", n),
                Err(e) => warn!("Factory default not persisted: {}", e),
            }
            return booted;
        }

        match self.decode_stored() {
            Ok(booted) => booted,
            Err(e) => {
                warn!("Stored devices unreadable ({}), running factory default", e);
                BootedStore::factory(BootSource::Fallback)
            }
        }
    }

    fn decode_stored(&self) -> Result<BootedStore> {
        let bytes = self.load_document()?;
        let profiles = codec::split_profiles(codec::parse_bytes(&bytes)?)?;
        let active_index = codec::selected_index(&profiles);
        let device = codec::hydrate(&profiles[active_index])?;
        info!(
            "Loaded {} profile(s), active #{} '{}'",
            profiles.len(),
            active_index,
            device.name
        );
        Ok(BootedStore {
            device,
            profiles,
            active_index,
            source: BootSource::Stored,
        })
    }
}
