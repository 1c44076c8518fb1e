//! Streamed document upload.
//!
//! The transport delivers a device document in chunks.  The buffer is owned
//! by the request: dropping it on any exit path frees the memory.

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct UploadBuffer {
    data: Vec<u8>,
    limit: usize,
}

impl UploadBuffer {
    /// Start an upload.  A declared length above `limit` is refused before
    /// anything is allocated.
    pub fn begin(declared_len: Option<usize>, limit: usize) -> Result<Self> {
        let mut data = Vec::new();
        if let Some(len) = declared_len {
            if len > limit {
                return Err(Error::ResourceExhausted { needed: len, limit });
            }
            data.try_reserve_exact(len)
                .map_err(|_| Error::ResourceExhausted { needed: len, limit })?;
        }
        Ok(Self { data, limit })
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        let needed = self.data.len() + chunk.len();
        if needed > self.limit {
            return Err(Error::ResourceExhausted {
                needed,
                limit: self.limit,
            });
        }
        self.data
            .try_reserve(chunk.len())
            .map_err(|_| Error::ResourceExhausted {
                needed,
                limit: self.limit,
            })?;
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
