//! Versioned JSON envelope
//!
//! Records are stored as `{"version": N, "data": ...}`. A bare payload with no
//! envelope (the pre-versioning format) is still accepted on read.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Storage;
use crate::error::StorageError;

/// Current envelope version
pub const SAVE_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeIn<T> {
    version: u32,
    data: T,
}

/// Read and decode a record. `Ok(None)` means the key is absent.
pub fn read_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(text) = storage.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str::<EnvelopeIn<T>>(&text) {
        Ok(env) if env.version == SAVE_VERSION => Ok(Some(env.data)),
        Ok(env) => Err(StorageError::Version {
            found: env.version,
            expected: SAVE_VERSION,
        }),
        Err(_) => {
            let data = serde_json::from_str::<T>(&text)?;
            log::debug!("Read legacy un-enveloped record '{}'", key);
            Ok(Some(data))
        }
    }
}

/// Encode and write a record inside the current envelope
pub fn write_json<T: Serialize>(
    storage: &mut dyn Storage,
    key: &str,
    data: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(&EnvelopeOut {
        version: SAVE_VERSION,
        data,
    })?;
    storage.set(key, &json)
}
