use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use replay_engine::{Replay, ReplayConfig};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path} at {json_path}: {source}")]
    Json {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug)]
pub(crate) struct LoadedReplay {
    pub(crate) replay: Replay,
    pub(crate) sha256_hex: String,
    pub(crate) byte_len: usize,
}

pub(crate) fn load_replay(path: &Path) -> Result<LoadedReplay, DecodeError> {
    let bytes = read_bytes(path)?;
    let replay = decode_json::<Replay>(path, &bytes)?;
    Ok(LoadedReplay {
        replay,
        sha256_hex: sha256_hex(&bytes),
        byte_len: bytes.len(),
    })
}

/// Reads an optional JSON config; absent paths yield the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ReplayConfig, DecodeError> {
    match path {
        Some(path) => decode_json(path, &read_bytes(path)?),
        None => Ok(ReplayConfig::default()),
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, DecodeError> {
    fs::read(path).map_err(|source| DecodeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_json<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, DecodeError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        DecodeError::Json {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    to_hex_lower(&Sha256::digest(bytes))
}

fn to_hex_lower(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        output.push(char::from(DIGITS[usize::from(byte >> 4)]));
        output.push(char::from(DIGITS[usize::from(byte & 0x0f)]));
    }
    output
}
