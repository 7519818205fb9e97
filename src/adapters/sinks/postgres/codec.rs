//! JSON payload columns.
//!
//! `stdtx` and `tx_result` are stored as JSONB. They are bound as text and
//! cast in SQL, and read back through `::text`.

use serde::{de::DeserializeOwned, Serialize};

use crate::application::{AppError, AppResult};

pub fn encode_payload<T: Serialize>(payload: &T) -> AppResult<String> {
    serde_json::to_string(payload).map_err(AppError::PayloadEncode)
}

pub fn decode_payload<T: DeserializeOwned>(column: &'static str, raw: &str) -> AppResult<T> {
    serde_json::from_str(raw).map_err(|source| AppError::PayloadDecode { column, source })
}
