//! Canonical fields pulled out of a transaction's loosely typed message.
//!
//! The `value` map of a message has no fixed shape: which keys exist and
//! what type they hold depends on the message type. Every accessor here
//! degrades to a zero value instead of failing, so a transaction always
//! yields a complete record.

use num_bigint::BigInt;
use serde_json::{Map, Value};

use crate::application::{AppError, AppResult};
use crate::domain::chain::StdTx;

#[derive(Debug, Clone, PartialEq)]
pub struct MessageFields {
    pub from_address: String,
    pub to_address: String,
    pub amount: BigInt,
    pub chains: Vec<String>,
    pub fee: i64,
    pub fee_denomination: String,
    pub message_type: String,
    pub public_key: String,
}

/// Typed view over a message value map.
pub struct MessageValue<'a> {
    values: &'a Map<String, Value>,
}

impl<'a> MessageValue<'a> {
    pub fn new(values: &'a Map<String, Value>) -> Self {
        Self { values }
    }

    /// String under `key`, empty when absent or not a string.
    pub fn string(&self, key: &str) -> String {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_default()
    }

    /// Decimal integer stored as a string under `key`, zero when absent,
    /// not a string or not a decimal number.
    pub fn big_int(&self, key: &str) -> BigInt {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .map(parse_big_int)
            .unwrap_or_default()
    }

    /// String elements of the list under `key`; other elements are skipped.
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.values
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Parses a base-10 integer, yielding zero for anything unparsable.
pub fn parse_big_int(raw: &str) -> BigInt {
    BigInt::parse_bytes(raw.as_bytes(), 10).unwrap_or_default()
}

/// Parses a base-10 machine integer, yielding zero for anything unparsable.
pub fn parse_i64(raw: &str) -> i64 {
    raw.parse().unwrap_or_default()
}

/// Extracts the canonical fields of the transaction `hash` from its
/// envelope. The envelope must carry at least one fee entry.
pub fn extract_message_fields(hash: &str, std_tx: &StdTx) -> AppResult<MessageFields> {
    let fee = std_tx
        .fee
        .first()
        .ok_or_else(|| AppError::TransactionWithoutFee {
            hash: hash.to_owned(),
        })?;

    let value = MessageValue::new(&std_tx.msg.value);

    Ok(MessageFields {
        from_address: value.string("from_address"),
        to_address: value.string("to_address"),
        amount: value.big_int("amount"),
        chains: value.strings("chains"),
        fee: parse_i64(&fee.amount),
        fee_denomination: fee.denom.clone(),
        message_type: std_tx.msg.msg_type.clone(),
        public_key: std_tx.signature.pub_key.clone(),
    })
}
