//! Records as the ledger RPC returns them.
//!
//! These shapes are deliberately loose: every field carries a serde default
//! so a partially populated response still decodes, and numeric quantities
//! stay decimal strings until the normalizer turns them into integers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainBlock {
    #[serde(default)]
    pub block_id: BlockId,
    #[serde(default)]
    pub block: BlockBody,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockId {
    #[serde(default)]
    pub hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockBody {
    #[serde(default)]
    pub header: BlockHeader,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    #[serde(default)]
    pub height: String,
    #[serde(default = "unix_epoch")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub num_txs: String,
    #[serde(default)]
    pub total_txs: String,
    #[serde(default)]
    pub proposer_address: String,
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            height: String::new(),
            time: unix_epoch(),
            num_txs: String::new(),
            total_txs: String::new(),
            proposer_address: String::new(),
        }
    }
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainTransaction {
    pub hash: String,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub index: i32,
    #[serde(default)]
    pub tx_result: TxResult,
    #[serde(default)]
    pub tx: String,
    #[serde(rename = "stdTx", default)]
    pub std_tx: StdTx,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxResult {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub events: Value,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub signer: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub message_type: String,
}

/// The signed transaction envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StdTx {
    #[serde(default)]
    pub entropy: i64,
    #[serde(default)]
    pub fee: Vec<Fee>,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub msg: TxMsg,
    #[serde(default)]
    pub signature: TxSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub denom: String,
}

/// Message carried by a transaction. `value` differs per message type and
/// is kept as an untyped map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxMsg {
    #[serde(rename = "type", default)]
    pub msg_type: String,
    #[serde(default)]
    pub value: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxSignature {
    #[serde(default)]
    pub pub_key: String,
    #[serde(default)]
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainAccount {
    pub address: String,
    #[serde(default)]
    pub coins: Vec<Coin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub denom: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainApp {
    pub address: String,
    #[serde(default)]
    pub jailed: bool,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub staked_tokens: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainNode {
    pub address: String,
    #[serde(default)]
    pub jailed: bool,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub service_url: String,
    #[serde(default)]
    pub tokens: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_transaction_with_camel_case_envelope() {
        let raw = r#"{
            "hash": "AF5BB3EAFF431E2E5E784D639825979FF20A779725BFE61D4521340F70C3996D",
            "height": 30363,
            "index": 2,
            "tx_result": {"code": 0, "signer": "addssd", "message_type": "send"},
            "tx": "c2lnbmVk",
            "stdTx": {
                "entropy": 3223323,
                "fee": [{"amount": "10000", "denom": "upokt"}],
                "memo": "",
                "msg": {"type": "pos/Send", "value": {"from_address": "addssd", "amount": "462000000"}},
                "signature": {"pub_key": "adasdsfd", "signature": "sig"}
            }
        }"#;

        let tx: ChainTransaction = serde_json::from_str(raw).unwrap();

        assert_eq!(tx.height, 30363);
        assert_eq!(tx.index, 2);
        assert_eq!(tx.std_tx.msg.msg_type, "pos/Send");
        assert_eq!(tx.std_tx.fee[0].denom, "upokt");
        assert_eq!(tx.std_tx.signature.pub_key, "adasdsfd");
        assert_eq!(tx.tx_result.message_type, "send");
    }

    #[test]
    fn block_without_header_still_decodes() {
        let block: ChainBlock = serde_json::from_str(r#"{"block_id": {"hash": ""}}"#).unwrap();

        assert!(block.block_id.hash.is_empty());
        assert_eq!(block.block.header.time, DateTime::<Utc>::UNIX_EPOCH);
    }
}
