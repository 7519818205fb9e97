//! Conversion of ledger records into snapshot records.
//!
//! Accounts, apps and nodes do not report the height they were listed at,
//! so the caller passes it in. Token quantities that fail to parse become
//! zero.

use chrono::Duration;

use crate::application::{AppError, AppResult};
use crate::domain::chain::{ChainAccount, ChainApp, ChainBlock, ChainNode, ChainTransaction};
use crate::domain::message::{extract_message_fields, parse_big_int, parse_i64};
use crate::domain::{Account, App, Block, Node, Transaction};

/// `height` is the height that was requested from the ledger, only used to
/// label the error when the block has no hash.
pub fn normalize_block(height: i64, chain_block: &ChainBlock) -> AppResult<Block> {
    if chain_block.block_id.hash.is_empty() {
        return Err(AppError::BlockHasNoHash { height });
    }

    let header = &chain_block.block.header;

    Ok(Block {
        hash: chain_block.block_id.hash.clone(),
        height: parse_i64(&header.height),
        time: header.time,
        proposer_address: header.proposer_address.clone(),
        tx_count: parse_i64(&header.num_txs),
        tx_total: parse_i64(&header.total_txs),
        accounts_quantity: 0,
        apps_quantity: 0,
        nodes_quantity: 0,
        took: Duration::zero(),
    })
}

pub fn normalize_transaction(chain_tx: &ChainTransaction) -> AppResult<Transaction> {
    let fields = extract_message_fields(&chain_tx.hash, &chain_tx.std_tx)?;

    Ok(Transaction {
        hash: chain_tx.hash.clone(),
        from_address: fields.from_address,
        to_address: fields.to_address,
        app_pub_key: fields.public_key,
        blockchains: fields.chains,
        message_type: fields.message_type,
        height: chain_tx.height,
        index: chain_tx.index,
        std_tx: chain_tx.std_tx.clone(),
        tx_result: chain_tx.tx_result.clone(),
        tx: chain_tx.tx.clone(),
        entropy: chain_tx.std_tx.entropy,
        fee: fields.fee,
        fee_denomination: fields.fee_denomination,
        amount: fields.amount,
    })
}

/// Balance and denomination are only taken when the account holds exactly
/// one coin.
pub fn normalize_account(height: i64, chain_account: &ChainAccount) -> Account {
    let (balance, balance_denomination) = match chain_account.coins.as_slice() {
        [coin] => (parse_big_int(&coin.amount), coin.denom.clone()),
        _ => (Default::default(), String::new()),
    };

    Account {
        address: chain_account.address.clone(),
        height,
        balance,
        balance_denomination,
    }
}

pub fn normalize_app(height: i64, chain_app: &ChainApp) -> App {
    App {
        address: chain_app.address.clone(),
        height,
        jailed: chain_app.jailed,
        public_key: chain_app.public_key.clone(),
        staked_tokens: parse_big_int(&chain_app.staked_tokens),
    }
}

pub fn normalize_node(height: i64, chain_node: &ChainNode) -> Node {
    Node {
        address: chain_node.address.clone(),
        height,
        jailed: chain_node.jailed,
        public_key: chain_node.public_key.clone(),
        service_url: chain_node.service_url.clone(),
        tokens: parse_big_int(&chain_node.tokens),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::{BlockBody, BlockHeader, BlockId, Coin, Fee, StdTx, TxMsg};
    use chrono::{TimeZone, Utc};
    use num_bigint::BigInt;

    const ADDRESS: &str = "00353abd21ef72725b295ba5a9a5eb6082548e21";

    fn coin(amount: &str, denom: &str) -> Coin {
        Coin {
            amount: amount.to_string(),
            denom: denom.to_string(),
        }
    }

    #[test]
    fn block_fields_are_parsed_from_header() {
        let time = Utc.with_ymd_and_hms(2022, 3, 1, 10, 0, 0).unwrap();
        let chain_block = ChainBlock {
            block_id: BlockId {
                hash: "ABC".to_string(),
            },
            block: BlockBody {
                header: BlockHeader {
                    height: "30363".to_string(),
                    time,
                    num_txs: "12".to_string(),
                    total_txs: "5000".to_string(),
                    proposer_address: ADDRESS.to_string(),
                },
            },
        };

        let block = normalize_block(30363, &chain_block).unwrap();

        assert_eq!(block.hash, "ABC");
        assert_eq!(block.height, 30363);
        assert_eq!(block.time, time);
        assert_eq!(block.tx_count, 12);
        assert_eq!(block.tx_total, 5000);
        assert_eq!(block.took, Duration::zero());
    }

    #[test]
    fn block_without_hash_is_rejected() {
        let err = normalize_block(7, &ChainBlock::default()).unwrap_err();

        assert!(matches!(err, AppError::BlockHasNoHash { height: 7 }));
    }

    #[test]
    fn account_takes_height_from_caller() {
        let chain_account = ChainAccount {
            address: ADDRESS.to_string(),
            coins: vec![coin("212121", "upokt")],
        };

        let account = normalize_account(21, &chain_account);

        assert_eq!(account.height, 21);
        assert_eq!(account.balance, BigInt::from(212121));
        assert_eq!(account.balance_denomination, "upokt");
    }

    #[test]
    fn account_with_several_coins_has_no_balance() {
        let chain_account = ChainAccount {
            address: ADDRESS.to_string(),
            coins: vec![coin("1", "upokt"), coin("2", "other")],
        };

        let account = normalize_account(21, &chain_account);

        assert_eq!(account.balance, BigInt::default());
        assert_eq!(account.balance_denomination, "");
    }

    #[test]
    fn corrupt_token_amounts_become_zero() {
        let app = normalize_app(
            5,
            &ChainApp {
                address: ADDRESS.to_string(),
                jailed: true,
                public_key: "pk".to_string(),
                staked_tokens: "lots".to_string(),
            },
        );
        let node = normalize_node(
            5,
            &ChainNode {
                address: ADDRESS.to_string(),
                jailed: false,
                public_key: "pk".to_string(),
                service_url: "https://node.example:443".to_string(),
                tokens: "99999999999999999999999".to_string(),
            },
        );

        assert!(app.jailed);
        assert_eq!(app.staked_tokens, BigInt::default());
        assert_eq!(node.tokens.to_string(), "99999999999999999999999");
        assert_eq!(node.service_url, "https://node.example:443");
    }

    #[test]
    fn transaction_merges_envelope_and_message() {
        let chain_tx = ChainTransaction {
            hash: "AF5B".to_string(),
            height: 30363,
            index: 4,
            tx: "c2lnbmVk".to_string(),
            std_tx: StdTx {
                entropy: 3223323,
                fee: vec![Fee {
                    amount: "10000".to_string(),
                    denom: "upokt".to_string(),
                }],
                msg: TxMsg {
                    msg_type: "apps/MsgAppStake".to_string(),
                    value: serde_json::json!({"chains": ["0021"]})
                        .as_object()
                        .cloned()
                        .unwrap(),
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let tx = normalize_transaction(&chain_tx).unwrap();

        assert_eq!(tx.hash, "AF5B");
        assert_eq!(tx.height, 30363);
        assert_eq!(tx.index, 4);
        assert_eq!(tx.entropy, 3223323);
        assert_eq!(tx.blockchains, vec!["0021".to_string()]);
        assert_eq!(tx.message_type, "apps/MsgAppStake");
        assert_eq!(tx.from_address, "");
        assert_eq!(tx.std_tx, chain_tx.std_tx);
    }
}
