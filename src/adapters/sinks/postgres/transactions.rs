use sqlx::FromRow;

use super::{
    codec::{decode_payload, encode_payload},
    height_condition, PostgresStore,
};
use crate::{
    application::{AppError, AppResult},
    domain::{address::validate_address, message::parse_big_int, Order, Paging, Transaction},
};

const INSERT_TRANSACTIONS: &str = r#"
    INSERT INTO transactions (
        hash, from_address, to_address, app_pub_key, blockchains, message_type,
        height, index, stdtx, tx_result, tx, entropy, fee, fee_denomination, amount
    )
    SELECT * FROM UNNEST(
        $1::text[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[],
        $7::bigint[], $8::integer[], $9::jsonb[], $10::jsonb[], $11::text[],
        $12::bigint[], $13::bigint[], $14::text[], $15::numeric[]
    )
    ON CONFLICT (hash) DO NOTHING"#;

const TRANSACTION_COLUMNS: &str = "hash, from_address, to_address, app_pub_key, blockchains, \
     message_type, height, index, stdtx::text AS stdtx, tx_result::text AS tx_result, tx, \
     entropy, fee, fee_denomination, amount::text AS amount";

const CHAINS_SEPARATOR: char = ',';

#[derive(Debug, FromRow)]
struct DbTransaction {
    hash: String,
    from_address: Option<String>,
    to_address: Option<String>,
    app_pub_key: String,
    blockchains: String,
    message_type: String,
    height: i64,
    index: i32,
    stdtx: String,
    tx_result: String,
    tx: String,
    entropy: i64,
    fee: i64,
    fee_denomination: String,
    amount: String,
}

impl TryFrom<DbTransaction> for Transaction {
    type Error = AppError;

    fn try_from(row: DbTransaction) -> AppResult<Self> {
        Ok(Transaction {
            std_tx: decode_payload("stdtx", &row.stdtx)?,
            tx_result: decode_payload("tx_result", &row.tx_result)?,
            hash: row.hash,
            from_address: row.from_address.unwrap_or_default(),
            to_address: row.to_address.unwrap_or_default(),
            app_pub_key: row.app_pub_key,
            blockchains: split_chains(&row.blockchains),
            message_type: row.message_type,
            height: row.height,
            index: row.index,
            tx: row.tx,
            entropy: row.entropy,
            fee: row.fee,
            fee_denomination: row.fee_denomination,
            amount: parse_big_int(&row.amount),
        })
    }
}

fn join_chains(chains: &[String]) -> String {
    chains.join(&CHAINS_SEPARATOR.to_string())
}

fn split_chains(column: &str) -> Vec<String> {
    if column.is_empty() {
        return Vec::new();
    }
    column.split(CHAINS_SEPARATOR).map(str::to_string).collect()
}

fn nullable(address: &str) -> Option<String> {
    (!address.is_empty()).then(|| address.to_string())
}

fn into_transactions(rows: Vec<DbTransaction>) -> AppResult<Vec<Transaction>> {
    rows.into_iter().map(Transaction::try_from).collect()
}

impl PostgresStore {
    pub async fn write_transactions(&self, txs: &[Transaction]) -> AppResult<()> {
        if txs.is_empty() {
            return Ok(());
        }

        let mut hashes = Vec::with_capacity(txs.len());
        let mut from_addresses = Vec::with_capacity(txs.len());
        let mut to_addresses = Vec::with_capacity(txs.len());
        let mut app_pub_keys = Vec::with_capacity(txs.len());
        let mut blockchains = Vec::with_capacity(txs.len());
        let mut message_types = Vec::with_capacity(txs.len());
        let mut heights = Vec::with_capacity(txs.len());
        let mut indexes = Vec::with_capacity(txs.len());
        let mut std_txs = Vec::with_capacity(txs.len());
        let mut tx_results = Vec::with_capacity(txs.len());
        let mut raw_txs = Vec::with_capacity(txs.len());
        let mut entropies = Vec::with_capacity(txs.len());
        let mut fees = Vec::with_capacity(txs.len());
        let mut fee_denominations = Vec::with_capacity(txs.len());
        let mut amounts = Vec::with_capacity(txs.len());

        for tx in txs {
            hashes.push(tx.hash.clone());
            from_addresses.push(nullable(&tx.from_address));
            to_addresses.push(nullable(&tx.to_address));
            app_pub_keys.push(tx.app_pub_key.clone());
            blockchains.push(join_chains(&tx.blockchains));
            message_types.push(tx.message_type.clone());
            heights.push(tx.height);
            indexes.push(tx.index);
            std_txs.push(encode_payload(&tx.std_tx)?);
            tx_results.push(encode_payload(&tx.tx_result)?);
            raw_txs.push(tx.tx.clone());
            entropies.push(tx.entropy);
            fees.push(tx.fee);
            fee_denominations.push(tx.fee_denomination.clone());
            amounts.push(tx.amount.to_string());
        }

        sqlx::query(INSERT_TRANSACTIONS)
            .bind(hashes)
            .bind(from_addresses)
            .bind(to_addresses)
            .bind(app_pub_keys)
            .bind(blockchains)
            .bind(message_types)
            .bind(heights)
            .bind(indexes)
            .bind(std_txs)
            .bind(tx_results)
            .bind(raw_txs)
            .bind(entropies)
            .bind(fees)
            .bind(fee_denominations)
            .bind(amounts)
            .execute(&self.pool)
            .await?;

        tracing::debug!(count = txs.len(), "Saved transactions");
        Ok(())
    }

    pub async fn read_transactions(
        &self,
        order: Order,
        paging: Paging,
    ) -> AppResult<Vec<Transaction>> {
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY height {order}, index {order}",
            order = order.as_sql()
        );

        let rows: Vec<DbTransaction> =
            self.read_page("transactions_cursor", &query, paging).await?;
        into_transactions(rows)
    }

    /// Transactions of one block in block order; latest stored height when `None`.
    pub async fn read_transactions_by_height(
        &self,
        height: Option<i64>,
        paging: Paging,
    ) -> AppResult<Vec<Transaction>> {
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE {} ORDER BY index",
            height_condition("transactions", height)
        );

        let rows: Vec<DbTransaction> =
            self.read_page("transactions_cursor", &query, paging).await?;
        into_transactions(rows)
    }

    /// Transactions sent or received by `address`, newest first.
    pub async fn read_transactions_by_address(
        &self,
        address: &str,
        paging: Paging,
    ) -> AppResult<Vec<Transaction>> {
        validate_address(address)?;

        // The address is plain hex at this point.
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE from_address = '{address}' OR to_address = '{address}' \
             ORDER BY height DESC, index DESC"
        );

        let rows: Vec<DbTransaction> =
            self.read_page("transactions_cursor", &query, paging).await?;
        into_transactions(rows)
    }

    pub async fn read_transaction_by_hash(&self, hash: &str) -> AppResult<Transaction> {
        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE hash = $1"
        );

        let row: DbTransaction = sqlx::query_as(&query)
            .bind(hash)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    pub async fn get_transactions_quantity(&self) -> AppResult<i64> {
        let quantity = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(quantity)
    }

    pub async fn get_transactions_quantity_by_height(
        &self,
        height: Option<i64>,
    ) -> AppResult<i64> {
        let quantity = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions \
             WHERE height = COALESCE($1, (SELECT MAX(height) FROM transactions))",
        )
        .bind(height)
        .fetch_one(&self.pool)
        .await?;

        Ok(quantity)
    }

    pub async fn get_transactions_quantity_by_address(&self, address: &str) -> AppResult<i64> {
        validate_address(address)?;

        let quantity = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE from_address = $1 OR to_address = $1",
        )
        .bind(address)
        .fetch_one(&self.pool)
        .await?;

        Ok(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sinks::postgres::tests::unconnected_store;

    fn stored_row() -> DbTransaction {
        DbTransaction {
            hash: "ABCD".to_string(),
            from_address: Some("00353abd21ef72725b295ba5a9a5eb6082548e21".to_string()),
            to_address: None,
            app_pub_key: String::new(),
            blockchains: "0001,0021".to_string(),
            message_type: "stake_validator".to_string(),
            height: 21,
            index: 3,
            stdtx: r#"{"entropy": 7, "fee": [{"amount": "10000", "denom": "upokt"}]}"#.to_string(),
            tx_result: r#"{"code": 0, "message_type": "stake_validator"}"#.to_string(),
            tx: "raw".to_string(),
            entropy: 7,
            fee: 10000,
            fee_denomination: "upokt".to_string(),
            amount: "0".to_string(),
        }
    }

    #[test]
    fn chains_column_round_trip() {
        let chains = vec!["0001".to_string(), "0021".to_string()];

        assert_eq!(join_chains(&chains), "0001,0021");
        assert_eq!(split_chains("0001,0021"), chains);
        assert!(split_chains("").is_empty());
    }

    #[test]
    fn empty_addresses_are_stored_as_null() {
        assert_eq!(nullable(""), None);
        assert_eq!(nullable("abc"), Some("abc".to_string()));
    }

    #[test]
    fn stored_row_decodes_payloads() {
        let tx = Transaction::try_from(stored_row()).unwrap();

        assert_eq!(tx.std_tx.entropy, 7);
        assert_eq!(tx.std_tx.fee[0].denom, "upokt");
        assert_eq!(tx.tx_result.message_type, "stake_validator");
        assert_eq!(tx.to_address, "");
        assert_eq!(tx.blockchains.len(), 2);
    }

    #[test]
    fn corrupt_payload_is_a_decode_error() {
        let mut row = stored_row();
        row.tx_result = "[1, 2".to_string();

        let err = Transaction::try_from(row).unwrap_err();

        assert!(matches!(
            err,
            AppError::PayloadDecode {
                column: "tx_result",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn address_listing_validates_first() {
        let store = unconnected_store();

        let err = store
            .read_transactions_by_address("'; DROP TABLE transactions; --", Paging::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAddress(_)));

        let err = store
            .get_transactions_quantity_by_address("not-hex")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAddress(_)));
    }
}
