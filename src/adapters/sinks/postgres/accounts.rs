use sqlx::FromRow;

use super::{height_condition, PostgresStore};
use crate::{
    application::AppResult,
    domain::{address::validate_address, message::parse_big_int, Account, Paging},
};

const INSERT_ACCOUNTS: &str = r#"
    INSERT INTO accounts (address, height, balance, balance_denomination)
    SELECT * FROM UNNEST($1::text[], $2::bigint[], $3::numeric[], $4::text[])
    ON CONFLICT (height, address) DO NOTHING"#;

const ACCOUNT_COLUMNS: &str = "address, height, balance::text AS balance, balance_denomination";

const SELECT_ACCOUNT_BY_ADDRESS: &str = r#"
    SELECT address, height, balance::text AS balance, balance_denomination
    FROM accounts
    WHERE address = $1 AND height = COALESCE($2, (SELECT MAX(height) FROM accounts))
    ORDER BY id DESC
    LIMIT 1"#;

const COUNT_ACCOUNTS: &str = r#"
    SELECT COUNT(*) FROM accounts
    WHERE height = COALESCE($1, (SELECT MAX(height) FROM accounts))"#;

#[derive(Debug, FromRow)]
struct DbAccount {
    address: String,
    height: i64,
    balance: String,
    balance_denomination: String,
}

impl From<DbAccount> for Account {
    fn from(row: DbAccount) -> Self {
        Account {
            address: row.address,
            height: row.height,
            balance: parse_big_int(&row.balance),
            balance_denomination: row.balance_denomination,
        }
    }
}

impl PostgresStore {
    pub async fn write_accounts(&self, accounts: &[Account]) -> AppResult<()> {
        if accounts.is_empty() {
            return Ok(());
        }

        let mut addresses = Vec::with_capacity(accounts.len());
        let mut heights = Vec::with_capacity(accounts.len());
        let mut balances = Vec::with_capacity(accounts.len());
        let mut denominations = Vec::with_capacity(accounts.len());

        for account in accounts {
            addresses.push(account.address.clone());
            heights.push(account.height);
            balances.push(account.balance.to_string());
            denominations.push(account.balance_denomination.clone());
        }

        sqlx::query(INSERT_ACCOUNTS)
            .bind(addresses)
            .bind(heights)
            .bind(balances)
            .bind(denominations)
            .execute(&self.pool)
            .await?;

        tracing::debug!(count = accounts.len(), "Saved accounts");
        Ok(())
    }

    /// Accounts at `height` (latest when `None`), ordered by address.
    pub async fn read_accounts(
        &self,
        height: Option<i64>,
        paging: Paging,
    ) -> AppResult<Vec<Account>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {} ORDER BY address, id",
            height_condition("accounts", height)
        );

        let rows: Vec<DbAccount> = self.read_page("accounts_cursor", &query, paging).await?;
        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn read_account_by_address(
        &self,
        address: &str,
        height: Option<i64>,
    ) -> AppResult<Account> {
        validate_address(address)?;

        let row: DbAccount = sqlx::query_as(SELECT_ACCOUNT_BY_ADDRESS)
            .bind(address)
            .bind(height)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    pub async fn get_accounts_quantity(&self, height: Option<i64>) -> AppResult<i64> {
        let quantity = sqlx::query_scalar(COUNT_ACCOUNTS)
            .bind(height)
            .fetch_one(&self.pool)
            .await?;

        Ok(quantity)
    }
}
