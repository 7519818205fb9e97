use sqlx::FromRow;

use super::{height_condition, PostgresStore};
use crate::{
    application::AppResult,
    domain::{address::validate_address, message::parse_big_int, App, Paging},
};

const INSERT_APPS: &str = r#"
    INSERT INTO apps (address, height, jailed, public_key, staked_tokens)
    SELECT * FROM UNNEST($1::text[], $2::bigint[], $3::boolean[], $4::text[], $5::numeric[])
    ON CONFLICT (height, address) DO NOTHING"#;

const APP_COLUMNS: &str =
    "address, height, jailed, public_key, staked_tokens::text AS staked_tokens";

const SELECT_APP_BY_ADDRESS: &str = r#"
    SELECT address, height, jailed, public_key, staked_tokens::text AS staked_tokens
    FROM apps
    WHERE address = $1 AND height = COALESCE($2, (SELECT MAX(height) FROM apps))
    ORDER BY id DESC
    LIMIT 1"#;

const COUNT_APPS: &str = r#"
    SELECT COUNT(*) FROM apps
    WHERE height = COALESCE($1, (SELECT MAX(height) FROM apps))"#;

#[derive(Debug, FromRow)]
struct DbApp {
    address: String,
    height: i64,
    jailed: bool,
    public_key: String,
    staked_tokens: String,
}

impl From<DbApp> for App {
    fn from(row: DbApp) -> Self {
        App {
            address: row.address,
            height: row.height,
            jailed: row.jailed,
            public_key: row.public_key,
            staked_tokens: parse_big_int(&row.staked_tokens),
        }
    }
}

impl PostgresStore {
    pub async fn write_apps(&self, apps: &[App]) -> AppResult<()> {
        if apps.is_empty() {
            return Ok(());
        }

        let mut addresses = Vec::with_capacity(apps.len());
        let mut heights = Vec::with_capacity(apps.len());
        let mut jailed = Vec::with_capacity(apps.len());
        let mut public_keys = Vec::with_capacity(apps.len());
        let mut staked_tokens = Vec::with_capacity(apps.len());

        for app in apps {
            addresses.push(app.address.clone());
            heights.push(app.height);
            jailed.push(app.jailed);
            public_keys.push(app.public_key.clone());
            staked_tokens.push(app.staked_tokens.to_string());
        }

        sqlx::query(INSERT_APPS)
            .bind(addresses)
            .bind(heights)
            .bind(jailed)
            .bind(public_keys)
            .bind(staked_tokens)
            .execute(&self.pool)
            .await?;

        tracing::debug!(count = apps.len(), "Saved apps");
        Ok(())
    }

    pub async fn read_apps(&self, height: Option<i64>, paging: Paging) -> AppResult<Vec<App>> {
        let query = format!(
            "SELECT {APP_COLUMNS} FROM apps WHERE {} ORDER BY address, id",
            height_condition("apps", height)
        );

        let rows: Vec<DbApp> = self.read_page("apps_cursor", &query, paging).await?;
        Ok(rows.into_iter().map(App::from).collect())
    }

    pub async fn read_app_by_address(&self, address: &str, height: Option<i64>) -> AppResult<App> {
        validate_address(address)?;

        let row: DbApp = sqlx::query_as(SELECT_APP_BY_ADDRESS)
            .bind(address)
            .bind(height)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    pub async fn get_apps_quantity(&self, height: Option<i64>) -> AppResult<i64> {
        let quantity = sqlx::query_scalar(COUNT_APPS)
            .bind(height)
            .fetch_one(&self.pool)
            .await?;

        Ok(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sinks::postgres::tests::unconnected_store;
    use crate::application::AppError;

    #[tokio::test]
    async fn non_hex_address_is_rejected() {
        let store = unconnected_store();

        let err = store
            .read_app_by_address("zz353abd21ef72725b295ba5a9a5eb6082548e21", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidAddress(_)));
    }

    #[test]
    fn unparsable_stake_reads_as_zero() {
        let app = App::from(DbApp {
            address: "00353abd21ef72725b295ba5a9a5eb6082548e21".to_string(),
            height: 4,
            jailed: false,
            public_key: "pk".to_string(),
            staked_tokens: "NaN".to_string(),
        });

        assert_eq!(app.staked_tokens, num_bigint::BigInt::default());
    }
}
