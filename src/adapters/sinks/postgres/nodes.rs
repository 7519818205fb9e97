use sqlx::FromRow;

use super::{height_condition, PostgresStore};
use crate::{
    application::AppResult,
    domain::{address::validate_address, message::parse_big_int, Node, Paging},
};

const INSERT_NODES: &str = r#"
    INSERT INTO nodes (address, height, jailed, public_key, service_url, tokens)
    SELECT * FROM UNNEST(
        $1::text[], $2::bigint[], $3::boolean[], $4::text[], $5::text[], $6::numeric[]
    )
    ON CONFLICT (height, address) DO NOTHING"#;

const NODE_COLUMNS: &str =
    "address, height, jailed, public_key, service_url, tokens::text AS tokens";

const SELECT_NODE_BY_ADDRESS: &str = r#"
    SELECT address, height, jailed, public_key, service_url, tokens::text AS tokens
    FROM nodes
    WHERE address = $1 AND height = COALESCE($2, (SELECT MAX(height) FROM nodes))
    ORDER BY id DESC
    LIMIT 1"#;

const COUNT_NODES: &str = r#"
    SELECT COUNT(*) FROM nodes
    WHERE height = COALESCE($1, (SELECT MAX(height) FROM nodes))"#;

#[derive(Debug, FromRow)]
struct DbNode {
    address: String,
    height: i64,
    jailed: bool,
    public_key: String,
    service_url: String,
    tokens: String,
}

impl From<DbNode> for Node {
    fn from(row: DbNode) -> Self {
        Node {
            address: row.address,
            height: row.height,
            jailed: row.jailed,
            public_key: row.public_key,
            service_url: row.service_url,
            tokens: parse_big_int(&row.tokens),
        }
    }
}

impl PostgresStore {
    pub async fn write_nodes(&self, nodes: &[Node]) -> AppResult<()> {
        if nodes.is_empty() {
            return Ok(());
        }

        let mut addresses = Vec::with_capacity(nodes.len());
        let mut heights = Vec::with_capacity(nodes.len());
        let mut jailed = Vec::with_capacity(nodes.len());
        let mut public_keys = Vec::with_capacity(nodes.len());
        let mut service_urls = Vec::with_capacity(nodes.len());
        let mut tokens = Vec::with_capacity(nodes.len());

        for node in nodes {
            addresses.push(node.address.clone());
            heights.push(node.height);
            jailed.push(node.jailed);
            public_keys.push(node.public_key.clone());
            service_urls.push(node.service_url.clone());
            tokens.push(node.tokens.to_string());
        }

        sqlx::query(INSERT_NODES)
            .bind(addresses)
            .bind(heights)
            .bind(jailed)
            .bind(public_keys)
            .bind(service_urls)
            .bind(tokens)
            .execute(&self.pool)
            .await?;

        tracing::debug!(count = nodes.len(), "Saved nodes");
        Ok(())
    }

    pub async fn read_nodes(&self, height: Option<i64>, paging: Paging) -> AppResult<Vec<Node>> {
        let query = format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE {} ORDER BY address, id",
            height_condition("nodes", height)
        );

        let rows: Vec<DbNode> = self.read_page("nodes_cursor", &query, paging).await?;
        Ok(rows.into_iter().map(Node::from).collect())
    }

    pub async fn read_node_by_address(
        &self,
        address: &str,
        height: Option<i64>,
    ) -> AppResult<Node> {
        validate_address(address)?;

        let row: DbNode = sqlx::query_as(SELECT_NODE_BY_ADDRESS)
            .bind(address)
            .bind(height)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    pub async fn get_nodes_quantity(&self, height: Option<i64>) -> AppResult<i64> {
        let quantity = sqlx::query_scalar(COUNT_NODES)
            .bind(height)
            .fetch_one(&self.pool)
            .await?;

        Ok(quantity)
    }
}
