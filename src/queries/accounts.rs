//! Account listing queries.

use tracing::debug;

use super::response_structs::{Account, AccountsActor, ActorEnvelope};
use crate::{client::QueryRunner, prelude::*, Error};

const ACCOUNTS_QUERY: &str = "{ actor { accounts { id name } } }";

/// Get all accounts accessible with the current credential.
pub async fn list_accounts<R: QueryRunner + ?Sized>(runner: &R) -> Result<Vec<Account>> {
    let data = runner.run_query(ACCOUNTS_QUERY, None).await?;
    let envelope: ActorEnvelope<AccountsActor> =
        serde_json::from_value(data).map_err(|e| Error::JsonParse(e.to_string()))?;
    debug!(count = envelope.actor.accounts.len(), "Fetched account list");
    Ok(envelope.actor.accounts)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;

    struct MockRunner;

    #[async_trait]
    impl QueryRunner for MockRunner {
        async fn run_query(&self, _query: &str, _variables: Option<Value>) -> Result<Value> {
            Ok(json!({
                "actor": {
                    "accounts": [
                        {"id": 1, "name": "Production"},
                        {"id": 2, "name": "Staging"}
                    ]
                }
            }))
        }
    }

    #[tokio::test]
    async fn test_list_accounts_parses_envelope() {
        let accounts = list_accounts(&MockRunner).await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, 1);
        assert_eq!(accounts[0].name, "Production");
        assert_eq!(accounts[1].to_string(), "account 2 (Staging)");
    }

    struct BrokenRunner;

    #[async_trait]
    impl QueryRunner for BrokenRunner {
        async fn run_query(&self, _query: &str, _variables: Option<Value>) -> Result<Value> {
            Ok(json!({"actor": {}}))
        }
    }

    #[tokio::test]
    async fn test_list_accounts_surfaces_shape_mismatch() {
        let err = list_accounts(&BrokenRunner).await.unwrap_err();
        assert!(matches!(err, Error::JsonParse(_)));
    }
}
