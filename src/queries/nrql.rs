//! NRQL queries, single-account and fanned out across many accounts.

use std::sync::Arc;

use serde_json::json;

use super::accounts::list_accounts;
use super::response_structs::{Account, AccountActor, AccountNrqlResult, ActorEnvelope};
use crate::{
    batch::{BatchExecutor, BatchOutcome},
    client::QueryRunner,
    prelude::*,
    Error,
};

/// Default server-side NRQL timeout in seconds.
pub const DEFAULT_NRQL_TIMEOUT_SECS: u32 = 90;

const NRQL_QUERY: &str = "\
query ($accountId: Int!, $nrql: Nrql!, $timeout: Seconds) {
  actor {
    account(id: $accountId) {
      nrql(query: $nrql, timeout: $timeout) {
        results
      }
    }
  }
}";

/// Run an NRQL query for a single account.
pub async fn run_account_query<R: QueryRunner + ?Sized>(
    runner: &R,
    account_id: i64,
    nrql: &str,
    timeout: u32,
) -> Result<AccountNrqlResult> {
    let variables = json!({ "accountId": account_id, "nrql": nrql, "timeout": timeout });
    let data = runner.run_query(NRQL_QUERY, Some(variables)).await?;
    let envelope: ActorEnvelope<AccountActor> =
        serde_json::from_value(data).map_err(|e| Error::JsonParse(e.to_string()))?;
    Ok(AccountNrqlResult {
        account_id,
        results: envelope.actor.account.nrql.results,
    })
}

/// Run an NRQL query across many accounts concurrently.
///
/// When `accounts` is `None` the full account list is fetched first. One
/// outcome is returned per account, aligned with the account order; a
/// failing account never aborts the others.
pub async fn run_across_accounts<R>(
    runner: Arc<R>,
    executor: &BatchExecutor,
    nrql: &str,
    accounts: Option<Vec<Account>>,
    timeout: u32,
) -> Result<Vec<BatchOutcome<AccountNrqlResult>>>
where
    R: QueryRunner + 'static,
{
    let accounts = match accounts {
        Some(accounts) => accounts,
        None => list_accounts(runner.as_ref()).await?,
    };

    let nrql = nrql.to_string();
    let outcomes = executor
        .run_batch(accounts, move |account: Account| {
            let runner = Arc::clone(&runner);
            let nrql = nrql.clone();
            async move { run_account_query(runner.as_ref(), account.id, &nrql, timeout).await }
        })
        .await;
    Ok(outcomes)
}
