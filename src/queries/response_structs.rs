use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A New Relic account visible to the current credential.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub name: String,
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "account {} ({})", self.id, self.name)
    }
}

/// NRQL results for one account.
#[derive(Serialize, Debug, Clone)]
pub struct AccountNrqlResult {
    pub account_id: i64,
    pub results: Vec<Value>,
}

// Envelopes mirroring the nesting of NerdGraph responses.

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ActorEnvelope<T> {
    pub(crate) actor: T,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct AccountsActor {
    pub(crate) accounts: Vec<Account>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct AccountActor {
    pub(crate) account: NrqlContainer,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct NrqlContainer {
    pub(crate) nrql: NrqlResults,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct NrqlResults {
    pub(crate) results: Vec<Value>,
}
