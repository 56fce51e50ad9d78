pub const US_API_URL: &str = "https://api.newrelic.com/graphql";
pub const EU_API_URL: &str = "https://api.eu.newrelic.com/graphql";

/// Header carrying the NerdGraph credential on every request.
pub(crate) const API_KEY_HEADER: &str = "API-Key";

/// Environment variable checked by [`crate::NerdGraphClient::from_env`].
pub const API_KEY_ENV_VAR: &str = "NEW_RELIC_API_KEY";

/// NerdGraph regional endpoint selector.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BaseUrl {
    #[default]
    Us,
    Eu,
}

impl BaseUrl {
    pub fn get_url(&self) -> String {
        match self {
            BaseUrl::Us => US_API_URL.to_string(),
            BaseUrl::Eu => EU_API_URL.to_string(),
        }
    }
}
