use crate::error::{AppResult, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The three fields of a subscription record the calendar flow consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub name: String,
    /// Pre-formatted display price
    pub price: String,
    #[serde(alias = "renewalDate")]
    pub renewal_date: String,
}

impl Subscription {
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        renewal_date: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            renewal_date: renewal_date.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubscriptionFile {
    #[serde(default)]
    subscriptions: Vec<Subscription>,
}

/// Read subscriptions from a TOML file (`[[subscriptions]]` tables) or a
/// JSON array as exported by the subscription API
pub fn load_subscriptions(path: &Path) -> AppResult<Vec<Subscription>> {
    let content = std::fs::read_to_string(path)?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("toml") | None => Ok(toml::from_str::<SubscriptionFile>(&content)?.subscriptions),
        Some(other) => Err(Error::Other(format!(
            "Unsupported subscription file type '.{}'",
            other
        ))),
    }
}
