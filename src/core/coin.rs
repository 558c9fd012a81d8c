//! Coin identifier model

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a tracked asset as understood by the quote service (e.g., "bitcoin")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinId(String);

impl CoinId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-friendly name derived from the identifier ("shiba-inu" -> "Shiba Inu")
    pub fn display_name(&self) -> String {
        self.0
            .split('-')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CoinId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CoinId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Join identifiers the way the quote service expects them in a query string
pub fn join_ids(coins: &[CoinId]) -> String {
    coins
        .iter()
        .map(CoinId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
