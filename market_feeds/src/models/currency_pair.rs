use serde::{Deserialize, Serialize};

/// A (base, quote) symbol pair used to parameterize per-pair calls.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency code, e.g. "USD".
    pub base: String,
    /// Quote currency code, e.g. "EUR".
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Concatenated vendor symbol, e.g. "USDEUR".
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Slash-separated form stored in indicator tables, e.g. "USD/EUR".
    pub fn display(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}
