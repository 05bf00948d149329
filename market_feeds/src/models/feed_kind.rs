//! The resource type discriminator, as a closed set of supported feeds.

use serde::{Deserialize, Serialize};

/// Which fetch-and-normalize routine a registry resource needs.
///
/// The registry stores this as an integer `type_id`. Ids without a variant are
/// not an error: [`FeedKind::from_type_id`] returns `None` and the resource is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Scalar macroeconomic series (GDP, CPI, ...). `type_id = 1`.
    EconomicSeries,
    /// Technical indicator computed per currency pair. `type_id = 2`.
    TechnicalIndicator,
    /// Commodity price series (e.g. WTI). `type_id = 4`.
    Commodity,
    /// Intraday FX bars per currency pair. `type_id = 5`.
    FxIntraday,
    /// Daily FX bars per currency pair. `type_id = 6`.
    FxDaily,
}

impl FeedKind {
    /// Map a registry discriminator to a kind.
    pub fn from_type_id(type_id: i32) -> Option<Self> {
        match type_id {
            1 => Some(Self::EconomicSeries),
            2 => Some(Self::TechnicalIndicator),
            4 => Some(Self::Commodity),
            5 => Some(Self::FxIntraday),
            6 => Some(Self::FxDaily),
            _ => None,
        }
    }

    /// The registry discriminator for this kind.
    pub fn type_id(self) -> i32 {
        match self {
            Self::EconomicSeries => 1,
            Self::TechnicalIndicator => 2,
            Self::Commodity => 4,
            Self::FxIntraday => 5,
            Self::FxDaily => 6,
        }
    }

    /// Whether the feed is fetched once per currency pair rather than once globally.
    pub fn per_pair(self) -> bool {
        matches!(
            self,
            Self::TechnicalIndicator | Self::FxIntraday | Self::FxDaily
        )
    }
}
