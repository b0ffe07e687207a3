// =============================================================================
// Shared types used across the series engine
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// Price component an indicator reads from each candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Price {
    Open,
    High,
    Low,
    Close,
}

impl Default for Price {
    fn default() -> Self {
        Self::Close
    }
}

impl Price {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Price {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "close" => Ok(Self::Close),
            other => Err(SeriesError::InvalidParameter(format!(
                "unrecognized price field {other:?}"
            ))),
        }
    }
}

/// Which way a crossing is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Over,
    Under,
}

impl Default for Direction {
    fn default() -> Self {
        Self::Over
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Over => write!(f, "over"),
            Self::Under => write!(f, "under"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_parses_known_fields() {
        assert_eq!("open".parse::<Price>().unwrap(), Price::Open);
        assert_eq!("close".parse::<Price>().unwrap(), Price::Close);
        assert_eq!(Price::High.to_string(), "high");
    }

    #[test]
    fn price_rejects_unknown_field() {
        let err = "volume".parse::<Price>().unwrap_err();
        assert!(matches!(err, SeriesError::InvalidParameter(_)));
    }

    #[test]
    fn price_deserialises_lowercase() {
        let p: Price = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(p, Price::Low);
    }
}
