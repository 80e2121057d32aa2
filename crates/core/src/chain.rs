//! ChainId - Type-safe destination chain identifiers
//!
//! Well-known chains get their own variant; anything else keeps its numeric
//! EIP-155 id in `Other`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Empty chain identifier")]
    Empty,

    #[error("Unknown chain: {0}")]
    Unknown(String),

    #[error("Chain id 0 is reserved")]
    ZeroId,
}

/// Destination chain for a payout
///
/// # Examples
/// ```
/// use zenopay_core::ChainId;
///
/// let bnb: ChainId = "BNB Chain".parse().unwrap();
/// assert_eq!(bnb, ChainId::Bnb);
/// assert_eq!(bnb.id(), 56);
///
/// let custom: ChainId = "2".parse().unwrap();
/// assert_eq!(custom, ChainId::Other(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum ChainId {
    /// Ethereum mainnet
    Ethereum,
    /// Optimism
    Optimism,
    /// BNB Smart Chain
    Bnb,
    /// Polygon PoS
    Polygon,
    /// Base
    Base,
    /// Arbitrum One
    Arbitrum,
    /// Sepolia testnet
    Sepolia,
    /// Any other EVM chain id
    Other(u64),
}

impl ChainId {
    /// Numeric EIP-155 chain id
    pub fn id(&self) -> u64 {
        match self {
            ChainId::Ethereum => 1,
            ChainId::Optimism => 10,
            ChainId::Bnb => 56,
            ChainId::Polygon => 137,
            ChainId::Base => 8453,
            ChainId::Arbitrum => 42161,
            ChainId::Sepolia => 11_155_111,
            ChainId::Other(id) => *id,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> String {
        match self {
            ChainId::Ethereum => "Ethereum".to_string(),
            ChainId::Optimism => "Optimism".to_string(),
            ChainId::Bnb => "BNB Chain".to_string(),
            ChainId::Polygon => "Polygon".to_string(),
            ChainId::Base => "Base".to_string(),
            ChainId::Arbitrum => "Arbitrum".to_string(),
            ChainId::Sepolia => "Sepolia".to_string(),
            ChainId::Other(id) => format!("chain-{}", id),
        }
    }

    /// Native asset symbol, when known
    pub fn native_symbol(&self) -> Option<&'static str> {
        match self {
            ChainId::Ethereum
            | ChainId::Optimism
            | ChainId::Base
            | ChainId::Arbitrum
            | ChainId::Sepolia => Some("ETH"),
            ChainId::Bnb => Some("BNB"),
            ChainId::Polygon => Some("MATIC"),
            ChainId::Other(_) => None,
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(self, ChainId::Sepolia)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

impl TryFrom<u64> for ChainId {
    type Error = ChainError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Ok(match id {
            0 => return Err(ChainError::ZeroId),
            1 => ChainId::Ethereum,
            10 => ChainId::Optimism,
            56 => ChainId::Bnb,
            137 => ChainId::Polygon,
            8453 => ChainId::Base,
            42161 => ChainId::Arbitrum,
            11_155_111 => ChainId::Sepolia,
            other => ChainId::Other(other),
        })
    }
}

impl From<ChainId> for u64 {
    fn from(chain: ChainId) -> Self {
        chain.id()
    }
}

impl FromStr for ChainId {
    type Err = ChainError;

    /// Accepts numeric ids and common spoken names ("bnb chain", "eth", "matic")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ChainError::Empty);
        }

        if let Ok(id) = normalized.parse::<u64>() {
            return ChainId::try_from(id);
        }

        let compact: String = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(match compact.as_str() {
            "ethereum" | "eth" | "mainnet" | "ethereum mainnet" => ChainId::Ethereum,
            "optimism" | "op" => ChainId::Optimism,
            "bnb" | "bnb chain" | "bsc" | "binance" | "binance smart chain" => ChainId::Bnb,
            "polygon" | "matic" => ChainId::Polygon,
            "base" => ChainId::Base,
            "arbitrum" | "arbitrum one" | "arb" => ChainId::Arbitrum,
            "sepolia" => ChainId::Sepolia,
            _ => return Err(ChainError::Unknown(s.trim().to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("Ethereum".parse::<ChainId>().unwrap(), ChainId::Ethereum);
        assert_eq!("bnb  chain".parse::<ChainId>().unwrap(), ChainId::Bnb);
        assert_eq!("MATIC".parse::<ChainId>().unwrap(), ChainId::Polygon);
    }

    #[test]
    fn test_parse_numeric_maps_known_ids() {
        assert_eq!("1".parse::<ChainId>().unwrap(), ChainId::Ethereum);
        assert_eq!("42161".parse::<ChainId>().unwrap(), ChainId::Arbitrum);
        assert_eq!("2".parse::<ChainId>().unwrap(), ChainId::Other(2));
    }

    #[test]
    fn test_zero_and_unknown_rejected() {
        assert!(matches!("0".parse::<ChainId>(), Err(ChainError::ZeroId)));
        assert!(matches!("narnia".parse::<ChainId>(), Err(ChainError::Unknown(_))));
        assert!(matches!("  ".parse::<ChainId>(), Err(ChainError::Empty)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ChainId::Bnb).unwrap();
        assert_eq!(json, "56");
        let parsed: ChainId = serde_json::from_str("137").unwrap();
        assert_eq!(parsed, ChainId::Polygon);
    }

    #[test]
    fn test_native_symbol() {
        assert_eq!(ChainId::Base.native_symbol(), Some("ETH"));
        assert_eq!(ChainId::Bnb.native_symbol(), Some("BNB"));
        assert_eq!(ChainId::Other(99).native_symbol(), None);
    }
}
