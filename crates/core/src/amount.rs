//! Amount - Integer amounts in the smallest on-chain unit
//!
//! Payout amounts are always expressed in the smallest unit of the asset
//! (wei for ETH). Human-readable values ("0.1 ETH") are converted with
//! `from_units`, which refuses anything that would lose precision.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimals used by ETH and every EVM native asset we pay out in
pub const NATIVE_DECIMALS: u32 = 18;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount {value} has more than {decimals} decimal places")]
    TooPrecise { value: Decimal, decimals: u32 },

    #[error("Amount overflow: {0}")]
    Overflow(String),

    #[error("Invalid amount: {0}")]
    Parse(String),
}

/// An amount in the smallest unit of an asset.
///
/// # Example
/// ```
/// use zenopay_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::from_ether(Decimal::new(1, 1)).unwrap(); // 0.1 ETH
/// assert_eq!(amount.value(), 100_000_000_000_000_000);
///
/// // Sub-wei precision is rejected
/// let dust = Amount::from_units(Decimal::new(1, 19), 18);
/// assert!(dust.is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(0);

    /// Create an amount from a raw smallest-unit value
    #[inline]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Convert a human-readable value with `decimals` places into the smallest unit
    pub fn from_units(value: Decimal, decimals: u32) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::NegativeAmount(value));
        }

        let factor = 10i128
            .checked_pow(decimals)
            .and_then(|f| Decimal::try_from_i128_with_scale(f, 0).ok())
            .ok_or_else(|| AmountError::Overflow(format!("10^{}", decimals)))?;

        let raw = value
            .checked_mul(factor)
            .ok_or_else(|| AmountError::Overflow(value.to_string()))?;

        if !raw.fract().is_zero() {
            return Err(AmountError::TooPrecise { value, decimals });
        }

        raw.to_u128()
            .map(Self)
            .ok_or_else(|| AmountError::Overflow(value.to_string()))
    }

    /// Convert an ETH value into wei
    pub fn from_ether(value: Decimal) -> Result<Self, AmountError> {
        Self::from_units(value, NATIVE_DECIMALS)
    }

    /// Express the amount in human units, if it fits in a `Decimal`
    pub fn to_units(&self, decimals: u32) -> Option<Decimal> {
        let raw = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(raw, decimals)
            .ok()
            .map(|d| d.normalize())
    }

    /// Get the raw smallest-unit value
    #[inline]
    pub const fn value(&self) -> u128 {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Returns None if the result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Big-endian 32-byte encoding, the width of a `uint256` word
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&self.0.to_be_bytes());
        word
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|e| AmountError::Parse(format!("{}: {}", s, e)))
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0.to_string()
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}
