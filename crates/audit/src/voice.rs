//! Voice approval commands
//!
//! Recognises transcripts containing
//! `approve <amount> <token> to <recipient> [on <chain>]`, e.g.
//! "Approve 0.5 ETH to Alice on BNB Chain" or "please approve 2 BNB to bob".
//! Words before the verb are ignored. Keywords are matched
//! case-insensitively; recipient and chain may span several words.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use zenopay_core::{Amount, AmountError, ChainError, ChainId, NATIVE_DECIMALS};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("Not an approval command: {0}")]
    NotACommand(String),

    #[error("Missing {0} in voice command")]
    Missing(&'static str),

    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("Amount cannot be represented: {0}")]
    Amount(#[from] AmountError),

    #[error("Unknown chain: {0}")]
    Chain(#[from] ChainError),
}

/// A parsed `approve ...` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceCommand {
    /// Spoken amount in human units
    pub amount: Decimal,
    /// Token symbol, upper-cased
    pub token: String,
    pub recipient: String,
    /// Spoken chain name, if any
    pub chain: Option<String>,
}

impl VoiceCommand {
    pub fn parse(transcript: &str) -> Result<Self, VoiceError> {
        let words: Vec<&str> = transcript
            .split_whitespace()
            .map(|w| w.trim_end_matches(|c: char| matches!(c, '.' | ',' | '!' | '?')))
            .filter(|w| !w.is_empty())
            .collect();

        let verb = words
            .iter()
            .position(|w| w.eq_ignore_ascii_case("approve"))
            .ok_or_else(|| VoiceError::NotACommand(transcript.trim().to_string()))?;
        let rest = &words[verb + 1..];

        let (amount_word, rest) = rest.split_first().ok_or(VoiceError::Missing("amount"))?;
        let (amount, token_inline) = split_amount(amount_word)?;

        // "0.5eth" carries the token in the same word
        let (token, rest) = match token_inline {
            Some(token) => (token, rest),
            None => {
                let (token, rest) = rest.split_first().ok_or(VoiceError::Missing("token"))?;
                (token.to_string(), rest)
            }
        };
        if token.eq_ignore_ascii_case("to") {
            return Err(VoiceError::Missing("token"));
        }

        let (to, rest) = rest.split_first().ok_or(VoiceError::Missing("recipient"))?;
        if !to.eq_ignore_ascii_case("to") {
            return Err(VoiceError::Missing("'to'"));
        }

        let on = rest.iter().rposition(|w| w.eq_ignore_ascii_case("on"));
        let (recipient, chain) = match on {
            Some(pos) if pos > 0 && pos + 1 < rest.len() => (&rest[..pos], Some(&rest[pos + 1..])),
            _ => (rest, None),
        };

        if recipient.is_empty() {
            return Err(VoiceError::Missing("recipient"));
        }

        Ok(Self {
            amount,
            token: token.to_uppercase(),
            recipient: recipient.join(" "),
            chain: chain.map(|words| words.join(" ")),
        })
    }

    /// Whether the spoken token is the native asset of `chain`.
    ///
    /// Chains without a known symbol accept any token.
    pub fn token_matches(&self, chain: ChainId) -> bool {
        chain
            .native_symbol()
            .map(|symbol| self.token.eq_ignore_ascii_case(symbol))
            .unwrap_or(true)
    }

    /// Spoken amount in the smallest unit (18 decimals)
    pub fn amount_units(&self) -> Result<Amount, VoiceError> {
        Ok(Amount::from_units(self.amount, NATIVE_DECIMALS)?)
    }

    /// Resolve the spoken chain name
    pub fn chain_id(&self) -> Result<Option<ChainId>, VoiceError> {
        self.chain
            .as_deref()
            .map(ChainId::from_str)
            .transpose()
            .map_err(VoiceError::from)
    }
}

/// Split "0.5" or "0.5eth" into the number and an optional glued token
fn split_amount(word: &str) -> Result<(Decimal, Option<String>), VoiceError> {
    let end = word
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(word.len());
    let (number, suffix) = word.split_at(end);

    let amount = Decimal::from_str(number).map_err(|_| VoiceError::InvalidAmount(word.to_string()))?;
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(VoiceError::InvalidAmount(word.to_string()));
    }

    let token = (!suffix.is_empty()).then(|| suffix.to_string());
    Ok((amount, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_full_command() {
        let cmd = VoiceCommand::parse("Approve 0.5 ETH to Alice on BNB Chain").unwrap();

        assert_eq!(cmd.amount, dec!(0.5));
        assert_eq!(cmd.token, "ETH");
        assert_eq!(cmd.recipient, "Alice");
        assert_eq!(cmd.chain.as_deref(), Some("BNB Chain"));
        assert_eq!(cmd.chain_id().unwrap(), Some(ChainId::Bnb));
        assert_eq!(cmd.amount_units().unwrap(), Amount::new(500_000_000_000_000_000));
    }

    #[test]
    fn test_parse_without_chain() {
        let cmd = VoiceCommand::parse("approve 2 usdc to bob smith.").unwrap();

        assert_eq!(cmd.amount, dec!(2));
        assert_eq!(cmd.token, "USDC");
        assert_eq!(cmd.recipient, "bob smith");
        assert_eq!(cmd.chain, None);
        assert_eq!(cmd.chain_id().unwrap(), None);
    }

    #[test]
    fn test_parse_glued_token() {
        let cmd = VoiceCommand::parse("APPROVE 1.25eth TO 0xabc ON polygon").unwrap();
        assert_eq!(cmd.amount, dec!(1.25));
        assert_eq!(cmd.token, "ETH");
        assert_eq!(cmd.recipient, "0xabc");
        assert_eq!(cmd.chain_id().unwrap(), Some(ChainId::Polygon));
    }

    #[test]
    fn test_parse_with_leading_words() {
        let cmd = VoiceCommand::parse("Please approve 0.5 ETH to Alice").unwrap();
        assert_eq!(cmd.amount, dec!(0.5));
        assert_eq!(cmd.token, "ETH");
        assert_eq!(cmd.recipient, "Alice");

        let cmd = VoiceCommand::parse("ok, approve 3 bnb to bob on bnb chain").unwrap();
        assert_eq!(cmd.chain_id().unwrap(), Some(ChainId::Bnb));
    }

    #[test]
    fn test_token_matches_native_symbol() {
        let cmd = VoiceCommand::parse("approve 0.5 eth to alice").unwrap();
        assert!(cmd.token_matches(ChainId::Base));
        assert!(!cmd.token_matches(ChainId::Bnb));

        let usdc = VoiceCommand::parse("approve 0.5 usdc to alice").unwrap();
        assert!(!usdc.token_matches(ChainId::Base));
        assert!(usdc.token_matches(ChainId::Other(424242)));
    }

    #[test]
    fn test_recipient_named_on() {
        // A trailing "on" with nothing after it belongs to the recipient
        let cmd = VoiceCommand::parse("approve 1 eth to ron on").unwrap();
        assert_eq!(cmd.recipient, "ron on");
        assert_eq!(cmd.chain, None);
    }

    #[test]
    fn test_parse_rejects_other_text() {
        assert!(matches!(
            VoiceCommand::parse("reject request 4"),
            Err(VoiceError::NotACommand(_))
        ));
        assert!(matches!(VoiceCommand::parse(""), Err(VoiceError::NotACommand(_))));
        assert!(matches!(
            VoiceCommand::parse("approve lots of eth to alice"),
            Err(VoiceError::InvalidAmount(_))
        ));
        assert!(matches!(
            VoiceCommand::parse("approve 1 eth alice"),
            Err(VoiceError::Missing(_))
        ));
        assert!(matches!(
            VoiceCommand::parse("approve 1 eth to"),
            Err(VoiceError::Missing("recipient"))
        ));
    }

    #[test]
    fn test_unknown_chain() {
        let cmd = VoiceCommand::parse("approve 1 eth to alice on narnia").unwrap();
        assert!(matches!(cmd.chain_id(), Err(VoiceError::Chain(_))));
    }
}
