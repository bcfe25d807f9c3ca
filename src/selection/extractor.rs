//! Candidate address extraction from free-form comment text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::social::Comment;

/// Length of a candidate address.
pub const ADDRESS_LEN: usize = 44;

/// Base-58 alphabet: digits and letters without `0`, `O`, `I` and `l`.
const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Token that is not shaped like a ledger address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a 44-character base-58 address")]
pub struct InvalidAddress(pub String);

/// A string that passed the address format check.
///
/// The check is purely syntactic; the address may not exist on chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for WalletAddress {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_candidate_address(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidAddress(s.to_string()))
        }
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = InvalidAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_candidate_address(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidAddress(value))
        }
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True iff `token` is exactly 44 base-58 characters.
pub fn is_candidate_address(token: &str) -> bool {
    token.len() == ADDRESS_LEN && token.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Whitespace-separated tokens of `text` that look like addresses, in order.
///
/// Repeats are kept.
pub fn extract_candidates(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|token| is_candidate_address(token))
        .collect()
}

/// The single address of a qualifying comment.
///
/// A comment qualifies when it contains `keyword` (case-insensitive) and
/// exactly one candidate address.
pub fn validate(comment: &Comment, keyword: &str) -> Option<WalletAddress> {
    let text = comment.text();
    if !text.to_lowercase().contains(&keyword.to_lowercase()) {
        return None;
    }

    match extract_candidates(text).as_slice() {
        [address] => Some(WalletAddress(address.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const ADDR_A: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
    const ADDR_B: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    fn comment(text: &str) -> Comment {
        Comment::new("alice", text, Utc::now(), "c-1")
    }

    #[test]
    fn test_candidate_format() {
        assert!(is_candidate_address(ADDR_A));
        assert!(!is_candidate_address(&ADDR_A[..43]));
        assert!(!is_candidate_address(&format!("{}1", ADDR_A)));
        // Excluded characters
        for bad in ['0', 'O', 'I', 'l'] {
            let token = format!("{}{}", bad, &ADDR_A[1..]);
            assert!(!is_candidate_address(&token), "{} should be rejected", bad);
        }
        // Multi-byte characters are rejected even at the right byte length
        assert!(!is_candidate_address(&format!("é{}", &ADDR_A[2..])));
    }

    #[test]
    fn test_extract_keeps_order_and_repeats() {
        let text = format!("{} and\t{}\n{} done", ADDR_B, ADDR_A, ADDR_B);
        assert_eq!(extract_candidates(&text), vec![ADDR_B, ADDR_A, ADDR_B]);
    }

    #[test]
    fn test_validate_requires_keyword() {
        assert_eq!(
            validate(&comment(&format!("PeNcIl {}", ADDR_A)), "pencil"),
            Some(ADDR_A.parse().unwrap())
        );
        assert_eq!(validate(&comment(&format!("pen {}", ADDR_A)), "pencil"), None);
    }

    #[test]
    fn test_validate_requires_exactly_one_address() {
        assert_eq!(validate(&comment("pencil please"), "pencil"), None);
        assert_eq!(
            validate(&comment(&format!("pencil {} {}", ADDR_A, ADDR_B)), "pencil"),
            None
        );
        // Same address twice is still two candidates
        assert_eq!(
            validate(&comment(&format!("pencil {} {}", ADDR_A, ADDR_A)), "pencil"),
            None
        );
    }

    #[test]
    fn test_wallet_address_parse() {
        let address: WalletAddress = ADDR_A.parse().unwrap();
        assert_eq!(address.to_string(), ADDR_A);
        assert!("short".parse::<WalletAddress>().is_err());

        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", ADDR_A));
        assert!(serde_json::from_str::<WalletAddress>("\"nope\"").is_err());
    }
}
