//! Session tokens identifying a single run.

use derive_more::{Display, Error};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of a session token in characters.
pub const TOKEN_LEN: usize = 32;

/// A malformed session token.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Session token must be {} lowercase hex characters, got {:?}", TOKEN_LEN, value)]
pub struct TokenError {
    /// The rejected input.
    pub value: String,
}

/// Opaque identifier minted when a run starts: 128 random bits as 32
/// lowercase hex characters.
///
/// Tokens are minted client-side, so the only thing a server can check is
/// the format; uniqueness is enforced by storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Mints a fresh token.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; TOKEN_LEN / 2];
        rng.fill(&mut bytes[..]);
        let token = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self(token)
    }

    /// Validates a token string.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] unless `value` is exactly [`TOKEN_LEN`]
    /// characters from `[0-9a-f]`.
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        let well_formed = value.len() == TOKEN_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(Self(value.to_string()))
        } else {
            Err(TokenError {
                value: value.to_string(),
            })
        }
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}
