//! Caller identity and provenance fingerprints.
//!
//! Authentication happens upstream. This module only turns whatever the
//! gateway hands over into an [`Identity`], and an identity into an
//! irreversible fingerprint that is stored but never shown.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::net::SocketAddr;
use tracing::{debug, instrument};

/// Who submitted a score.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// A logged-in account. Its scores are ranked and listed.
    Account(i32),
    /// A guest, known only by best-effort request context.
    Anonymous {
        /// Network origin of the caller, such as a client address.
        origin: String,
        /// Client signature, such as the user agent.
        client_signature: String,
    },
}

impl Identity {
    /// Builds a guest identity.
    pub fn anonymous(origin: impl Into<String>, client_signature: impl Into<String>) -> Self {
        Identity::Anonymous {
            origin: origin.into(),
            client_signature: client_signature.into(),
        }
    }

    /// The account id, if logged in.
    pub fn account_id(&self) -> Option<i32> {
        match self {
            Identity::Account(id) => Some(*id),
            Identity::Anonymous { .. } => None,
        }
    }

    /// SHA-256 over a domain-separated description of the identity, hex encoded.
    ///
    /// Accounts hash as `account:<id>` and guests as
    /// `anonymous:<origin>|<client signature>`, so the two can never collide.
    pub fn fingerprint(&self) -> String {
        let material = match self {
            Identity::Account(id) => format!("account:{}", id),
            Identity::Anonymous {
                origin,
                client_signature,
            } => format!("anonymous:{}|{}", origin, client_signature),
        };
        hex::encode(Sha256::digest(material.as_bytes()))
    }
}

/// Turns request metadata into an [`Identity`].
pub trait IdentityResolver: Send + Sync {
    /// Resolves the caller. Never fails: anything unrecognized is a guest.
    fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Identity;
}

/// Default header carrying the authenticated account id.
pub const DEFAULT_ACCOUNT_HEADER: &str = "x-account-id";

/// Trusts an account id header set by the authentication gateway in front
/// of the service.
///
/// A missing or non-numeric header means a guest. Guests are described by
/// the first `X-Forwarded-For` hop (or the peer address) and the `User-Agent`.
#[derive(Debug, Clone)]
pub struct TrustedHeaderIdentity {
    header: String,
}

impl TrustedHeaderIdentity {
    /// Reads the account id from `header`.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
        }
    }

    /// Name of the header read.
    pub fn header(&self) -> &str {
        &self.header
    }
}

impl Default for TrustedHeaderIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT_HEADER)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl IdentityResolver for TrustedHeaderIdentity {
    #[instrument(skip(self, headers), fields(header = %self.header))]
    fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Identity {
        if let Some(id) = header_str(headers, &self.header).and_then(|v| v.trim().parse::<i32>().ok()) {
            debug!(account_id = id, "Caller is a logged-in account");
            return Identity::Account(id);
        }

        let origin = header_str(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|hop| hop.trim().to_string())
            .filter(|hop| !hop.is_empty())
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| "unknown".to_string());
        let client_signature = header_str(headers, "user-agent").unwrap_or("").to_string();

        debug!(origin = %origin, "Caller is a guest");
        Identity::anonymous(origin, client_signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = Identity::Account(7).fingerprint();
        assert_eq!(fp.len(), 64);
        assert!(fp.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(fp, Identity::Account(7).fingerprint());
        assert_ne!(fp, Identity::Account(8).fingerprint());
    }

    #[test]
    fn test_fingerprint_domains_do_not_collide() {
        let guest = Identity::anonymous("7", "");
        assert_ne!(guest.fingerprint(), Identity::Account(7).fingerprint());
    }

    #[test]
    fn test_header_resolves_account() {
        let mut headers = HeaderMap::new();
        headers.insert("x-account-id", HeaderValue::from_static(" 42 "));
        let id = TrustedHeaderIdentity::default().resolve(&headers, None);
        assert_eq!(id, Identity::Account(42));
    }

    #[test]
    fn test_custom_header_name_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user", HeaderValue::from_static("3"));
        let id = TrustedHeaderIdentity::new("X-User").resolve(&headers, None);
        assert_eq!(id.account_id(), Some(3));
    }

    #[test]
    fn test_garbage_header_means_guest() {
        let mut headers = HeaderMap::new();
        headers.insert("x-account-id", HeaderValue::from_static("admin"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8"));
        let id = TrustedHeaderIdentity::default().resolve(&headers, None);
        assert_eq!(id, Identity::anonymous("203.0.113.9", "curl/8"));
    }

    #[test]
    fn test_guest_falls_back_to_peer_address() {
        let peer: SocketAddr = "192.0.2.1:5555".parse().unwrap();
        let id = TrustedHeaderIdentity::default().resolve(&HeaderMap::new(), Some(peer));
        assert_eq!(id, Identity::anonymous("192.0.2.1", ""));
    }
}
