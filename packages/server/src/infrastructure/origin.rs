//! Anonymized origin identifiers.
//!
//! The raw client address never leaves this module; messages are attributed
//! to a salted SHA-256 digest of it instead.

use std::net::IpAddr;

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::domain::OriginId;

const ORIGIN_ID_LEN: usize = 18;

/// Derives stable, non-reversible origin ids from client addresses
#[derive(Debug, Clone)]
pub struct OriginIdFactory {
    salt: String,
    trust_proxy: bool,
}

impl OriginIdFactory {
    /// # Arguments
    ///
    /// * `salt` - Secret mixed into every digest
    /// * `trust_proxy` - Use the first `X-Forwarded-For` entry as the client address
    pub fn new(salt: String, trust_proxy: bool) -> Self {
        Self { salt, trust_proxy }
    }

    /// Pick the client address for a connection.
    pub fn client_address(&self, peer: IpAddr, headers: &HeaderMap) -> String {
        if self.trust_proxy {
            let forwarded = headers
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty());
            if let Some(address) = forwarded {
                return address.to_string();
            }
        }
        peer.to_string()
    }

    pub fn derive(&self, address: &str) -> OriginId {
        let digest = Sha256::new()
            .chain_update(self.salt.as_bytes())
            .chain_update(address.as_bytes())
            .finalize();
        OriginId::from_digest(&digest, ORIGIN_ID_LEN)
    }
}
