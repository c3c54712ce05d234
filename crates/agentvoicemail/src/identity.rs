//! Agent identity: the signing key that pays for jobs and the address derived from it.
//!
//! The address doubles as the `agent_id` the service uses to track free-tier usage.

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::env;
use std::fmt;

/// Environment variable holding the hex-encoded signing key.
pub const PRIVATE_KEY_ENV: &str = "AGENT_PRIVATE_KEY";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("private key required: pass one explicitly or set AGENT_PRIVATE_KEY")]
    MissingKey,

    #[error("invalid private key: {0}")]
    InvalidKey(String),
}

/// Signing credential plus its derived address. Immutable once loaded.
#[derive(Clone)]
pub struct Identity {
    signer: PrivateKeySigner,
}

impl Identity {
    /// Load from a hex-encoded private key (with or without 0x prefix).
    pub fn from_key(private_key: &str) -> Result<Self, IdentityError> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let signer: PrivateKeySigner = key
            .parse()
            .map_err(|e| IdentityError::InvalidKey(format!("{e}")))?;
        Ok(Self { signer })
    }

    /// Load from [`PRIVATE_KEY_ENV`].
    pub fn from_env() -> Result<Self, IdentityError> {
        Self::load(None)
    }

    /// Use `private_key` if given, otherwise fall back to the environment.
    pub fn load(private_key: Option<&str>) -> Result<Self, IdentityError> {
        match private_key {
            Some(key) if !key.trim().is_empty() => Self::from_key(key),
            _ => {
                let key = env::var(PRIVATE_KEY_ENV)
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(IdentityError::MissingKey)?;
                Self::from_key(&key)
            }
        }
    }

    /// Generate a throwaway identity.
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Checksummed address, used as the service `agent_id`.
    pub fn address_string(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    /// Wallet for an alloy provider's signing filler.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.signer.address())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}
