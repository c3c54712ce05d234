use alloy::primitives::Address;
use std::env;
use std::time::Duration;
use url::Url;

use crate::constants::{
    DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_ENDPOINT, DEFAULT_HTTP_TIMEOUT, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY, DEFAULT_TOKEN, DEFAULT_TOKEN_SYMBOL, EXPLORER_BASE, RPC_URL,
};
use crate::ledger::Commitment;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Chain-side settings for paying the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub rpc_url: String,
    /// TIP-20 token contract used for payment.
    pub token: Address,
    /// Label sent to the service alongside the transaction hash.
    pub token_symbol: String,
    pub commitment: Commitment,
    /// Upper bound on waiting for a transfer to reach `commitment`.
    pub confirmation_timeout: Duration,
    pub explorer_base: String,
}

impl Default for LedgerConfig {
    /// Defaults to Tempo Moderato and pathUSD.
    fn default() -> Self {
        Self {
            rpc_url: RPC_URL.to_string(),
            token: DEFAULT_TOKEN,
            token_symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            commitment: Commitment::Confirmed,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            explorer_base: EXPLORER_BASE.to_string(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // Optional: RPC endpoint override
        let rpc_url = env::var("RPC_URL").unwrap_or(defaults.rpc_url);
        Url::parse(&rpc_url).map_err(|_| ConfigError::InvalidUrl(rpc_url.clone()))?;

        // Optional: payment token
        let token = match env::var("PAYMENT_TOKEN") {
            Ok(s) if !s.is_empty() => s.parse().map_err(|_| ConfigError::InvalidAddress(s))?,
            _ => defaults.token,
        };

        let token_symbol = env::var("PAYMENT_TOKEN_SYMBOL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.token_symbol);

        let commitment = match env::var("PAYMENT_COMMITMENT") {
            Ok(s) if !s.is_empty() => s.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PAYMENT_COMMITMENT",
                value: s,
            })?,
            _ => defaults.commitment,
        };

        let confirmation_timeout = parse_secs("CONFIRMATION_TIMEOUT_SECS")?
            .unwrap_or(defaults.confirmation_timeout);

        Ok(Self {
            rpc_url,
            token,
            token_symbol,
            commitment,
            confirmation_timeout,
            ..defaults
        })
    }

    /// Explorer link for a transaction hash, for log output.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base.trim_end_matches('/'), tx_hash)
    }
}

/// Settings for the pay-on-demand client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base URL.
    pub endpoint: String,
    /// Receiving wallet. `None` falls back to the wallet advertised by `/api/pricing`.
    pub service_wallet: Option<Address>,
    /// Paid attempts after a transfer while the service still answers 402.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub http_timeout: Duration,
    pub ledger: LedgerConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            service_wallet: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            ledger: LedgerConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // Optional: service endpoint override
        let endpoint = env::var("AGENT_VOICEMAIL_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.endpoint);
        Url::parse(&endpoint).map_err(|_| ConfigError::InvalidUrl(endpoint.clone()))?;

        // Optional: receiving wallet override
        let service_wallet = match env::var("SERVICE_WALLET") {
            Ok(s) if !s.is_empty() => {
                Some(s.parse().map_err(|_| ConfigError::InvalidAddress(s))?)
            }
            _ => None,
        };

        let max_retries = match env::var("MAX_PAYMENT_RETRIES") {
            Ok(s) => s.parse().map_err(|_| ConfigError::InvalidValue {
                name: "MAX_PAYMENT_RETRIES",
                value: s,
            })?,
            Err(_) => defaults.max_retries,
        };

        let retry_delay = parse_secs("PAYMENT_RETRY_DELAY_SECS")?.unwrap_or(defaults.retry_delay);

        Ok(Self {
            endpoint,
            service_wallet,
            max_retries,
            retry_delay,
            http_timeout: defaults.http_timeout,
            ledger: LedgerConfig::from_env()?,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_service_wallet(mut self, wallet: Address) -> Self {
        self.service_wallet = Some(wallet);
        self
    }

    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }
}

fn parse_secs(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(s) => s
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::InvalidValue { name, value: s }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, "https://agentvoicemail.com");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert!(config.service_wallet.is_none());
        assert_eq!(config.ledger.token, DEFAULT_TOKEN);
        assert_eq!(config.ledger.token_symbol, "USDC");
    }

    #[test]
    fn test_builders() {
        let wallet: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        let config = ClientConfig::default()
            .with_endpoint("http://localhost:3000")
            .with_service_wallet(wallet)
            .with_retry_policy(5, Duration::from_millis(10));
        assert_eq!(config.endpoint, "http://localhost:3000");
        assert_eq!(config.service_wallet, Some(wallet));
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_tx_url() {
        let config = LedgerConfig::default();
        assert_eq!(
            config.tx_url("0xabc"),
            "https://explore.moderato.tempo.xyz/tx/0xabc"
        );
    }

    // All env-dependent assertions live in one test so parallel tests never race on variables.
    #[test]
    fn test_from_env() {
        env::set_var("AGENT_VOICEMAIL_ENDPOINT", "http://127.0.0.1:9999");
        env::set_var(
            "SERVICE_WALLET",
            "0x00000000000000000000000000000000000000bb",
        );
        env::set_var("MAX_PAYMENT_RETRIES", "7");
        env::set_var("PAYMENT_COMMITMENT", "finalized");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:9999");
        assert!(config.service_wallet.is_some());
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.ledger.commitment, Commitment::Finalized);

        env::set_var("SERVICE_WALLET", "not-an-address");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidAddress(_))
        ));

        env::remove_var("SERVICE_WALLET");
        env::set_var("MAX_PAYMENT_RETRIES", "many");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidValue { .. })
        ));

        env::remove_var("MAX_PAYMENT_RETRIES");
        env::remove_var("PAYMENT_COMMITMENT");
        env::set_var("AGENT_VOICEMAIL_ENDPOINT", "not a url");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidUrl(_))
        ));
        env::remove_var("AGENT_VOICEMAIL_ENDPOINT");
    }
}
