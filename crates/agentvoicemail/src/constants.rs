use alloy::primitives::Address;
use std::time::Duration;

/// Default AgentVoicemail service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://agentvoicemail.com";

/// Default RPC endpoint for Tempo Moderato.
pub const RPC_URL: &str = "https://rpc.moderato.tempo.xyz";

/// Block explorer base URL.
pub const EXPLORER_BASE: &str = "https://explore.moderato.tempo.xyz";

/// pathUSD token address on Tempo Moderato testnet.
pub const DEFAULT_TOKEN: Address = Address::new([
    0x20, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
]);

/// Token label the service expects in `payment.token`.
pub const DEFAULT_TOKEN_SYMBOL: &str = "USDC";

/// Payment tokens (USDC, pathUSD) have 6 decimal places.
pub const TOKEN_DECIMALS: u32 = 6;

/// Paid attempts after a transfer before giving up on the service accepting the proof.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay between paid attempts that still come back 402.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Upper bound on waiting for a transfer to reach the requested commitment.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-request timeout for service HTTP calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Job polling defaults.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Price multiplier for expedited processing.
pub const PRIORITY_MULTIPLIER: u64 = 2;

/// Service API paths.
pub const PRICING_PATH: &str = "/api/pricing";
pub const HEALTH_PATH: &str = "/api/health";
pub const PROCESS_PATH: &str = "/api/voicemail/process";
pub const STATUS_PATH: &str = "/api/voicemail/status";
