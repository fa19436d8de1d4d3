//! SDK error type.

use solana_sdk::pubkey::Pubkey;

/// All errors returned by the Aldrin SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── RPC / network ────────────────────────────────────────────────────────
    /// A Solana JSON-RPC call failed.
    #[error("RPC error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    /// An account the operation depends on does not exist on-chain.
    #[error("Account {0} not found")]
    AccountNotFound(Pubkey),

    /// The account exists but is owned by a program we do not talk to.
    #[error("Account {account} is owned by {actual}, expected {expected}")]
    InvalidAccountOwner { account: Pubkey, expected: String, actual: Pubkey },

    // ── Pool discovery ───────────────────────────────────────────────────────
    /// No pool matches the requested name or mint pair.
    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    /// One of the pool vaults is empty.
    #[error("Pool has no liquidity")]
    NoLiquidity,

    // ── Farming / staking ────────────────────────────────────────────────────
    #[error("Farming state {0} not found")]
    FarmingStateNotFound(Pubkey),

    #[error("No open farming tickets for this pool")]
    NoFarmingTickets,

    #[error("No open staking tickets")]
    NoStakingTickets,

    #[error("Nothing to claim")]
    NothingToClaim,

    // ── Swap slippage ────────────────────────────────────────────────────────
    /// The quoted output is below the caller's minimum.
    #[error("Slippage guard triggered: estimated_out={estimated}, min_amount_out={min}")]
    SlippageExceeded { estimated: u64, min: u64 },

    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("Integer overflow in fee / swap math")]
    MathOverflow,

    // ── Account parsing ──────────────────────────────────────────────────────
    /// Raw account bytes could not be deserialized.
    #[error("Account parse error at offset {offset}: {reason}")]
    ParseError { offset: usize, reason: String },

    // ── Registry / config ────────────────────────────────────────────────────
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Validation ───────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A single instruction group does not fit in one transaction packet.
    #[error("Transaction is {size} bytes; the packet limit is {limit}")]
    TransactionTooLarge { size: usize, limit: usize },
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;
