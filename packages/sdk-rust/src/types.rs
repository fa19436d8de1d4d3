//! Parameter and result types for the high-level client.

use solana_sdk::pubkey::Pubkey;

use crate::registry::PoolVersion;
use crate::state::{FarmingCalc, FarmingState, FarmingTicket, PoolState, StakingPool};

// ─── Decoded accounts with their addresses ───────────────────────────────────

/// A pool account and the program version that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolInfo {
    pub address: Pubkey,
    pub version: PoolVersion,
    pub state:   PoolState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmingStateInfo {
    pub address: Pubkey,
    pub state:   FarmingState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmingTicketInfo {
    pub address: Pubkey,
    pub ticket:  FarmingTicket,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmingCalcInfo {
    pub address: Pubkey,
    pub calc:    FarmingCalc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingPoolInfo {
    pub address: Pubkey,
    pub pool:    StakingPool,
}

// ─── Pool reads ───────────────────────────────────────────────────────────────

/// Optional mint constraints for [`get_pools`](crate::pools::PoolService::get_pools).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolFilter {
    pub base_mint:  Option<Pubkey>,
    pub quote_mint: Option<Pubkey>,
}

/// Live reserves and spot price of a pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceInfo {
    pub pool:           Pubkey,
    pub base_reserve:   u64,
    pub quote_reserve:  u64,
    pub base_decimals:  u8,
    pub quote_decimals: u8,
    pub lp_supply:      u64,
    /// Quote tokens per one base token, decimals applied.
    pub price:          f64,
}

/// Fee and output breakdown for a hypothetical swap.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapQuote {
    pub amount_in:        u64,
    /// Fee kept by the pool for liquidity providers.
    pub trade_fee:        u64,
    /// Fee paid to the pool owner's fee account.
    pub owner_fee:        u64,
    /// `amount_in − trade_fee − owner_fee`; the amount that moves the curve.
    pub after_fees:       u64,
    pub estimated_out:    u64,
    /// `estimated_out / amount_in` in raw units.
    pub effective_rate:   f64,
    /// Pure curve slippage: `after_fees / (reserve_in + after_fees) × 100`.
    pub price_impact_pct: f64,
    pub reserve_in:       u64,
    pub reserve_out:      u64,
}

/// Arguments of `create_basket` derived from live reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositAmounts {
    pub creation_size:    u64,
    pub base_token_used:  u64,
    pub quote_token_used: u64,
}

/// Expected and minimum outputs of `redeem_basket`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawAmounts {
    pub base_out:  u64,
    pub quote_out: u64,
    pub base_min:  u64,
    pub quote_min: u64,
}

// ─── Pool writes ──────────────────────────────────────────────────────────────

/// An extra SPL transfer appended after the swap, paid from the wallet's
/// input-token account (e.g. an integrator fee).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeTransfer {
    /// Token account of the input mint that receives the fee.
    pub destination: Pubkey,
    pub amount:      u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    pub mint_in:        Pubkey,
    pub mint_out:       Pubkey,
    pub amount_in:      u64,
    /// Tolerance applied to the quoted output. Ignored when `min_amount_out` is set.
    pub slippage_bps:   u16,
    pub min_amount_out: Option<u64>,
    /// Skip the mint-pair lookup and swap through this pool.
    pub pool:           Option<Pubkey>,
    pub fee:            Option<FeeTransfer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapResult {
    pub signature:      String,
    pub pool:           Pubkey,
    pub amount_in:      u64,
    pub estimated_out:  u64,
    pub min_amount_out: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositParams {
    pub pool:         Pubkey,
    /// Base tokens to deposit; the quote side is matched from reserves.
    pub base_amount:  u64,
    pub slippage_bps: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositResult {
    pub signature:  String,
    pub pool:       Pubkey,
    pub amounts:    DepositAmounts,
    pub pool_token: Pubkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawParams {
    pub pool:         Pubkey,
    pub lp_amount:    u64,
    pub slippage_bps: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawResult {
    pub signature: String,
    pub pool:      Pubkey,
    pub amounts:   WithdrawAmounts,
}

// ─── Farming / staking writes ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartFarmingResult {
    pub signature: String,
    /// Newly created ticket account.
    pub ticket:    Pubkey,
    pub amount:    u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndFarmingResult {
    /// Signatures in send order; tickets are packed several per transaction.
    pub signatures: Vec<String>,
    pub tickets:    Vec<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndStakingResult {
    /// One signature per closed ticket, in ticket order.
    pub signatures: Vec<String>,
    pub tickets:    Vec<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimResult {
    /// Signatures in send order; the last one carries the withdrawal.
    pub signatures:    Vec<String>,
    pub farming_state: Pubkey,
    pub farming_calc:  Pubkey,
    /// Token account the rewards were paid to.
    pub destination:   Pubkey,
}
