//! Aldrin Rust SDK
//!
//! Async client for the Aldrin AMM pool programs (v1 constant-product and
//! v2 curve pools) and the RIN staking program on Solana. Query pools,
//! swap, provide liquidity, farm pool tokens and stake, without an Anchor
//! dependency.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aldrin_sdk::{AldrinClient, PoolRegistry, SwapParams};
//! use aldrin_sdk::registry::{RIN_MINT, USDC_MINT};
//! use solana_sdk::signature::Keypair;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client   = AldrinClient::mainnet();
//!     let registry = PoolRegistry::builtin();
//!     let wallet   = Keypair::new(); // use a funded keypair
//!
//!     // 1. Quote first
//!     let pool  = client.pools().pool_by_name(&registry, "RIN_USDC").await?;
//!     let quote = client.pools().quote(&pool, &USDC_MINT, 10_000_000).await?;
//!     println!("Estimated out: {}  impact: {:.2}%", quote.estimated_out, quote.price_impact_pct);
//!
//!     // 2. Swap with 0.5% slippage
//!     let result = client.pools().swap(&wallet, SwapParams {
//!         mint_in:        USDC_MINT,
//!         mint_out:       RIN_MINT,
//!         amount_in:      10_000_000,
//!         slippage_bps:   50,
//!         min_amount_out: None,
//!         pool:           Some(pool.address),
//!         fee:            None,
//!     }).await?;
//!     println!("Swapped! tx: {}", result.signature);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Overview
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`PoolService::get_pools`] | All pools of both pool programs |
//! | [`PoolService::find_pool`] | Pool for a mint pair |
//! | [`PoolService::get_price`] | Reserves, LP supply and spot price |
//! | [`PoolService::quote`] | Off-chain fee + slippage breakdown |
//! | [`PoolService::swap`] | Token swap with optional fee transfer |
//! | [`PoolService::deposit_liquidity`] | Deposit tokens, receive pool tokens |
//! | [`PoolService::withdraw_liquidity`] | Burn pool tokens for the underlying |
//! | [`FarmingService::start_farming`] | Freeze pool tokens in a ticket |
//! | [`FarmingService::end_farming`] | Unfreeze all open tickets |
//! | [`FarmingService::claim_farmed`] | Claim farming rewards |
//! | [`StakingService::start_staking`] | Stake RIN |
//! | [`StakingService::end_staking`] | Close all staking tickets |
//! | [`StakingService::claim_staking_rewards`] | Claim staking rewards |

pub mod client;
pub mod config;
pub mod error;
pub mod farming;
pub mod instructions;
pub mod math;
pub mod pools;
pub mod registry;
pub mod staking;
pub mod state;
pub mod transaction;
pub mod types;

pub use client::{AldrinClient, BaseClient};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use farming::FarmingService;
pub use pools::PoolService;
pub use registry::{PoolRegistry, PoolVersion};
pub use staking::StakingService;
pub use transaction::TransactionPlan;
pub use types::*;
