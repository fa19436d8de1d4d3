//! Pool discovery, pricing, swaps and liquidity.

use std::sync::Arc;

use log::{debug, warn};
use solana_sdk::{pubkey::Pubkey, signature::Signer};

use crate::{
    client::BaseClient,
    error::{Error, Result},
    instructions::{
        create_basket_ix, derive_ata, redeem_basket_ix, swap_ix, token_transfer_ix, Side,
        UserPoolAccounts,
    },
    math::{deposit_amounts, min_with_slippage, price, quote_swap, withdraw_amounts},
    registry::{resolve_symbol, PoolRegistry, PoolVersion, WSOL_MINT},
    state::{parse_pool, POOL_BASE_MINT_OFFSET, POOL_QUOTE_MINT_OFFSET, POOL_V1_LEN, POOL_V2_LEN},
    transaction::TransactionPlan,
    types::{
        DepositAmounts, DepositParams, DepositResult, FeeTransfer, PoolFilter, PoolInfo, PriceInfo,
        SwapParams, SwapQuote, SwapResult, WithdrawAmounts, WithdrawParams, WithdrawResult,
    },
};

/// Pool operations on the v1 and v2 pool programs.
pub struct PoolService {
    base: Arc<BaseClient>,
}

impl PoolService {
    pub fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    // ── Read operations ───────────────────────────────────────────────────────

    /// Pool accounts of both pool programs, optionally narrowed by mint.
    pub async fn get_pools(&self, filter: &PoolFilter) -> Result<Vec<PoolInfo>> {
        let mut memcmp: Vec<(usize, &[u8])> = Vec::new();
        if let Some(mint) = &filter.base_mint {
            memcmp.push((POOL_BASE_MINT_OFFSET, mint.as_ref()));
        }
        if let Some(mint) = &filter.quote_mint {
            memcmp.push((POOL_QUOTE_MINT_OFFSET, mint.as_ref()));
        }
        let mut pools = self.query_pools(PoolVersion::V1, &memcmp).await?;
        pools.extend(self.query_pools(PoolVersion::V2, &memcmp).await?);
        Ok(pools)
    }

    /// Fetch and decode one pool; the version follows from the account owner.
    pub async fn get_pool(&self, address: &Pubkey) -> Result<PoolInfo> {
        let account = self.base.account(address).await?;
        let version = self
            .base
            .config()
            .pool_version(&account.owner)
            .ok_or_else(|| Error::InvalidAccountOwner {
                account:  *address,
                expected: "a pool program".into(),
                actual:   account.owner,
            })?;
        Ok(PoolInfo {
            address: *address,
            version,
            state: parse_pool(&account.data, version)?,
        })
    }

    /// Locate the pool trading `mint_a` against `mint_b`, in either order.
    pub async fn find_pool(&self, mint_a: &Pubkey, mint_b: &Pubkey) -> Result<PoolInfo> {
        self.find_pool_in(&[PoolVersion::V1, PoolVersion::V2], mint_a, mint_b).await
    }

    /// Resolve a registry name to its pool account.
    pub async fn pool_by_name(&self, registry: &PoolRegistry, name: &str) -> Result<PoolInfo> {
        let entry = registry
            .get(name)
            .ok_or_else(|| Error::PoolNotFound(name.to_string()))?;
        match entry.address {
            Some(address) => self.get_pool(&address).await,
            None => {
                self.find_pool_in(&[entry.version], &entry.base_mint, &entry.quote_mint)
                    .await
            }
        }
    }

    /// Current reserves, LP supply and decimal-adjusted spot price.
    pub async fn get_price(&self, pool: &PoolInfo) -> Result<PriceInfo> {
        let s = &pool.state;
        let base_reserve  = self.base.token_balance(&s.base_token_vault).await?;
        let quote_reserve = self.base.token_balance(&s.quote_token_vault).await?;
        let (lp_supply, _)      = self.base.mint_info(&s.pool_mint).await?;
        let (_, base_decimals)  = self.base.mint_info(&s.base_token_mint).await?;
        let (_, quote_decimals) = self.base.mint_info(&s.quote_token_mint).await?;

        Ok(PriceInfo {
            pool: pool.address,
            base_reserve,
            quote_reserve,
            base_decimals,
            quote_decimals,
            lp_supply,
            price: price(base_reserve, quote_reserve, base_decimals, quote_decimals),
        })
    }

    /// Quote a swap of `amount_in` units of `mint_in` without sending anything.
    pub async fn quote(&self, pool: &PoolInfo, mint_in: &Pubkey, amount_in: u64) -> Result<SwapQuote> {
        let side = Side::for_input(&pool.state, mint_in).ok_or_else(|| {
            Error::InvalidArgument(format!("{} is not traded by pool {}", mint_in, pool.address))
        })?;
        let base_reserve  = self.base.token_balance(&pool.state.base_token_vault).await?;
        let quote_reserve = self.base.token_balance(&pool.state.quote_token_vault).await?;
        let (reserve_in, reserve_out) = match side {
            Side::Ask => (base_reserve, quote_reserve),
            Side::Bid => (quote_reserve, base_reserve),
        };
        let quote = quote_swap(&pool.state.fees, reserve_in, reserve_out, amount_in)?;
        debug!(
            "quote {} {amount_in} -> {} via {}: out={} impact={:.3}%",
            resolve_symbol(mint_in),
            match side {
                Side::Ask => resolve_symbol(&pool.state.quote_token_mint),
                Side::Bid => resolve_symbol(&pool.state.base_token_mint),
            },
            pool.address,
            quote.estimated_out,
            quote.price_impact_pct
        );
        Ok(quote)
    }

    // ── Write operations ──────────────────────────────────────────────────────

    /// Swap `amount_in` of `mint_in` for `mint_out`.
    ///
    /// The pool is looked up by mint pair unless `params.pool` pins one. The
    /// output account is created when missing; wrapped SOL on either side goes
    /// through a temporary account closed at the end of the transaction. An
    /// optional fee transfer is paid from the input account after the swap.
    pub async fn swap(&self, wallet: &(dyn Signer + Sync), params: SwapParams) -> Result<SwapResult> {
        if params.mint_in == params.mint_out {
            return Err(Error::InvalidArgument("mint_in and mint_out must differ".into()));
        }
        if params.amount_in == 0 {
            return Err(Error::InvalidArgument("amount_in must be > 0".into()));
        }

        let pool = match params.pool {
            Some(address) => self.get_pool(&address).await?,
            None => self.find_pool(&params.mint_in, &params.mint_out).await?,
        };
        let side = swap_side(&pool, &params.mint_in, &params.mint_out)?;

        let quote = self.quote(&pool, &params.mint_in, params.amount_in).await?;
        let min_amount_out = params
            .min_amount_out
            .unwrap_or_else(|| min_with_slippage(quote.estimated_out, params.slippage_bps));
        if quote.estimated_out < min_amount_out {
            return Err(Error::SlippageExceeded { estimated: quote.estimated_out, min: min_amount_out });
        }

        let owner = wallet.pubkey();
        let fee_amount = params.fee.map(|f| f.amount).unwrap_or(0);
        let spend = params.amount_in.checked_add(fee_amount).ok_or(Error::MathOverflow)?;

        let mut plan = TransactionPlan::new();
        let user_in  = self.base.source_token_account(&mut plan, &owner, &params.mint_in, spend).await?;
        let user_out = self.base.destination_token_account(&mut plan, &owner, &params.mint_out).await?;

        assemble_swap(
            &mut plan,
            &self.base.config().pool_program(pool.version),
            &pool,
            &owner,
            &user_in,
            &user_out,
            side,
            params.amount_in,
            min_amount_out,
            params.fee,
        )?;
        let sig = self.base.send(&plan, wallet).await?;

        Ok(SwapResult {
            signature:     sig.to_string(),
            pool:          pool.address,
            amount_in:     params.amount_in,
            estimated_out: quote.estimated_out,
            min_amount_out,
        })
    }

    /// Deposit `base_amount` base tokens plus the matching quote amount and
    /// receive pool tokens. The pool-token account is created when missing.
    pub async fn deposit_liquidity(
        &self,
        wallet: &(dyn Signer + Sync),
        params: DepositParams,
    ) -> Result<DepositResult> {
        let pool = self.get_pool(&params.pool).await?;
        let s = &pool.state;

        let base_reserve  = self.base.token_balance(&s.base_token_vault).await?;
        let quote_reserve = self.base.token_balance(&s.quote_token_vault).await?;
        let (lp_supply, _) = self.base.mint_info(&s.pool_mint).await?;
        let amounts = deposit_amounts(
            params.base_amount,
            base_reserve,
            quote_reserve,
            lp_supply,
            params.slippage_bps,
        )?;

        let owner = wallet.pubkey();
        let accounts = self.wallet_accounts(&owner, &pool).await?;
        let program_id = self.base.config().pool_program(pool.version);
        let (plan, user) = deposit_plan(&program_id, &pool, &owner, &amounts, accounts)?;
        let sig = self.base.send(&plan, wallet).await?;

        Ok(DepositResult {
            signature:  sig.to_string(),
            pool:       pool.address,
            amounts,
            pool_token: user.pool_token,
        })
    }

    /// Burn `lp_amount` pool tokens for the proportional base and quote tokens.
    pub async fn withdraw_liquidity(
        &self,
        wallet: &(dyn Signer + Sync),
        params: WithdrawParams,
    ) -> Result<WithdrawResult> {
        if params.lp_amount == 0 {
            return Err(Error::InvalidArgument("lp_amount must be > 0".into()));
        }
        let pool = self.get_pool(&params.pool).await?;
        let s = &pool.state;
        let owner = wallet.pubkey();

        let pool_token = derive_ata(&owner, &s.pool_mint);
        let held = self.base.token_balance(&pool_token).await?;
        if held < params.lp_amount {
            return Err(Error::InvalidArgument(format!(
                "wallet holds {held} pool tokens, cannot redeem {}",
                params.lp_amount
            )));
        }

        let base_reserve  = self.base.token_balance(&s.base_token_vault).await?;
        let quote_reserve = self.base.token_balance(&s.quote_token_vault).await?;
        let (lp_supply, _) = self.base.mint_info(&s.pool_mint).await?;
        let amounts = withdraw_amounts(
            params.lp_amount,
            base_reserve,
            quote_reserve,
            lp_supply,
            params.slippage_bps,
        )?;

        let accounts = self.wallet_accounts(&owner, &pool).await?;
        let program_id = self.base.config().pool_program(pool.version);
        let plan = withdraw_plan(&program_id, &pool, &owner, params.lp_amount, &amounts, accounts)?;
        let sig = self.base.send(&plan, wallet).await?;

        Ok(WithdrawResult { signature: sig.to_string(), pool: pool.address, amounts })
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    async fn wallet_accounts(&self, owner: &Pubkey, pool: &PoolInfo) -> Result<WalletAccounts> {
        let s = &pool.state;
        let keys = [
            derive_ata(owner, &s.base_token_mint),
            derive_ata(owner, &s.quote_token_mint),
            derive_ata(owner, &s.pool_mint),
        ];
        let exist = self.base.accounts_exist(&keys).await?;
        let rent = if s.base_token_mint == WSOL_MINT || s.quote_token_mint == WSOL_MINT {
            self.base.token_account_rent().await?
        } else {
            0
        };
        Ok(WalletAccounts { base: exist[0], quote: exist[1], pool_token: exist[2], rent })
    }

    async fn query_pools(
        &self,
        version: PoolVersion,
        memcmp:  &[(usize, &[u8])],
    ) -> Result<Vec<PoolInfo>> {
        let size = match version {
            PoolVersion::V1 => POOL_V1_LEN,
            PoolVersion::V2 => POOL_V2_LEN,
        };
        let program_id = self.base.config().pool_program(version);
        let raw = self.base.program_accounts(&program_id, size as u64, memcmp).await?;

        let mut out = Vec::with_capacity(raw.len());
        for (address, account) in raw {
            match parse_pool(&account.data, version) {
                Ok(state) => out.push(PoolInfo { address, version, state }),
                Err(e)    => warn!("skipping malformed pool {address}: {e}"),
            }
        }
        Ok(out)
    }

    /// Try `(a, b)` then `(b, a)` as `(base, quote)` in each program version.
    async fn find_pool_in(
        &self,
        versions: &[PoolVersion],
        mint_a:   &Pubkey,
        mint_b:   &Pubkey,
    ) -> Result<PoolInfo> {
        for (base, quote) in [(mint_a, mint_b), (mint_b, mint_a)] {
            for &version in versions {
                let filters: [(usize, &[u8]); 2] = [
                    (POOL_BASE_MINT_OFFSET, base.as_ref()),
                    (POOL_QUOTE_MINT_OFFSET, quote.as_ref()),
                ];
                if let Some(pool) = self.query_pools(version, &filters).await?.into_iter().next() {
                    return Ok(pool);
                }
            }
        }
        Err(Error::PoolNotFound(format!(
            "{} / {}",
            resolve_symbol(mint_a),
            resolve_symbol(mint_b)
        )))
    }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Side for swapping `mint_in` into `mint_out` through `pool`.
fn swap_side(pool: &PoolInfo, mint_in: &Pubkey, mint_out: &Pubkey) -> Result<Side> {
    let side = Side::for_input(&pool.state, mint_in);
    let expected_out = match side {
        Some(Side::Ask) => pool.state.quote_token_mint,
        Some(Side::Bid) => pool.state.base_token_mint,
        None => Pubkey::default(),
    };
    match side {
        Some(side) if expected_out == *mint_out => Ok(side),
        _ => Err(Error::InvalidArgument(format!(
            "pool {} does not trade {} for {}",
            pool.address,
            resolve_symbol(mint_in),
            resolve_symbol(mint_out)
        ))),
    }
}

/// Append the swap and the optional fee transfer to a plan whose input and
/// output accounts are already resolved.
#[allow(clippy::too_many_arguments)]
fn assemble_swap(
    plan:       &mut TransactionPlan,
    program_id: &Pubkey,
    pool:       &PoolInfo,
    owner:      &Pubkey,
    user_in:    &Pubkey,
    user_out:   &Pubkey,
    side:       Side,
    amount_in:  u64,
    min_out:    u64,
    fee:        Option<FeeTransfer>,
) -> Result<()> {
    let (user_base, user_quote) = match side {
        Side::Ask => (user_in, user_out),
        Side::Bid => (user_out, user_in),
    };
    plan.push_action(swap_ix(
        program_id,
        &pool.address,
        &pool.state,
        owner,
        user_base,
        user_quote,
        amount_in,
        min_out,
        side,
    ));
    if let Some(fee) = fee {
        if fee.amount > 0 {
            plan.set_fee(token_transfer_ix(user_in, &fee.destination, owner, fee.amount)?);
        }
    }
    Ok(())
}

/// Which of the wallet's associated token accounts for a pool exist, and the
/// rent a temporary wrapped-SOL account needs.
#[derive(Debug, Clone, Copy, Default)]
struct WalletAccounts {
    base:       bool,
    quote:      bool,
    pool_token: bool,
    rent:       u64,
}

fn deposit_plan(
    program_id: &Pubkey,
    pool:       &PoolInfo,
    owner:      &Pubkey,
    amounts:    &DepositAmounts,
    accounts:   WalletAccounts,
) -> Result<(TransactionPlan, UserPoolAccounts)> {
    let s = &pool.state;
    let mut plan = TransactionPlan::new();
    let user = UserPoolAccounts {
        base: plan.source_account(
            owner, &s.base_token_mint, amounts.base_token_used, accounts.base, accounts.rent,
        )?,
        quote: plan.source_account(
            owner, &s.quote_token_mint, amounts.quote_token_used, accounts.quote, accounts.rent,
        )?,
        pool_token: plan.destination_account(owner, &s.pool_mint, accounts.pool_token, accounts.rent)?,
    };
    plan.push_action(create_basket_ix(
        program_id,
        &pool.address,
        s,
        &user,
        owner,
        amounts.creation_size,
        amounts.base_token_used,
        amounts.quote_token_used,
    ));
    Ok((plan, user))
}

fn withdraw_plan(
    program_id: &Pubkey,
    pool:       &PoolInfo,
    owner:      &Pubkey,
    lp_amount:  u64,
    amounts:    &WithdrawAmounts,
    accounts:   WalletAccounts,
) -> Result<TransactionPlan> {
    let s = &pool.state;
    let mut plan = TransactionPlan::new();
    let user = UserPoolAccounts {
        base:       plan.destination_account(owner, &s.base_token_mint, accounts.base, accounts.rent)?,
        quote:      plan.destination_account(owner, &s.quote_token_mint, accounts.quote, accounts.rent)?,
        pool_token: derive_ata(owner, &s.pool_mint),
    };
    plan.push_action(redeem_basket_ix(
        program_id,
        &pool.address,
        s,
        &user,
        owner,
        lp_amount,
        amounts.base_min,
        amounts.quote_min,
    ));
    Ok(plan)
}
