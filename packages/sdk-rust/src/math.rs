//! Quote, deposit and withdrawal math.
//!
//! Mirrors the pool program's integer arithmetic so off-chain estimates match
//! on-chain results. Stable-curve pools are quoted with the constant-product
//! formula, which never overstates their output.

use crate::error::{Error, Result};
use crate::state::Fees;
use crate::types::{DepositAmounts, SwapQuote, WithdrawAmounts};

/// Basis-point denominator for slippage tolerances.
pub const BPS_DENOMINATOR: u128 = 10_000;

// ─── Slippage ─────────────────────────────────────────────────────────────────

/// `amount` reduced by `slippage_bps`.
pub fn min_with_slippage(amount: u64, slippage_bps: u16) -> u64 {
    let cut = amount as u128 * slippage_bps as u128 / BPS_DENOMINATOR;
    amount.saturating_sub(cut as u64)
}

/// `amount` increased by `slippage_bps`, saturating at `u64::MAX`.
pub fn max_with_slippage(amount: u64, slippage_bps: u16) -> u64 {
    let extra = amount as u128 * slippage_bps as u128 / BPS_DENOMINATOR;
    u64::try_from(amount as u128 + extra).unwrap_or(u64::MAX)
}

// ─── Price ────────────────────────────────────────────────────────────────────

/// Quote tokens per one base token, with mint decimals applied.
pub fn price(base_reserve: u64, quote_reserve: u64, base_decimals: u8, quote_decimals: u8) -> f64 {
    if base_reserve == 0 {
        return 0.0;
    }
    let base  = base_reserve as f64 / 10f64.powi(base_decimals as i32);
    let quote = quote_reserve as f64 / 10f64.powi(quote_decimals as i32);
    quote / base
}

// ─── Swap ─────────────────────────────────────────────────────────────────────

fn fee_part(amount: u128, numerator: u64, denominator: u64) -> Result<u128> {
    if denominator == 0 || numerator == 0 {
        return Ok(0);
    }
    Ok(amount
        .checked_mul(numerator as u128)
        .ok_or(Error::MathOverflow)?
        / denominator as u128)
}

/// Full fee and output breakdown for swapping `amount_in` into a pool with the
/// given reserves.
pub fn quote_swap(fees: &Fees, reserve_in: u64, reserve_out: u64, amount_in: u64) -> Result<SwapQuote> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(Error::NoLiquidity);
    }
    let in_u128 = amount_in as u128;

    let trade_fee = fee_part(in_u128, fees.trade_fee_numerator, fees.trade_fee_denominator)?;
    let owner_fee = fee_part(in_u128, fees.owner_trade_fee_numerator, fees.owner_trade_fee_denominator)?;

    let after_fees = in_u128
        .checked_sub(trade_fee)
        .and_then(|v| v.checked_sub(owner_fee))
        .ok_or(Error::MathOverflow)?;

    let r_in  = reserve_in as u128;
    let r_out = reserve_out as u128;

    let estimated_out = r_out
        .checked_mul(after_fees)
        .ok_or(Error::MathOverflow)?
        .checked_div(r_in.checked_add(after_fees).ok_or(Error::MathOverflow)?)
        .ok_or(Error::MathOverflow)? as u64;

    let effective_rate = if amount_in == 0 {
        0.0
    } else {
        estimated_out as f64 / amount_in as f64
    };

    let price_impact_pct = after_fees as f64 / (r_in as f64 + after_fees as f64) * 100.0;

    Ok(SwapQuote {
        amount_in,
        trade_fee:  trade_fee as u64,
        owner_fee:  owner_fee as u64,
        after_fees: after_fees as u64,
        estimated_out,
        effective_rate,
        price_impact_pct,
        reserve_in,
        reserve_out,
    })
}

// ─── Liquidity ────────────────────────────────────────────────────────────────

/// Compute `create_basket` arguments for depositing `base_amount` base tokens.
///
/// - `creation_size = base_amount × lp_supply / base_reserve`
/// - the quote side is the proportional amount, rounded up
/// - both maxima are widened by `slippage_bps`
pub fn deposit_amounts(
    base_amount:   u64,
    base_reserve:  u64,
    quote_reserve: u64,
    lp_supply:     u64,
    slippage_bps:  u16,
) -> Result<DepositAmounts> {
    if base_reserve == 0 || quote_reserve == 0 || lp_supply == 0 {
        return Err(Error::NoLiquidity);
    }
    let amount = base_amount as u128;

    let creation_size = amount
        .checked_mul(lp_supply as u128)
        .ok_or(Error::MathOverflow)?
        / base_reserve as u128;
    if creation_size == 0 {
        return Err(Error::InvalidArgument(format!(
            "deposit of {base_amount} base tokens mints no pool tokens"
        )));
    }

    let quote_needed = amount
        .checked_mul(quote_reserve as u128)
        .ok_or(Error::MathOverflow)?
        .div_ceil(base_reserve as u128);

    let creation_size = u64::try_from(creation_size).map_err(|_| Error::MathOverflow)?;
    let quote_needed  = u64::try_from(quote_needed).map_err(|_| Error::MathOverflow)?;

    Ok(DepositAmounts {
        creation_size,
        base_token_used:  max_with_slippage(base_amount, slippage_bps),
        quote_token_used: max_with_slippage(quote_needed, slippage_bps),
    })
}

/// Compute expected and minimum outputs for burning `lp_amount` pool tokens.
pub fn withdraw_amounts(
    lp_amount:     u64,
    base_reserve:  u64,
    quote_reserve: u64,
    lp_supply:     u64,
    slippage_bps:  u16,
) -> Result<WithdrawAmounts> {
    if lp_supply == 0 {
        return Err(Error::NoLiquidity);
    }
    if lp_amount > lp_supply {
        return Err(Error::InvalidArgument(format!(
            "cannot redeem {lp_amount} pool tokens; supply is {lp_supply}"
        )));
    }
    let share = |reserve: u64| (lp_amount as u128 * reserve as u128 / lp_supply as u128) as u64;
    let base_out  = share(base_reserve);
    let quote_out = share(quote_reserve);

    Ok(WithdrawAmounts {
        base_out,
        quote_out,
        base_min:  min_with_slippage(base_out, slippage_bps),
        quote_min: min_with_slippage(quote_out, slippage_bps),
    })
}
