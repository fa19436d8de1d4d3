use aldrin_sdk::{
    registry::{resolve_mint, resolve_symbol},
    AldrinClient, ClientConfig, DepositParams, FarmingTicketInfo, FeeTransfer, PoolFilter,
    PoolInfo, PoolRegistry, StakingPoolInfo, SwapParams, WithdrawParams,
};
use anyhow::{anyhow, bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use serde_json::json;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
};
use std::str::FromStr;

// ─── Version banner ───────────────────────────────────────────────────────────

fn print_banner() {
    let ver = env!("CARGO_PKG_VERSION");
    let cfg = ClientConfig::mainnet();
    println!();
    println!("  Aldrin CLI  v{ver}  ·  AMM pools, farming and RIN staking on Solana");
    println!("  {}", "─".repeat(62));
    println!("  Pools v1  {}", cfg.pools_program_id);
    println!("  Pools v2  {}", cfg.pools_v2_program_id);
    println!("  Staking   {}", cfg.staking_program_id);
    println!("  Network   Solana mainnet-beta");
    println!();
}

// ─── CLI definition ───────────────────────────────────────────────────────────

/// Aldrin: swap, provide liquidity, farm and stake on Solana.
///
/// Every command supports --json for machine-readable output.
#[derive(Parser)]
#[command(
    name    = "aldrin",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Aldrin AMM pools, liquidity farming and RIN staking from the command line.",
    after_help = "\
ENVIRONMENT:
  ALDRIN_RPC_URL    Solana JSON-RPC endpoint  [default: https://api.mainnet-beta.solana.com]
  ALDRIN_KEYPAIR    Path to Ed25519 keypair JSON  [default: ~/.config/solana/id.json]
  ALDRIN_REGISTRY   Extra named pools (JSON array)
  RUST_LOG          Log filter, e.g. aldrin_sdk=debug

QUICK START:
  aldrin pools
  aldrin price   --pool RIN_USDC
  aldrin quote   --in USDC --out RIN --amount 10000000
  aldrin swap    --in USDC --out RIN --amount 10000000 --slippage-bps 50
  aldrin stake   --amount 1000000000"
)]
struct Cli {
    /// Solana JSON-RPC endpoint
    #[arg(
        long,
        global        = true,
        value_name    = "URL",
        default_value = "https://api.mainnet-beta.solana.com",
        env           = "ALDRIN_RPC_URL"
    )]
    rpc_url: String,

    /// Path to the wallet's Ed25519 keypair JSON file
    #[arg(
        long,
        global        = true,
        value_name    = "PATH",
        default_value = "~/.config/solana/id.json",
        env           = "ALDRIN_KEYPAIR"
    )]
    keypair: String,

    /// JSON file with extra named pools, added to the built-in table
    #[arg(long, global = true, value_name = "PATH", env = "ALDRIN_REGISTRY")]
    registry: Option<String>,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List pools of both pool programs
    ///
    /// Read-only. Narrow the list with --base / --quote.
    #[command(
        after_help = "\
EXAMPLES:
  aldrin pools
  aldrin pools --quote USDC --json
  aldrin pools --names        # named pools known to this CLI"
    )]
    Pools {
        /// Only pools with this base token (symbol or mint)
        #[arg(long, value_name = "TOKEN")]
        base: Option<String>,

        /// Only pools with this quote token (symbol or mint)
        #[arg(long, value_name = "TOKEN")]
        quote: Option<String>,

        /// Print the named-pool registry instead of querying the chain
        #[arg(long, default_value_t = false)]
        names: bool,
    },

    /// Show a pool's accounts, fees and farming states
    #[command(
        name = "pool-info",
        after_help = "\
EXAMPLES:
  aldrin pool-info --pool RIN_USDC
  aldrin pool-info --pool RIN-USDC --json
  aldrin pool-info --pool <POOL_ADDRESS>"
    )]
    PoolInfo {
        /// Registry name (RIN_USDC), token pair (RIN-USDC) or pool address
        #[arg(long, value_name = "POOL")]
        pool: String,
    },

    /// Show live reserves, LP supply and spot price
    #[command(
        after_help = "\
EXAMPLES:
  aldrin price --pool RIN_USDC
  aldrin price --pool SOL-USDC --json"
    )]
    Price {
        /// Registry name, token pair or pool address
        #[arg(long, value_name = "POOL")]
        pool: String,
    },

    /// Preview a swap's fee breakdown without sending any transaction
    #[command(
        after_help = "\
EXAMPLES:
  aldrin quote --in USDC --out RIN --amount 10000000
  aldrin quote --in SOL --out USDC --amount 1000000000 --json

OUTPUT FIELDS:
  trade_fee      LP fee kept by the pool
  owner_fee      fee sent to the pool owner's fee account
  after_fees     amount that moves the curve
  estimated_out  constant-product output
  price_impact   slippage from pool depth (excludes fees)"
    )]
    Quote {
        /// Token to sell (symbol or base-58 mint)
        #[arg(long = "in", value_name = "TOKEN")]
        token_in: String,

        /// Token to receive (symbol or base-58 mint)
        #[arg(long = "out", value_name = "TOKEN")]
        token_out: String,

        /// Amount of the input token (atomic units)
        #[arg(long, value_name = "AMOUNT")]
        amount: u64,

        /// Quote through this pool instead of looking it up by pair
        #[arg(long, value_name = "POOL")]
        pool: Option<String>,
    },

    /// Swap tokens through a pool
    ///
    /// The output token account is created when missing. SOL is wrapped and
    /// unwrapped automatically.
    #[command(
        after_help = "\
EXAMPLES:
  aldrin swap --in USDC --out RIN --amount 10000000
  aldrin swap --in SOL --out USDC --amount 1000000000 --slippage-bps 30
  aldrin swap --in USDC --out RIN --amount 10000000 --min-out 4500000000

  # Pay an integrator fee in the input token after the swap
  aldrin swap --in USDC --out RIN --amount 10000000 \\
    --fee-account <USDC_TOKEN_ACCOUNT> --fee-amount 10000"
    )]
    Swap {
        /// Token to sell (symbol or base-58 mint)
        #[arg(long = "in", value_name = "TOKEN")]
        token_in: String,

        /// Token to receive (symbol or base-58 mint)
        #[arg(long = "out", value_name = "TOKEN")]
        token_out: String,

        /// Amount of the input token to sell (atomic units)
        #[arg(long, value_name = "AMOUNT")]
        amount: u64,

        /// Slippage tolerance on the quoted output, in basis points
        #[arg(long, value_name = "BPS", default_value_t = 50)]
        slippage_bps: u16,

        /// Explicit minimum output; overrides --slippage-bps
        #[arg(long, value_name = "AMOUNT")]
        min_out: Option<u64>,

        /// Swap through this pool instead of looking it up by pair
        #[arg(long, value_name = "POOL")]
        pool: Option<String>,

        /// Input-token account receiving the fee transfer
        #[arg(long, value_name = "ADDRESS", requires = "fee_amount")]
        fee_account: Option<String>,

        /// Fee amount in input-token atomic units
        #[arg(long, value_name = "AMOUNT", requires = "fee_account")]
        fee_amount: Option<u64>,
    },

    /// Deposit base tokens plus the matching quote amount, receive pool tokens
    #[command(
        after_help = "\
EXAMPLES:
  aldrin deposit --pool RIN_USDC --amount 1000000000
  aldrin deposit --pool SOL-USDC --amount 500000000 --slippage-bps 200

NOTES:
  --amount is the base token (first in the pool name). The quote side is
  computed from live reserves and capped by --slippage-bps."
    )]
    Deposit {
        /// Registry name, token pair or pool address
        #[arg(long, value_name = "POOL")]
        pool: String,

        /// Base tokens to deposit (atomic units)
        #[arg(long, value_name = "AMOUNT")]
        amount: u64,

        #[arg(long, value_name = "BPS", default_value_t = 100)]
        slippage_bps: u16,
    },

    /// Burn pool tokens for the proportional base and quote tokens
    #[command(
        after_help = "\
EXAMPLES:
  aldrin withdraw --pool RIN_USDC --lp-amount 1000000
  aldrin withdraw --pool RIN_USDC --lp-amount 1000000 --slippage-bps 50 --json"
    )]
    Withdraw {
        /// Registry name, token pair or pool address
        #[arg(long, value_name = "POOL")]
        pool: String,

        /// Pool tokens to burn (atomic units)
        #[arg(long, value_name = "AMOUNT")]
        lp_amount: u64,

        #[arg(long, value_name = "BPS", default_value_t = 100)]
        slippage_bps: u16,
    },

    /// List farming tickets and claimable rewards
    #[command(
        name = "farming-tickets",
        after_help = "\
EXAMPLES:
  aldrin farming-tickets
  aldrin farming-tickets --pool RIN_USDC --json
  aldrin farming-tickets --owner <WALLET>"
    )]
    FarmingTickets {
        /// Only tickets on this pool
        #[arg(long, value_name = "POOL")]
        pool: Option<String>,

        /// Wallet to inspect; defaults to the keypair's public key
        #[arg(long, value_name = "ADDRESS")]
        owner: Option<String>,
    },

    /// Freeze pool tokens in a new farming ticket
    #[command(
        name = "start-farming",
        after_help = "\
EXAMPLES:
  aldrin start-farming --pool RIN_USDC --amount 1000000"
    )]
    StartFarming {
        #[arg(long, value_name = "POOL")]
        pool: String,

        /// Pool tokens to freeze (atomic units)
        #[arg(long, value_name = "AMOUNT")]
        amount: u64,
    },

    /// End every open farming ticket on a pool
    #[command(
        name = "end-farming",
        after_help = "\
EXAMPLES:
  aldrin end-farming --pool RIN_USDC"
    )]
    EndFarming {
        #[arg(long, value_name = "POOL")]
        pool: String,
    },

    /// Claim the rewards of one farming state
    #[command(
        name = "claim-farmed",
        after_help = "\
EXAMPLES:
  aldrin claim-farmed --pool RIN_USDC --farming-state <STATE>

  # List the pool's farming states first:
  aldrin pool-info --pool RIN_USDC"
    )]
    ClaimFarmed {
        #[arg(long, value_name = "POOL")]
        pool: String,

        #[arg(long, value_name = "ADDRESS")]
        farming_state: String,
    },

    /// List staking tickets
    #[command(
        name = "staking-tickets",
        after_help = "\
EXAMPLES:
  aldrin staking-tickets
  aldrin staking-tickets --all --json"
    )]
    StakingTickets {
        /// Staking pool; discovered automatically when the program has one
        #[arg(long, value_name = "ADDRESS")]
        staking_pool: Option<String>,

        /// Wallet to inspect; defaults to the keypair's public key
        #[arg(long, value_name = "ADDRESS")]
        owner: Option<String>,

        /// Include tickets that have already been closed
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Stake tokens in a new staking ticket
    #[command(
        after_help = "\
EXAMPLES:
  aldrin stake --amount 1000000000"
    )]
    Stake {
        #[arg(long, value_name = "ADDRESS")]
        staking_pool: Option<String>,

        /// Tokens to stake (atomic units)
        #[arg(long, value_name = "AMOUNT")]
        amount: u64,
    },

    /// Close every open staking ticket (one transaction per ticket)
    #[command(
        after_help = "\
EXAMPLES:
  aldrin unstake
  aldrin unstake --json"
    )]
    Unstake {
        #[arg(long, value_name = "ADDRESS")]
        staking_pool: Option<String>,
    },

    /// Claim staking rewards from one farming state
    #[command(
        name = "claim-staking",
        after_help = "\
EXAMPLES:
  aldrin claim-staking --farming-state <STATE>"
    )]
    ClaimStaking {
        #[arg(long, value_name = "ADDRESS")]
        staking_pool: Option<String>,

        #[arg(long, value_name = "ADDRESS")]
        farming_state: String,
    },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // When invoked with no arguments, show banner + full help and exit cleanly.
    if std::env::args().len() == 1 {
        print_banner();
        Cli::command().print_long_help().ok();
        println!();
        return Ok(());
    }

    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "warn" }),
    )
    .init();

    let registry = match &cli.registry {
        Some(path) => PoolRegistry::load(expand_home(path))
            .with_context(|| format!("Cannot load pool registry '{path}'"))?,
        None => PoolRegistry::builtin(),
    };
    let ctx = Ctx {
        client: AldrinClient::new(cli.rpc_url.clone()),
        registry,
        keypair_path: cli.keypair.clone(),
        json: cli.json,
    };
    log::debug!("RPC URL: {}", cli.rpc_url);

    match &cli.command {
        Commands::Pools { base, quote, names } => {
            if *names {
                cmd_pool_names(&ctx)
            } else {
                cmd_pools(&ctx, base.as_deref(), quote.as_deref()).await
            }
        }
        Commands::PoolInfo { pool } => cmd_pool_info(&ctx, pool).await,
        Commands::Price { pool } => cmd_price(&ctx, pool).await,
        Commands::Quote { token_in, token_out, amount, pool } => {
            cmd_quote(&ctx, token_in, token_out, *amount, pool.as_deref()).await
        }
        Commands::Swap {
            token_in, token_out, amount, slippage_bps, min_out, pool, fee_account, fee_amount,
        } => {
            let fee = match (fee_account, fee_amount) {
                (Some(account), Some(amount)) => Some(FeeTransfer {
                    destination: parse_pubkey(account, "--fee-account")?,
                    amount:      *amount,
                }),
                _ => None,
            };
            cmd_swap(
                &ctx, token_in, token_out, *amount, *slippage_bps, *min_out, pool.as_deref(), fee,
            )
            .await
        }
        Commands::Deposit { pool, amount, slippage_bps } => {
            cmd_deposit(&ctx, pool, *amount, *slippage_bps).await
        }
        Commands::Withdraw { pool, lp_amount, slippage_bps } => {
            cmd_withdraw(&ctx, pool, *lp_amount, *slippage_bps).await
        }
        Commands::FarmingTickets { pool, owner } => {
            cmd_farming_tickets(&ctx, pool.as_deref(), owner.as_deref()).await
        }
        Commands::StartFarming { pool, amount } => cmd_start_farming(&ctx, pool, *amount).await,
        Commands::EndFarming { pool } => cmd_end_farming(&ctx, pool).await,
        Commands::ClaimFarmed { pool, farming_state } => {
            cmd_claim_farmed(&ctx, pool, farming_state).await
        }
        Commands::StakingTickets { staking_pool, owner, all } => {
            cmd_staking_tickets(&ctx, staking_pool.as_deref(), owner.as_deref(), *all).await
        }
        Commands::Stake { staking_pool, amount } => {
            cmd_stake(&ctx, staking_pool.as_deref(), *amount).await
        }
        Commands::Unstake { staking_pool } => cmd_unstake(&ctx, staking_pool.as_deref()).await,
        Commands::ClaimStaking { staking_pool, farming_state } => {
            cmd_claim_staking(&ctx, staking_pool.as_deref(), farming_state).await
        }
    }
}

struct Ctx {
    client:       AldrinClient,
    registry:     PoolRegistry,
    keypair_path: String,
    json:         bool,
}

impl Ctx {
    fn wallet(&self) -> Result<Keypair> {
        load_keypair(&self.keypair_path)
    }

    /// `--owner` if given, else the keypair's public key.
    fn owner(&self, owner: Option<&str>) -> Result<Pubkey> {
        match owner {
            Some(o) => parse_pubkey(o, "--owner"),
            None => Ok(self.wallet()?.pubkey()),
        }
    }
}

// ─── pools ────────────────────────────────────────────────────────────────────

fn cmd_pool_names(ctx: &Ctx) -> Result<()> {
    if ctx.json {
        let entries: Vec<_> = ctx
            .registry
            .iter()
            .map(|e| {
                json!({
                    "name":       e.name,
                    "base_mint":  e.base_mint.to_string(),
                    "quote_mint": e.quote_mint.to_string(),
                    "version":    e.version.to_string(),
                    "address":    e.address.map(|a| a.to_string()),
                })
            })
            .collect();
        println!("{}", json!({ "status": "ok", "command": "pools", "pools": entries }));
    } else {
        println!("─── Named Pools ──────────────────────────────────────────────────");
        for e in ctx.registry.iter() {
            let addr = e.address.map(|a| a.to_string()).unwrap_or_else(|| "(by mint pair)".into());
            println!("  {:<12} {}  {:>6}/{:<6} {addr}", e.name, e.version,
                     resolve_symbol(&e.base_mint), resolve_symbol(&e.quote_mint));
        }
    }
    Ok(())
}

async fn cmd_pools(ctx: &Ctx, base: Option<&str>, quote: Option<&str>) -> Result<()> {
    let filter = PoolFilter {
        base_mint:  base.map(resolve_mint).transpose().context("--base")?,
        quote_mint: quote.map(resolve_mint).transpose().context("--quote")?,
    };
    let pools = ctx
        .client
        .pools()
        .get_pools(&filter)
        .await
        .context("Failed to query pools; check your RPC endpoint")?;

    if ctx.json {
        let list: Vec<_> = pools.iter().map(pool_json).collect();
        println!("{}", json!({ "status": "ok", "command": "pools", "count": list.len(), "pools": list }));
    } else {
        println!("─── Pools ({}) ─────────────────────────────────────────────────────", pools.len());
        for p in &pools {
            println!("  {}  {}  {}", p.address, p.version, pool_label(p));
        }
    }
    Ok(())
}

// ─── pool-info ────────────────────────────────────────────────────────────────

async fn cmd_pool_info(ctx: &Ctx, pool_arg: &str) -> Result<()> {
    let pool = resolve_pool(ctx, pool_arg).await?;
    let states = ctx.client.farming().get_farming_states(&pool).await?;
    let s = &pool.state;
    let fees = &s.fees;
    let trade_pct = pct(fees.trade_fee_numerator, fees.trade_fee_denominator);
    let owner_pct = pct(fees.owner_trade_fee_numerator, fees.owner_trade_fee_denominator);

    if ctx.json {
        let farming: Vec<_> = states
            .iter()
            .map(|f| {
                json!({
                    "address":           f.address.to_string(),
                    "tokens_total":      f.state.tokens_total,
                    "tokens_unlocked":   f.state.tokens_unlocked,
                    "tokens_per_period": f.state.tokens_per_period,
                    "period_length":     f.state.period_length,
                    "vault":             f.state.farming_token_vault.to_string(),
                })
            })
            .collect();
        let mut out = pool_json(&pool);
        out["status"] = json!("ok");
        out["command"] = json!("pool-info");
        out["pool_signer"] = json!(s.pool_signer.to_string());
        out["base_vault"] = json!(s.base_token_vault.to_string());
        out["quote_vault"] = json!(s.quote_token_vault.to_string());
        out["trade_fee_pct"] = json!(trade_pct);
        out["owner_fee_pct"] = json!(owner_pct);
        out["stable"] = json!(s.is_stable());
        out["farming_states"] = json!(farming);
        println!("{out}");
    } else {
        println!("─── Pool Info: {} ──────────────────────────────────────────────", pool_label(&pool));
        println!("  Pool             {}  ({})", pool.address, pool.version);
        println!("  Pool mint        {}", s.pool_mint);
        println!("  Pool signer      {}", s.pool_signer);
        println!();
        println!("  Base             {}  ({})", resolve_symbol(&s.base_token_mint), s.base_token_mint);
        println!("  Base vault       {}", s.base_token_vault);
        println!("  Quote            {}  ({})", resolve_symbol(&s.quote_token_mint), s.quote_token_mint);
        println!("  Quote vault      {}", s.quote_token_vault);
        println!();
        println!("  Trade fee        {trade_pct:.3}%");
        println!("  Owner fee        {owner_pct:.3}%");
        if let Some(curve) = &s.curve {
            println!("  Curve            {:?}  ({})", curve.curve_type, curve.curve);
        }
        println!();
        if states.is_empty() {
            println!("  No farming states.");
        }
        for f in &states {
            println!("  Farming state    {}", f.address);
            println!("    Remaining      {:>20}  of {}", f.state.tokens_remaining(), f.state.tokens_total);
            println!("    Per period     {:>20}  every {}s", f.state.tokens_per_period, f.state.period_length);
        }
    }
    Ok(())
}

// ─── price ────────────────────────────────────────────────────────────────────

async fn cmd_price(ctx: &Ctx, pool_arg: &str) -> Result<()> {
    let pool = resolve_pool(ctx, pool_arg).await?;
    let price = ctx.client.pools().get_price(&pool).await?;
    let (base, quote) = symbols(&pool);

    if ctx.json {
        println!("{}", json!({
            "status":         "ok",
            "command":        "price",
            "pool":           pool.address.to_string(),
            "base":           base,
            "quote":          quote,
            "base_reserve":   price.base_reserve,
            "quote_reserve":  price.quote_reserve,
            "base_decimals":  price.base_decimals,
            "quote_decimals": price.quote_decimals,
            "lp_supply":      price.lp_supply,
            "price":          price.price,
        }));
    } else {
        println!("─── Price: {base}/{quote} ────────────────────────────────────────────");
        println!("  Pool             {}", pool.address);
        println!("  Base reserve     {:>20}  {base}", price.base_reserve);
        println!("  Quote reserve    {:>20}  {quote}", price.quote_reserve);
        println!("  LP supply        {:>20}", price.lp_supply);
        if price.base_reserve > 0 {
            println!("  Price            {:.8}  {quote} per {base}", price.price);
        } else {
            println!("  Price            (pool is empty, no liquidity)");
        }
    }
    Ok(())
}

// ─── quote ────────────────────────────────────────────────────────────────────

async fn cmd_quote(
    ctx:       &Ctx,
    token_in:  &str,
    token_out: &str,
    amount:    u64,
    pool_arg:  Option<&str>,
) -> Result<()> {
    let mint_in  = resolve_mint(token_in).context("--in")?;
    let mint_out = resolve_mint(token_out).context("--out")?;
    if amount == 0 {
        bail!("--amount must be > 0 (atomic units)");
    }
    let pool = match pool_arg {
        Some(p) => resolve_pool(ctx, p).await?,
        None => ctx.client.pools().find_pool(&mint_in, &mint_out).await?,
    };
    let q = ctx.client.pools().quote(&pool, &mint_in, amount).await?;
    let (sym_in, sym_out) = (resolve_symbol(&mint_in), resolve_symbol(&mint_out));

    if ctx.json {
        println!("{}", json!({
            "status":           "ok",
            "command":          "quote",
            "pool":             pool.address.to_string(),
            "in":               sym_in,
            "out":              sym_out,
            "amount_in":        q.amount_in,
            "trade_fee":        q.trade_fee,
            "owner_fee":        q.owner_fee,
            "after_fees":       q.after_fees,
            "estimated_out":    q.estimated_out,
            "effective_rate":   q.effective_rate,
            "price_impact_pct": q.price_impact_pct,
            "reserve_in":       q.reserve_in,
            "reserve_out":      q.reserve_out,
        }));
    } else {
        println!("─── Quote: {sym_in} → {sym_out} ─────────────────────────────────────────");
        println!("  Pool             {}", pool.address);
        println!("  Amount in        {:>20}  {sym_in}", q.amount_in);
        println!("  Trade fee        {:>20}", q.trade_fee);
        println!("  Owner fee        {:>20}", q.owner_fee);
        println!("  After fees       {:>20}", q.after_fees);
        println!("  Estimated out    {:>20}  {sym_out}", q.estimated_out);
        println!("  Effective rate   {:.8}", q.effective_rate);
        println!("  Price impact     {:.4}%", q.price_impact_pct);
    }
    Ok(())
}

// ─── swap ─────────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
async fn cmd_swap(
    ctx:          &Ctx,
    token_in:     &str,
    token_out:    &str,
    amount:       u64,
    slippage_bps: u16,
    min_out:      Option<u64>,
    pool_arg:     Option<&str>,
    fee:          Option<FeeTransfer>,
) -> Result<()> {
    let mint_in  = resolve_mint(token_in).context("--in")?;
    let mint_out = resolve_mint(token_out).context("--out")?;
    let wallet   = ctx.wallet()?;
    let pool = match pool_arg {
        Some(p) => Some(resolve_pool(ctx, p).await?.address),
        None => None,
    };

    let result = ctx
        .client
        .pools()
        .swap(&wallet, SwapParams {
            mint_in,
            mint_out,
            amount_in: amount,
            slippage_bps,
            min_amount_out: min_out,
            pool,
            fee,
        })
        .await
        .context("swap failed")?;

    let (sym_in, sym_out) = (resolve_symbol(&mint_in), resolve_symbol(&mint_out));
    if ctx.json {
        println!("{}", json!({
            "status":         "ok",
            "command":        "swap",
            "pool":           result.pool.to_string(),
            "in":             sym_in,
            "out":            sym_out,
            "amount_in":      result.amount_in,
            "estimated_out":  result.estimated_out,
            "min_amount_out": result.min_amount_out,
            "fee":            fee.map(|f| f.amount).unwrap_or(0),
            "tx":             result.signature,
        }));
    } else {
        println!("─── Swapped ──────────────────────────────────────────────────────");
        println!("  Pool             {}", result.pool);
        println!("  Sold             {:>20}  {sym_in}", result.amount_in);
        println!("  Estimated out    {:>20}  {sym_out}", result.estimated_out);
        println!("  Minimum out      {:>20}  {sym_out}", result.min_amount_out);
        if let Some(f) = fee {
            println!("  Fee              {:>20}  {sym_in} → {}", f.amount, f.destination);
        }
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

// ─── deposit / withdraw ───────────────────────────────────────────────────────

async fn cmd_deposit(ctx: &Ctx, pool_arg: &str, amount: u64, slippage_bps: u16) -> Result<()> {
    if amount == 0 {
        bail!("--amount must be > 0 (atomic units of the base token)");
    }
    let wallet = ctx.wallet()?;
    let pool = resolve_pool(ctx, pool_arg).await?;
    let result = ctx
        .client
        .pools()
        .deposit_liquidity(&wallet, DepositParams { pool: pool.address, base_amount: amount, slippage_bps })
        .await
        .context("deposit failed")?;
    let (base, quote) = symbols(&pool);

    if ctx.json {
        println!("{}", json!({
            "status":           "ok",
            "command":          "deposit",
            "pool":             result.pool.to_string(),
            "creation_size":    result.amounts.creation_size,
            "base_token_used":  result.amounts.base_token_used,
            "quote_token_used": result.amounts.quote_token_used,
            "pool_token":       result.pool_token.to_string(),
            "tx":               result.signature,
        }));
    } else {
        println!("─── Liquidity Deposited ──────────────────────────────────────────");
        println!("  Pool             {}  ({base}/{quote})", result.pool);
        println!("  Pool tokens      {:>20}", result.amounts.creation_size);
        println!("  Max {base:<12} {:>20}", result.amounts.base_token_used);
        println!("  Max {quote:<12} {:>20}", result.amounts.quote_token_used);
        println!("  Pool token acct  {}", result.pool_token);
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

async fn cmd_withdraw(ctx: &Ctx, pool_arg: &str, lp_amount: u64, slippage_bps: u16) -> Result<()> {
    let wallet = ctx.wallet()?;
    let pool = resolve_pool(ctx, pool_arg).await?;
    let result = ctx
        .client
        .pools()
        .withdraw_liquidity(&wallet, WithdrawParams { pool: pool.address, lp_amount, slippage_bps })
        .await
        .context("withdraw failed")?;
    let (base, quote) = symbols(&pool);

    if ctx.json {
        println!("{}", json!({
            "status":    "ok",
            "command":   "withdraw",
            "pool":      result.pool.to_string(),
            "lp_amount": lp_amount,
            "base_out":  result.amounts.base_out,
            "quote_out": result.amounts.quote_out,
            "base_min":  result.amounts.base_min,
            "quote_min": result.amounts.quote_min,
            "tx":        result.signature,
        }));
    } else {
        println!("─── Liquidity Withdrawn ──────────────────────────────────────────");
        println!("  Pool             {}  ({base}/{quote})", result.pool);
        println!("  Burned           {:>20}  pool tokens", lp_amount);
        println!("  {base:<16} {:>20}  (min {})", result.amounts.base_out, result.amounts.base_min);
        println!("  {quote:<16} {:>20}  (min {})", result.amounts.quote_out, result.amounts.quote_min);
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

// ─── farming ──────────────────────────────────────────────────────────────────

async fn cmd_farming_tickets(ctx: &Ctx, pool_arg: Option<&str>, owner: Option<&str>) -> Result<()> {
    let owner = ctx.owner(owner)?;
    let pool = match pool_arg {
        Some(p) => Some(resolve_pool(ctx, p).await?),
        None => None,
    };
    let tickets = ctx.client.farming().get_farming_tickets(&owner, pool.as_ref()).await?;
    let calcs = ctx.client.farming().get_farming_calcs(&owner, None).await?;

    if ctx.json {
        let claimable: Vec<_> = calcs
            .iter()
            .map(|c| json!({
                "farming_calc":  c.address.to_string(),
                "farming_state": c.calc.farming_state.to_string(),
                "token_amount":  c.calc.token_amount,
            }))
            .collect();
        println!("{}", json!({
            "status":    "ok",
            "command":   "farming-tickets",
            "owner":     owner.to_string(),
            "tickets":   tickets.iter().map(ticket_json).collect::<Vec<_>>(),
            "claimable": claimable,
        }));
    } else {
        println!("─── Farming Tickets ──────────────────────────────────────────────");
        println!("  Owner            {owner}");
        print_tickets(&tickets);
        for c in &calcs {
            println!("  Claimable        {:>20}  from {}", c.calc.token_amount, c.calc.farming_state);
        }
    }
    Ok(())
}

async fn cmd_start_farming(ctx: &Ctx, pool_arg: &str, amount: u64) -> Result<()> {
    let wallet = ctx.wallet()?;
    let pool = resolve_pool(ctx, pool_arg).await?;
    let result = ctx
        .client
        .farming()
        .start_farming(&wallet, &pool, amount)
        .await
        .context("start-farming failed")?;

    if ctx.json {
        println!("{}", json!({
            "status":  "ok",
            "command": "start-farming",
            "pool":    pool.address.to_string(),
            "ticket":  result.ticket.to_string(),
            "amount":  result.amount,
            "tx":      result.signature,
        }));
    } else {
        println!("─── Farming Started ──────────────────────────────────────────────");
        println!("  Pool             {}  ({})", pool.address, pool_label(&pool));
        println!("  Ticket           {}", result.ticket);
        println!("  Frozen           {:>20}  pool tokens", result.amount);
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

async fn cmd_end_farming(ctx: &Ctx, pool_arg: &str) -> Result<()> {
    let wallet = ctx.wallet()?;
    let pool = resolve_pool(ctx, pool_arg).await?;
    let result = ctx
        .client
        .farming()
        .end_farming(&wallet, &pool)
        .await
        .context("end-farming failed")?;

    if ctx.json {
        println!("{}", json!({
            "status":  "ok",
            "command": "end-farming",
            "pool":    pool.address.to_string(),
            "tickets": result.tickets.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            "txs":     result.signatures,
        }));
    } else {
        println!("─── Farming Ended ────────────────────────────────────────────────");
        println!("  Pool             {}  ({})", pool.address, pool_label(&pool));
        for t in &result.tickets {
            println!("  Ticket           {t}");
        }
        for sig in &result.signatures {
            println!("  Transaction      {sig}");
        }
    }
    Ok(())
}

async fn cmd_claim_farmed(ctx: &Ctx, pool_arg: &str, farming_state: &str) -> Result<()> {
    let wallet = ctx.wallet()?;
    let pool = resolve_pool(ctx, pool_arg).await?;
    let state = parse_pubkey(farming_state, "--farming-state")?;
    let result = ctx
        .client
        .farming()
        .claim_farmed(&wallet, &pool, &state)
        .await
        .context("claim-farmed failed")?;
    print_claim(ctx, "claim-farmed", &result)
}

// ─── staking ──────────────────────────────────────────────────────────────────

async fn cmd_staking_tickets(
    ctx:          &Ctx,
    staking_pool: Option<&str>,
    owner:        Option<&str>,
    all:          bool,
) -> Result<()> {
    let owner = ctx.owner(owner)?;
    let pool = resolve_staking_pool(ctx, staking_pool).await?;
    let staking = ctx.client.staking();
    let tickets = staking.get_staking_tickets(&owner, Some(&pool.address), all).await?;
    let calcs = staking.get_farming_calcs(&owner, None).await?;
    let staked: u64 = tickets.iter().filter(|t| t.ticket.is_open()).map(|t| t.ticket.tokens_frozen).sum();

    if ctx.json {
        println!("{}", json!({
            "status":       "ok",
            "command":      "staking-tickets",
            "owner":        owner.to_string(),
            "staking_pool": pool.address.to_string(),
            "staked":       staked,
            "tickets":      tickets.iter().map(ticket_json).collect::<Vec<_>>(),
            "claimable":    calcs.iter().map(|c| c.calc.token_amount).sum::<u64>(),
        }));
    } else {
        println!("─── Staking Tickets ──────────────────────────────────────────────");
        println!("  Owner            {owner}");
        println!("  Staking pool     {}", pool.address);
        println!("  Staked           {:>20}  {}", staked, resolve_symbol(&pool.pool.staking_mint));
        print_tickets(&tickets);
    }
    Ok(())
}

async fn cmd_stake(ctx: &Ctx, staking_pool: Option<&str>, amount: u64) -> Result<()> {
    let wallet = ctx.wallet()?;
    let pool = resolve_staking_pool(ctx, staking_pool).await?;
    let result = ctx
        .client
        .staking()
        .start_staking(&wallet, &pool.address, amount)
        .await
        .context("stake failed")?;

    if ctx.json {
        println!("{}", json!({
            "status":       "ok",
            "command":      "stake",
            "staking_pool": pool.address.to_string(),
            "ticket":       result.ticket.to_string(),
            "amount":       result.amount,
            "tx":           result.signature,
        }));
    } else {
        println!("─── Staked ───────────────────────────────────────────────────────");
        println!("  Staking pool     {}", pool.address);
        println!("  Ticket           {}", result.ticket);
        println!("  Amount           {:>20}  {}", result.amount, resolve_symbol(&pool.pool.staking_mint));
        println!("  Transaction      {}", result.signature);
    }
    Ok(())
}

async fn cmd_unstake(ctx: &Ctx, staking_pool: Option<&str>) -> Result<()> {
    let wallet = ctx.wallet()?;
    let pool = resolve_staking_pool(ctx, staking_pool).await?;
    let result = ctx
        .client
        .staking()
        .end_staking(&wallet, &pool.address)
        .await
        .context("unstake failed")?;

    if ctx.json {
        println!("{}", json!({
            "status":       "ok",
            "command":      "unstake",
            "staking_pool": pool.address.to_string(),
            "tickets":      result.tickets.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            "txs":          result.signatures,
        }));
    } else {
        println!("─── Unstaked ─────────────────────────────────────────────────────");
        println!("  Staking pool     {}", pool.address);
        for (ticket, sig) in result.tickets.iter().zip(&result.signatures) {
            println!("  Ticket           {ticket}");
            println!("    Transaction    {sig}");
        }
    }
    Ok(())
}

async fn cmd_claim_staking(ctx: &Ctx, staking_pool: Option<&str>, farming_state: &str) -> Result<()> {
    let wallet = ctx.wallet()?;
    let pool = resolve_staking_pool(ctx, staking_pool).await?;
    let state = parse_pubkey(farming_state, "--farming-state")?;
    let result = ctx
        .client
        .staking()
        .claim_staking_rewards(&wallet, &pool.address, &state)
        .await
        .context("claim-staking failed")?;
    print_claim(ctx, "claim-staking", &result)
}

// ─── Shared utilities ─────────────────────────────────────────────────────────

/// Resolve `--pool`: a base-58 address, a registry name (`RIN_USDC`) or a
/// token pair (`RIN-USDC`).
async fn resolve_pool(ctx: &Ctx, arg: &str) -> Result<PoolInfo> {
    let pools = ctx.client.pools();
    if let Ok(address) = Pubkey::from_str(arg) {
        return pools
            .get_pool(&address)
            .await
            .with_context(|| format!("Cannot load pool account {address}"));
    }
    if ctx.registry.get(arg).is_some() {
        return pools
            .pool_by_name(&ctx.registry, arg)
            .await
            .with_context(|| format!("Pool '{arg}' not found on-chain"));
    }
    if let Some((a, b)) = arg.split_once('-') {
        let mint_a = resolve_mint(a).context("pair: token A")?;
        let mint_b = resolve_mint(b).context("pair: token B")?;
        return pools
            .find_pool(&mint_a, &mint_b)
            .await
            .with_context(|| format!("No pool found for pair '{arg}'"));
    }
    Err(anyhow!(
        "Unknown pool '{arg}'.\n  \
         Use a registry name ({}), a token pair like RIN-USDC, or a pool address.\n  \
         Run `aldrin pools --names` to list the registry.",
        ctx.registry.names().join(", ")
    ))
}

/// `--staking-pool` if given; otherwise the program's only staking pool.
async fn resolve_staking_pool(ctx: &Ctx, arg: Option<&str>) -> Result<StakingPoolInfo> {
    let staking = ctx.client.staking();
    if let Some(a) = arg {
        let address = parse_pubkey(a, "--staking-pool")?;
        return staking
            .get_staking_pool(&address)
            .await
            .with_context(|| format!("Cannot load staking pool {address}"));
    }
    let mut pools = staking.get_staking_pools().await.context("Failed to query staking pools")?;
    match pools.len() {
        1 => Ok(pools.remove(0)),
        0 => bail!("No staking pool found on the staking program."),
        n => bail!(
            "{n} staking pools found; pass --staking-pool with one of:\n  {}",
            pools.iter().map(|p| p.address.to_string()).collect::<Vec<_>>().join("\n  ")
        ),
    }
}

fn print_claim(ctx: &Ctx, command: &str, result: &aldrin_sdk::ClaimResult) -> Result<()> {
    if ctx.json {
        println!("{}", json!({
            "status":        "ok",
            "command":       command,
            "farming_state": result.farming_state.to_string(),
            "farming_calc":  result.farming_calc.to_string(),
            "destination":   result.destination.to_string(),
            "txs":           result.signatures,
        }));
    } else {
        println!("─── Rewards Claimed ──────────────────────────────────────────────");
        println!("  Farming state    {}", result.farming_state);
        println!("  Farming calc     {}", result.farming_calc);
        println!("  Paid to          {}", result.destination);
        for sig in &result.signatures {
            println!("  Transaction      {sig}");
        }
    }
    Ok(())
}

fn print_tickets(tickets: &[FarmingTicketInfo]) {
    if tickets.is_empty() {
        println!();
        println!("  No tickets.");
        return;
    }
    for t in tickets {
        let status = if t.ticket.is_open() { "open" } else { "closed" };
        println!();
        println!("  Ticket           {}  ({status})", t.address);
        println!("    Pool           {}", t.ticket.pool);
        println!("    Frozen         {:>20}", t.ticket.tokens_frozen);
        println!("    Started        {}", t.ticket.start_time);
        for s in &t.ticket.states_attached {
            println!("    Attached       {}", s.farming_state);
        }
    }
}

fn ticket_json(t: &FarmingTicketInfo) -> serde_json::Value {
    json!({
        "address":       t.address.to_string(),
        "pool":          t.ticket.pool.to_string(),
        "tokens_frozen": t.ticket.tokens_frozen,
        "start_time":    t.ticket.start_time,
        "open":          t.ticket.is_open(),
        "states":        t.ticket.states_attached.iter().map(|s| s.farming_state.to_string()).collect::<Vec<_>>(),
    })
}

fn pool_json(p: &PoolInfo) -> serde_json::Value {
    let (base, quote) = symbols(p);
    json!({
        "pool":       p.address.to_string(),
        "version":    p.version.to_string(),
        "base":       base,
        "quote":      quote,
        "base_mint":  p.state.base_token_mint.to_string(),
        "quote_mint": p.state.quote_token_mint.to_string(),
        "pool_mint":  p.state.pool_mint.to_string(),
    })
}

fn symbols(p: &PoolInfo) -> (String, String) {
    (resolve_symbol(&p.state.base_token_mint), resolve_symbol(&p.state.quote_token_mint))
}

/// `"BASE/QUOTE"` for display.
fn pool_label(p: &PoolInfo) -> String {
    let (base, quote) = symbols(p);
    format!("{base}/{quote}")
}

fn pct(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

fn parse_pubkey(s: &str, flag: &str) -> Result<Pubkey> {
    Pubkey::from_str(s).map_err(|_| anyhow!("{flag}: '{s}' is not a base-58 address"))
}

/// Expand `~/` to `$HOME/` in file paths.
fn expand_home(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => format!("{}/{rest}", std::env::var("HOME").unwrap_or_default()),
        None => path.to_string(),
    }
}

fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded = expand_home(path);
    read_keypair_file(&expanded).map_err(|e| {
        anyhow!(
            "Cannot load keypair from '{}': {}\n  \
             Set ALDRIN_KEYPAIR or pass --keypair to specify a different path.",
            expanded,
            e
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_swap_with_fee() {
        let cli = Cli::try_parse_from([
            "aldrin", "swap", "--in", "USDC", "--out", "RIN", "--amount", "100",
            "--fee-account", "11111111111111111111111111111111", "--fee-amount", "5", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Swap { amount, slippage_bps, fee_amount, .. } => {
                assert_eq!(amount, 100);
                assert_eq!(slippage_bps, 50);
                assert_eq!(fee_amount, Some(5));
            }
            _ => panic!("expected swap"),
        }
    }

    #[test]
    fn fee_flags_come_in_pairs() {
        let res = Cli::try_parse_from([
            "aldrin", "swap", "--in", "USDC", "--out", "RIN", "--amount", "1", "--fee-amount", "5",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn home_is_expanded() {
        std::env::set_var("HOME", "/home/test");
        assert_eq!(expand_home("~/id.json"), "/home/test/id.json");
        assert_eq!(expand_home("/abs/id.json"), "/abs/id.json");
    }

    #[test]
    fn fee_percentages() {
        assert!((pct(25, 10_000) - 0.25).abs() < 1e-12);
        assert_eq!(pct(5, 0), 0.0);
    }
}
