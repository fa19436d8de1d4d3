//! Aldrin Rust SDK: integration example
//!
//! Demonstrates: quote, swap, liquidity, farming and staking reads.
//!
//! # Setup
//!
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! aldrin-sdk = { path = "../packages/sdk-rust" }
//! solana-sdk = "2.2"
//! tokio      = { version = "1", features = ["full"] }
//! ```
//!
//! # Environment
//!
//! ```bash
//! export ALDRIN_RPC_URL="https://api.mainnet-beta.solana.com"
//! export ALDRIN_KEYPAIR="$HOME/.config/solana/id.json"
//! ```

use aldrin_sdk::{
    registry::{resolve_symbol, RIN_MINT, USDC_MINT},
    AldrinClient, DepositParams, PoolRegistry, SwapParams,
};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn rpc_url() -> String {
    std::env::var("ALDRIN_RPC_URL")
        .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".into())
}

fn load_keypair() -> Keypair {
    let path = std::env::var("ALDRIN_KEYPAIR")
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/.config/solana/id.json")
        });
    read_keypair_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load keypair from {path}: {e}"))
}

// ─── Example 1: Quote a swap ──────────────────────────────────────────────────

/// Fee and slippage breakdown before spending any funds. Read-only.
async fn example_quote(client: &AldrinClient, registry: &PoolRegistry) {
    println!("\n── Quote: 10 USDC → RIN ─────────────────────────────────────");

    let pool = client
        .pools()
        .pool_by_name(registry, "RIN_USDC")
        .await
        .expect("pool lookup failed");
    let q = client
        .pools()
        .quote(&pool, &USDC_MINT, 10_000_000)
        .await
        .expect("quote failed");

    println!("  Pool:           {}", pool.address);
    println!("  Amount in:      {}", q.amount_in);
    println!("  Trade fee:      {}", q.trade_fee);
    println!("  Owner fee:      {}", q.owner_fee);
    println!("  After fees:     {}", q.after_fees);
    println!("  Estimated out:  {}", q.estimated_out);
    println!("  Price impact:   {:.3}%", q.price_impact_pct);
}

// ─── Example 2: Price (read-only) ─────────────────────────────────────────────

async fn example_price(client: &AldrinClient) {
    println!("\n── Price: RIN/USDC ──────────────────────────────────────────");

    let pool  = client.pools().find_pool(&RIN_MINT, &USDC_MINT).await.expect("find_pool failed");
    let price = client.pools().get_price(&pool).await.expect("get_price failed");

    println!("  Base reserve:   {}", price.base_reserve);
    println!("  Quote reserve:  {}", price.quote_reserve);
    println!("  LP supply:      {}", price.lp_supply);
    println!("  Spot price:     {:.6}", price.price);
}

// ─── Example 3: Swap ──────────────────────────────────────────────────────────

/// Swap 10 USDC for RIN with 1% max slippage.
async fn example_swap(client: &AldrinClient, payer: &Keypair) {
    println!("\n── Swap: 10 USDC → RIN ──────────────────────────────────────");

    let result = client
        .pools()
        .swap(payer, SwapParams {
            mint_in:        USDC_MINT,
            mint_out:       RIN_MINT,
            amount_in:      10_000_000,
            slippage_bps:   100,
            min_amount_out: None,
            pool:           None,
            fee:            None,
        })
        .await
        .expect("swap failed");

    println!("  Signature:     {}", result.signature);
    println!("  Estimated out: {}", result.estimated_out);
    println!("  Min out:       {}", result.min_amount_out);
}

// ─── Example 4: Deposit and farm ──────────────────────────────────────────────

/// Deposit 1 RIN (plus matching USDC), then freeze the pool tokens received.
async fn example_deposit_and_farm(client: &AldrinClient, registry: &PoolRegistry, payer: &Keypair) {
    println!("\n── Deposit + farm: RIN/USDC ─────────────────────────────────");

    let pool = client.pools().pool_by_name(registry, "RIN_USDC").await.expect("pool lookup failed");
    let deposit = client
        .pools()
        .deposit_liquidity(payer, DepositParams {
            pool:         pool.address,
            base_amount:  1_000_000_000,
            slippage_bps: 100,
        })
        .await
        .expect("deposit failed");
    println!("  Deposit tx:    {}", deposit.signature);
    println!("  Pool tokens:   {}", deposit.amounts.creation_size);

    let farm = client
        .farming()
        .start_farming(payer, &pool, deposit.amounts.creation_size)
        .await
        .expect("start_farming failed");
    println!("  Ticket:        {}", farm.ticket);
    println!("  Farming tx:    {}", farm.signature);
}

// ─── Example 5: Tickets and rewards ───────────────────────────────────────────

async fn example_positions(client: &AldrinClient, owner: &Pubkey) {
    println!("\n── Farming and staking positions ────────────────────────────");

    let tickets = client
        .farming()
        .get_farming_tickets(owner, None)
        .await
        .expect("get_farming_tickets failed");
    for t in tickets.iter().filter(|t| t.ticket.is_open()) {
        println!("  farm  {} | pool {} | frozen {}", t.address, t.ticket.pool, t.ticket.tokens_frozen);
    }

    let staking_pools = client.staking().get_staking_pools().await.expect("get_staking_pools failed");
    for pool in &staking_pools {
        let tickets = client
            .staking()
            .get_staking_tickets(owner, Some(&pool.address), false)
            .await
            .expect("get_staking_tickets failed");
        let staked: u64 = tickets.iter().map(|t| t.ticket.tokens_frozen).sum();
        println!("  stake {} | {} {}", pool.address, staked, resolve_symbol(&pool.pool.staking_mint));
    }
}

// ─── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let client   = AldrinClient::new(rpc_url());
    let registry = PoolRegistry::builtin();
    let payer    = load_keypair();

    println!("Aldrin Rust SDK example");
    println!("Wallet:   {}", payer.pubkey());
    println!("Pools v1: {}", client.config().pools_program_id);

    // ── Read-only (no funds required) ─────────────────────────────────────
    example_quote(&client, &registry).await;
    example_price(&client).await;
    example_positions(&client, &payer.pubkey()).await;

    // ── Write operations (requires funded wallet) ─────────────────────────
    // Uncomment to execute on-chain:

    // example_swap(&client, &payer).await;
    // example_deposit_and_farm(&client, &registry, &payer).await;
}
