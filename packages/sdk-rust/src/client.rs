//! [`AldrinClient`], the main entry point, and the shared RPC base its
//! services run on.

use std::sync::Arc;

use log::{debug, info};
use solana_account_decoder_client_types::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType},
};
use solana_sdk::{
    account::Account,
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::{Signature, Signer},
    transaction::Transaction,
};

use crate::{
    config::ClientConfig,
    error::{Error, Result},
    farming::FarmingService,
    instructions::{derive_ata, TOKEN_ACCOUNT_LEN},
    pools::PoolService,
    registry::WSOL_MINT,
    staking::StakingService,
    state::{parse_mint_supply, parse_token_amount},
    transaction::{transaction_size, TransactionPlan},
};

// ─── Base client ──────────────────────────────────────────────────────────────

/// RPC access shared by every service: account reads, filtered program
/// queries, and signing + submission of a [`TransactionPlan`].
pub struct BaseClient {
    rpc:    Arc<RpcClient>,
    config: ClientConfig,
}

impl BaseClient {
    pub fn new(rpc: Arc<RpcClient>, config: ClientConfig) -> Self {
        Self { rpc, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch an account; a missing account is [`Error::AccountNotFound`].
    pub async fn account(&self, key: &Pubkey) -> Result<Account> {
        self.rpc
            .get_account_with_commitment(key, self.config.commitment)
            .await?
            .value
            .ok_or(Error::AccountNotFound(*key))
    }

    /// Existence flag for each key, in order, from one `getMultipleAccounts` call.
    pub async fn accounts_exist(&self, keys: &[Pubkey]) -> Result<Vec<bool>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let accounts = self.rpc.get_multiple_accounts(keys).await?;
        Ok(accounts.iter().map(Option::is_some).collect())
    }

    pub async fn account_exists(&self, key: &Pubkey) -> Result<bool> {
        Ok(self.accounts_exist(std::slice::from_ref(key)).await?[0])
    }

    /// `getProgramAccounts` restricted to accounts of `data_size` bytes that
    /// match every `(offset, bytes)` memcmp filter.
    pub async fn program_accounts(
        &self,
        program_id: &Pubkey,
        data_size:  u64,
        memcmp:     &[(usize, &[u8])],
    ) -> Result<Vec<(Pubkey, Account)>> {
        let mut filters = vec![RpcFilterType::DataSize(data_size)];
        filters.extend(memcmp.iter().map(|(offset, bytes)| {
            RpcFilterType::Memcmp(Memcmp::new(*offset, MemcmpEncodedBytes::Bytes(bytes.to_vec())))
        }));

        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding:   Some(UiAccountEncoding::Base64),
                commitment: Some(self.config.commitment),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        let accounts = self.rpc.get_program_accounts_with_config(program_id, config).await?;
        debug!(
            "getProgramAccounts {program_id} size={data_size} filters={} -> {} accounts",
            memcmp.len(),
            accounts.len()
        );
        Ok(accounts)
    }

    /// Raw `amount` of an SPL token account.
    pub async fn token_balance(&self, key: &Pubkey) -> Result<u64> {
        parse_token_amount(&self.account(key).await?.data)
    }

    /// `(supply, decimals)` of an SPL mint.
    pub async fn mint_info(&self, mint: &Pubkey) -> Result<(u64, u8)> {
        parse_mint_supply(&self.account(mint).await?.data)
    }

    /// Lamports a token account needs to be rent exempt.
    pub async fn token_account_rent(&self) -> Result<u64> {
        Ok(self
            .rpc
            .get_minimum_balance_for_rent_exemption(TOKEN_ACCOUNT_LEN as usize)
            .await?)
    }

    /// Wallet token account that pays `amount` of `mint` in `plan`; see
    /// [`TransactionPlan::source_account`].
    pub async fn source_token_account(
        &self,
        plan:   &mut TransactionPlan,
        wallet: &Pubkey,
        mint:   &Pubkey,
        amount: u64,
    ) -> Result<Pubkey> {
        let exists = self.account_exists(&derive_ata(wallet, mint)).await?;
        let rent = if *mint == WSOL_MINT && !exists { self.token_account_rent().await? } else { 0 };
        plan.source_account(wallet, mint, amount, exists, rent)
    }

    /// Wallet token account that receives `mint` in `plan`; see
    /// [`TransactionPlan::destination_account`].
    pub async fn destination_token_account(
        &self,
        plan:   &mut TransactionPlan,
        wallet: &Pubkey,
        mint:   &Pubkey,
    ) -> Result<Pubkey> {
        if *mint == WSOL_MINT {
            let rent = self.token_account_rent().await?;
            return plan.destination_account(wallet, mint, false, rent);
        }
        let exists = self.account_exists(&derive_ata(wallet, mint)).await?;
        plan.destination_account(wallet, mint, exists, 0)
    }

    /// Sign `plan` with `wallet` (fee payer) plus the plan's own keypairs and
    /// submit it, waiting for confirmation.
    pub async fn send(&self, plan: &TransactionPlan, wallet: &(dyn Signer + Sync)) -> Result<Signature> {
        let instructions = plan.instructions();
        if instructions.is_empty() {
            return Err(Error::InvalidArgument("transaction has no instructions".into()));
        }
        let payer = wallet.pubkey();
        let size = transaction_size(&instructions, &payer);
        if size > PACKET_DATA_SIZE {
            return Err(Error::TransactionTooLarge { size, limit: PACKET_DATA_SIZE });
        }
        debug!(
            "sending {} instructions ({size} bytes, {} extra signers) for {payer}",
            instructions.len(),
            plan.signers().len(),
        );

        let blockhash = self.rpc.get_latest_blockhash().await?;
        let tx = {
            let mut signers: Vec<&dyn Signer> = Vec::with_capacity(plan.signers().len() + 1);
            signers.push(wallet);
            signers.extend(plan.signers().iter().map(|k| k as &dyn Signer));
            Transaction::new_signed_with_payer(&instructions, Some(&payer), &signers, blockhash)
        };
        let signature = self.rpc.send_and_confirm_transaction(&tx).await?;
        info!("transaction confirmed: {signature}");
        Ok(signature)
    }

    /// Split `plan` into packet-sized transactions and send them one after
    /// another. Stops at the first failure; earlier transactions stay landed.
    pub async fn send_batches(
        &self,
        plan:   TransactionPlan,
        wallet: &(dyn Signer + Sync),
    ) -> Result<Vec<Signature>> {
        let batches = plan.into_batches(&wallet.pubkey())?;
        if batches.len() > 1 {
            debug!("plan split into {} transactions", batches.len());
        }
        let mut signatures = Vec::with_capacity(batches.len());
        for batch in &batches {
            signatures.push(self.send(batch, wallet).await?);
        }
        Ok(signatures)
    }
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async Aldrin client for Solana.
///
/// ```rust,no_run
/// # use aldrin_sdk::{AldrinClient, PoolRegistry};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client   = AldrinClient::mainnet();
/// let registry = PoolRegistry::builtin();
/// let pool     = client.pools().pool_by_name(&registry, "RIN_USDC").await?;
/// let price    = client.pools().get_price(&pool).await?;
/// println!("RIN/USDC: {:.4}", price.price);
/// # Ok(())
/// # }
/// ```
pub struct AldrinClient {
    base:    Arc<BaseClient>,
    pools:   PoolService,
    farming: FarmingService,
    staking: StakingService,
}

impl AldrinClient {
    /// Create a client pointing at any RPC endpoint.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::mainnet().with_rpc_url(rpc_url))
    }

    /// Pre-configured client for Solana mainnet-beta.
    pub fn mainnet() -> Self {
        Self::with_config(ClientConfig::mainnet())
    }

    /// Pre-configured client for Solana devnet.
    pub fn devnet() -> Self {
        Self::with_config(ClientConfig::devnet())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let rpc = Arc::new(RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment));
        Self::from_rpc(rpc, config)
    }

    /// Build on an existing RPC client; `config.rpc_url` is informational only.
    pub fn from_rpc(rpc: Arc<RpcClient>, config: ClientConfig) -> Self {
        let base = Arc::new(BaseClient::new(rpc, config));
        Self {
            pools:   PoolService::new(base.clone()),
            farming: FarmingService::new(base.clone()),
            staking: StakingService::new(base.clone()),
            base,
        }
    }

    pub fn pools(&self) -> &PoolService {
        &self.pools
    }

    pub fn farming(&self) -> &FarmingService {
        &self.farming
    }

    pub fn staking(&self) -> &StakingService {
        &self.staking
    }

    pub fn base(&self) -> &BaseClient {
        &self.base
    }

    pub fn config(&self) -> &ClientConfig {
        self.base.config()
    }
}
