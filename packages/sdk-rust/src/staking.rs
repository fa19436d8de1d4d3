//! Single-token staking on the staking program.
//!
//! Staking tickets and reward states share the farming layouts and
//! instructions; the staking pool takes the place of the AMM pool.

use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, info, warn};
use solana_sdk::{pubkey::Pubkey, signature::Signer};

use crate::{
    client::BaseClient,
    error::{Error, Result},
    farming::{self, FarmingTarget},
    instructions::derive_ata,
    state::{parse_staking_pool, STAKING_POOL_LEN},
    transaction::TransactionPlan,
    types::{
        ClaimResult, EndStakingResult, FarmingCalcInfo, FarmingStateInfo, FarmingTicketInfo,
        StakingPoolInfo, StartFarmingResult,
    },
};

pub struct StakingService {
    base: Arc<BaseClient>,
}

impl StakingService {
    pub fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    fn program_id(&self) -> Pubkey {
        self.base.config().staking_program_id
    }

    // ── Read operations ───────────────────────────────────────────────────────

    /// Every staking pool account of the staking program.
    pub async fn get_staking_pools(&self) -> Result<Vec<StakingPoolInfo>> {
        let raw = self
            .base
            .program_accounts(&self.program_id(), STAKING_POOL_LEN as u64, &[])
            .await?;
        let mut out = Vec::with_capacity(raw.len());
        for (address, account) in raw {
            match parse_staking_pool(&account.data) {
                Ok(pool) => out.push(StakingPoolInfo { address, pool }),
                Err(e)   => warn!("skipping malformed staking pool {address}: {e}"),
            }
        }
        Ok(out)
    }

    pub async fn get_staking_pool(&self, address: &Pubkey) -> Result<StakingPoolInfo> {
        let account = self.base.account(address).await?;
        if account.owner != self.program_id() {
            return Err(Error::InvalidAccountOwner {
                account:  *address,
                expected: self.program_id().to_string(),
                actual:   account.owner,
            });
        }
        Ok(StakingPoolInfo { address: *address, pool: parse_staking_pool(&account.data)? })
    }

    /// Reward schedules attached to a staking pool.
    pub async fn get_farming_states(&self, staking_pool: &Pubkey) -> Result<Vec<FarmingStateInfo>> {
        farming::query_farming_states(&self.base, &self.program_id(), staking_pool).await
    }

    /// Staking tickets of `owner`. Closed tickets are dropped unless
    /// `include_closed` is set.
    pub async fn get_staking_tickets(
        &self,
        owner:          &Pubkey,
        staking_pool:   Option<&Pubkey>,
        include_closed: bool,
    ) -> Result<Vec<FarmingTicketInfo>> {
        let mut tickets = farming::query_tickets(&self.base, &self.program_id(), owner, staking_pool).await?;
        if !include_closed {
            tickets.retain(|t| t.ticket.is_open());
        }
        Ok(tickets)
    }

    pub async fn get_farming_calcs(
        &self,
        owner:         &Pubkey,
        farming_state: Option<&Pubkey>,
    ) -> Result<Vec<FarmingCalcInfo>> {
        farming::query_calcs(&self.base, &self.program_id(), owner, farming_state).await
    }

    /// Rewards already computed into `owner`'s calcs for `farming_state`.
    pub async fn claimable(&self, owner: &Pubkey, farming_state: &Pubkey) -> Result<u64> {
        Ok(self
            .get_farming_calcs(owner, Some(farming_state))
            .await?
            .iter()
            .map(|c| c.calc.token_amount)
            .sum())
    }

    // ── Write operations ──────────────────────────────────────────────────────

    /// Stake `amount` tokens in a new ticket.
    pub async fn start_staking(
        &self,
        wallet:       &(dyn Signer + Sync),
        staking_pool: &Pubkey,
        amount:       u64,
    ) -> Result<StartFarmingResult> {
        let pool = self.get_staking_pool(staking_pool).await?;
        let target = FarmingTarget::for_staking(&pool, self.base.config());
        farming::start(&self.base, &target, wallet, amount).await
    }

    /// Close every open staking ticket of the wallet.
    ///
    /// Each ticket is ended in its own transaction and all of them are
    /// submitted concurrently. There is no ordering between them; the first
    /// failure is returned and tickets already closed stay closed.
    pub async fn end_staking(
        &self,
        wallet:       &(dyn Signer + Sync),
        staking_pool: &Pubkey,
    ) -> Result<EndStakingResult> {
        let owner = wallet.pubkey();
        let pool = self.get_staking_pool(staking_pool).await?;
        let target = FarmingTarget::for_staking(&pool, self.base.config());

        let tickets = self.get_staking_tickets(&owner, Some(staking_pool), false).await?;
        if tickets.is_empty() {
            return Err(Error::NoStakingTickets);
        }
        let states = self.get_farming_states(staking_pool).await?;

        let exists = self.base.account_exists(&derive_ata(&owner, &target.token_mint)).await?;
        let plans = unstake_plans(&target, &tickets, &states, &owner, exists)?;
        if let Some(setup) = &plans.setup {
            let sig = self.base.send(setup, wallet).await?;
            debug!("created staking token account {}: {sig}", plans.user_token);
        }

        let signatures =
            try_join_all(plans.tickets.iter().map(|plan| self.base.send(plan, wallet))).await?;
        info!("closed {} staking tickets on {staking_pool}", signatures.len());

        Ok(EndStakingResult {
            signatures: signatures.iter().map(|s| s.to_string()).collect(),
            tickets:    tickets.iter().map(|t| t.address).collect(),
        })
    }

    /// Claim the rewards of one farming state of a staking pool.
    pub async fn claim_staking_rewards(
        &self,
        wallet:        &(dyn Signer + Sync),
        staking_pool:  &Pubkey,
        farming_state: &Pubkey,
    ) -> Result<ClaimResult> {
        let pool = self.get_staking_pool(staking_pool).await?;
        let target = FarmingTarget::for_staking(&pool, self.base.config());
        farming::claim(&self.base, &target, wallet, farming_state).await
    }
}

/// Transactions behind one `end_staking` call.
struct UnstakePlans {
    /// Creates the staking-token account; sent alone before the tickets.
    setup:      Option<TransactionPlan>,
    user_token: Pubkey,
    /// One `end_farming` per ticket, independent of each other.
    tickets:    Vec<TransactionPlan>,
}

fn unstake_plans(
    target:     &FarmingTarget,
    tickets:    &[FarmingTicketInfo],
    states:     &[FarmingStateInfo],
    owner:      &Pubkey,
    ata_exists: bool,
) -> Result<UnstakePlans> {
    let mut setup = TransactionPlan::new();
    let user_token = setup.ata_if_missing(owner, &target.token_mint, ata_exists);

    let mut plans = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        let mut plan = TransactionPlan::new();
        plan.push_action(farming::end_ticket_ix(target, ticket, states, &user_token, owner)?);
        plans.push(plan);
    }

    Ok(UnstakePlans {
        setup: (!setup.is_empty()).then_some(setup),
        user_token,
        tickets: plans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::registry::STAKING_PROGRAM_ID;
    use crate::instructions::sighash;
    use crate::state::{
        FarmingState, FarmingStateAttached, FarmingTicket, StakingPool, OPEN_TICKET_END_TIME,
    };

    fn target() -> FarmingTarget {
        FarmingTarget {
            program_id:   STAKING_PROGRAM_ID,
            pool:         Pubkey::new_unique(),
            pool_signer:  Pubkey::new_unique(),
            freeze_vault: Pubkey::new_unique(),
            token_mint:   Pubkey::new_unique(),
        }
    }

    fn reward_state(pool: &Pubkey) -> FarmingStateInfo {
        FarmingStateInfo {
            address: Pubkey::new_unique(),
            state: FarmingState {
                tokens_unlocked:     0,
                tokens_per_period:   1,
                tokens_total:        100,
                period_length:       86_400,
                no_withdrawal_time:  0,
                vesting_type:        0,
                vesting_period:      0,
                start_time:          0,
                current_time:        0,
                pool:                *pool,
                farming_token_vault: Pubkey::new_unique(),
                farming_snapshots:   Pubkey::new_unique(),
            },
        }
    }

    fn stake(pool: &Pubkey, state: &Pubkey, owner: &Pubkey) -> FarmingTicketInfo {
        FarmingTicketInfo {
            address: Pubkey::new_unique(),
            ticket: FarmingTicket {
                tokens_frozen: 1_000,
                start_time:    1,
                end_time:      OPEN_TICKET_END_TIME,
                user_key:      *owner,
                pool:          *pool,
                states_attached: vec![FarmingStateAttached {
                    farming_state: *state,
                    last_withdraw_time: 0,
                    last_vested_withdraw_time: 0,
                }],
            },
        }
    }

    #[test]
    fn unstake_creates_missing_account_first_then_one_tx_per_ticket() {
        let t = target();
        let owner = Pubkey::new_unique();
        let s = reward_state(&t.pool);
        let tickets: Vec<_> = (0..3).map(|_| stake(&t.pool, &s.address, &owner)).collect();

        let plans = unstake_plans(&t, &tickets, &[s.clone()], &owner, false).unwrap();
        assert_eq!(plans.user_token, derive_ata(&owner, &t.token_mint));
        let setup = plans.setup.expect("missing account is created up front");
        assert_eq!(setup.len(), 1);
        assert_eq!(setup.instructions()[0].program_id, spl_associated_token_account::ID);

        assert_eq!(plans.tickets.len(), tickets.len());
        for (plan, ticket) in plans.tickets.iter().zip(&tickets) {
            let ixs = plan.instructions();
            assert_eq!(ixs.len(), 1);
            assert_eq!(&ixs[0].data[..8], &sighash("end_farming"));
            assert_eq!(ixs[0].accounts[1].pubkey, s.address);
            assert_eq!(ixs[0].accounts[3].pubkey, ticket.address);
            assert_eq!(ixs[0].accounts[6].pubkey, plans.user_token);
        }
    }

    #[test]
    fn unstake_skips_setup_when_account_exists() {
        let t = target();
        let owner = Pubkey::new_unique();
        let s = reward_state(&t.pool);
        let tickets = [stake(&t.pool, &s.address, &owner)];

        let plans = unstake_plans(&t, &tickets, &[s], &owner, true).unwrap();
        assert!(plans.setup.is_none());
        assert_eq!(plans.tickets.len(), 1);

        assert!(matches!(
            unstake_plans(&t, &tickets, &[], &owner, true),
            Err(Error::FarmingStateNotFound(p)) if p == t.pool
        ));
    }

    #[test]
    fn staking_target_uses_vault_and_mint() {
        let info = StakingPoolInfo {
            address: Pubkey::new_unique(),
            pool: StakingPool {
                staking_mint:      Pubkey::new_unique(),
                staking_vault:     Pubkey::new_unique(),
                pool_signer:       Pubkey::new_unique(),
                pool_signer_nonce: 255,
                authority:         Pubkey::new_unique(),
            },
        };
        let t = FarmingTarget::for_staking(&info, &ClientConfig::default());
        assert_eq!(t.program_id, STAKING_PROGRAM_ID);
        assert_eq!(t.pool, info.address);
        assert_eq!(t.freeze_vault, info.pool.staking_vault);
        assert_eq!(t.token_mint, info.pool.staking_mint);
        assert_eq!(t.pool_signer, info.pool.pool_signer);
    }
}
