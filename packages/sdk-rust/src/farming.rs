//! Liquidity farming: freeze pool tokens in tickets and claim rewards.
//!
//! The pool programs and the staking program expose the same farming
//! instruction set. Everything below runs against a [`FarmingTarget`], which
//! is built either from a pool or from a staking pool, so
//! [`StakingService`](crate::staking::StakingService) reuses these flows.

use std::sync::Arc;

use log::{debug, info, warn};
use solana_sdk::{
    account::Account,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

use crate::{
    client::BaseClient,
    config::ClientConfig,
    error::{Error, Result},
    instructions::{
        check_farmed_ix, derive_ata, end_farming_ix, initialize_farming_calc_ix, start_farming_ix,
        withdraw_farmed_ix,
    },
    registry::PoolVersion,
    state::{
        parse_farming_calc, parse_farming_state, parse_farming_ticket, parse_token_mint,
        FARMING_CALC_LEN, FARMING_CALC_STATE_OFFSET, FARMING_CALC_USER_OFFSET, FARMING_STATE_LEN,
        FARMING_STATE_POOL_OFFSET, FARMING_TICKET_LEN, FARMING_TICKET_POOL_OFFSET,
        FARMING_TICKET_USER_OFFSET, MAX_STATES_ATTACHED,
    },
    transaction::TransactionPlan,
    types::{
        ClaimResult, EndFarmingResult, FarmingCalcInfo, FarmingStateInfo, FarmingTicketInfo,
        PoolInfo, StakingPoolInfo, StartFarmingResult,
    },
};

// ─── Target ───────────────────────────────────────────────────────────────────

/// Accounts of the pool (or staking pool) a farming operation runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FarmingTarget {
    pub program_id:   Pubkey,
    pub pool:         Pubkey,
    pub pool_signer:  Pubkey,
    /// Vault holding frozen tokens.
    pub freeze_vault: Pubkey,
    /// Mint of the tokens being frozen.
    pub token_mint:   Pubkey,
}

impl FarmingTarget {
    pub fn for_pool(pool: &PoolInfo, config: &ClientConfig) -> Self {
        Self {
            program_id:   config.pool_program(pool.version),
            pool:         pool.address,
            pool_signer:  pool.state.pool_signer,
            freeze_vault: pool.state.lp_token_freeze_vault,
            token_mint:   pool.state.pool_mint,
        }
    }

    pub fn for_staking(pool: &StakingPoolInfo, config: &ClientConfig) -> Self {
        Self {
            program_id:   config.staking_program_id,
            pool:         pool.address,
            pool_signer:  pool.pool.pool_signer,
            freeze_vault: pool.pool.staking_vault,
            token_mint:   pool.pool.staking_mint,
        }
    }
}

// ─── Queries ──────────────────────────────────────────────────────────────────

fn decode_all<T>(
    raw:   Vec<(Pubkey, Account)>,
    what:  &str,
    parse: impl Fn(&[u8]) -> Result<T>,
) -> Vec<(Pubkey, T)> {
    raw.into_iter()
        .filter_map(|(address, account)| match parse(&account.data) {
            Ok(v)  => Some((address, v)),
            Err(e) => {
                warn!("skipping malformed {what} {address}: {e}");
                None
            }
        })
        .collect()
}

/// Farming states of `program_id` whose `pool` field is `pool`.
pub(crate) async fn query_farming_states(
    base:       &BaseClient,
    program_id: &Pubkey,
    pool:       &Pubkey,
) -> Result<Vec<FarmingStateInfo>> {
    let raw = base
        .program_accounts(
            program_id,
            FARMING_STATE_LEN as u64,
            &[(FARMING_STATE_POOL_OFFSET, pool.as_ref())],
        )
        .await?;
    Ok(decode_all(raw, "farming state", parse_farming_state)
        .into_iter()
        .map(|(address, state)| FarmingStateInfo { address, state })
        .collect())
}

/// Tickets of `program_id` owned by `owner`, optionally limited to one pool.
pub(crate) async fn query_tickets(
    base:       &BaseClient,
    program_id: &Pubkey,
    owner:      &Pubkey,
    pool:       Option<&Pubkey>,
) -> Result<Vec<FarmingTicketInfo>> {
    let mut memcmp: Vec<(usize, &[u8])> = vec![(FARMING_TICKET_USER_OFFSET, owner.as_ref())];
    if let Some(pool) = pool {
        memcmp.push((FARMING_TICKET_POOL_OFFSET, pool.as_ref()));
    }
    let raw = base
        .program_accounts(program_id, FARMING_TICKET_LEN as u64, &memcmp)
        .await?;
    Ok(decode_all(raw, "farming ticket", parse_farming_ticket)
        .into_iter()
        .map(|(address, ticket)| FarmingTicketInfo { address, ticket })
        .collect())
}

/// Farming calcs of `program_id` owned by `owner`, optionally for one state.
pub(crate) async fn query_calcs(
    base:          &BaseClient,
    program_id:    &Pubkey,
    owner:         &Pubkey,
    farming_state: Option<&Pubkey>,
) -> Result<Vec<FarmingCalcInfo>> {
    let mut memcmp: Vec<(usize, &[u8])> = vec![(FARMING_CALC_USER_OFFSET, owner.as_ref())];
    if let Some(state) = farming_state {
        memcmp.push((FARMING_CALC_STATE_OFFSET, state.as_ref()));
    }
    let raw = base
        .program_accounts(program_id, FARMING_CALC_LEN as u64, &memcmp)
        .await?;
    Ok(decode_all(raw, "farming calc", parse_farming_calc)
        .into_iter()
        .map(|(address, calc)| FarmingCalcInfo { address, calc })
        .collect())
}

/// Fetch a farming state and check it belongs to `program_id`.
pub(crate) async fn load_farming_state(
    base:       &BaseClient,
    program_id: &Pubkey,
    address:    &Pubkey,
) -> Result<FarmingStateInfo> {
    let account = match base.account(address).await {
        Err(Error::AccountNotFound(_)) => return Err(Error::FarmingStateNotFound(*address)),
        other => other?,
    };
    if account.owner != *program_id {
        return Err(Error::InvalidAccountOwner {
            account:  *address,
            expected: program_id.to_string(),
            actual:   account.owner,
        });
    }
    Ok(FarmingStateInfo { address: *address, state: parse_farming_state(&account.data)? })
}

// ─── Flows ────────────────────────────────────────────────────────────────────

/// Freeze `amount` tokens from the wallet's associated account in a new ticket.
pub(crate) async fn start(
    base:   &BaseClient,
    target: &FarmingTarget,
    wallet: &(dyn Signer + Sync),
    amount: u64,
) -> Result<StartFarmingResult> {
    if amount == 0 {
        return Err(Error::InvalidArgument("amount must be > 0".into()));
    }
    let owner = wallet.pubkey();
    let user_token = derive_ata(&owner, &target.token_mint);
    let held = base.token_balance(&user_token).await?;
    if held < amount {
        return Err(Error::InvalidArgument(format!("wallet holds {held} tokens, cannot freeze {amount}")));
    }

    let states = query_farming_states(base, &target.program_id, &target.pool).await?;
    let attach = states_to_attach(&states);
    if attach.is_empty() {
        return Err(Error::FarmingStateNotFound(target.pool));
    }
    debug!("starting farming on {} with {} states attached", target.pool, attach.len());

    let ticket = Keypair::new();
    let ticket_key = ticket.pubkey();
    let mut plan = TransactionPlan::new();
    plan.push_action(start_farming_ix(
        &target.program_id,
        &target.pool,
        &attach,
        &ticket_key,
        &target.freeze_vault,
        &user_token,
        &owner,
        amount,
    )?);
    plan.add_signer(ticket);

    let sig = base.send(&plan, wallet).await?;
    Ok(StartFarmingResult { signature: sig.to_string(), ticket: ticket_key, amount })
}

/// Pay out the rewards a wallet has accrued in `farming_state`.
///
/// Creates the wallet's farming calc when it has none, runs `check_farmed`
/// for every ticket attached to the state, then withdraws to the wallet's
/// reward-token account (created when missing).
pub(crate) async fn claim(
    base:          &BaseClient,
    target:        &FarmingTarget,
    wallet:        &(dyn Signer + Sync),
    farming_state: &Pubkey,
) -> Result<ClaimResult> {
    let owner = wallet.pubkey();
    let state = load_farming_state(base, &target.program_id, farming_state).await?;
    if state.state.pool != target.pool {
        return Err(Error::InvalidArgument(format!(
            "farming state {farming_state} belongs to {}, not {}",
            state.state.pool, target.pool
        )));
    }

    let held = query_tickets(base, &target.program_id, &owner, Some(&target.pool)).await?;
    let tickets = tickets_for_claim(&held, farming_state)?;

    let mut plan = TransactionPlan::new();
    let existing = query_calcs(base, &target.program_id, &owner, Some(farming_state)).await?;
    let (calc, init_calc) = calc_for_claim(&existing, &mut plan);

    let vault = base.account(&state.state.farming_token_vault).await?;
    let reward_mint = parse_token_mint(&vault.data)?;
    let destination = base.destination_token_account(&mut plan, &owner, &reward_mint).await?;

    for ix in claim_actions(
        target,
        &state,
        &calc,
        init_calc,
        &tickets,
        &destination,
        &owner,
        base.config().max_snapshots,
    ) {
        plan.push_action(ix);
    }
    debug!("claiming {farming_state} over {} tickets (new calc: {init_calc})", tickets.len());

    let signatures = base.send_batches(plan, wallet).await?;
    Ok(ClaimResult {
        signatures:    signatures.iter().map(|s| s.to_string()).collect(),
        farming_state: *farming_state,
        farming_calc:  calc,
        destination,
    })
}

/// Tickets whose `check_farmed` accrues `farming_state` rewards.
///
/// No tickets on the pool is [`Error::NoFarmingTickets`]; tickets that are
/// all attached elsewhere is [`Error::NothingToClaim`].
fn tickets_for_claim(held: &[FarmingTicketInfo], farming_state: &Pubkey) -> Result<Vec<Pubkey>> {
    if held.is_empty() {
        return Err(Error::NoFarmingTickets);
    }
    let tickets: Vec<Pubkey> = held
        .iter()
        .filter(|t| t.ticket.is_attached_to(farming_state))
        .map(|t| t.address)
        .collect();
    if tickets.is_empty() {
        return Err(Error::NothingToClaim);
    }
    Ok(tickets)
}

/// The wallet's calc for the state, or a fresh keypair registered with
/// `plan`. The flag is true when the calc still has to be initialised.
fn calc_for_claim(existing: &[FarmingCalcInfo], plan: &mut TransactionPlan) -> (Pubkey, bool) {
    match existing.first() {
        Some(c) => (c.address, false),
        None => {
            let kp = Keypair::new();
            let key = kp.pubkey();
            plan.add_signer(kp);
            (key, true)
        }
    }
}

/// Open tickets only; ended tickets keep their accounts but hold nothing.
pub(crate) fn open_tickets(tickets: Vec<FarmingTicketInfo>) -> Vec<FarmingTicketInfo> {
    tickets.into_iter().filter(|t| t.ticket.is_open()).collect()
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// States a new ticket attaches to: those with rewards left, or every state
/// when all schedules have run out. At most [`MAX_STATES_ATTACHED`].
fn states_to_attach(states: &[FarmingStateInfo]) -> Vec<Pubkey> {
    let active: Vec<Pubkey> = states
        .iter()
        .filter(|s| s.state.tokens_remaining() > 0)
        .map(|s| s.address)
        .collect();
    let mut keys = if active.is_empty() {
        states.iter().map(|s| s.address).collect()
    } else {
        active
    };
    keys.truncate(MAX_STATES_ATTACHED);
    keys
}

/// `end_farming` for one ticket, against the first of its attached states
/// found in `states` (or the first state when none is recognised).
pub(crate) fn end_ticket_ix(
    target:     &FarmingTarget,
    ticket:     &FarmingTicketInfo,
    states:     &[FarmingStateInfo],
    user_token: &Pubkey,
    owner:      &Pubkey,
) -> Result<Instruction> {
    let state = ticket
        .ticket
        .states_attached
        .iter()
        .find_map(|a| states.iter().find(|s| s.address == a.farming_state))
        .or_else(|| states.first())
        .ok_or(Error::FarmingStateNotFound(target.pool))?;

    Ok(end_farming_ix(
        &target.program_id,
        &target.pool,
        &state.address,
        &state.state.farming_snapshots,
        &ticket.address,
        &target.freeze_vault,
        &target.pool_signer,
        user_token,
        owner,
    ))
}

#[allow(clippy::too_many_arguments)]
fn claim_actions(
    target:        &FarmingTarget,
    state:         &FarmingStateInfo,
    calc:          &Pubkey,
    init_calc:     bool,
    tickets:       &[Pubkey],
    destination:   &Pubkey,
    owner:         &Pubkey,
    max_snapshots: u64,
) -> Vec<Instruction> {
    let mut ixs = Vec::with_capacity(tickets.len() + 2);
    if init_calc {
        if let Some(first) = tickets.first() {
            ixs.push(initialize_farming_calc_ix(&target.program_id, calc, first, &state.address, owner));
        }
    }
    for ticket in tickets {
        ixs.push(check_farmed_ix(
            &target.program_id,
            &target.pool,
            &state.address,
            &state.state.farming_snapshots,
            calc,
            ticket,
            max_snapshots,
        ));
    }
    ixs.push(withdraw_farmed_ix(
        &target.program_id,
        &target.pool,
        &state.address,
        calc,
        &state.state.farming_token_vault,
        &target.pool_signer,
        destination,
        owner,
    ));
    ixs
}

// ─── Service ──────────────────────────────────────────────────────────────────

/// Farming on the v1 and v2 pool programs.
pub struct FarmingService {
    base: Arc<BaseClient>,
}

impl FarmingService {
    pub fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    fn target(&self, pool: &PoolInfo) -> FarmingTarget {
        FarmingTarget::for_pool(pool, self.base.config())
    }

    fn programs(&self) -> [Pubkey; 2] {
        let cfg = self.base.config();
        [cfg.pool_program(PoolVersion::V1), cfg.pool_program(PoolVersion::V2)]
    }

    /// Reward schedules attached to `pool`.
    pub async fn get_farming_states(&self, pool: &PoolInfo) -> Result<Vec<FarmingStateInfo>> {
        let target = self.target(pool);
        query_farming_states(&self.base, &target.program_id, &pool.address).await
    }

    /// Tickets owned by `owner`, on one pool or across both pool programs.
    pub async fn get_farming_tickets(
        &self,
        owner: &Pubkey,
        pool:  Option<&PoolInfo>,
    ) -> Result<Vec<FarmingTicketInfo>> {
        match pool {
            Some(pool) => {
                let target = self.target(pool);
                query_tickets(&self.base, &target.program_id, owner, Some(&pool.address)).await
            }
            None => {
                let mut out = Vec::new();
                for program in self.programs() {
                    out.extend(query_tickets(&self.base, &program, owner, None).await?);
                }
                Ok(out)
            }
        }
    }

    /// Farming calcs owned by `owner` across both pool programs.
    pub async fn get_farming_calcs(
        &self,
        owner:         &Pubkey,
        farming_state: Option<&Pubkey>,
    ) -> Result<Vec<FarmingCalcInfo>> {
        let mut out = Vec::new();
        for program in self.programs() {
            out.extend(query_calcs(&self.base, &program, owner, farming_state).await?);
        }
        Ok(out)
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

    /// Freeze `lp_amount` pool tokens in a new farming ticket.
    pub async fn start_farming(
        &self,
        wallet:    &(dyn Signer + Sync),
        pool:      &PoolInfo,
        lp_amount: u64,
    ) -> Result<StartFarmingResult> {
        start(&self.base, &self.target(pool), wallet, lp_amount).await
    }

    /// End every open ticket the wallet holds on `pool`.
    ///
    /// The `end_farming` calls are packed into as few transactions as fit and
    /// sent in order; the first failure stops the rest.
    pub async fn end_farming(
        &self,
        wallet: &(dyn Signer + Sync),
        pool:   &PoolInfo,
    ) -> Result<EndFarmingResult> {
        let owner = wallet.pubkey();
        let target = self.target(pool);

        let tickets = open_tickets(self.get_farming_tickets(&owner, Some(pool)).await?);
        if tickets.is_empty() {
            return Err(Error::NoFarmingTickets);
        }
        let states = self.get_farming_states(pool).await?;

        let mut plan = TransactionPlan::new();
        let user_token = self
            .base
            .destination_token_account(&mut plan, &owner, &target.token_mint)
            .await?;
        for ticket in &tickets {
            plan.push_action(end_ticket_ix(&target, ticket, &states, &user_token, &owner)?);
        }

        let signatures = self.base.send_batches(plan, wallet).await?;
        info!("ended {} farming tickets on {} in {} transactions", tickets.len(), pool.address, signatures.len());
        Ok(EndFarmingResult {
            signatures: signatures.iter().map(|s| s.to_string()).collect(),
            tickets:    tickets.iter().map(|t| t.address).collect(),
        })
    }

    /// Claim the rewards of one farming state of `pool`.
    pub async fn claim_farmed(
        &self,
        wallet:        &(dyn Signer + Sync),
        pool:          &PoolInfo,
        farming_state: &Pubkey,
    ) -> Result<ClaimResult> {
        claim(&self.base, &self.target(pool), wallet, farming_state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::sighash;
    use crate::state::{
        FarmingCalc, FarmingState, FarmingStateAttached, FarmingTicket, OPEN_TICKET_END_TIME,
    };
    use solana_sdk::packet::PACKET_DATA_SIZE;

    fn target() -> FarmingTarget {
        FarmingTarget {
            program_id:   Pubkey::new_unique(),
            pool:         Pubkey::new_unique(),
            pool_signer:  Pubkey::new_unique(),
            freeze_vault: Pubkey::new_unique(),
            token_mint:   Pubkey::new_unique(),
        }
    }

    fn state(pool: &Pubkey, total: u64, unlocked: u64) -> FarmingStateInfo {
        FarmingStateInfo {
            address: Pubkey::new_unique(),
            state: FarmingState {
                tokens_unlocked:     unlocked,
                tokens_per_period:   10,
                tokens_total:        total,
                period_length:       3_600,
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

    fn ticket(pool: &Pubkey, attached: &[Pubkey]) -> FarmingTicketInfo {
        FarmingTicketInfo {
            address: Pubkey::new_unique(),
            ticket: FarmingTicket {
                tokens_frozen: 100,
                start_time:    1,
                end_time:      OPEN_TICKET_END_TIME,
                user_key:      Pubkey::new_unique(),
                pool:          *pool,
                states_attached: attached
                    .iter()
                    .map(|s| FarmingStateAttached {
                        farming_state: *s,
                        last_withdraw_time: 0,
                        last_vested_withdraw_time: 0,
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn attaches_active_states_first() {
        let pool = Pubkey::new_unique();
        let done = state(&pool, 100, 100);
        let live = state(&pool, 100, 40);
        assert_eq!(states_to_attach(&[done.clone(), live.clone()]), vec![live.address]);

        // Every schedule exhausted: attach to all of them.
        assert_eq!(states_to_attach(&[done.clone()]), vec![done.address]);
        assert!(states_to_attach(&[]).is_empty());

        let many: Vec<_> = (0..12).map(|_| state(&pool, 10, 0)).collect();
        assert_eq!(states_to_attach(&many).len(), MAX_STATES_ATTACHED);
    }

    #[test]
    fn end_ticket_uses_attached_state_snapshots() {
        let t = target();
        let a = state(&t.pool, 10, 0);
        let b = state(&t.pool, 10, 0);
        let tk = ticket(&t.pool, &[b.address]);
        let owner = Pubkey::new_unique();
        let user_token = Pubkey::new_unique();

        let ix = end_ticket_ix(&t, &tk, &[a.clone(), b.clone()], &user_token, &owner).unwrap();
        assert_eq!(ix.program_id, t.program_id);
        assert_eq!(ix.data, sighash("end_farming").to_vec());
        let keys: Vec<Pubkey> = ix.accounts.iter().take(8).map(|m| m.pubkey).collect();
        assert_eq!(
            keys,
            vec![
                t.pool, b.address, b.state.farming_snapshots, tk.address,
                t.freeze_vault, t.pool_signer, user_token, owner,
            ]
        );

        // Unknown attachment falls back to the first state.
        let stray = ticket(&t.pool, &[Pubkey::new_unique()]);
        let ix = end_ticket_ix(&t, &stray, &[a.clone(), b], &user_token, &owner).unwrap();
        assert_eq!(ix.accounts[1].pubkey, a.address);

        assert!(matches!(
            end_ticket_ix(&t, &stray, &[], &user_token, &owner),
            Err(Error::FarmingStateNotFound(p)) if p == t.pool
        ));
    }

    #[test]
    fn claim_inits_calc_checks_each_ticket_then_withdraws() {
        let t = target();
        let s = state(&t.pool, 1_000, 500);
        let calc = Pubkey::new_unique();
        let tickets = [Pubkey::new_unique(), Pubkey::new_unique()];
        let dest = Pubkey::new_unique();
        let owner = Pubkey::new_unique();

        let ixs = claim_actions(&t, &s, &calc, true, &tickets, &dest, &owner, 7);
        let names: Vec<[u8; 8]> = ixs.iter().map(|ix| ix.data[..8].try_into().unwrap()).collect();
        assert_eq!(
            names,
            vec![
                sighash("initialize_farming_calc"),
                sighash("check_farmed"),
                sighash("check_farmed"),
                sighash("withdraw_farmed"),
            ]
        );
        assert_eq!(ixs[0].accounts[0].pubkey, calc);
        assert_eq!(ixs[0].accounts[1].pubkey, tickets[0]);
        assert_eq!(ixs[1].accounts[4].pubkey, tickets[0]);
        assert_eq!(ixs[2].accounts[4].pubkey, tickets[1]);
        assert_eq!(&ixs[2].data[8..], &7u64.to_le_bytes());
        assert_eq!(ixs[3].accounts[3].pubkey, s.state.farming_token_vault);
        assert_eq!(ixs[3].accounts[5].pubkey, dest);

        let existing = claim_actions(&t, &s, &calc, false, &tickets[..1], &dest, &owner, 7);
        assert_eq!(existing.len(), 2);
        assert_eq!(&existing[0].data[..8], &sighash("check_farmed"));
    }

    fn calc(farming_state: &Pubkey) -> FarmingCalcInfo {
        FarmingCalcInfo {
            address: Pubkey::new_unique(),
            calc: FarmingCalc {
                farming_state: *farming_state,
                user_key:      Pubkey::new_unique(),
                initializer:   Pubkey::new_unique(),
                token_amount:  5,
            },
        }
    }

    fn count(batches: &[TransactionPlan], name: &str) -> usize {
        batches
            .iter()
            .flat_map(|b| b.instructions())
            .filter(|ix| ix.data.len() >= 8 && ix.data[..8] == sighash(name))
            .count()
    }

    #[test]
    fn claim_needs_tickets_attached_to_the_state() {
        let pool = Pubkey::new_unique();
        let wanted = Pubkey::new_unique();
        let other = Pubkey::new_unique();

        assert!(matches!(tickets_for_claim(&[], &wanted), Err(Error::NoFarmingTickets)));

        let elsewhere = [ticket(&pool, &[other])];
        assert!(matches!(tickets_for_claim(&elsewhere, &wanted), Err(Error::NothingToClaim)));

        let both = ticket(&pool, &[other, wanted]);
        let only_other = ticket(&pool, &[other]);
        let direct = ticket(&pool, &[wanted]);
        assert_eq!(
            tickets_for_claim(&[both.clone(), only_other, direct.clone()], &wanted).unwrap(),
            vec![both.address, direct.address]
        );
    }

    #[test]
    fn claim_reuses_calc_or_registers_a_new_signer() {
        let s = Pubkey::new_unique();
        let existing = calc(&s);
        let mut plan = TransactionPlan::new();

        assert_eq!(calc_for_claim(&[existing.clone()], &mut plan), (existing.address, false));
        assert!(plan.signers().is_empty());

        let (key, init) = calc_for_claim(&[], &mut plan);
        assert!(init);
        assert_ne!(key, existing.address);
        assert_eq!(plan.signers().len(), 1);
        assert_eq!(plan.signers()[0].pubkey(), key);
    }

    #[test]
    fn ended_tickets_are_not_ended_again() {
        let pool = Pubkey::new_unique();
        let open = ticket(&pool, &[]);
        let mut ended = ticket(&pool, &[]);
        ended.ticket.end_time = 1_700_000_000;

        assert_eq!(open_tickets(vec![ended.clone(), open.clone()]), vec![open]);
        assert!(open_tickets(vec![ended]).is_empty());
    }

    #[test]
    fn many_tickets_end_in_packet_sized_transactions() {
        let t = target();
        let s = state(&t.pool, 10, 0);
        let owner = Pubkey::new_unique();

        for n in [1usize, 15, 30] {
            let mut plan = TransactionPlan::new();
            let user_token = plan.ata_if_missing(&owner, &t.token_mint, false);
            for _ in 0..n {
                let tk = ticket(&t.pool, &[s.address]);
                plan.push_action(end_ticket_ix(&t, &tk, &[s.clone()], &user_token, &owner).unwrap());
            }

            let batches = plan.into_batches(&owner).unwrap();
            assert_eq!(count(&batches, "end_farming"), n);
            for b in &batches {
                assert!(b.size(&owner) <= PACKET_DATA_SIZE, "{n} tickets: {} bytes", b.size(&owner));
            }
            assert_eq!(
                batches[0].instructions()[0].program_id,
                spl_associated_token_account::ID
            );
            match n {
                1 => assert_eq!(batches.len(), 1),
                30 => assert!(batches.len() > 1),
                _ => {}
            }
        }
    }

    #[test]
    fn long_claim_inits_calc_first_and_withdraws_last() {
        let t = target();
        let s = state(&t.pool, 1_000, 500);
        let owner = Pubkey::new_unique();
        let dest = Pubkey::new_unique();
        let tickets: Vec<Pubkey> = (0..40).map(|_| Pubkey::new_unique()).collect();

        let mut plan = TransactionPlan::new();
        let (calc_key, init) = calc_for_claim(&[], &mut plan);
        for ix in claim_actions(&t, &s, &calc_key, init, &tickets, &dest, &owner, 7) {
            plan.push_action(ix);
        }

        let batches = plan.into_batches(&owner).unwrap();
        assert!(batches.len() > 1);
        assert_eq!(count(&batches, "check_farmed"), tickets.len());
        for b in &batches {
            assert!(b.size(&owner) <= PACKET_DATA_SIZE);
        }

        let first = batches[0].instructions();
        assert_eq!(&first[0].data[..8], &sighash("initialize_farming_calc"));
        assert_eq!(batches[0].signers().len(), 1);
        assert_eq!(batches[0].signers()[0].pubkey(), calc_key);
        assert!(batches[1..].iter().all(|b| b.signers().is_empty()));

        let last = batches[batches.len() - 1].instructions();
        assert_eq!(&last[last.len() - 1].data[..8], &sighash("withdraw_farmed"));
        assert_eq!(count(&batches, "withdraw_farmed"), 1);
    }
}
