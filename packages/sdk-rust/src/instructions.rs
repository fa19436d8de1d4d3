//! Low-level instruction builders.
//!
//! Each function constructs a [`solana_sdk::instruction::Instruction`] ready
//! for signing and submission. Account order mirrors the on-chain programs'
//! account structs exactly.
//!
//! Instruction data is the Anchor discriminator `sha256("global:{name}")[..8]`
//! followed by the Borsh-encoded arguments (little-endian integers, one byte
//! per enum tag).
//!
//! The staking program shares the farming instruction set with the pool
//! programs; pass [`STAKING_PROGRAM_ID`](crate::registry::STAKING_PROGRAM_ID)
//! and the staking pool in the `pool` slot.

use solana_sdk::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    sysvar,
};
use solana_system_interface::instruction as system_instruction;

use crate::error::{Error, Result};
use crate::state::PoolState;

// ─── Discriminator ────────────────────────────────────────────────────────────

/// Anchor instruction discriminator: first 8 bytes of `sha256("global:{name}")`.
pub fn sighash(name: &str) -> [u8; 8] {
    let h = hash(format!("global:{name}").as_bytes());
    let mut d = [0u8; 8];
    d.copy_from_slice(&h.to_bytes()[..8]);
    d
}

// ─── Swap side ────────────────────────────────────────────────────────────────

/// Order side from the pool's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Spend quote tokens, receive base tokens.
    Bid,
    /// Spend base tokens, receive quote tokens.
    Ask,
}

impl Side {
    /// Side for a swap that spends `mint_in`; `None` if the mint is not in the pool.
    pub fn for_input(pool: &PoolState, mint_in: &Pubkey) -> Option<Side> {
        if *mint_in == pool.base_token_mint {
            Some(Side::Ask)
        } else if *mint_in == pool.quote_token_mint {
            Some(Side::Bid)
        } else {
            None
        }
    }

    fn tag(self) -> u8 {
        match self {
            Side::Bid => 0,
            Side::Ask => 1,
        }
    }
}

/// The wallet's token accounts for one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPoolAccounts {
    pub base:       Pubkey,
    pub quote:      Pubkey,
    pub pool_token: Pubkey,
}

// ─── create_basket (deposit) ──────────────────────────────────────────────────

/// Build the `create_basket` instruction: deposit up to `base_token_used` /
/// `quote_token_used` and mint exactly `creation_size` LP tokens.
#[allow(clippy::too_many_arguments)]
pub fn create_basket_ix(
    program_id:       &Pubkey,
    pool:             &Pubkey,
    state:            &PoolState,
    user:             &UserPoolAccounts,
    wallet:           &Pubkey,
    creation_size:    u64,
    base_token_used:  u64,
    quote_token_used: u64,
) -> Instruction {
    let mut data = sighash("create_basket").to_vec();
    data.extend_from_slice(&creation_size.to_le_bytes());
    data.extend_from_slice(&base_token_used.to_le_bytes());
    data.extend_from_slice(&quote_token_used.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*pool,                false),
            AccountMeta::new(state.pool_mint,                false),
            AccountMeta::new_readonly(state.pool_signer,     false),
            AccountMeta::new(user.base,                      false),
            AccountMeta::new(user.quote,                     false),
            AccountMeta::new(state.base_token_vault,         false),
            AccountMeta::new(state.quote_token_vault,        false),
            AccountMeta::new(user.pool_token,                false),
            AccountMeta::new_readonly(*wallet,               true),   // signer
            AccountMeta::new_readonly(spl_token::ID,         false),
            AccountMeta::new_readonly(sysvar::clock::ID,     false),
            AccountMeta::new_readonly(sysvar::rent::ID,      false),
        ],
        data,
    }
}

// ─── redeem_basket (withdraw) ─────────────────────────────────────────────────

/// Build the `redeem_basket` instruction: burn `redemption_size` LP tokens and
/// receive at least `base_min` / `quote_min`.
#[allow(clippy::too_many_arguments)]
pub fn redeem_basket_ix(
    program_id:      &Pubkey,
    pool:            &Pubkey,
    state:           &PoolState,
    user:            &UserPoolAccounts,
    wallet:          &Pubkey,
    redemption_size: u64,
    base_min:        u64,
    quote_min:       u64,
) -> Instruction {
    let mut data = sighash("redeem_basket").to_vec();
    data.extend_from_slice(&redemption_size.to_le_bytes());
    data.extend_from_slice(&base_min.to_le_bytes());
    data.extend_from_slice(&quote_min.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*pool,                false),
            AccountMeta::new(state.pool_mint,                false),
            AccountMeta::new(state.base_token_vault,         false),
            AccountMeta::new(state.quote_token_vault,        false),
            AccountMeta::new_readonly(state.pool_signer,     false),
            AccountMeta::new(user.pool_token,                false),
            AccountMeta::new(user.base,                      false),
            AccountMeta::new(user.quote,                     false),
            AccountMeta::new_readonly(*wallet,               true),   // signer
            AccountMeta::new_readonly(spl_token::ID,         false),
            AccountMeta::new(state.fee_base_account,         false),
            AccountMeta::new(state.fee_quote_account,        false),
            AccountMeta::new_readonly(sysvar::clock::ID,     false),
        ],
        data,
    }
}

// ─── swap ─────────────────────────────────────────────────────────────────────

/// Build the `swap` instruction.
///
/// Pass both of the wallet's token accounts regardless of direction; the
/// program reads `side` to decide which one it debits. v2 pools add their
/// curve account before the token program.
#[allow(clippy::too_many_arguments)]
pub fn swap_ix(
    program_id:       &Pubkey,
    pool:             &Pubkey,
    state:            &PoolState,
    wallet:           &Pubkey,
    user_base:        &Pubkey,
    user_quote:       &Pubkey,
    tokens:           u64,
    min_tokens:       u64,
    side:             Side,
) -> Instruction {
    let mut data = sighash("swap").to_vec();
    data.extend_from_slice(&tokens.to_le_bytes());
    data.extend_from_slice(&min_tokens.to_le_bytes());
    data.push(side.tag());

    let mut accounts = vec![
        AccountMeta::new_readonly(*pool,                 false),
        AccountMeta::new_readonly(state.pool_signer,     false),
        AccountMeta::new(state.pool_mint,                false),
        AccountMeta::new(state.base_token_vault,         false),
        AccountMeta::new(state.quote_token_vault,        false),
        AccountMeta::new(state.fee_pool_token_account,   false),
        AccountMeta::new_readonly(*wallet,               true),   // signer
        AccountMeta::new(*user_base,                     false),
        AccountMeta::new(*user_quote,                    false),
    ];
    if let Some(curve) = &state.curve {
        accounts.push(AccountMeta::new_readonly(curve.curve, false));
    }
    accounts.push(AccountMeta::new_readonly(spl_token::ID, false));

    Instruction { program_id: *program_id, accounts, data }
}

// ─── Farming ──────────────────────────────────────────────────────────────────

/// Build the `start_farming` instruction.
///
/// `farming_ticket` must be a fresh keypair; it is created by the program and
/// must sign. The ticket is attached to every state in `farming_states`; the
/// first one takes the fixed slot, the rest follow as remaining accounts.
#[allow(clippy::too_many_arguments)]
pub fn start_farming_ix(
    program_id:     &Pubkey,
    pool:           &Pubkey,
    farming_states: &[Pubkey],
    farming_ticket: &Pubkey,
    freeze_vault:   &Pubkey,
    user_token:     &Pubkey,
    wallet:         &Pubkey,
    token_amount:   u64,
) -> Result<Instruction> {
    let (first, rest) = farming_states
        .split_first()
        .ok_or_else(|| Error::InvalidArgument("start_farming needs at least one farming state".into()))?;

    let mut data = sighash("start_farming").to_vec();
    data.extend_from_slice(&token_amount.to_le_bytes());

    let mut accounts = vec![
        AccountMeta::new_readonly(*pool,            false),
        AccountMeta::new_readonly(*first,           false),
        AccountMeta::new(*farming_ticket,           true),   // mut + signer (init)
        AccountMeta::new(*freeze_vault,             false),
        AccountMeta::new(*user_token,               false),
        AccountMeta::new_readonly(*wallet,          true),   // token authority
        AccountMeta::new_readonly(*wallet,          false),  // user_key
        AccountMeta::new_readonly(spl_token::ID,    false),
        AccountMeta::new_readonly(sysvar::clock::ID, false),
        AccountMeta::new_readonly(sysvar::rent::ID, false),
    ];
    accounts.extend(rest.iter().map(|s| AccountMeta::new_readonly(*s, false)));

    Ok(Instruction { program_id: *program_id, accounts, data })
}

/// Build the `end_farming` instruction: unfreeze a ticket's tokens back to
/// `user_token`.
#[allow(clippy::too_many_arguments)]
pub fn end_farming_ix(
    program_id:        &Pubkey,
    pool:              &Pubkey,
    farming_state:     &Pubkey,
    farming_snapshots: &Pubkey,
    farming_ticket:    &Pubkey,
    freeze_vault:      &Pubkey,
    pool_signer:       &Pubkey,
    user_token:        &Pubkey,
    wallet:            &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*pool,              false),
            AccountMeta::new_readonly(*farming_state,     false),
            AccountMeta::new_readonly(*farming_snapshots, false),
            AccountMeta::new(*farming_ticket,             false),
            AccountMeta::new(*freeze_vault,               false),
            AccountMeta::new_readonly(*pool_signer,       false),
            AccountMeta::new(*user_token,                 false),
            AccountMeta::new_readonly(*wallet,            true),
            AccountMeta::new_readonly(spl_token::ID,      false),
            AccountMeta::new_readonly(sysvar::clock::ID,  false),
            AccountMeta::new_readonly(sysvar::rent::ID,   false),
        ],
        data: sighash("end_farming").to_vec(),
    }
}

/// Build the `initialize_farming_calc` instruction. `farming_calc` is a fresh
/// keypair and must sign.
pub fn initialize_farming_calc_ix(
    program_id:     &Pubkey,
    farming_calc:   &Pubkey,
    farming_ticket: &Pubkey,
    farming_state:  &Pubkey,
    wallet:         &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*farming_calc,               true),   // mut + signer (init)
            AccountMeta::new_readonly(*farming_ticket,    false),
            AccountMeta::new_readonly(*farming_state,     false),
            AccountMeta::new_readonly(*wallet,            false),  // user_key
            AccountMeta::new_readonly(*wallet,            true),   // initializer
            AccountMeta::new_readonly(sysvar::rent::ID,   false),
        ],
        data: sighash("initialize_farming_calc").to_vec(),
    }
}

/// Build the `check_farmed` instruction: move rewards accrued by a ticket
/// into its farming calc, walking at most `max_snapshots` snapshots.
pub fn check_farmed_ix(
    program_id:        &Pubkey,
    pool:              &Pubkey,
    farming_state:     &Pubkey,
    farming_snapshots: &Pubkey,
    farming_calc:      &Pubkey,
    farming_ticket:    &Pubkey,
    max_snapshots:     u64,
) -> Instruction {
    let mut data = sighash("check_farmed").to_vec();
    data.extend_from_slice(&max_snapshots.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*pool,              false),
            AccountMeta::new_readonly(*farming_state,     false),
            AccountMeta::new_readonly(*farming_snapshots, false),
            AccountMeta::new(*farming_calc,               false),
            AccountMeta::new(*farming_ticket,             false),
            AccountMeta::new_readonly(sysvar::clock::ID,  false),
        ],
        data,
    }
}

/// Build the `withdraw_farmed` instruction: pay out a farming calc's balance.
#[allow(clippy::too_many_arguments)]
pub fn withdraw_farmed_ix(
    program_id:          &Pubkey,
    pool:                &Pubkey,
    farming_state:       &Pubkey,
    farming_calc:        &Pubkey,
    farming_token_vault: &Pubkey,
    pool_signer:         &Pubkey,
    user_reward_token:   &Pubkey,
    wallet:              &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*pool,              false),
            AccountMeta::new_readonly(*farming_state,     false),
            AccountMeta::new(*farming_calc,               false),
            AccountMeta::new(*farming_token_vault,        false),
            AccountMeta::new_readonly(*pool_signer,       false),
            AccountMeta::new(*user_reward_token,          false),
            AccountMeta::new_readonly(*wallet,            true),
            AccountMeta::new_readonly(spl_token::ID,      false),
            AccountMeta::new_readonly(sysvar::clock::ID,  false),
        ],
        data: sighash("withdraw_farmed").to_vec(),
    }
}

// ─── SPL token / system helpers ───────────────────────────────────────────────

/// Size of a packed SPL token account.
pub const TOKEN_ACCOUNT_LEN: u64 = 165;

/// Derive the Associated Token Account for a wallet + mint.
pub fn derive_ata(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(wallet, mint)
}

/// Create the associated token account of `wallet` for `mint`, paid by `payer`.
pub fn create_ata_ix(payer: &Pubkey, wallet: &Pubkey, mint: &Pubkey) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account(
        payer,
        wallet,
        mint,
        &spl_token::ID,
    )
}

/// SPL transfer of `amount` from `source` to `destination`, signed by `owner`.
pub fn token_transfer_ix(
    source:      &Pubkey,
    destination: &Pubkey,
    owner:       &Pubkey,
    amount:      u64,
) -> Result<Instruction> {
    spl_token::instruction::transfer(&spl_token::ID, source, destination, owner, &[], amount)
        .map_err(|e| Error::InvalidArgument(format!("token transfer: {e}")))
}

/// Close `account`, sending its lamports to `destination`.
pub fn close_account_ix(account: &Pubkey, destination: &Pubkey, owner: &Pubkey) -> Result<Instruction> {
    spl_token::instruction::close_account(&spl_token::ID, account, destination, owner, &[])
        .map_err(|e| Error::InvalidArgument(format!("close account: {e}")))
}

/// Move `lamports` from `from` to `to` with the system program.
pub fn system_transfer_ix(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    system_instruction::transfer(from, to, lamports)
}

/// Bring a native-mint token account's `amount` in line with its lamports.
pub fn sync_native_ix(account: &Pubkey) -> Result<Instruction> {
    spl_token::instruction::sync_native(&spl_token::ID, account)
        .map_err(|e| Error::InvalidArgument(format!("sync native: {e}")))
}

/// Create and initialise a fresh token account holding `lamports`.
///
/// For the native mint, every lamport above `rent_exempt` is spendable
/// wrapped SOL once the account is initialised.
pub fn create_token_account_ixs(
    payer:    &Pubkey,
    account:  &Pubkey,
    mint:     &Pubkey,
    owner:    &Pubkey,
    lamports: u64,
) -> Result<Vec<Instruction>> {
    let create = system_instruction::create_account(
        payer,
        account,
        lamports,
        TOKEN_ACCOUNT_LEN,
        &spl_token::ID,
    );
    let init = spl_token::instruction::initialize_account3(&spl_token::ID, account, mint, owner)
        .map_err(|e| Error::InvalidArgument(format!("initialize account: {e}")))?;
    Ok(vec![create, init])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PoolVersion;
    use crate::state::{parse_pool, tests::pool_bytes};

    fn pool(version: PoolVersion) -> PoolState {
        let k: [Pubkey; 12] = std::array::from_fn(|_| Pubkey::new_unique());
        let curve = Pubkey::new_unique();
        let data = pool_bytes(&k, version, (version == PoolVersion::V2).then_some(&curve));
        parse_pool(&data, version).unwrap()
    }

    fn user() -> UserPoolAccounts {
        UserPoolAccounts {
            base:       Pubkey::new_unique(),
            quote:      Pubkey::new_unique(),
            pool_token: Pubkey::new_unique(),
        }
    }

    #[test]
    fn sighash_is_sha256_prefix() {
        let expected = hash(b"global:swap").to_bytes();
        assert_eq!(sighash("swap"), expected[..8]);
        assert_ne!(sighash("create_basket"), sighash("redeem_basket"));
    }

    #[test]
    fn create_basket_layout() {
        let program = Pubkey::new_unique();
        let pool_addr = Pubkey::new_unique();
        let wallet = Pubkey::new_unique();
        let state = pool(PoolVersion::V1);
        let u = user();

        let ix = create_basket_ix(&program, &pool_addr, &state, &u, &wallet, 1_000, 2_000, 3_000);

        assert_eq!(ix.program_id, program);
        assert_eq!(&ix.data[..8], &sighash("create_basket"));
        assert_eq!(&ix.data[8..16], &1_000u64.to_le_bytes());
        assert_eq!(&ix.data[16..24], &2_000u64.to_le_bytes());
        assert_eq!(&ix.data[24..32], &3_000u64.to_le_bytes());
        assert_eq!(ix.data.len(), 32);

        let keys: Vec<Pubkey> = ix.accounts.iter().map(|a| a.pubkey).collect();
        assert_eq!(
            keys,
            vec![
                pool_addr, state.pool_mint, state.pool_signer, u.base, u.quote,
                state.base_token_vault, state.quote_token_vault, u.pool_token, wallet,
                spl_token::ID, sysvar::clock::ID, sysvar::rent::ID,
            ]
        );
        let signers: Vec<Pubkey> = ix.accounts.iter().filter(|a| a.is_signer).map(|a| a.pubkey).collect();
        assert_eq!(signers, vec![wallet]);
        assert!(!ix.accounts[0].is_writable);
        assert!(ix.accounts[1].is_writable);
    }

    #[test]
    fn redeem_basket_layout() {
        let state = pool(PoolVersion::V1);
        let u = user();
        let wallet = Pubkey::new_unique();
        let pool_addr = Pubkey::new_unique();
        let ix = redeem_basket_ix(&Pubkey::new_unique(), &pool_addr, &state, &u, &wallet, 50, 10, 20);

        assert_eq!(&ix.data[..8], &sighash("redeem_basket"));
        assert_eq!(ix.data[8..].to_vec(), [50u64, 10, 20].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>());
        assert_eq!(ix.accounts.len(), 13);
        assert_eq!(ix.accounts[5].pubkey, u.pool_token);
        assert_eq!(ix.accounts[8].pubkey, wallet);
        assert!(ix.accounts[8].is_signer);
        assert_eq!(ix.accounts[10].pubkey, state.fee_base_account);
        assert_eq!(ix.accounts[11].pubkey, state.fee_quote_account);
    }

    #[test]
    fn swap_layout_v1_and_v2() {
        let wallet = Pubkey::new_unique();
        let (ub, uq) = (Pubkey::new_unique(), Pubkey::new_unique());

        let v1 = pool(PoolVersion::V1);
        let ix = swap_ix(&Pubkey::new_unique(), &Pubkey::new_unique(), &v1, &wallet, &ub, &uq, 500, 450, Side::Ask);
        assert_eq!(&ix.data[..8], &sighash("swap"));
        assert_eq!(&ix.data[8..16], &500u64.to_le_bytes());
        assert_eq!(&ix.data[16..24], &450u64.to_le_bytes());
        assert_eq!(ix.data[24], 1);
        assert_eq!(ix.accounts.len(), 10);
        assert_eq!(ix.accounts[5].pubkey, v1.fee_pool_token_account);
        assert_eq!(ix.accounts[9].pubkey, spl_token::ID);

        let v2 = pool(PoolVersion::V2);
        let ix = swap_ix(&Pubkey::new_unique(), &Pubkey::new_unique(), &v2, &wallet, &ub, &uq, 1, 0, Side::Bid);
        assert_eq!(ix.data[24], 0);
        assert_eq!(ix.accounts.len(), 11);
        assert_eq!(ix.accounts[9].pubkey, v2.curve.unwrap().curve);
        assert_eq!(ix.accounts[10].pubkey, spl_token::ID);
    }

    #[test]
    fn side_follows_input_mint() {
        let state = pool(PoolVersion::V1);
        assert_eq!(Side::for_input(&state, &state.base_token_mint), Some(Side::Ask));
        assert_eq!(Side::for_input(&state, &state.quote_token_mint), Some(Side::Bid));
        assert_eq!(Side::for_input(&state, &Pubkey::new_unique()), None);
    }

    #[test]
    fn start_farming_attaches_extra_states() {
        let states = [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()];
        let ticket = Pubkey::new_unique();
        let wallet = Pubkey::new_unique();
        let ix = start_farming_ix(
            &Pubkey::new_unique(), &Pubkey::new_unique(), &states, &ticket,
            &Pubkey::new_unique(), &Pubkey::new_unique(), &wallet, 9_999,
        )
        .unwrap();

        assert_eq!(&ix.data[8..], &9_999u64.to_le_bytes());
        assert_eq!(ix.accounts[1].pubkey, states[0]);
        assert!(ix.accounts[2].is_signer && ix.accounts[2].is_writable);
        assert_eq!(ix.accounts.len(), 12);
        assert_eq!(ix.accounts[10].pubkey, states[1]);
        assert_eq!(ix.accounts[11].pubkey, states[2]);

        let err = start_farming_ix(
            &Pubkey::new_unique(), &Pubkey::new_unique(), &[], &ticket,
            &Pubkey::new_unique(), &Pubkey::new_unique(), &wallet, 1,
        );
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn farming_claim_instructions() {
        let (program, pool_addr, state, snaps, calc, ticket, wallet) = (
            Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique(),
            Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique(),
        );

        let init = initialize_farming_calc_ix(&program, &calc, &ticket, &state, &wallet);
        assert_eq!(init.data, sighash("initialize_farming_calc").to_vec());
        assert!(init.accounts[0].is_signer);
        assert!(init.accounts[4].is_signer);

        let check = check_farmed_ix(&program, &pool_addr, &state, &snaps, &calc, &ticket, 10);
        assert_eq!(&check.data[8..], &10u64.to_le_bytes());
        assert!(check.accounts.iter().all(|a| !a.is_signer));

        let vault = Pubkey::new_unique();
        let signer = Pubkey::new_unique();
        let dest = Pubkey::new_unique();
        let w = withdraw_farmed_ix(&program, &pool_addr, &state, &calc, &vault, &signer, &dest, &wallet);
        assert_eq!(w.data.len(), 8);
        assert_eq!(w.accounts[5].pubkey, dest);
        assert!(w.accounts[6].is_signer);

        let end = end_farming_ix(&program, &pool_addr, &state, &snaps, &ticket, &vault, &signer, &dest, &wallet);
        assert_eq!(end.data, sighash("end_farming").to_vec());
        assert_eq!(end.accounts[3].pubkey, ticket);
        assert!(end.accounts[3].is_writable);
    }

    #[test]
    fn token_helpers_target_spl_programs() {
        let (a, b, o) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        assert_eq!(token_transfer_ix(&a, &b, &o, 5).unwrap().program_id, spl_token::ID);
        assert_eq!(close_account_ix(&a, &b, &o).unwrap().program_id, spl_token::ID);
        assert_eq!(create_ata_ix(&o, &o, &b).program_id, spl_associated_token_account::ID);

        let ixs = create_token_account_ixs(&o, &a, &b, &o, 3_000_000).unwrap();
        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[0].program_id, solana_system_interface::program::ID);
        assert_eq!(ixs[1].program_id, spl_token::ID);
    }

    #[test]
    fn wsol_top_up_helpers() {
        let (from, to) = (Pubkey::new_unique(), Pubkey::new_unique());
        let transfer = system_transfer_ix(&from, &to, 7_000);
        assert_eq!(transfer.program_id, solana_system_interface::program::ID);
        assert_eq!(transfer.accounts[0], AccountMeta::new(from, true));
        assert_eq!(transfer.accounts[1], AccountMeta::new(to, false));
        // SystemInstruction::Transfer = 2, then the u64 amount
        assert_eq!(&transfer.data[..4], &2u32.to_le_bytes());
        assert_eq!(&transfer.data[4..], &7_000u64.to_le_bytes());

        let sync = sync_native_ix(&to).unwrap();
        assert_eq!(sync.program_id, spl_token::ID);
        assert_eq!(sync.accounts, vec![AccountMeta::new(to, false)]);
        // TokenInstruction::SyncNative = 17
        assert_eq!(sync.data, vec![17]);
    }
}
