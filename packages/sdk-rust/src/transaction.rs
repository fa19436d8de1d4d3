//! Ordered assembly of a single transaction.
//!
//! Instructions are collected into four stages and always emitted in this
//! order:
//!
//! 1. setup: create missing token accounts, fund temporary wrapped-SOL accounts
//! 2. actions: the program calls themselves
//! 3. fee: an optional SPL transfer
//! 4. cleanup: close temporary accounts
//!
//! Fresh keypairs created along the way (temporary accounts, farming tickets,
//! farming calcs) are kept with the plan and co-sign the transaction.
//!
//! A plan too large for one packet can be split with
//! [`TransactionPlan::into_batches`].

use solana_sdk::{
    instruction::Instruction,
    message::Message,
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

use crate::error::{Error, Result};
use crate::instructions::{
    close_account_ix, create_ata_ix, create_token_account_ixs, derive_ata, sync_native_ix,
    system_transfer_ix,
};
use crate::registry::WSOL_MINT;

/// Serialized size of a legacy transaction carrying `instructions`, paid by `payer`.
pub fn transaction_size(instructions: &[Instruction], payer: &Pubkey) -> usize {
    let message = Message::new(instructions, Some(payer));
    let signatures = usize::from(message.header.num_required_signatures);
    // compact-u16 signature count (one byte below 128) + signatures + message
    1 + signatures * 64 + message.serialize().len()
}

fn check_fits(instructions: &[Instruction], payer: &Pubkey) -> Result<()> {
    let size = transaction_size(instructions, payer);
    if size > PACKET_DATA_SIZE {
        return Err(Error::TransactionTooLarge { size, limit: PACKET_DATA_SIZE });
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct TransactionPlan {
    setup:   Vec<Instruction>,
    actions: Vec<Instruction>,
    fee:     Option<Instruction>,
    cleanup: Vec<Instruction>,
    signers: Vec<Keypair>,
}

impl TransactionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_setup(&mut self, ix: Instruction) -> &mut Self {
        self.setup.push(ix);
        self
    }

    pub fn push_action(&mut self, ix: Instruction) -> &mut Self {
        self.actions.push(ix);
        self
    }

    /// Set the fee transfer; a second call replaces the first.
    pub fn set_fee(&mut self, ix: Instruction) -> &mut Self {
        self.fee = Some(ix);
        self
    }

    pub fn push_cleanup(&mut self, ix: Instruction) -> &mut Self {
        self.cleanup.push(ix);
        self
    }

    /// Register a keypair that must co-sign (newly created accounts).
    pub fn add_signer(&mut self, keypair: Keypair) -> &mut Self {
        self.signers.push(keypair);
        self
    }

    /// Return the wallet's associated token account for `mint`, adding its
    /// creation to the setup stage when `exists` is false.
    pub fn ata_if_missing(&mut self, wallet: &Pubkey, mint: &Pubkey, exists: bool) -> Pubkey {
        if !exists {
            self.setup.push(create_ata_ix(wallet, wallet, mint));
        }
        derive_ata(wallet, mint)
    }

    /// Create a temporary wrapped-SOL account holding `lamports` (rent
    /// included), owned by `wallet`, and close it back into the wallet in the
    /// cleanup stage. Returns the temporary account address.
    pub fn wrap_sol(&mut self, wallet: &Pubkey, lamports: u64) -> Result<Pubkey> {
        let temp = Keypair::new();
        let address = temp.pubkey();
        for ix in create_token_account_ixs(wallet, &address, &WSOL_MINT, wallet, lamports)? {
            self.setup.push(ix);
        }
        self.cleanup.push(close_account_ix(&address, wallet, wallet)?);
        self.signers.push(temp);
        Ok(address)
    }

    /// Top up the wallet's existing wrapped-SOL account with `lamports` and
    /// sync its token amount. The account stays open afterwards.
    pub fn fund_wsol_ata(&mut self, wallet: &Pubkey, lamports: u64) -> Result<Pubkey> {
        let ata = derive_ata(wallet, &WSOL_MINT);
        self.setup.push(system_transfer_ix(wallet, &ata, lamports));
        self.setup.push(sync_native_ix(&ata)?);
        Ok(ata)
    }

    /// Token account paying `amount` of `mint` from `wallet`.
    ///
    /// Wrapped SOL tops up the wallet's WSOL account when `ata_exists`, and
    /// otherwise funds a temporary account with `rent + amount`. Any other
    /// mint must already have its associated token account.
    pub fn source_account(
        &mut self,
        wallet:     &Pubkey,
        mint:       &Pubkey,
        amount:     u64,
        ata_exists: bool,
        rent:       u64,
    ) -> Result<Pubkey> {
        if *mint == WSOL_MINT {
            if ata_exists {
                return self.fund_wsol_ata(wallet, amount);
            }
            let lamports = rent.checked_add(amount).ok_or(Error::MathOverflow)?;
            return self.wrap_sol(wallet, lamports);
        }
        let ata = derive_ata(wallet, mint);
        if !ata_exists {
            return Err(Error::AccountNotFound(ata));
        }
        Ok(ata)
    }

    /// Token account receiving `mint` for `wallet`. Wrapped SOL lands in a
    /// temporary account unwrapped at cleanup; other mints use the associated
    /// token account, created when missing.
    pub fn destination_account(
        &mut self,
        wallet:     &Pubkey,
        mint:       &Pubkey,
        ata_exists: bool,
        rent:       u64,
    ) -> Result<Pubkey> {
        if *mint == WSOL_MINT {
            return self.wrap_sol(wallet, rent);
        }
        Ok(self.ata_if_missing(wallet, mint, ata_exists))
    }

    /// All instructions in stage order.
    pub fn instructions(&self) -> Vec<Instruction> {
        self.setup
            .iter()
            .chain(self.actions.iter())
            .chain(self.fee.iter())
            .chain(self.cleanup.iter())
            .cloned()
            .collect()
    }

    pub fn signers(&self) -> &[Keypair] {
        &self.signers
    }

    pub fn len(&self) -> usize {
        self.setup.len() + self.actions.len() + self.fee.iter().count() + self.cleanup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialized transaction size when `payer` submits this plan.
    pub fn size(&self, payer: &Pubkey) -> usize {
        transaction_size(&self.instructions(), payer)
    }

    /// Split the actions over as many plans as needed for each to fit in one
    /// packet. Setup stays in the first plan, fee and cleanup in the last, and
    /// every keypair goes to the plans whose instructions it signs.
    ///
    /// Errors with [`Error::TransactionTooLarge`] when a single action cannot
    /// fit even on its own.
    pub fn into_batches(self, payer: &Pubkey) -> Result<Vec<TransactionPlan>> {
        let tail: Vec<Instruction> = self.fee.iter().chain(self.cleanup.iter()).cloned().collect();

        let mut groups: Vec<Vec<Instruction>> = Vec::new();
        let mut current: Vec<Instruction> = Vec::new();
        for ix in self.actions {
            let prefix: &[Instruction] = if groups.is_empty() { &self.setup } else { &[] };
            let candidate: Vec<Instruction> = prefix
                .iter()
                .chain(current.iter())
                .chain(std::iter::once(&ix))
                .chain(tail.iter())
                .cloned()
                .collect();
            if transaction_size(&candidate, payer) <= PACKET_DATA_SIZE {
                current.push(ix);
                continue;
            }
            if current.is_empty() {
                check_fits(&candidate, payer)?;
            }
            groups.push(std::mem::take(&mut current));
            let alone: Vec<Instruction> = std::iter::once(&ix).chain(tail.iter()).cloned().collect();
            check_fits(&alone, payer)?;
            current.push(ix);
        }
        if !current.is_empty() || groups.is_empty() {
            groups.push(current);
        }

        let last = groups.len() - 1;
        let mut setup = self.setup;
        let mut plans = Vec::with_capacity(groups.len());
        for (i, actions) in groups.into_iter().enumerate() {
            let mut plan = TransactionPlan {
                setup: if i == 0 { std::mem::take(&mut setup) } else { Vec::new() },
                actions,
                ..TransactionPlan::default()
            };
            if i == last {
                plan.fee = self.fee.clone();
                plan.cleanup = self.cleanup.clone();
            }
            let instructions = plan.instructions();
            for kp in &self.signers {
                let key = kp.pubkey();
                let signs = instructions
                    .iter()
                    .any(|ix| ix.accounts.iter().any(|m| m.is_signer && m.pubkey == key));
                if signs {
                    plan.signers.push(kp.insecure_clone());
                }
            }
            plans.push(plan);
        }
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::token_transfer_ix;
    use solana_sdk::instruction::AccountMeta;

    fn marker(tag: u8) -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts:   vec![AccountMeta::new_readonly(Pubkey::new_unique(), false)],
            data:       vec![tag],
        }
    }

    #[test]
    fn stages_come_out_in_fixed_order() {
        let mut plan = TransactionPlan::new();
        // Pushed out of order on purpose.
        plan.push_cleanup(marker(4));
        plan.set_fee(marker(3));
        plan.push_action(marker(2));
        plan.push_setup(marker(1));
        plan.push_action(marker(22));

        let tags: Vec<u8> = plan.instructions().iter().map(|ix| ix.data[0]).collect();
        assert_eq!(tags, vec![1, 2, 22, 3, 4]);
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn existing_ata_adds_nothing() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let mut plan = TransactionPlan::new();

        let ata = plan.ata_if_missing(&wallet, &mint, true);
        assert_eq!(ata, derive_ata(&wallet, &mint));
        assert!(plan.is_empty());

        plan.ata_if_missing(&wallet, &mint, false);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.instructions()[0].program_id, spl_associated_token_account::ID);
    }

    #[test]
    fn wrapped_sol_brackets_the_action() {
        let wallet = Pubkey::new_unique();
        let mut plan = TransactionPlan::new();
        let temp = plan.wrap_sol(&wallet, 2_039_280 + 1_000).unwrap();
        plan.push_action(marker(9));
        plan.set_fee(token_transfer_ix(&temp, &Pubkey::new_unique(), &wallet, 10).unwrap());

        let ixs = plan.instructions();
        assert_eq!(ixs.len(), 5);
        // create_account + initialize_account3
        assert_eq!(ixs[0].program_id, solana_system_interface::program::ID);
        assert_eq!(ixs[1].program_id, spl_token::ID);
        assert_eq!(ixs[2].data, vec![9]);
        // fee transfer precedes the close
        assert_eq!(ixs[3].program_id, spl_token::ID);
        assert_eq!(ixs[4].program_id, spl_token::ID);
        assert_eq!(ixs[4].accounts[0].pubkey, temp);

        assert_eq!(plan.signers().len(), 1);
        assert_eq!(plan.signers()[0].pubkey(), temp);
    }

    fn wide(accounts: usize) -> Instruction {
        Instruction {
            program_id: spl_token::ID,
            accounts:   (0..accounts).map(|_| AccountMeta::new(Pubkey::new_unique(), false)).collect(),
            data:       vec![0; 8],
        }
    }

    #[test]
    fn small_plan_is_a_single_batch() {
        let wallet = Pubkey::new_unique();
        let mut plan = TransactionPlan::new();
        plan.push_action(marker(1));
        assert!(plan.size(&wallet) <= PACKET_DATA_SIZE);

        let batches = plan.into_batches(&wallet).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
    }

    #[test]
    fn many_actions_split_into_packets() {
        let wallet = Pubkey::new_unique();
        let mut plan = TransactionPlan::new();
        let temp = plan.wrap_sol(&wallet, 3_000_000).unwrap();
        plan.set_fee(token_transfer_ix(&temp, &Pubkey::new_unique(), &wallet, 1).unwrap());
        let actions: Vec<Instruction> = (0..30).map(|_| wide(2)).collect();
        for ix in &actions {
            plan.push_action(ix.clone());
        }
        assert!(plan.size(&wallet) > PACKET_DATA_SIZE);

        let batches = plan.into_batches(&wallet).unwrap();
        assert!(batches.len() > 1);
        for b in &batches {
            assert!(b.size(&wallet) <= PACKET_DATA_SIZE, "{} bytes", b.size(&wallet));
        }

        // Temp account is created (and co-signed) only in the first batch,
        // fee and close only in the last.
        assert_eq!(batches[0].setup.len(), 2);
        assert_eq!(batches[0].signers().len(), 1);
        assert_eq!(batches[0].signers()[0].pubkey(), temp);
        let last = batches.last().unwrap();
        assert!(last.fee.is_some());
        assert_eq!(last.cleanup.len(), 1);
        for b in &batches[1..] {
            assert!(b.setup.is_empty());
            assert!(b.signers().is_empty());
        }
        for b in &batches[..batches.len() - 1] {
            assert!(b.fee.is_none() && b.cleanup.is_empty());
        }

        let resplit: Vec<Instruction> = batches.iter().flat_map(|b| b.actions.clone()).collect();
        assert_eq!(resplit, actions);
    }

    #[test]
    fn action_too_wide_for_any_packet() {
        let wallet = Pubkey::new_unique();
        let mut plan = TransactionPlan::new();
        plan.push_action(marker(1));
        plan.push_action(wide(40));
        assert!(matches!(
            plan.into_batches(&wallet),
            Err(Error::TransactionTooLarge { limit, .. }) if limit == PACKET_DATA_SIZE
        ));
    }

    #[test]
    fn sol_source_tops_up_existing_wsol_account() {
        let wallet = Pubkey::new_unique();
        let ata = derive_ata(&wallet, &WSOL_MINT);
        let mut plan = TransactionPlan::new();

        let src = plan.source_account(&wallet, &WSOL_MINT, 5_000, true, 2_039_280).unwrap();
        assert_eq!(src, ata);
        let ixs = plan.instructions();
        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[0].program_id, solana_system_interface::program::ID);
        assert_eq!(ixs[0].accounts[1].pubkey, ata);
        assert_eq!(&ixs[0].data[4..], &5_000u64.to_le_bytes());
        assert_eq!(ixs[1].program_id, spl_token::ID);
        // nothing to close, no extra signer
        assert!(plan.cleanup.is_empty());
        assert!(plan.signers().is_empty());
    }

    #[test]
    fn sol_source_without_wsol_account_wraps_rent_plus_amount() {
        let wallet = Pubkey::new_unique();
        let mut plan = TransactionPlan::new();
        let src = plan.source_account(&wallet, &WSOL_MINT, 5_000, false, 2_039_280).unwrap();
        assert_eq!(plan.signers()[0].pubkey(), src);
        assert_eq!(plan.cleanup.len(), 1);
        // SystemInstruction::CreateAccount { lamports, .. }
        assert_eq!(&plan.setup[0].data[4..12], &2_044_280u64.to_le_bytes());

        let mut plan = TransactionPlan::new();
        assert!(matches!(
            plan.source_account(&wallet, &WSOL_MINT, u64::MAX, false, 1),
            Err(Error::MathOverflow)
        ));
    }

    #[test]
    fn spl_source_must_exist_and_destination_is_created() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let mut plan = TransactionPlan::new();
        assert!(matches!(
            plan.source_account(&wallet, &mint, 1, false, 0),
            Err(Error::AccountNotFound(a)) if a == derive_ata(&wallet, &mint)
        ));
        assert_eq!(plan.source_account(&wallet, &mint, 1, true, 0).unwrap(), derive_ata(&wallet, &mint));
        assert!(plan.is_empty());

        let dst = plan.destination_account(&wallet, &mint, false, 0).unwrap();
        assert_eq!(dst, derive_ata(&wallet, &mint));
        assert_eq!(plan.len(), 1);

        let sol = plan.destination_account(&wallet, &WSOL_MINT, true, 2_039_280).unwrap();
        assert_ne!(sol, derive_ata(&wallet, &WSOL_MINT));
        assert_eq!(plan.cleanup.len(), 1);
    }
}
