//! On-chain account deserialization.
//!
//! Every record starts with the 8-byte Anchor account discriminator, which is
//! skipped. Integers are little-endian. Byte offsets mirror the program's
//! account structs exactly; the `*_OFFSET` constants are the positions used by
//! `getProgramAccounts` memcmp filters.

use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};
use crate::registry::PoolVersion;

// ─── Fees ─────────────────────────────────────────────────────────────────────

/// Fee schedule embedded in every pool account (48 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fees {
    pub trade_fee_numerator:            u64,
    pub trade_fee_denominator:          u64,
    pub owner_trade_fee_numerator:      u64,
    pub owner_trade_fee_denominator:    u64,
    pub owner_withdraw_fee_numerator:   u64,
    pub owner_withdraw_fee_denominator: u64,
}

pub const FEES_LEN: usize = 48;

fn parse_fees(data: &[u8], offset: usize) -> Result<Fees> {
    Ok(Fees {
        trade_fee_numerator:            read_u64(data, offset)?,
        trade_fee_denominator:          read_u64(data, offset + 8)?,
        owner_trade_fee_numerator:      read_u64(data, offset + 16)?,
        owner_trade_fee_denominator:    read_u64(data, offset + 24)?,
        owner_withdraw_fee_numerator:   read_u64(data, offset + 32)?,
        owner_withdraw_fee_denominator: read_u64(data, offset + 40)?,
    })
}

// ─── Pool ─────────────────────────────────────────────────────────────────────

/// Bonding curve of a v2 pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveType {
    ConstantProduct,
    Stable,
}

impl CurveType {
    fn from_u8(v: u8, offset: usize) -> Result<Self> {
        match v {
            0 => Ok(CurveType::ConstantProduct),
            1 => Ok(CurveType::Stable),
            other => Err(Error::ParseError { offset, reason: format!("unknown curve type {other}") }),
        }
    }
}

/// Curve fields present only on v2 pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCurve {
    pub curve_type: CurveType,
    pub curve:      Pubkey,
}

/// Deserialized pool account.
///
/// Layout (after 8-byte discriminator):
/// ```text
/// lp_token_freeze_vault(32)  pool_mint(32)  base_token_vault(32)
/// base_token_mint(32)  quote_token_vault(32)  quote_token_mint(32)
/// pool_signer(32)  pool_signer_nonce(1)  authority(32)
/// initializer_account(32)  fee_base_account(32)  fee_quote_account(32)
/// fee_pool_token_account(32)  fees(48)                       = 441 bytes (v1)
/// … curve_type(1)  curve(32)                                  = 474 bytes (v2)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub lp_token_freeze_vault:  Pubkey,
    pub pool_mint:              Pubkey,
    pub base_token_vault:       Pubkey,
    pub base_token_mint:        Pubkey,
    pub quote_token_vault:      Pubkey,
    pub quote_token_mint:       Pubkey,
    pub pool_signer:            Pubkey,
    pub pool_signer_nonce:      u8,
    pub authority:              Pubkey,
    pub initializer_account:    Pubkey,
    pub fee_base_account:       Pubkey,
    pub fee_quote_account:      Pubkey,
    pub fee_pool_token_account: Pubkey,
    pub fees:                   Fees,
    /// `Some` for v2 pools.
    pub curve:                  Option<PoolCurve>,
}

pub const POOL_V1_LEN: usize = 441;
pub const POOL_V2_LEN: usize = 474;
pub const POOL_BASE_MINT_OFFSET:  usize = 104;
pub const POOL_QUOTE_MINT_OFFSET: usize = 168;

impl PoolState {
    pub fn is_stable(&self) -> bool {
        matches!(self.curve, Some(PoolCurve { curve_type: CurveType::Stable, .. }))
    }
}

/// Deserialize a pool account of the given program version.
pub fn parse_pool(data: &[u8], version: PoolVersion) -> Result<PoolState> {
    let expected = match version {
        PoolVersion::V1 => POOL_V1_LEN,
        PoolVersion::V2 => POOL_V2_LEN,
    };
    check_len(data, expected, "Pool")?;

    let curve = match version {
        PoolVersion::V1 => None,
        PoolVersion::V2 => Some(PoolCurve {
            curve_type: CurveType::from_u8(data[441], 441)?,
            curve:      read_pubkey(data, 442)?,
        }),
    };

    Ok(PoolState {
        lp_token_freeze_vault:  read_pubkey(data, 8)?,
        pool_mint:              read_pubkey(data, 40)?,
        base_token_vault:       read_pubkey(data, 72)?,
        base_token_mint:        read_pubkey(data, POOL_BASE_MINT_OFFSET)?,
        quote_token_vault:      read_pubkey(data, 136)?,
        quote_token_mint:       read_pubkey(data, POOL_QUOTE_MINT_OFFSET)?,
        pool_signer:            read_pubkey(data, 200)?,
        pool_signer_nonce:      data[232],
        authority:              read_pubkey(data, 233)?,
        initializer_account:    read_pubkey(data, 265)?,
        fee_base_account:       read_pubkey(data, 297)?,
        fee_quote_account:      read_pubkey(data, 329)?,
        fee_pool_token_account: read_pubkey(data, 361)?,
        fees:                   parse_fees(data, 393)?,
        curve,
    })
}

// ─── Farming state ────────────────────────────────────────────────────────────

/// Reward schedule attached to a pool (or staking pool).
///
/// Layout (after 8-byte discriminator):
/// ```text
/// tokens_unlocked(8)  tokens_per_period(8)  tokens_total(8)  period_length(8)
/// no_withdrawal_time(8)  vesting_type(1)  vesting_period(8)  start_time(8)
/// current_time(8)  pool(32)  farming_token_vault(32)  farming_snapshots(32)
/// = 169 bytes
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmingState {
    pub tokens_unlocked:     u64,
    pub tokens_per_period:   u64,
    pub tokens_total:        u64,
    pub period_length:       u64,
    pub no_withdrawal_time:  u64,
    pub vesting_type:        u8,
    pub vesting_period:      u64,
    pub start_time:          u64,
    pub current_time:        u64,
    pub pool:                Pubkey,
    pub farming_token_vault: Pubkey,
    pub farming_snapshots:   Pubkey,
}

pub const FARMING_STATE_LEN: usize = 169;
pub const FARMING_STATE_POOL_OFFSET: usize = 73;

impl FarmingState {
    /// Rewards not yet unlocked by the schedule.
    pub fn tokens_remaining(&self) -> u64 {
        self.tokens_total.saturating_sub(self.tokens_unlocked)
    }
}

pub fn parse_farming_state(data: &[u8]) -> Result<FarmingState> {
    check_len(data, FARMING_STATE_LEN, "FarmingState")?;
    Ok(FarmingState {
        tokens_unlocked:     read_u64(data, 8)?,
        tokens_per_period:   read_u64(data, 16)?,
        tokens_total:        read_u64(data, 24)?,
        period_length:       read_u64(data, 32)?,
        no_withdrawal_time:  read_u64(data, 40)?,
        vesting_type:        data[48],
        vesting_period:      read_u64(data, 49)?,
        start_time:          read_u64(data, 57)?,
        current_time:        read_u64(data, 65)?,
        pool:                read_pubkey(data, FARMING_STATE_POOL_OFFSET)?,
        farming_token_vault: read_pubkey(data, 105)?,
        farming_snapshots:   read_pubkey(data, 137)?,
    })
}

// ─── Farming ticket ───────────────────────────────────────────────────────────

/// A farming state a ticket has been attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarmingStateAttached {
    pub farming_state:             Pubkey,
    pub last_withdraw_time:        u64,
    pub last_vested_withdraw_time: u64,
}

/// LP tokens (or staked tokens) frozen by a user.
///
/// Layout (after 8-byte discriminator):
/// ```text
/// tokens_frozen(8)  start_time(8)  end_time(8)  user_key(32)  pool(32)
/// states_attached: 10 × { farming_state(32) last_withdraw_time(8)
///                          last_vested_withdraw_time(8) }
/// = 576 bytes
/// ```
/// The staking program stores its tickets in the same layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmingTicket {
    pub tokens_frozen:   u64,
    pub start_time:      u64,
    pub end_time:        u64,
    pub user_key:        Pubkey,
    pub pool:            Pubkey,
    /// Occupied slots only.
    pub states_attached: Vec<FarmingStateAttached>,
}

pub const FARMING_TICKET_LEN: usize = 576;
pub const FARMING_TICKET_USER_OFFSET: usize = 32;
pub const FARMING_TICKET_POOL_OFFSET: usize = 64;
pub const MAX_STATES_ATTACHED: usize = 10;
/// `end_time` of a ticket that has not been ended yet.
pub const OPEN_TICKET_END_TIME: u64 = i64::MAX as u64;

const STATE_ATTACHED_LEN: usize = 48;

impl FarmingTicket {
    pub fn is_open(&self) -> bool {
        self.end_time == OPEN_TICKET_END_TIME
    }

    pub fn is_attached_to(&self, farming_state: &Pubkey) -> bool {
        self.states_attached.iter().any(|s| s.farming_state == *farming_state)
    }
}

pub fn parse_farming_ticket(data: &[u8]) -> Result<FarmingTicket> {
    check_len(data, FARMING_TICKET_LEN, "FarmingTicket")?;

    let mut states_attached = Vec::new();
    for i in 0..MAX_STATES_ATTACHED {
        let base = 96 + i * STATE_ATTACHED_LEN;
        let farming_state = read_pubkey(data, base)?;
        if farming_state == Pubkey::default() {
            continue;
        }
        states_attached.push(FarmingStateAttached {
            farming_state,
            last_withdraw_time:        read_u64(data, base + 32)?,
            last_vested_withdraw_time: read_u64(data, base + 40)?,
        });
    }

    Ok(FarmingTicket {
        tokens_frozen: read_u64(data, 8)?,
        start_time:    read_u64(data, 16)?,
        end_time:      read_u64(data, 24)?,
        user_key:      read_pubkey(data, FARMING_TICKET_USER_OFFSET)?,
        pool:          read_pubkey(data, FARMING_TICKET_POOL_OFFSET)?,
        states_attached,
    })
}

// ─── Farming calc ─────────────────────────────────────────────────────────────

/// Per-user accumulator of rewards computed by `check_farmed`.
///
/// Layout: `disc(8) farming_state(32) user_key(32) initializer(32)
/// token_amount(8)` = 112 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmingCalc {
    pub farming_state: Pubkey,
    pub user_key:      Pubkey,
    pub initializer:   Pubkey,
    pub token_amount:  u64,
}

pub const FARMING_CALC_LEN: usize = 112;
pub const FARMING_CALC_STATE_OFFSET: usize = 8;
pub const FARMING_CALC_USER_OFFSET: usize = 40;

pub fn parse_farming_calc(data: &[u8]) -> Result<FarmingCalc> {
    check_len(data, FARMING_CALC_LEN, "FarmingCalc")?;
    Ok(FarmingCalc {
        farming_state: read_pubkey(data, FARMING_CALC_STATE_OFFSET)?,
        user_key:      read_pubkey(data, FARMING_CALC_USER_OFFSET)?,
        initializer:   read_pubkey(data, 72)?,
        token_amount:  read_u64(data, 104)?,
    })
}

// ─── Staking pool ─────────────────────────────────────────────────────────────

/// Layout: `disc(8) staking_mint(32) staking_vault(32) pool_signer(32)
/// pool_signer_nonce(1) authority(32)` = 137 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingPool {
    pub staking_mint:      Pubkey,
    pub staking_vault:     Pubkey,
    pub pool_signer:       Pubkey,
    pub pool_signer_nonce: u8,
    pub authority:         Pubkey,
}

pub const STAKING_POOL_LEN: usize = 137;

pub fn parse_staking_pool(data: &[u8]) -> Result<StakingPool> {
    check_len(data, STAKING_POOL_LEN, "StakingPool")?;
    Ok(StakingPool {
        staking_mint:      read_pubkey(data, 8)?,
        staking_vault:     read_pubkey(data, 40)?,
        pool_signer:       read_pubkey(data, 72)?,
        pool_signer_nonce: data[104],
        authority:         read_pubkey(data, 105)?,
    })
}

// ─── SPL token accounts ───────────────────────────────────────────────────────

/// Read the `amount` field from a packed SPL token account.
///
/// Token account layout: `mint(32) owner(32) amount(8) …`
pub fn parse_token_amount(data: &[u8]) -> Result<u64> {
    if data.len() < 72 {
        return Err(Error::ParseError {
            offset: 64,
            reason: format!("Token account is {} bytes; need at least 72", data.len()),
        });
    }
    read_u64(data, 64)
}

/// Read the `mint` field from a packed SPL token account.
pub fn parse_token_mint(data: &[u8]) -> Result<Pubkey> {
    check_len(data, 72, "Token")?;
    read_pubkey(data, 0)
}

/// Read `(supply, decimals)` from a packed SPL mint.
///
/// Mint layout: `authority_option(4) authority(32) supply(8) decimals(1) …`
pub fn parse_mint_supply(data: &[u8]) -> Result<(u64, u8)> {
    check_len(data, 45, "Mint")?;
    Ok((read_u64(data, 36)?, data[44]))
}

// ─── Byte-slice primitives ────────────────────────────────────────────────────

fn check_len(data: &[u8], expected: usize, what: &str) -> Result<()> {
    if data.len() < expected {
        return Err(Error::ParseError {
            offset: 0,
            reason: format!("{what} account is {} bytes; expected {expected}", data.len()),
        });
    }
    Ok(())
}

fn field<const N: usize>(data: &[u8], offset: usize, what: &str) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::ParseError {
            offset,
            reason: format!("slice too short for {what} ({N} bytes)"),
        })
}

pub(crate) fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey> {
    field::<32>(data, offset, "Pubkey").map(Pubkey::from)
}

pub(crate) fn read_u64(data: &[u8], offset: usize) -> Result<u64> {
    field::<8>(data, offset, "u64").map(u64::from_le_bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Little helper for laying out test buffers field by field.
    pub(crate) struct Buf(pub Vec<u8>);

    impl Buf {
        pub fn new(len: usize) -> Self {
            Buf(vec![0u8; len])
        }
        pub fn key(mut self, offset: usize, k: &Pubkey) -> Self {
            self.0[offset..offset + 32].copy_from_slice(k.as_ref());
            self
        }
        pub fn u64(mut self, offset: usize, v: u64) -> Self {
            self.0[offset..offset + 8].copy_from_slice(&v.to_le_bytes());
            self
        }
        pub fn u8(mut self, offset: usize, v: u8) -> Self {
            self.0[offset] = v;
            self
        }
    }

    fn keys<const N: usize>() -> [Pubkey; N] {
        std::array::from_fn(|_| Pubkey::new_unique())
    }

    pub(crate) fn pool_bytes(k: &[Pubkey; 12], version: PoolVersion, curve: Option<&Pubkey>) -> Vec<u8> {
        let len = match version {
            PoolVersion::V1 => POOL_V1_LEN,
            PoolVersion::V2 => POOL_V2_LEN,
        };
        let mut b = Buf::new(len)
            .key(8, &k[0]).key(40, &k[1]).key(72, &k[2]).key(104, &k[3])
            .key(136, &k[4]).key(168, &k[5]).key(200, &k[6]).u8(232, 254)
            .key(233, &k[7]).key(265, &k[8]).key(297, &k[9]).key(329, &k[10])
            .key(361, &k[11])
            .u64(393, 25).u64(401, 10_000).u64(409, 5).u64(417, 10_000)
            .u64(425, 0).u64(433, 1);
        if let Some(c) = curve {
            b = b.u8(441, 1).key(442, c);
        }
        b.0
    }

    #[test]
    fn decodes_v1_pool() {
        let k = keys::<12>();
        let data = pool_bytes(&k, PoolVersion::V1, None);
        let pool = parse_pool(&data, PoolVersion::V1).unwrap();

        assert_eq!(pool.lp_token_freeze_vault, k[0]);
        assert_eq!(pool.pool_mint, k[1]);
        assert_eq!(pool.base_token_vault, k[2]);
        assert_eq!(pool.base_token_mint, k[3]);
        assert_eq!(pool.quote_token_vault, k[4]);
        assert_eq!(pool.quote_token_mint, k[5]);
        assert_eq!(pool.pool_signer, k[6]);
        assert_eq!(pool.pool_signer_nonce, 254);
        assert_eq!(pool.authority, k[7]);
        assert_eq!(pool.initializer_account, k[8]);
        assert_eq!(pool.fee_base_account, k[9]);
        assert_eq!(pool.fee_quote_account, k[10]);
        assert_eq!(pool.fee_pool_token_account, k[11]);
        assert_eq!(pool.fees.trade_fee_numerator, 25);
        assert_eq!(pool.fees.owner_trade_fee_numerator, 5);
        assert_eq!(pool.fees.owner_withdraw_fee_denominator, 1);
        assert!(pool.curve.is_none());
        assert!(!pool.is_stable());
    }

    #[test]
    fn decodes_v2_pool_curve() {
        let k = keys::<12>();
        let curve = Pubkey::new_unique();
        let data = pool_bytes(&k, PoolVersion::V2, Some(&curve));
        let pool = parse_pool(&data, PoolVersion::V2).unwrap();
        assert_eq!(pool.curve, Some(PoolCurve { curve_type: CurveType::Stable, curve }));
        assert!(pool.is_stable());

        // A v1-sized buffer is too short for the v2 layout.
        let short = pool_bytes(&k, PoolVersion::V1, None);
        assert!(matches!(parse_pool(&short, PoolVersion::V2), Err(Error::ParseError { .. })));
    }

    #[test]
    fn rejects_unknown_curve_type() {
        let k = keys::<12>();
        let mut data = pool_bytes(&k, PoolVersion::V2, Some(&Pubkey::new_unique()));
        data[441] = 7;
        assert!(matches!(
            parse_pool(&data, PoolVersion::V2),
            Err(Error::ParseError { offset: 441, .. })
        ));
    }

    #[test]
    fn decodes_farming_state() {
        let [pool, vault, snaps] = keys::<3>();
        let data = Buf::new(FARMING_STATE_LEN)
            .u64(8, 400).u64(16, 100).u64(24, 1_000).u64(32, 3_600).u64(40, 86_400)
            .u8(48, 1).u64(49, 604_800).u64(57, 1_650_000_000).u64(65, 1_650_003_600)
            .key(73, &pool).key(105, &vault).key(137, &snaps)
            .0;
        let s = parse_farming_state(&data).unwrap();
        assert_eq!(s.tokens_unlocked, 400);
        assert_eq!(s.tokens_per_period, 100);
        assert_eq!(s.tokens_total, 1_000);
        assert_eq!(s.period_length, 3_600);
        assert_eq!(s.no_withdrawal_time, 86_400);
        assert_eq!(s.vesting_type, 1);
        assert_eq!(s.vesting_period, 604_800);
        assert_eq!(s.start_time, 1_650_000_000);
        assert_eq!(s.current_time, 1_650_003_600);
        assert_eq!(s.pool, pool);
        assert_eq!(s.farming_token_vault, vault);
        assert_eq!(s.farming_snapshots, snaps);
        assert_eq!(s.tokens_remaining(), 600);
    }

    #[test]
    fn decodes_ticket_and_skips_empty_slots() {
        let [user, pool, st0, st2] = keys::<4>();
        let data = Buf::new(FARMING_TICKET_LEN)
            .u64(8, 5_000).u64(16, 1_700_000_000).u64(24, OPEN_TICKET_END_TIME)
            .key(32, &user).key(64, &pool)
            .key(96, &st0).u64(128, 11).u64(136, 12)
            .key(96 + 2 * 48, &st2).u64(96 + 2 * 48 + 32, 21)
            .0;
        let t = parse_farming_ticket(&data).unwrap();
        assert_eq!(t.tokens_frozen, 5_000);
        assert_eq!(t.start_time, 1_700_000_000);
        assert!(t.is_open());
        assert_eq!(t.user_key, user);
        assert_eq!(t.pool, pool);
        assert_eq!(
            t.states_attached,
            vec![
                FarmingStateAttached { farming_state: st0, last_withdraw_time: 11, last_vested_withdraw_time: 12 },
                FarmingStateAttached { farming_state: st2, last_withdraw_time: 21, last_vested_withdraw_time: 0 },
            ]
        );
        assert!(t.is_attached_to(&st2));
        assert!(!t.is_attached_to(&pool));
    }

    #[test]
    fn closed_ticket_is_not_open() {
        let data = Buf::new(FARMING_TICKET_LEN).u64(24, 1_700_000_100).0;
        assert!(!parse_farming_ticket(&data).unwrap().is_open());
    }

    #[test]
    fn decodes_farming_calc_and_staking_pool() {
        let [state, user, init] = keys::<3>();
        let calc = Buf::new(FARMING_CALC_LEN)
            .key(8, &state).key(40, &user).key(72, &init).u64(104, 777)
            .0;
        let c = parse_farming_calc(&calc).unwrap();
        assert_eq!((c.farming_state, c.user_key, c.initializer, c.token_amount), (state, user, init, 777));

        let [mint, vault, signer, auth] = keys::<4>();
        let sp = Buf::new(STAKING_POOL_LEN)
            .key(8, &mint).key(40, &vault).key(72, &signer).u8(104, 253).key(105, &auth)
            .0;
        let p = parse_staking_pool(&sp).unwrap();
        assert_eq!(p.staking_mint, mint);
        assert_eq!(p.staking_vault, vault);
        assert_eq!(p.pool_signer, signer);
        assert_eq!(p.pool_signer_nonce, 253);
        assert_eq!(p.authority, auth);
    }

    #[test]
    fn token_and_mint_fields() {
        let mint = Pubkey::new_unique();
        let acc = Buf::new(165).key(0, &mint).u64(64, 42).0;
        assert_eq!(parse_token_amount(&acc).unwrap(), 42);
        assert_eq!(parse_token_mint(&acc).unwrap(), mint);

        let m = Buf::new(82).u64(36, 1_000_000).u8(44, 6).0;
        assert_eq!(parse_mint_supply(&m).unwrap(), (1_000_000, 6));
    }

    #[test]
    fn short_token_account_names_the_record_once() {
        let err = parse_token_mint(&[0u8; 10]).unwrap_err();
        assert_eq!(err.to_string(), "Account parse error at offset 0: Token account is 10 bytes; expected 72");
        let err = parse_mint_supply(&[0u8; 10]).unwrap_err();
        assert!(err.to_string().ends_with("Mint account is 10 bytes; expected 45"), "{err}");
    }

    #[test]
    fn short_buffers_are_parse_errors() {
        for err in [
            parse_farming_state(&[0u8; 10]).unwrap_err(),
            parse_farming_ticket(&[0u8; 100]).unwrap_err(),
            parse_farming_calc(&[]).unwrap_err(),
            parse_staking_pool(&[0u8; 136]).unwrap_err(),
            parse_token_amount(&[0u8; 71]).unwrap_err(),
        ] {
            assert!(matches!(err, Error::ParseError { .. }), "{err}");
        }
    }
}
