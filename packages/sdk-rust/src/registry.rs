//! Static address tables: program IDs, well-known mints and named pools.
//!
//! Named pools map to a mint pair and a program version. The pool account
//! itself is located on-chain by mint pair (see
//! [`PoolService::find_pool`](crate::pools::PoolService::find_pool)) unless a
//! registry entry pins an explicit address.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use solana_sdk::{pubkey, pubkey::Pubkey};

use crate::error::{Error, Result};

// ─── Program IDs ──────────────────────────────────────────────────────────────

/// Constant-product pool program (v1 pools).
pub const POOLS_PROGRAM_ID: Pubkey = pubkey!("AMM55ShdkoGRB5jVYPjWziwk8m5MpwyDgsMWHaMSQWH6");
/// Curve pool program (v2 pools: constant product or stable curve).
pub const POOLS_V2_PROGRAM_ID: Pubkey = pubkey!("CURVGoZn8zycx6FXwwevgBTB2gVvdbGTEpvMJDbgs2t4");
/// RIN staking program.
pub const STAKING_PROGRAM_ID: Pubkey = pubkey!("rinajRPUgiiW2rG6uieXvcNNQNaWr9ZcMmqo28VvXfa");

// ─── Token mints (mainnet-beta) ──────────────────────────────────────────────

pub const RIN_MINT:  Pubkey = pubkey!("E5ndSkaB17Dm7CsD22dvcjfrYSDLCxFcMd6z8ddCk5wp");
pub const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
pub const USDT_MINT: Pubkey = pubkey!("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB");
pub const MSOL_MINT: Pubkey = pubkey!("mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So");
pub const STSOL_MINT: Pubkey = pubkey!("7dHbWXmci3dT8UFYWYZweBLXgycu7Y3iL6trKn1Y7ARj");
pub const ETH_MINT:  Pubkey = pubkey!("7vfCXTUXx5WJV5JADk17DUJ4ksgau7utNKj4b963voxs");
/// Wrapped SOL. Operations touching this mint fund a temporary token account.
pub const WSOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

pub const KNOWN_TOKENS: &[(&str, Pubkey)] = &[
    ("RIN",   RIN_MINT),
    ("USDC",  USDC_MINT),
    ("USDT",  USDT_MINT),
    ("SOL",   WSOL_MINT),
    ("MSOL",  MSOL_MINT),
    ("STSOL", STSOL_MINT),
    ("ETH",   ETH_MINT),
];

// ─── Pool versions ────────────────────────────────────────────────────────────

/// Which pool program owns a pool account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolVersion {
    V1,
    V2,
}

impl std::fmt::Display for PoolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolVersion::V1 => f.write_str("v1"),
            PoolVersion::V2 => f.write_str("v2"),
        }
    }
}

// ─── Named pools ──────────────────────────────────────────────────────────────

/// `(name, base symbol, quote symbol, version)`
const AUTHORIZED_POOLS: &[(&str, &str, &str, PoolVersion)] = &[
    ("RIN_USDC",   "RIN",   "USDC", PoolVersion::V1),
    ("RIN_SOL",    "RIN",   "SOL",  PoolVersion::V1),
    ("SOL_USDC",   "SOL",   "USDC", PoolVersion::V1),
    ("mSOL_USDC",  "MSOL",  "USDC", PoolVersion::V1),
    ("stSOL_USDC", "STSOL", "USDC", PoolVersion::V1),
    ("ETH_USDC",   "ETH",   "USDC", PoolVersion::V1),
    ("mSOL_SOL",   "MSOL",  "SOL",  PoolVersion::V2),
    ("USDT_USDC",  "USDT",  "USDC", PoolVersion::V2),
];

/// A named pool known to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    pub name:       String,
    pub base_mint:  Pubkey,
    pub quote_mint: Pubkey,
    pub version:    PoolVersion,
    /// Pinned pool account. `None` means "look it up by mint pair".
    pub address:    Option<Pubkey>,
}

#[derive(Deserialize)]
struct RawPoolEntry {
    name:       String,
    base_mint:  String,
    quote_mint: String,
    #[serde(default)]
    version:    Option<PoolVersion>,
    #[serde(default)]
    address:    Option<String>,
}

/// Name → pool lookup table. Names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    entries: BTreeMap<String, PoolEntry>,
}

impl PoolRegistry {
    /// The built-in mainnet table.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for (name, base, quote, version) in AUTHORIZED_POOLS {
            // Symbols in the table are always present in KNOWN_TOKENS.
            let (Some(base_mint), Some(quote_mint)) = (known_mint(base), known_mint(quote)) else {
                continue;
            };
            registry.insert(PoolEntry {
                name: name.to_string(),
                base_mint,
                quote_mint,
                version: *version,
                address: None,
            });
        }
        registry
    }

    /// Built-in table extended with the entries of a JSON array.
    ///
    /// ```json
    /// [{ "name": "RIN_USDT", "base_mint": "RIN", "quote_mint": "USDT",
    ///    "version": "v1", "address": "<optional pool pubkey>" }]
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let mut registry = Self::builtin();
        registry.extend_json(json)?;
        Ok(registry)
    }

    /// Read [`from_json`](Self::from_json) input from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Add entries from a JSON array; a repeated name replaces the earlier entry.
    pub fn extend_json(&mut self, json: &str) -> Result<()> {
        let raw: Vec<RawPoolEntry> = serde_json::from_str(json)?;
        for r in raw {
            let address = r
                .address
                .as_deref()
                .map(|a| {
                    Pubkey::from_str(a).map_err(|_| {
                        Error::Registry(format!("pool '{}': invalid address '{a}'", r.name))
                    })
                })
                .transpose()?;
            self.insert(PoolEntry {
                base_mint:  resolve_mint(&r.base_mint)?,
                quote_mint: resolve_mint(&r.quote_mint)?,
                version:    r.version.unwrap_or(PoolVersion::V1),
                address,
                name:       r.name,
            });
        }
        Ok(())
    }

    pub fn insert(&mut self, entry: PoolEntry) {
        self.entries.insert(entry.name.to_uppercase(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&PoolEntry> {
        self.entries.get(&name.to_uppercase())
    }

    /// Registered pool names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.values().map(|e| e.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoolEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── Symbol helpers ───────────────────────────────────────────────────────────

fn known_mint(symbol: &str) -> Option<Pubkey> {
    let upper = symbol.to_uppercase();
    KNOWN_TOKENS
        .iter()
        .find(|(sym, _)| *sym == upper)
        .map(|(_, mint)| *mint)
}

/// Resolve a symbol (RIN, USDC, SOL, …) or a base-58 mint address.
pub fn resolve_mint(symbol_or_address: &str) -> Result<Pubkey> {
    if let Some(mint) = known_mint(symbol_or_address) {
        return Ok(mint);
    }
    Pubkey::from_str(symbol_or_address).map_err(|_| {
        Error::Registry(format!(
            "unknown token '{}'; use one of {} or a base-58 mint address",
            symbol_or_address,
            KNOWN_TOKENS.iter().map(|(s, _)| *s).collect::<Vec<_>>().join(", ")
        ))
    })
}

/// Reverse lookup: mint → symbol, or a shortened address for unknown mints.
pub fn resolve_symbol(mint: &Pubkey) -> String {
    if let Some((sym, _)) = KNOWN_TOKENS.iter().find(|(_, m)| m == mint) {
        return sym.to_string();
    }
    let addr = mint.to_string();
    format!("{}…{}", &addr[..4], &addr[addr.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_resolves_every_pool() {
        let registry = PoolRegistry::builtin();
        assert_eq!(registry.len(), AUTHORIZED_POOLS.len());

        let rin_usdc = registry.get("rin_usdc").expect("RIN_USDC registered");
        assert_eq!(rin_usdc.base_mint, RIN_MINT);
        assert_eq!(rin_usdc.quote_mint, USDC_MINT);
        assert_eq!(rin_usdc.version, PoolVersion::V1);
        assert!(rin_usdc.address.is_none());

        assert_eq!(registry.get("USDT_USDC").unwrap().version, PoolVersion::V2);
    }

    #[test]
    fn json_entries_extend_and_override() {
        let pinned = Pubkey::new_unique();
        let json = format!(
            r#"[
                {{ "name": "RIN_USDC", "base_mint": "RIN", "quote_mint": "USDC",
                   "version": "v2", "address": "{pinned}" }},
                {{ "name": "CUSTOM", "base_mint": "{}", "quote_mint": "sol" }}
            ]"#,
            ETH_MINT
        );
        let registry = PoolRegistry::from_json(&json).unwrap();

        let overridden = registry.get("RIN_USDC").unwrap();
        assert_eq!(overridden.version, PoolVersion::V2);
        assert_eq!(overridden.address, Some(pinned));

        let custom = registry.get("custom").unwrap();
        assert_eq!(custom.base_mint, ETH_MINT);
        assert_eq!(custom.quote_mint, WSOL_MINT);
        assert_eq!(custom.version, PoolVersion::V1);
        assert_eq!(registry.len(), AUTHORIZED_POOLS.len() + 1);
    }

    #[test]
    fn bad_json_entry_is_rejected() {
        let err = PoolRegistry::from_json(r#"[{ "name": "X", "base_mint": "NOPE", "quote_mint": "USDC" }]"#)
            .unwrap_err();
        assert!(matches!(err, Error::Registry(_)));
    }

    #[test]
    fn symbols_round_trip() {
        assert_eq!(resolve_mint("usdc").unwrap(), USDC_MINT);
        assert_eq!(resolve_symbol(&USDC_MINT), "USDC");
        let unknown = Pubkey::new_unique();
        assert_eq!(resolve_mint(&unknown.to_string()).unwrap(), unknown);
        assert!(resolve_symbol(&unknown).contains('…'));
    }
}
