//! Connection settings and program addresses.

use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::registry::{PoolVersion, POOLS_PROGRAM_ID, POOLS_V2_PROGRAM_ID, STAKING_PROGRAM_ID};

pub const MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";
pub const DEVNET_RPC:  &str = "https://api.devnet.solana.com";

/// Connection settings and program addresses used by [`AldrinClient`](crate::AldrinClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// RPC endpoint URL
    pub rpc_url: String,

    /// Commitment for reads and transaction confirmation
    pub commitment: CommitmentConfig,

    pub pools_program_id: Pubkey,
    pub pools_v2_program_id: Pubkey,
    pub staking_program_id: Pubkey,

    /// Snapshots walked per `check_farmed` call when claiming rewards
    pub max_snapshots: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ClientConfig {
    pub fn mainnet() -> Self {
        Self {
            rpc_url: MAINNET_RPC.to_string(),
            commitment: CommitmentConfig::confirmed(),
            pools_program_id: POOLS_PROGRAM_ID,
            pools_v2_program_id: POOLS_V2_PROGRAM_ID,
            staking_program_id: STAKING_PROGRAM_ID,
            max_snapshots: 10,
        }
    }

    /// Devnet endpoint. Program IDs still default to the mainnet deployments;
    /// override them with [`with_program_ids`](Self::with_program_ids).
    pub fn devnet() -> Self {
        Self::mainnet().with_rpc_url(DEVNET_RPC)
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }

    /// Override the program IDs (useful for locally deployed programs in tests).
    pub fn with_program_ids(mut self, pools: Pubkey, pools_v2: Pubkey, staking: Pubkey) -> Self {
        self.pools_program_id = pools;
        self.pools_v2_program_id = pools_v2;
        self.staking_program_id = staking;
        self
    }

    pub fn with_max_snapshots(mut self, max_snapshots: u64) -> Self {
        self.max_snapshots = max_snapshots;
        self
    }

    pub fn pool_program(&self, version: PoolVersion) -> Pubkey {
        match version {
            PoolVersion::V1 => self.pools_program_id,
            PoolVersion::V2 => self.pools_v2_program_id,
        }
    }

    /// Pool version owning accounts of `program_id`, if it is one of ours.
    pub fn pool_version(&self, program_id: &Pubkey) -> Option<PoolVersion> {
        if *program_id == self.pools_program_id {
            Some(PoolVersion::V1)
        } else if *program_id == self.pools_v2_program_id {
            Some(PoolVersion::V2)
        } else {
            None
        }
    }
}
