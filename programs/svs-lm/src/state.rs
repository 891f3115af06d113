use anchor_lang::prelude::*;

use crate::{
    constants::{MAX_REWARD_TOKENS, VAULT_SEED},
    error::VaultError,
};

/// Registry entry of a reward token, in registration order
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardIndexCache {
    pub mint: Pubkey,
    /// Latched once set, never cleared
    pub is_registered: bool,
    /// Controller index at registration; start point for never-settled users
    pub registration_index: u128,
    /// Highest controller index observed by a settlement
    pub last_updated_index: u128,
}

impl RewardIndexCache {
    pub const LEN: usize = 32 + 1 + 16 + 16;

    pub fn observe(&mut self, current_index: u128) {
        if current_index > self.last_updated_index {
            self.last_updated_index = current_index;
        }
    }
}

#[account]
pub struct Vault {
    /// Account that created the vault
    pub authority: Pubkey,
    /// Asset supplied to the lending pool
    pub underlying_mint: Pubkey,
    /// Yield-bearing receipt of the lending pool (scaled balances)
    pub receipt_mint: Pubkey,
    /// Token-2022 non-transferable shares mint
    pub shares_mint: Pubkey,
    /// Vault-owned receipt token account
    pub receipt_vault: Pubkey,
    /// Lending pool reserve of `underlying_mint`
    pub reserve: Pubkey,
    /// Rewards controller configuration of `receipt_mint`
    pub asset_rewards: Pubkey,
    /// Decimals of receipt and shares
    pub receipt_decimals: u8,
    /// PDA bump seed
    pub bump: u8,
    /// Unique vault identifier (allows multiple vaults per receipt)
    pub vault_id: u64,
    /// Reward registry, append-only
    pub rewards: Vec<RewardIndexCache>,
    /// Reserved for future upgrades
    pub _reserved: [u8; 64],
}

impl Vault {
    pub const LEN: usize = 8 +  // discriminator
        32 * 7 +  // authority .. asset_rewards
        1 +   // receipt_decimals
        1 +   // bump
        8 +   // vault_id
        4 + RewardIndexCache::LEN * MAX_REWARD_TOKENS + // rewards
        64; // _reserved

    pub const SEED_PREFIX: &'static [u8] = VAULT_SEED;

    /// One whole share, the unit reward indices are expressed per
    pub fn asset_unit(&self) -> Result<u128> {
        10u128
            .checked_pow(self.receipt_decimals as u32)
            .ok_or_else(|| error!(VaultError::MathOverflow))
    }

    pub fn reward_position(&self, mint: &Pubkey) -> Option<usize> {
        self.rewards
            .iter()
            .position(|r| r.is_registered && r.mint == *mint)
    }

    pub fn is_registered_reward(&self, mint: &Pubkey) -> bool {
        self.reward_position(mint).is_some()
    }
}

/// Settlement record of one user for one reward
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserRewardsData {
    /// 0 means never settled
    pub rewards_index_on_last_interaction: u128,
    /// Owed but not yet paid out
    pub unclaimed_rewards: u128,
}

/// Per-user reward state, entries aligned with `Vault::rewards`
#[account]
pub struct UserRewards {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub bump: u8,
    pub entries: [UserRewardsData; MAX_REWARD_TOKENS],
}

impl UserRewards {
    pub const LEN: usize = 8 +  // discriminator
        32 +  // vault
        32 +  // owner
        1 +   // bump
        32 * MAX_REWARD_TOKENS; // entries

    /// Fill identity fields of a freshly created account
    pub fn init_if_empty(&mut self, vault: Pubkey, owner: Pubkey, bump: u8) {
        if self.vault == Pubkey::default() {
            self.vault = vault;
            self.owner = owner;
            self.bump = bump;
        }
    }
}

/// Meta-transaction nonce of a signer
#[account]
pub struct SigNonce {
    pub vault: Pubkey,
    pub signer: Pubkey,
    pub nonce: u64,
    pub bump: u8,
}

impl SigNonce {
    pub const LEN: usize = 8 + 32 + 32 + 8 + 1;

    pub fn init_if_empty(&mut self, vault: Pubkey, signer: Pubkey, bump: u8) {
        if self.vault == Pubkey::default() {
            self.vault = vault;
            self.signer = signer;
            self.bump = bump;
        }
    }

    /// Returns the nonce the current intent must carry, then advances it
    pub fn consume(&mut self) -> Result<u64> {
        let current = self.nonce;
        self.nonce = current.checked_add(1).ok_or(VaultError::MathOverflow)?;
        Ok(current)
    }
}
