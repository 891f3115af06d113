//! Lazily settled reward-index accounting.
//!
//! Indices come from the rewards controller and are expressed per asset unit
//! (10^receipt_decimals). A user's accrual since the last settlement is
//! `balance * (current - last) / asset_unit`; settlement folds it into
//! `unclaimed_rewards` and records the index it was computed at.

use anchor_lang::prelude::*;
use rewards_controller_itf::RewardData;

use crate::{
    constants::{CLAIM_ACCOUNTS_PER_REWARD, MAX_REWARD_TOKENS},
    error::VaultError,
    math::{mul_div, Rounding},
    state::{RewardIndexCache, UserRewardsData},
};

/// Accrual of `balance` between two index values (floor)
pub fn pending_rewards(
    balance: u64,
    last_index: u128,
    current_index: u128,
    asset_unit: u128,
) -> Result<u128> {
    if balance == 0 || current_index <= last_index {
        return Ok(0);
    }
    mul_div(
        balance as u128,
        current_index - last_index,
        asset_unit,
        Rounding::Floor,
    )
}

/// Index a settlement record accrues from; never-settled users start at registration
pub fn effective_last_index(data: &UserRewardsData, cache: &RewardIndexCache) -> u128 {
    if data.rewards_index_on_last_interaction == 0 {
        cache.registration_index
    } else {
        data.rewards_index_on_last_interaction
    }
}

pub fn claimable_rewards(
    balance: u64,
    data: &UserRewardsData,
    cache: &RewardIndexCache,
    current_index: u128,
    asset_unit: u128,
) -> Result<u128> {
    require!(cache.is_registered, VaultError::RewardNotInitialized);

    let pending = pending_rewards(
        balance,
        effective_last_index(data, cache),
        current_index,
        asset_unit,
    )?;
    data.unclaimed_rewards
        .checked_add(pending)
        .ok_or_else(|| error!(VaultError::MathOverflow))
}

/// Fold pending accrual into `unclaimed_rewards` and move the user to `current_index`.
///
/// `balance` must be the balance before the change that triggers settlement.
pub fn settle(
    balance: u64,
    data: &mut UserRewardsData,
    cache: &RewardIndexCache,
    current_index: u128,
    asset_unit: u128,
) -> Result<()> {
    if balance > 0 {
        data.unclaimed_rewards = claimable_rewards(balance, data, cache, current_index, asset_unit)?;
    } else {
        require!(cache.is_registered, VaultError::RewardNotInitialized);
    }
    data.rewards_index_on_last_interaction = current_index;
    Ok(())
}

/// Settle one user for every registered reward.
///
/// `current_indices` is aligned with `registry`; every cache observes its index.
pub fn settle_user(
    balance: u64,
    entries: &mut [UserRewardsData],
    registry: &mut [RewardIndexCache],
    current_indices: &[u128],
    asset_unit: u128,
) -> Result<()> {
    require!(
        current_indices.len() == registry.len() && entries.len() >= registry.len(),
        VaultError::RewardAccountsMismatch
    );

    for ((cache, data), current) in registry
        .iter_mut()
        .zip(entries.iter_mut())
        .zip(current_indices.iter().copied())
    {
        settle(balance, data, cache, current, asset_unit)?;
        cache.observe(current);
    }
    Ok(())
}

/// Index the vault should settle at for `cache`.
///
/// Projects the controller's stored index to `now`; falls back to the cached
/// value once the controller stops listing the reward. Never goes backwards.
pub fn current_index(
    cache: &RewardIndexCache,
    controller: Option<&RewardData>,
    total_supply: u64,
    asset_unit: u128,
    now: i64,
) -> Result<u128> {
    let Some(reward) = controller else {
        return Ok(cache.last_updated_index);
    };
    let (_, projected) = reward
        .asset_index(total_supply, asset_unit, now)
        .ok_or(VaultError::MathOverflow)?;
    Ok(projected.max(cache.last_updated_index))
}

/// Append `mint` to the registry at `start_index`.
///
/// Returns `false` when the mint is already registered.
pub fn register_reward_token(
    registry: &mut Vec<RewardIndexCache>,
    mint: Pubkey,
    start_index: u128,
) -> Result<bool> {
    if registry.iter().any(|r| r.is_registered && r.mint == mint) {
        return Ok(false);
    }
    require!(
        registry.len() < MAX_REWARD_TOKENS,
        VaultError::TooManyRewardTokens
    );

    registry.push(RewardIndexCache {
        mint,
        is_registered: true,
        registration_index: start_index,
        last_updated_index: start_index,
    });
    Ok(true)
}

/// Split of a claim between what is paid now and what stays owed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimResolution {
    pub paid: u64,
    pub deferred: u128,
}

pub fn resolve_claim(user_reward: u128, held: u64) -> ClaimResolution {
    let paid = user_reward.min(held as u128);
    ClaimResolution {
        paid: paid as u64,
        deferred: user_reward - paid,
    }
}

/// Record the outcome of a claim: the remainder stays owed and the user
/// moves to `current_index` even when only part was paid.
pub fn finish_claim(
    data: &mut UserRewardsData,
    user_reward: u128,
    held: u64,
    current_index: u128,
) -> ClaimResolution {
    let resolution = resolve_claim(user_reward, held);
    data.unclaimed_rewards = resolution.deferred;
    data.rewards_index_on_last_interaction = current_index;
    resolution
}

/// One requested reward and where its accounts start in the remaining accounts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimTarget {
    pub mint: Pubkey,
    /// Position in the vault registry
    pub position: usize,
    pub first_account: usize,
}

/// Map a claim request onto the registry and the remaining accounts.
///
/// Default-address entries are skipped and take no accounts. Every other mint
/// must be registered and appear once, and `accounts_len` must be exactly
/// `CLAIM_ACCOUNTS_PER_REWARD` per claimed mint.
pub fn plan_claims(
    requested: &[Pubkey],
    registry: &[RewardIndexCache],
    accounts_len: usize,
) -> Result<Vec<ClaimTarget>> {
    let mut targets: Vec<ClaimTarget> = Vec::with_capacity(requested.len());

    for mint in requested.iter().filter(|m| **m != Pubkey::default()) {
        require!(
            targets.iter().all(|t| t.mint != *mint),
            VaultError::RewardAccountsMismatch
        );
        let position = registry
            .iter()
            .position(|r| r.is_registered && r.mint == *mint)
            .ok_or(VaultError::RewardNotInitialized)?;

        targets.push(ClaimTarget {
            mint: *mint,
            position,
            first_account: targets.len() * CLAIM_ACCOUNTS_PER_REWARD,
        });
    }

    require!(
        accounts_len == targets.len() * CLAIM_ACCOUNTS_PER_REWARD,
        VaultError::RewardAccountsMismatch
    );
    Ok(targets)
}
