use anchor_lang::prelude::*;

/// Emission configuration and running index of one reward on one asset
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardData {
    pub mint: Pubkey,
    /// Token account the controller pays this reward from
    pub treasury: Pubkey,
    /// Reward accrued per asset unit (10^decimals) since distribution start
    pub index: u128,
    pub emission_per_second: u64,
    pub last_update_timestamp: i64,
    pub distribution_end: i64,
}

impl RewardData {
    /// Returns `(stored_index, index_projected_to_now)`.
    ///
    /// `None` on overflow.
    pub fn asset_index(&self, total_supply: u64, asset_unit: u128, now: i64) -> Option<(u128, u128)> {
        let old_index = self.index;
        if self.emission_per_second == 0
            || total_supply == 0
            || self.last_update_timestamp == now
            || self.last_update_timestamp >= self.distribution_end
        {
            return Some((old_index, old_index));
        }

        let until = now.min(self.distribution_end);
        let elapsed = u128::try_from(until.checked_sub(self.last_update_timestamp)?).ok()?;

        let accrued = (self.emission_per_second as u128)
            .checked_mul(elapsed)?
            .checked_mul(asset_unit)?
            / total_supply as u128;

        Some((old_index, old_index.checked_add(accrued)?))
    }
}

/// Rewards configured for one asset (the lending pool receipt)
#[account]
#[derive(Debug, Default)]
pub struct AssetRewards {
    pub asset: Pubkey,
    pub decimals: u8,
    pub rewards: Vec<RewardData>,
}

impl AssetRewards {
    pub fn asset_unit(&self) -> Option<u128> {
        10u128.checked_pow(self.decimals as u32)
    }

    pub fn reward_mints(&self) -> impl Iterator<Item = Pubkey> + '_ {
        self.rewards.iter().map(|r| r.mint)
    }

    pub fn reward(&self, mint: &Pubkey) -> Option<&RewardData> {
        self.rewards.iter().find(|r| r.mint == *mint)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserRewardData {
    pub mint: Pubkey,
    pub index: u128,
    pub accrued: u64,
}

/// Accrual record of one user on one asset
#[account]
#[derive(Debug, Default)]
pub struct UserAssetRewards {
    pub user: Pubkey,
    pub asset: Pubkey,
    pub entries: Vec<UserRewardData>,
}

impl UserAssetRewards {
    /// Rewards the controller would pay `user` for `mint` at `current_index`.
    pub fn pending(
        &self,
        mint: &Pubkey,
        balance: u64,
        current_index: u128,
        asset_unit: u128,
    ) -> Option<u64> {
        let Some(entry) = self.entries.iter().find(|e| e.mint == *mint) else {
            return Some(0);
        };
        if asset_unit == 0 {
            return None;
        }
        let accruing = (balance as u128)
            .checked_mul(current_index.saturating_sub(entry.index))?
            / asset_unit;
        let total = (entry.accrued as u128).checked_add(accruing)?;
        u64::try_from(total).ok()
    }
}

/// Delegated claimer of a user, PDA `[CLAIMER_SEED, user]`
#[account]
#[derive(Debug, Default)]
pub struct ClaimerConfig {
    pub user: Pubkey,
    pub claimer: Pubkey,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward(index: u128, emission: u64, last: i64, end: i64) -> RewardData {
        RewardData {
            index,
            emission_per_second: emission,
            last_update_timestamp: last,
            distribution_end: end,
            ..Default::default()
        }
    }

    #[test]
    fn test_asset_index_projects_emissions() {
        // 10 tokens/s for 100s over 1_000 units of supply (unit = 1)
        let r = reward(5, 10, 0, 1_000);
        assert_eq!(r.asset_index(1_000, 1, 100), Some((5, 6)));
    }

    #[test]
    fn test_asset_index_stops_at_distribution_end() {
        let r = reward(0, 10, 0, 50);
        let (_, capped) = r.asset_index(10, 1, 500).unwrap();
        assert_eq!(capped, 50);
    }

    #[test]
    fn test_asset_index_without_supply_is_flat() {
        let r = reward(42, 10, 0, 1_000);
        assert_eq!(r.asset_index(0, 1, 100), Some((42, 42)));
    }

    #[test]
    fn test_pending_for_unknown_mint_is_zero() {
        let user = UserAssetRewards::default();
        assert_eq!(user.pending(&Pubkey::new_unique(), 100, 10, 1), Some(0));
    }

    #[test]
    fn test_pending_accumulates_accrued() {
        let mint = Pubkey::new_unique();
        let user = UserAssetRewards {
            entries: vec![UserRewardData {
                mint,
                index: 10,
                accrued: 7,
            }],
            ..Default::default()
        };
        assert_eq!(user.pending(&mint, 3, 20, 1), Some(37));
    }
}
