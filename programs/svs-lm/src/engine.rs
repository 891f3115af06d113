//! Planning of deposits and withdrawals.
//!
//! A plan fixes the share and asset amounts of an operation before any
//! account is touched. Instructions execute the plan with CPIs.

use anchor_lang::prelude::*;

use crate::{
    caps::{self, ReserveSnapshot},
    error::VaultError,
    math::{convert_to_assets, convert_to_shares, Rounding},
};

/// Which side of the conversion the caller fixed
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountFormat {
    Shares(u64),
    Assets(u64),
}

/// How value enters or leaves the vault
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Underlying supplied to / withdrawn from the lending pool
    LendingPool,
    /// Receipt tokens moved directly
    Direct,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    pub shares: u64,
    pub assets: u64,
}

pub fn plan_deposit(
    amount: AmountFormat,
    route: Route,
    snapshot: &ReserveSnapshot,
) -> Result<Plan> {
    let rate = snapshot.rate();
    let plan = match amount {
        AmountFormat::Shares(shares) => {
            if route == Route::LendingPool {
                require!(shares <= caps::max_mint(snapshot)?, VaultError::ExceedsMaxMint);
            }
            Plan {
                shares,
                assets: convert_to_assets(shares, rate, Rounding::Ceiling)?,
            }
        }
        AmountFormat::Assets(assets) => {
            if route == Route::LendingPool {
                require!(
                    assets <= caps::max_deposit(snapshot)?,
                    VaultError::ExceedsMaxDeposit
                );
            }
            Plan {
                shares: convert_to_shares(assets, rate, Rounding::Floor)?,
                assets,
            }
        }
    };

    require!(
        plan.shares > 0 && plan.assets > 0,
        VaultError::InvalidZeroAmount
    );
    Ok(plan)
}

pub fn plan_withdraw(
    amount: AmountFormat,
    route: Route,
    snapshot: &ReserveSnapshot,
    owner_shares: u64,
    available_liquidity: u64,
) -> Result<Plan> {
    let rate = snapshot.rate();
    let plan = match amount {
        AmountFormat::Shares(shares) => {
            if route == Route::LendingPool {
                let max = caps::max_redeem(snapshot, owner_shares, available_liquidity)?;
                require!(shares <= max, VaultError::ExceedsMaxRedeem);
            }
            Plan {
                shares,
                assets: convert_to_assets(shares, rate, Rounding::Floor)?,
            }
        }
        AmountFormat::Assets(assets) => {
            if route == Route::LendingPool {
                let max = caps::max_withdraw(snapshot, owner_shares, available_liquidity)?;
                require!(assets <= max, VaultError::ExceedsMaxWithdraw);
            }
            Plan {
                shares: convert_to_shares(assets, rate, Rounding::Ceiling)?,
                assets,
            }
        }
    };

    require!(
        plan.shares > 0 && plan.assets > 0,
        VaultError::InvalidZeroAmount
    );
    require!(plan.shares <= owner_shares, VaultError::InsufficientShares);
    Ok(plan)
}

/// Scaled receipt units the vault takes in for `assets` (ceiling)
pub fn receipt_units_in(assets: u64, rate: u128) -> Result<u64> {
    let units = convert_to_shares(assets, rate, Rounding::Ceiling)?;
    require!(units > 0, VaultError::InvalidZeroAmount);
    Ok(units)
}

/// Scaled receipt units the vault pays out for `assets` (floor)
pub fn receipt_units_out(assets: u64, rate: u128) -> Result<u64> {
    let units = convert_to_shares(assets, rate, Rounding::Floor)?;
    require!(units > 0, VaultError::InvalidZeroAmount);
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::RAY, error::error_code};

    fn snapshot(rate: u128) -> ReserveSnapshot {
        ReserveSnapshot {
            active: true,
            supply_cap: 0,
            decimals: 6,
            current_exchange_rate: rate,
            ..Default::default()
        }
    }

    #[test]
    fn test_deposit_assets_rounds_down() {
        let plan = plan_deposit(AmountFormat::Assets(1000), Route::LendingPool, &snapshot(2 * RAY))
            .unwrap();
        assert_eq!(plan, Plan { shares: 500, assets: 1000 });
    }

    #[test]
    fn test_mint_shares_rounds_up() {
        let plan = plan_deposit(AmountFormat::Shares(500), Route::LendingPool, &snapshot(2 * RAY))
            .unwrap();
        assert_eq!(plan.assets, 1000);

        let rate = RAY + RAY / 2;
        let plan = plan_deposit(AmountFormat::Shares(3), Route::Direct, &snapshot(rate)).unwrap();
        assert_eq!(plan.assets, 5);
    }

    #[test]
    fn test_deposit_dust_is_rejected() {
        // 1 asset at rate 2 is half a share
        let result = plan_deposit(AmountFormat::Assets(1), Route::Direct, &snapshot(2 * RAY));
        assert_eq!(error_code(result), u32::from(VaultError::InvalidZeroAmount));

        let result = plan_deposit(AmountFormat::Shares(0), Route::Direct, &snapshot(RAY));
        assert_eq!(error_code(result), u32::from(VaultError::InvalidZeroAmount));
    }

    #[test]
    fn test_pool_deposit_respects_caps() {
        let paused = ReserveSnapshot {
            paused: true,
            ..snapshot(RAY)
        };

        let result = plan_deposit(AmountFormat::Assets(10), Route::LendingPool, &paused);
        assert_eq!(error_code(result), u32::from(VaultError::ExceedsMaxDeposit));

        let result = plan_deposit(AmountFormat::Shares(10), Route::LendingPool, &paused);
        assert_eq!(error_code(result), u32::from(VaultError::ExceedsMaxMint));
    }

    #[test]
    fn test_direct_deposit_ignores_caps() {
        let paused = ReserveSnapshot {
            paused: true,
            ..snapshot(RAY)
        };
        let plan = plan_deposit(AmountFormat::Assets(10), Route::Direct, &paused).unwrap();
        assert_eq!(plan.shares, 10);
    }

    #[test]
    fn test_withdraw_assets_rounds_up_shares() {
        let rate = RAY + RAY / 2;
        let plan = plan_withdraw(
            AmountFormat::Assets(7),
            Route::LendingPool,
            &snapshot(rate),
            100,
            1_000,
        )
        .unwrap();
        assert_eq!(plan, Plan { shares: 5, assets: 7 });
    }

    #[test]
    fn test_redeem_rounds_down_assets() {
        let rate = RAY + RAY / 2;
        let plan =
            plan_withdraw(AmountFormat::Shares(3), Route::Direct, &snapshot(rate), 3, 0).unwrap();
        assert_eq!(plan, Plan { shares: 3, assets: 4 });
    }

    #[test]
    fn test_pool_withdraw_bounded_by_liquidity() {
        let s = snapshot(RAY);

        let result = plan_withdraw(AmountFormat::Shares(11), Route::LendingPool, &s, 100, 10);
        assert_eq!(error_code(result), u32::from(VaultError::ExceedsMaxRedeem));

        let result = plan_withdraw(AmountFormat::Assets(11), Route::LendingPool, &s, 100, 10);
        assert_eq!(error_code(result), u32::from(VaultError::ExceedsMaxWithdraw));

        // the direct path does not depend on pool liquidity
        assert!(plan_withdraw(AmountFormat::Shares(11), Route::Direct, &s, 100, 0).is_ok());
    }

    #[test]
    fn test_withdraw_more_than_owned() {
        let result = plan_withdraw(AmountFormat::Shares(11), Route::Direct, &snapshot(RAY), 10, 0);
        assert_eq!(error_code(result), u32::from(VaultError::InsufficientShares));
    }

    #[test]
    fn test_withdraw_zero() {
        let result = plan_withdraw(AmountFormat::Assets(0), Route::Direct, &snapshot(RAY), 10, 0);
        assert_eq!(error_code(result), u32::from(VaultError::InvalidZeroAmount));
    }

    #[test]
    fn test_receipt_units_favor_vault() {
        let rate = RAY + RAY / 2;
        // 7 assets are 4.67 scaled units
        assert_eq!(receipt_units_in(7, rate).unwrap(), 5);
        assert_eq!(receipt_units_out(7, rate).unwrap(), 4);
        assert_eq!(
            error_code(receipt_units_out(1, 2 * RAY)),
            u32::from(VaultError::InvalidZeroAmount)
        );
    }
}
