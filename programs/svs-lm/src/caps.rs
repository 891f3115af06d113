//! Deposit and withdrawal limits derived from the lending pool reserve.
//!
//! Only the pool-routed path is bounded by these values; moving receipt
//! tokens directly in or out of the vault is not cap-limited.

use anchor_lang::prelude::*;
use lending_pool_itf::Reserve;

use crate::{
    error::VaultError,
    math::{convert_to_assets, convert_to_shares, Rounding},
};

/// Point-in-time view of the reserve configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReserveSnapshot {
    pub active: bool,
    pub paused: bool,
    pub frozen: bool,
    /// Whole tokens, 0 means uncapped
    pub supply_cap: u64,
    pub decimals: u8,
    /// Scaled receipt supply
    pub aggregate_supply: u64,
    /// Scaled amount owed to the treasury
    pub accrued_to_treasury: u64,
    /// Normalized income (ray)
    pub current_exchange_rate: u128,
}

impl ReserveSnapshot {
    pub fn capture(reserve: &Reserve, now: i64) -> Result<Self> {
        let rate = reserve
            .normalized_income(now)
            .ok_or(VaultError::MathOverflow)?;

        Ok(Self {
            active: reserve.is_active(),
            paused: reserve.is_paused(),
            frozen: reserve.is_frozen(),
            supply_cap: reserve.supply_cap,
            decimals: reserve.decimals,
            aggregate_supply: reserve.scaled_total_supply,
            accrued_to_treasury: reserve.accrued_to_treasury,
            current_exchange_rate: rate,
        })
    }

    pub fn rate(&self) -> u128 {
        self.current_exchange_rate
    }
}

/// Maximum assets the pool still accepts (0 if inactive, paused or frozen)
pub fn max_deposit(snapshot: &ReserveSnapshot) -> Result<u64> {
    if !snapshot.active || snapshot.paused || snapshot.frozen {
        return Ok(0);
    }
    if snapshot.supply_cap == 0 {
        return Ok(u64::MAX);
    }

    let unit = 10u128
        .checked_pow(snapshot.decimals as u32)
        .ok_or(VaultError::MathOverflow)?;
    let cap = (snapshot.supply_cap as u128)
        .checked_mul(unit)
        .ok_or(VaultError::MathOverflow)?;

    let scaled_supply = snapshot
        .aggregate_supply
        .checked_add(snapshot.accrued_to_treasury)
        .ok_or(VaultError::MathOverflow)?;
    let current_supply =
        convert_to_assets(scaled_supply, snapshot.current_exchange_rate, Rounding::Ceiling)?;

    let headroom = cap.saturating_sub(current_supply as u128);
    Ok(u64::try_from(headroom).unwrap_or(u64::MAX))
}

/// Maximum shares mintable through the pool
pub fn max_mint(snapshot: &ReserveSnapshot) -> Result<u64> {
    let assets = max_deposit(snapshot)?;
    if assets == u64::MAX {
        return Ok(u64::MAX);
    }
    convert_to_shares(assets, snapshot.current_exchange_rate, Rounding::Floor)
}

/// Maximum shares `owner_shares` can redeem through the pool.
///
/// `available_liquidity` is the underlying physically held by the reserve.
/// Frozen reserves still allow withdrawals.
pub fn max_redeem(
    snapshot: &ReserveSnapshot,
    owner_shares: u64,
    available_liquidity: u64,
) -> Result<u64> {
    if !snapshot.active || snapshot.paused {
        return Ok(0);
    }
    let liquidity_in_shares = convert_to_shares(
        available_liquidity,
        snapshot.current_exchange_rate,
        Rounding::Floor,
    )?;
    Ok(owner_shares.min(liquidity_in_shares))
}

/// Maximum assets `owner_shares` can withdraw through the pool
pub fn max_withdraw(
    snapshot: &ReserveSnapshot,
    owner_shares: u64,
    available_liquidity: u64,
) -> Result<u64> {
    let shares = max_redeem(snapshot, owner_shares, available_liquidity)?;
    convert_to_assets(shares, snapshot.current_exchange_rate, Rounding::Floor)
}
