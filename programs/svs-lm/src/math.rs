use anchor_lang::prelude::*;

use crate::{constants::RAY, error::VaultError};

mod u256 {
    use uint::construct_uint;

    construct_uint! {
        pub struct U256(4);
    }
}
pub use u256::U256;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rounding {
    Floor,
    Ceiling,
}

/// Convert assets to shares at a ray-scaled exchange rate.
///
/// Formula: shares = assets × RAY / rate
pub fn convert_to_shares(assets: u64, rate: u128, rounding: Rounding) -> Result<u64> {
    let shares = mul_div(assets as u128, RAY, rate, rounding)?;
    to_u64(shares)
}

/// Convert shares to assets at a ray-scaled exchange rate.
///
/// Formula: assets = shares × rate / RAY
pub fn convert_to_assets(shares: u64, rate: u128, rounding: Rounding) -> Result<u64> {
    let assets = mul_div(shares as u128, rate, RAY, rounding)?;
    to_u64(assets)
}

/// Safe multiplication then division with configurable rounding.
///
/// Computes: (value × numerator) / denominator
/// Uses a 256-bit intermediate to prevent overflow.
pub fn mul_div(value: u128, numerator: u128, denominator: u128, rounding: Rounding) -> Result<u128> {
    require!(denominator > 0, VaultError::DivisionByZero);

    let product = U256::from(value)
        .checked_mul(U256::from(numerator))
        .ok_or(VaultError::MathOverflow)?;

    let denom = U256::from(denominator);
    let result = match rounding {
        Rounding::Floor => product / denom,
        Rounding::Ceiling => {
            product
                .checked_add(denom)
                .ok_or(VaultError::MathOverflow)?
                .checked_sub(U256::one())
                .ok_or(VaultError::MathOverflow)?
                / denom
        }
    };

    require!(result <= U256::from(u128::MAX), VaultError::MathOverflow);
    Ok(result.as_u128())
}

pub fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| error!(VaultError::MathOverflow))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_floor() {
        // 100 * 3 / 2 = 150 (floor)
        assert_eq!(mul_div(100, 3, 2, Rounding::Floor).unwrap(), 150);
        // 100 * 1 / 3 = 33 (floor)
        assert_eq!(mul_div(100, 1, 3, Rounding::Floor).unwrap(), 33);
    }

    #[test]
    fn test_mul_div_ceiling() {
        // 100 * 3 / 2 = 150 (exact)
        assert_eq!(mul_div(100, 3, 2, Rounding::Ceiling).unwrap(), 150);
        // 100 * 1 / 3 = 34 (ceiling)
        assert_eq!(mul_div(100, 1, 3, Rounding::Ceiling).unwrap(), 34);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // u64::MAX * RAY overflows u128 but the result fits
        let assets = mul_div(u64::MAX as u128, RAY, RAY, Rounding::Floor).unwrap();
        assert_eq!(assets, u64::MAX as u128);
    }

    #[test]
    fn test_division_by_zero() {
        let result = mul_div(100, 100, 0, Rounding::Floor);
        assert!(result.is_err());
        assert!(convert_to_shares(100, 0, Rounding::Floor).is_err());
    }

    #[test]
    fn test_deposit_at_double_rate() {
        // 1 share = 2 assets
        let shares = convert_to_shares(1000, 2 * RAY, Rounding::Floor).unwrap();
        assert_eq!(shares, 500);

        let assets = convert_to_assets(500, 2 * RAY, Rounding::Ceiling).unwrap();
        assert_eq!(assets, 1000);
    }

    #[test]
    fn test_rounding_favors_vault() {
        // rate 1.5: 7 assets are 4.666.. shares
        let rate = RAY + RAY / 2;

        // deposit: floor (user gets less)
        let deposit_shares = convert_to_shares(7, rate, Rounding::Floor).unwrap();
        // withdraw: ceiling shares (user burns more)
        let withdraw_shares = convert_to_shares(7, rate, Rounding::Ceiling).unwrap();
        assert_eq!(deposit_shares, 4);
        assert_eq!(withdraw_shares, 5);

        // redeem: floor (user gets less)
        let redeem_assets = convert_to_assets(3, rate, Rounding::Floor).unwrap();
        // mint: ceiling assets (user pays more)
        let mint_assets = convert_to_assets(3, rate, Rounding::Ceiling).unwrap();
        assert_eq!(redeem_assets, 4);
        assert_eq!(mint_assets, 5);
    }

    #[test]
    fn test_round_trip_never_favors_depositor() {
        let rates = [RAY, RAY + 1, RAY + RAY / 3, 2 * RAY + 7, 17 * RAY / 10];
        let amounts = [1u64, 2, 3, 999, 1_000_001, 123_456_789_012];

        for rate in rates {
            for assets in amounts {
                let shares = convert_to_shares(assets, rate, Rounding::Floor).unwrap();
                let paid = convert_to_assets(shares, rate, Rounding::Ceiling).unwrap();
                let back = convert_to_shares(paid, rate, Rounding::Floor).unwrap();
                assert!(back <= shares, "rate {rate} assets {assets}");
                assert!(paid <= assets, "rate {rate} assets {assets}");
            }
        }
    }

    #[test]
    fn test_result_must_fit_u64() {
        // half a ray doubles the share count of u64::MAX assets
        let result = convert_to_shares(u64::MAX, RAY / 2, Rounding::Floor);
        assert!(result.is_err());
    }
}
