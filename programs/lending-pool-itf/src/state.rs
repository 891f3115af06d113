use anchor_lang::prelude::*;

mod u256 {
    use uint::construct_uint;

    construct_uint! {
        pub struct U256(4);
    }
}
pub use u256::U256;

pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;
pub const HALF_RAY: u128 = RAY / 2;
pub const SECONDS_PER_YEAR: u128 = 365 * 24 * 60 * 60;

pub const FLAG_ACTIVE: u8 = 1 << 0;
pub const FLAG_FROZEN: u8 = 1 << 1;
pub const FLAG_PAUSED: u8 = 1 << 2;

/// Lending pool reserve state (one per underlying asset)
#[account]
#[derive(Debug, Default)]
pub struct Reserve {
    /// Lending market this reserve belongs to
    pub lending_market: Pubkey,
    /// Mint of the supplied liquidity
    pub underlying_mint: Pubkey,
    /// Mint of the yield-bearing receipt (balances are stored scaled by the liquidity index)
    pub receipt_mint: Pubkey,
    /// Token account holding the reserve's available liquidity
    pub liquidity_supply: Pubkey,
    /// Decimals of the underlying (and receipt) mint
    pub decimals: u8,
    /// Bit set of `FLAG_ACTIVE`, `FLAG_FROZEN`, `FLAG_PAUSED`
    pub flags: u8,
    /// Supply cap in whole tokens, 0 means uncapped
    pub supply_cap: u64,
    /// Cumulated liquidity index at `last_update_timestamp` (ray)
    pub liquidity_index: u128,
    /// Current yearly supply rate (ray)
    pub current_liquidity_rate: u128,
    pub last_update_timestamp: i64,
    /// Total receipt supply in scaled units
    pub scaled_total_supply: u64,
    /// Scaled amount accrued to the treasury but not yet minted
    pub accrued_to_treasury: u64,
}

impl Reserve {
    pub fn is_active(&self) -> bool {
        self.flags & FLAG_ACTIVE != 0
    }

    pub fn is_frozen(&self) -> bool {
        self.flags & FLAG_FROZEN != 0
    }

    pub fn is_paused(&self) -> bool {
        self.flags & FLAG_PAUSED != 0
    }

    /// Liquidity index projected to `now` with linear interest.
    ///
    /// Returns `None` on overflow or if `now` is before the last update.
    pub fn normalized_income(&self, now: i64) -> Option<u128> {
        if now == self.last_update_timestamp {
            return Some(self.liquidity_index);
        }
        let elapsed = now.checked_sub(self.last_update_timestamp)?;
        let elapsed = u128::try_from(elapsed).ok()?;

        let accrued = U256::from(self.current_liquidity_rate)
            .checked_mul(U256::from(elapsed))?
            / U256::from(SECONDS_PER_YEAR);
        let linear_interest = accrued.checked_add(U256::from(RAY))?;

        let index = linear_interest
            .checked_mul(U256::from(self.liquidity_index))?
            .checked_add(U256::from(HALF_RAY))?
            / U256::from(RAY);

        if index > U256::from(u128::MAX) {
            return None;
        }
        Some(index.as_u128())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserve(rate: u128, index: u128, last: i64) -> Reserve {
        Reserve {
            liquidity_index: index,
            current_liquidity_rate: rate,
            last_update_timestamp: last,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalized_income_same_timestamp() {
        let r = reserve(RAY / 10, 2 * RAY, 100);
        assert_eq!(r.normalized_income(100), Some(2 * RAY));
    }

    #[test]
    fn test_normalized_income_one_year_ten_percent() {
        // 10% yearly on an index of 1.0 for a full year
        let r = reserve(RAY / 10, RAY, 0);
        let income = r.normalized_income(SECONDS_PER_YEAR as i64).unwrap();
        assert_eq!(income, RAY + RAY / 10);
    }

    #[test]
    fn test_normalized_income_rejects_past_timestamp() {
        let r = reserve(RAY / 10, RAY, 100);
        assert_eq!(r.normalized_income(99), None);
    }

    #[test]
    fn test_flags() {
        let r = Reserve {
            flags: FLAG_ACTIVE | FLAG_FROZEN,
            ..Default::default()
        };
        assert!(r.is_active());
        assert!(r.is_frozen());
        assert!(!r.is_paused());
    }
}
