#![allow(clippy::result_large_err)]

pub mod state;

use anchor_lang::prelude::*;
pub use state::*;

declare_id!("Ey6qzG7hEJJMDQaW417XC8tsEKm4J5S8UqRcC4xVHcBa");

pub const CLAIMER_SEED: &[u8] = b"claimer";

#[program]
pub mod rewards_controller {
    use super::*;

    /// Claim up to `amount` of one reward accrued by `claimer` on the asset.
    /// `u64::MAX` claims everything accrued.
    #[allow(unused_variables)]
    pub fn claim_rewards(ctx: Context<ClaimRewards>, amount: u64) -> Result<()> {
        // We only need the interface, not the actual implementation here.
        unimplemented!("rewards-controller-itf is just an interface")
    }
}

#[derive(Accounts)]
pub struct ClaimRewards<'info> {
    /// The account the rewards were accrued by
    pub claimer: Signer<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub asset_rewards: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub user_asset_rewards: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    pub reward_mint: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub reward_treasury: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub destination: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    pub token_program: AccountInfo<'info>,
}
