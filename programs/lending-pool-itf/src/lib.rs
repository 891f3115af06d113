#![allow(clippy::result_large_err)]

pub mod state;

use anchor_lang::prelude::*;
pub use state::*;

declare_id!("ECk8UremGj4hczdKdmAeEFsSaScRANxZ8Gy834WgMuAS");

#[program]
pub mod lending_pool {
    use super::*;

    /// Supply `amount` of underlying liquidity and receive scaled receipt tokens
    #[allow(unused_variables)]
    pub fn supply(ctx: Context<Supply>, amount: u64) -> Result<()> {
        // We only need the interface, not the actual implementation here.
        unimplemented!("lending-pool-itf is just an interface")
    }

    /// Burn receipt tokens worth `amount` of underlying and release the liquidity
    #[allow(unused_variables)]
    pub fn withdraw(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
        unimplemented!("lending-pool-itf is just an interface")
    }
}

#[derive(Accounts)]
pub struct Supply<'info> {
    /// Owner or delegate of `source_liquidity`
    pub authority: Signer<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub reserve: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    pub underlying_mint: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub source_liquidity: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub liquidity_supply: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub receipt_mint: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub destination_receipt: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    pub token_program: AccountInfo<'info>,
}

#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Owner of `source_receipt`
    pub authority: Signer<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub reserve: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    pub underlying_mint: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub source_receipt: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub receipt_mint: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub liquidity_supply: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    #[account(mut)]
    pub destination_liquidity: AccountInfo<'info>,

    /// CHECK: don't care this is just an interface
    pub token_program: AccountInfo<'info>,
}
