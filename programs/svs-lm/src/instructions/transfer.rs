use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{Mint, TokenAccount},
};
use lending_pool_itf::Reserve;
use rewards_controller_itf::AssetRewards;

use super::common::{burn_shares, mint_shares, require_allowance, reward_indices, settle_account};
use crate::{
    constants::USER_REWARDS_SEED,
    error::VaultError,
    events::SharesTransferred,
    state::{UserRewards, Vault},
    validation::{is_canonical_shares_account, require_recipient},
};

/// Move shares between holders, settling both sides first.
///
/// The shares mint is non-transferable, so a transfer is a burn from the
/// sender followed by a mint to the recipient.
#[derive(Accounts)]
pub struct TransferShares<'info> {
    /// Sender or its delegate
    #[account(mut)]
    pub caller: Signer<'info>,

    #[account(mut)]
    pub vault: Box<Account<'info, Vault>>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = vault.asset_rewards)]
    pub asset_rewards: Box<Account<'info, AssetRewards>>,

    #[account(mut, address = vault.shares_mint)]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = from_shares_account.mint == vault.shares_mint,
        constraint = is_canonical_shares_account(
            &from_shares_account.key(),
            &from_shares_account.owner,
            &vault.shares_mint,
        ) @ VaultError::InvalidSharesAccount,
    )]
    pub from_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = to_shares_account.mint == vault.shares_mint,
        constraint = is_canonical_shares_account(
            &to_shares_account.key(),
            &to_shares_account.owner,
            &vault.shares_mint,
        ) @ VaultError::InvalidSharesAccount,
        constraint = to_shares_account.owner != from_shares_account.owner @ VaultError::InvalidRecipient,
    )]
    pub to_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), from_shares_account.owner.as_ref()],
        bump = from_rewards.bump,
    )]
    pub from_rewards: Box<Account<'info, UserRewards>>,

    #[account(
        init_if_needed,
        payer = caller,
        space = UserRewards::LEN,
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), to_shares_account.owner.as_ref()],
        bump
    )]
    pub to_rewards: Box<Account<'info, UserRewards>>,

    pub token_2022_program: Program<'info, Token2022>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<TransferShares>, shares: u64) -> Result<()> {
    require!(shares > 0, VaultError::InvalidZeroAmount);

    let from = ctx.accounts.from_shares_account.owner;
    let to = ctx.accounts.to_shares_account.owner;
    require_recipient(&to)?;

    let from_balance = ctx.accounts.from_shares_account.amount;
    let to_balance = ctx.accounts.to_shares_account.amount;
    require!(from_balance >= shares, VaultError::InsufficientShares);

    let caller = ctx.accounts.caller.key();
    require_allowance(&caller, &ctx.accounts.from_shares_account, shares)?;

    let now = Clock::get()?.unix_timestamp;
    let indices = reward_indices(
        &ctx.accounts.vault,
        &ctx.accounts.asset_rewards,
        &ctx.accounts.reserve,
        now,
    )?;

    let vault_key = ctx.accounts.vault.key();
    let to_bump = ctx.bumps.to_rewards;
    ctx.accounts.to_rewards.init_if_empty(vault_key, to, to_bump);

    settle_account(
        &mut ctx.accounts.vault,
        &mut ctx.accounts.from_rewards,
        from_balance,
        &indices,
    )?;
    settle_account(
        &mut ctx.accounts.vault,
        &mut ctx.accounts.to_rewards,
        to_balance,
        &indices,
    )?;

    burn_shares(
        &ctx.accounts.shares_mint,
        &ctx.accounts.from_shares_account,
        ctx.accounts.caller.to_account_info(),
        &ctx.accounts.token_2022_program,
        shares,
    )?;
    mint_shares(
        &ctx.accounts.vault,
        &ctx.accounts.shares_mint,
        &ctx.accounts.to_shares_account,
        &ctx.accounts.token_2022_program,
        shares,
    )?;

    emit!(SharesTransferred {
        vault: vault_key,
        from,
        to,
        shares,
    });

    Ok(())
}
