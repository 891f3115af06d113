use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{Mint, TokenAccount, TokenInterface},
};
use lending_pool_itf::Reserve;
use rewards_controller_itf::AssetRewards;

use super::common::{
    burn_shares, require_allowance, reward_indices, settle_account, transfer_from_vault,
};
use crate::{
    caps::ReserveSnapshot,
    constants::{USER_REWARDS_SEED, VAULT_SEED},
    engine::{plan_withdraw, receipt_units_out, AmountFormat, Route},
    error::VaultError,
    events::Withdraw as WithdrawEvent,
    state::{UserRewards, Vault},
    validation::{is_canonical_shares_account, require_owner, require_recipient},
};

/// Withdraw underlying from the lending pool to `receiver`
#[derive(Accounts)]
#[instruction(amount: u64, receiver: Pubkey)]
pub struct WithdrawFromPool<'info> {
    /// Owner of the shares or its delegate
    pub caller: Signer<'info>,

    #[account(mut)]
    pub vault: Box<Account<'info, Vault>>,

    #[account(mut, address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = vault.asset_rewards)]
    pub asset_rewards: Box<Account<'info, AssetRewards>>,

    #[account(address = vault.underlying_mint)]
    pub underlying_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut, address = vault.receipt_mint)]
    pub receipt_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut, address = vault.receipt_vault)]
    pub receipt_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = reserve.liquidity_supply)]
    pub liquidity_supply: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = receiver_underlying_account.mint == vault.underlying_mint,
        constraint = receiver_underlying_account.owner == receiver,
    )]
    pub receiver_underlying_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = vault.shares_mint)]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = owner_shares_account.mint == vault.shares_mint,
        constraint = is_canonical_shares_account(
            &owner_shares_account.key(),
            &owner_shares_account.owner,
            &vault.shares_mint,
        ) @ VaultError::InvalidSharesAccount,
    )]
    pub owner_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), owner_shares_account.owner.as_ref()],
        bump = owner_rewards.bump,
    )]
    pub owner_rewards: Box<Account<'info, UserRewards>>,

    /// CHECK: lending pool program, address checked
    #[account(address = lending_pool_itf::ID)]
    pub lending_pool_program: UncheckedAccount<'info>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
}

/// Withdraw receipt tokens directly to `receiver`
#[derive(Accounts)]
#[instruction(amount: u64, receiver: Pubkey)]
pub struct WithdrawReceipt<'info> {
    /// Owner of the shares or its delegate
    pub caller: Signer<'info>,

    #[account(mut)]
    pub vault: Box<Account<'info, Vault>>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = vault.asset_rewards)]
    pub asset_rewards: Box<Account<'info, AssetRewards>>,

    #[account(address = vault.receipt_mint)]
    pub receipt_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut, address = vault.receipt_vault)]
    pub receipt_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = receiver_receipt_account.mint == vault.receipt_mint,
        constraint = receiver_receipt_account.owner == receiver,
    )]
    pub receiver_receipt_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = vault.shares_mint)]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = owner_shares_account.mint == vault.shares_mint,
        constraint = is_canonical_shares_account(
            &owner_shares_account.key(),
            &owner_shares_account.owner,
            &vault.shares_mint,
        ) @ VaultError::InvalidSharesAccount,
    )]
    pub owner_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), owner_shares_account.owner.as_ref()],
        bump = owner_rewards.bump,
    )]
    pub owner_rewards: Box<Account<'info, UserRewards>>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
}

/// Burn the owner's shares and release underlying through the pool
pub fn pool_handler(ctx: Context<WithdrawFromPool>, amount: AmountFormat, receiver: Pubkey) -> Result<()> {
    require_recipient(&receiver)?;

    let caller = ctx.accounts.caller.key();
    let owner = ctx.accounts.owner_shares_account.owner;
    require_owner(&owner)?;

    let now = Clock::get()?.unix_timestamp;
    let snapshot = ReserveSnapshot::capture(&ctx.accounts.reserve, now)?;
    let owner_balance = ctx.accounts.owner_shares_account.amount;
    let plan = plan_withdraw(
        amount,
        Route::LendingPool,
        &snapshot,
        owner_balance,
        ctx.accounts.liquidity_supply.amount,
    )?;

    require_allowance(&caller, &ctx.accounts.owner_shares_account, plan.shares)?;

    let indices = reward_indices(
        &ctx.accounts.vault,
        &ctx.accounts.asset_rewards,
        &ctx.accounts.reserve,
        now,
    )?;
    settle_account(
        &mut ctx.accounts.vault,
        &mut ctx.accounts.owner_rewards,
        owner_balance,
        &indices,
    )?;

    // Delegate burns consume the delegated amount
    burn_shares(
        &ctx.accounts.shares_mint,
        &ctx.accounts.owner_shares_account,
        ctx.accounts.caller.to_account_info(),
        &ctx.accounts.token_2022_program,
        plan.shares,
    )?;

    let receipt_mint_key = ctx.accounts.vault.receipt_mint;
    let vault_id_bytes = ctx.accounts.vault.vault_id.to_le_bytes();
    let bump = ctx.accounts.vault.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        receipt_mint_key.as_ref(),
        vault_id_bytes.as_ref(),
        &[bump],
    ]];

    lending_pool_itf::cpi::withdraw(
        CpiContext::new_with_signer(
            ctx.accounts.lending_pool_program.to_account_info(),
            lending_pool_itf::cpi::accounts::Withdraw {
                authority: ctx.accounts.vault.to_account_info(),
                reserve: ctx.accounts.reserve.to_account_info(),
                underlying_mint: ctx.accounts.underlying_mint.to_account_info(),
                source_receipt: ctx.accounts.receipt_vault.to_account_info(),
                receipt_mint: ctx.accounts.receipt_mint.to_account_info(),
                liquidity_supply: ctx.accounts.liquidity_supply.to_account_info(),
                destination_liquidity: ctx.accounts.receiver_underlying_account.to_account_info(),
                token_program: ctx.accounts.asset_token_program.to_account_info(),
            },
            signer_seeds,
        ),
        plan.assets,
    )?;

    emit!(WithdrawEvent {
        vault: ctx.accounts.vault.key(),
        caller,
        receiver,
        owner,
        assets: plan.assets,
        shares: plan.shares,
        through_pool: true,
    });

    Ok(())
}

/// Burn the owner's shares and send receipt tokens worth the planned assets
pub fn receipt_handler(ctx: Context<WithdrawReceipt>, amount: AmountFormat, receiver: Pubkey) -> Result<()> {
    require_recipient(&receiver)?;

    let caller = ctx.accounts.caller.key();
    let owner = ctx.accounts.owner_shares_account.owner;
    require_owner(&owner)?;

    let now = Clock::get()?.unix_timestamp;
    let snapshot = ReserveSnapshot::capture(&ctx.accounts.reserve, now)?;
    let owner_balance = ctx.accounts.owner_shares_account.amount;
    let plan = plan_withdraw(amount, Route::Direct, &snapshot, owner_balance, 0)?;
    // Receipt balances are scaled, round the paid units down
    let receipt_units = receipt_units_out(plan.assets, snapshot.rate())?;

    require_allowance(&caller, &ctx.accounts.owner_shares_account, plan.shares)?;

    let indices = reward_indices(
        &ctx.accounts.vault,
        &ctx.accounts.asset_rewards,
        &ctx.accounts.reserve,
        now,
    )?;
    settle_account(
        &mut ctx.accounts.vault,
        &mut ctx.accounts.owner_rewards,
        owner_balance,
        &indices,
    )?;

    burn_shares(
        &ctx.accounts.shares_mint,
        &ctx.accounts.owner_shares_account,
        ctx.accounts.caller.to_account_info(),
        &ctx.accounts.token_2022_program,
        plan.shares,
    )?;

    transfer_from_vault(
        &ctx.accounts.vault,
        ctx.accounts.receipt_vault.to_account_info(),
        ctx.accounts.receiver_receipt_account.to_account_info(),
        &ctx.accounts.receipt_mint,
        &ctx.accounts.asset_token_program,
        receipt_units,
    )?;

    emit!(WithdrawEvent {
        vault: ctx.accounts.vault.key(),
        caller,
        receiver,
        owner,
        assets: plan.assets,
        shares: plan.shares,
        through_pool: false,
    });

    Ok(())
}
