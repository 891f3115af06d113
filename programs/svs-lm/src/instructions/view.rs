use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::set_return_data;
use anchor_spl::token_interface::TokenAccount;
use lending_pool_itf::Reserve;
use rewards_controller_itf::{AssetRewards, UserAssetRewards};

use crate::{
    caps::{self, ReserveSnapshot},
    constants::USER_REWARDS_SEED,
    error::VaultError,
    math::{convert_to_assets, convert_to_shares, Rounding},
    rewards::{claimable_rewards, current_index},
    state::{UserRewards, UserRewardsData, Vault},
    validation::is_canonical_shares_account,
};

#[derive(Accounts)]
pub struct VaultView<'info> {
    pub vault: Account<'info, Vault>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = vault.receipt_vault)]
    pub receipt_vault: Box<InterfaceAccount<'info, TokenAccount>>,
}

#[derive(Accounts)]
pub struct VaultViewWithOwner<'info> {
    pub vault: Account<'info, Vault>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = reserve.liquidity_supply)]
    pub liquidity_supply: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        constraint = owner_shares_account.mint == vault.shares_mint,
        constraint = is_canonical_shares_account(
            &owner_shares_account.key(),
            &owner_shares_account.owner,
            &vault.shares_mint,
        ) @ VaultError::InvalidSharesAccount,
    )]
    pub owner_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,
}

#[derive(Accounts)]
pub struct RewardsView<'info> {
    pub vault: Account<'info, Vault>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = vault.asset_rewards)]
    pub asset_rewards: Box<Account<'info, AssetRewards>>,
}

#[derive(Accounts)]
pub struct UserRewardsView<'info> {
    pub vault: Account<'info, Vault>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = vault.asset_rewards)]
    pub asset_rewards: Box<Account<'info, AssetRewards>>,

    #[account(
        constraint = user_shares_account.mint == vault.shares_mint,
        constraint = is_canonical_shares_account(
            &user_shares_account.key(),
            &user_shares_account.owner,
            &vault.shares_mint,
        ) @ VaultError::InvalidSharesAccount,
    )]
    pub user_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Absent until the user first received shares
    #[account(
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), user_shares_account.owner.as_ref()],
        bump,
    )]
    pub user_rewards: Option<Account<'info, UserRewards>>,
}

#[derive(Accounts)]
#[instruction(reward_mint: Pubkey)]
pub struct VaultRewardsView<'info> {
    pub vault: Account<'info, Vault>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = vault.asset_rewards)]
    pub asset_rewards: Box<Account<'info, AssetRewards>>,

    #[account(address = vault.receipt_vault)]
    pub receipt_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        constraint = vault_asset_rewards.user == vault.key() @ VaultError::RewardAccountsMismatch,
        constraint = vault_asset_rewards.asset == vault.receipt_mint @ VaultError::RewardAccountsMismatch,
    )]
    pub vault_asset_rewards: Box<Account<'info, UserAssetRewards>>,

    #[account(
        constraint = vault_reward_account.owner == vault.key() @ VaultError::RewardAccountsMismatch,
        constraint = vault_reward_account.mint == reward_mint @ VaultError::RewardAccountsMismatch,
    )]
    pub vault_reward_account: Box<InterfaceAccount<'info, TokenAccount>>,
}

fn current_rate(reserve: &Reserve) -> Result<u128> {
    let now = Clock::get()?.unix_timestamp;
    reserve
        .normalized_income(now)
        .ok_or_else(|| error!(VaultError::MathOverflow))
}

fn snapshot(reserve: &Reserve) -> Result<ReserveSnapshot> {
    ReserveSnapshot::capture(reserve, Clock::get()?.unix_timestamp)
}

/// Preview shares minted for `assets` (floor rounding)
pub fn preview_deposit(ctx: Context<VaultView>, assets: u64) -> Result<()> {
    let shares = convert_to_shares(assets, current_rate(&ctx.accounts.reserve)?, Rounding::Floor)?;
    set_return_data(&shares.to_le_bytes());
    Ok(())
}

/// Preview assets required to mint `shares` (ceiling rounding)
pub fn preview_mint(ctx: Context<VaultView>, shares: u64) -> Result<()> {
    let assets = convert_to_assets(shares, current_rate(&ctx.accounts.reserve)?, Rounding::Ceiling)?;
    set_return_data(&assets.to_le_bytes());
    Ok(())
}

/// Preview shares burned to withdraw `assets` (ceiling rounding)
pub fn preview_withdraw(ctx: Context<VaultView>, assets: u64) -> Result<()> {
    let shares = convert_to_shares(assets, current_rate(&ctx.accounts.reserve)?, Rounding::Ceiling)?;
    set_return_data(&shares.to_le_bytes());
    Ok(())
}

/// Preview assets received for redeeming `shares` (floor rounding)
pub fn preview_redeem(ctx: Context<VaultView>, shares: u64) -> Result<()> {
    let assets = convert_to_assets(shares, current_rate(&ctx.accounts.reserve)?, Rounding::Floor)?;
    set_return_data(&assets.to_le_bytes());
    Ok(())
}

pub fn convert_to_shares_view(ctx: Context<VaultView>, assets: u64) -> Result<()> {
    let shares = convert_to_shares(assets, current_rate(&ctx.accounts.reserve)?, Rounding::Floor)?;
    set_return_data(&shares.to_le_bytes());
    Ok(())
}

pub fn convert_to_assets_view(ctx: Context<VaultView>, shares: u64) -> Result<()> {
    let assets = convert_to_assets(shares, current_rate(&ctx.accounts.reserve)?, Rounding::Floor)?;
    set_return_data(&assets.to_le_bytes());
    Ok(())
}

/// Underlying value of the receipt tokens held by the vault
pub fn get_total_assets(ctx: Context<VaultView>) -> Result<()> {
    let assets = convert_to_assets(
        ctx.accounts.receipt_vault.amount,
        current_rate(&ctx.accounts.reserve)?,
        Rounding::Floor,
    )?;
    set_return_data(&assets.to_le_bytes());
    Ok(())
}

/// Normalized income of the reserve (ray, u128)
pub fn rate(ctx: Context<VaultView>) -> Result<()> {
    set_return_data(&current_rate(&ctx.accounts.reserve)?.to_le_bytes());
    Ok(())
}

pub fn max_deposit(ctx: Context<VaultView>) -> Result<()> {
    let max = caps::max_deposit(&snapshot(&ctx.accounts.reserve)?)?;
    set_return_data(&max.to_le_bytes());
    Ok(())
}

pub fn max_mint(ctx: Context<VaultView>) -> Result<()> {
    let max = caps::max_mint(&snapshot(&ctx.accounts.reserve)?)?;
    set_return_data(&max.to_le_bytes());
    Ok(())
}

/// Bounded by the owner's shares and the pool's available liquidity
pub fn max_withdraw(ctx: Context<VaultViewWithOwner>) -> Result<()> {
    let max = caps::max_withdraw(
        &snapshot(&ctx.accounts.reserve)?,
        ctx.accounts.owner_shares_account.amount,
        ctx.accounts.liquidity_supply.amount,
    )?;
    set_return_data(&max.to_le_bytes());
    Ok(())
}

pub fn max_redeem(ctx: Context<VaultViewWithOwner>) -> Result<()> {
    let max = caps::max_redeem(
        &snapshot(&ctx.accounts.reserve)?,
        ctx.accounts.owner_shares_account.amount,
        ctx.accounts.liquidity_supply.amount,
    )?;
    set_return_data(&max.to_le_bytes());
    Ok(())
}

pub fn is_registered_reward_token(ctx: Context<RewardsView>, reward_mint: Pubkey) -> Result<()> {
    let registered = ctx.accounts.vault.is_registered_reward(&reward_mint);
    set_return_data(&[registered as u8]);
    Ok(())
}

/// Current index of `reward_mint`; unregistered rewards report the controller's value (0 if unknown)
pub fn get_current_rewards_index(ctx: Context<RewardsView>, reward_mint: Pubkey) -> Result<()> {
    let vault = &ctx.accounts.vault;
    let asset_rewards = &ctx.accounts.asset_rewards;
    let unit = asset_rewards.asset_unit().ok_or(VaultError::MathOverflow)?;
    let now = Clock::get()?.unix_timestamp;
    let total_supply = ctx.accounts.reserve.scaled_total_supply;

    let index = match vault.reward_position(&reward_mint) {
        Some(position) => current_index(
            &vault.rewards[position],
            asset_rewards.reward(&reward_mint),
            total_supply,
            unit,
            now,
        )?,
        None => match asset_rewards.reward(&reward_mint) {
            Some(reward) => {
                reward
                    .asset_index(total_supply, unit, now)
                    .ok_or(VaultError::MathOverflow)?
                    .1
            }
            None => 0,
        },
    };

    set_return_data(&index.to_le_bytes());
    Ok(())
}

/// Owed plus accrued rewards of the user (u128)
pub fn get_claimable_rewards(ctx: Context<UserRewardsView>, reward_mint: Pubkey) -> Result<()> {
    let vault = &ctx.accounts.vault;
    let position = vault
        .reward_position(&reward_mint)
        .ok_or(VaultError::RewardNotInitialized)?;

    let cache = &vault.rewards[position];
    let index = current_index(
        cache,
        ctx.accounts.asset_rewards.reward(&reward_mint),
        ctx.accounts.reserve.scaled_total_supply,
        ctx.accounts
            .asset_rewards
            .asset_unit()
            .ok_or(VaultError::MathOverflow)?,
        Clock::get()?.unix_timestamp,
    )?;
    let data = user_entry(&ctx.accounts.user_rewards, position);

    let claimable = claimable_rewards(
        ctx.accounts.user_shares_account.amount,
        &data,
        cache,
        index,
        vault.asset_unit()?,
    )?;
    set_return_data(&claimable.to_le_bytes());
    Ok(())
}

/// Settled but unpaid rewards of the user (u128)
pub fn get_unclaimed_rewards(ctx: Context<UserRewardsView>, reward_mint: Pubkey) -> Result<()> {
    let position = ctx
        .accounts
        .vault
        .reward_position(&reward_mint)
        .ok_or(VaultError::RewardNotInitialized)?;

    let data = user_entry(&ctx.accounts.user_rewards, position);
    set_return_data(&data.unclaimed_rewards.to_le_bytes());
    Ok(())
}

/// Rewards the vault holds plus what the controller still owes it (u64, 0 if unregistered)
pub fn get_total_claimable_rewards(ctx: Context<VaultRewardsView>, reward_mint: Pubkey) -> Result<()> {
    let vault = &ctx.accounts.vault;
    let Some(position) = vault.reward_position(&reward_mint) else {
        set_return_data(&0u64.to_le_bytes());
        return Ok(());
    };

    let asset_rewards = &ctx.accounts.asset_rewards;
    let unit = asset_rewards.asset_unit().ok_or(VaultError::MathOverflow)?;
    let index = current_index(
        &vault.rewards[position],
        asset_rewards.reward(&reward_mint),
        ctx.accounts.reserve.scaled_total_supply,
        unit,
        Clock::get()?.unix_timestamp,
    )?;

    let owed = ctx
        .accounts
        .vault_asset_rewards
        .pending(&reward_mint, ctx.accounts.receipt_vault.amount, index, unit)
        .ok_or(VaultError::MathOverflow)?;
    let total = owed
        .checked_add(ctx.accounts.vault_reward_account.amount)
        .ok_or(VaultError::MathOverflow)?;

    set_return_data(&total.to_le_bytes());
    Ok(())
}

fn user_entry(user_rewards: &Option<Account<UserRewards>>, position: usize) -> UserRewardsData {
    user_rewards
        .as_ref()
        .map(|u| u.entries[position])
        .unwrap_or_default()
}
