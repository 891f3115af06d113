use anchor_lang::prelude::*;

pub mod caps;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod instructions;
pub mod math;
pub mod rewards;
pub mod state;
pub mod validation;

use engine::AmountFormat;
use instructions::*;
use validation::{DepositIntent, WithdrawIntent};

declare_id!("8PSLyQVc8Ya11CiwccFDMGac1keSqfGMQErBXUcbBUkF");

#[program]
pub mod svs_lm {
    use super::*;

    /// Create a vault over the receipt token of a lending pool reserve
    pub fn initialize(ctx: Context<Initialize>, vault_id: u64) -> Result<()> {
        instructions::initialize::handler(ctx, vault_id)
    }

    /// Supply `assets` of underlying to the pool and receive shares
    /// Shares minted (floor rounding - favors vault)
    pub fn deposit(ctx: Context<DepositToPool>, assets: u64, receiver: Pubkey) -> Result<()> {
        instructions::deposit::pool_handler(ctx, AmountFormat::Assets(assets), receiver)
    }

    /// Mint exact shares by supplying the required underlying to the pool
    /// Pays assets (ceiling rounding - favors vault)
    pub fn mint(ctx: Context<DepositToPool>, shares: u64, receiver: Pubkey) -> Result<()> {
        instructions::deposit::pool_handler(ctx, AmountFormat::Shares(shares), receiver)
    }

    /// Deposit receipt tokens worth `assets` and receive shares
    pub fn deposit_receipt(ctx: Context<DepositReceipt>, assets: u64, receiver: Pubkey) -> Result<()> {
        instructions::deposit::receipt_handler(ctx, AmountFormat::Assets(assets), receiver)
    }

    /// Mint exact shares paying in receipt tokens
    pub fn mint_with_receipt(ctx: Context<DepositReceipt>, shares: u64, receiver: Pubkey) -> Result<()> {
        instructions::deposit::receipt_handler(ctx, AmountFormat::Shares(shares), receiver)
    }

    /// Withdraw exact underlying through the pool
    /// Burns shares (ceiling rounding - favors vault)
    pub fn withdraw(ctx: Context<WithdrawFromPool>, assets: u64, receiver: Pubkey) -> Result<()> {
        instructions::withdraw::pool_handler(ctx, AmountFormat::Assets(assets), receiver)
    }

    /// Redeem shares for underlying through the pool
    /// Receives assets (floor rounding - favors vault)
    pub fn redeem(ctx: Context<WithdrawFromPool>, shares: u64, receiver: Pubkey) -> Result<()> {
        instructions::withdraw::pool_handler(ctx, AmountFormat::Shares(shares), receiver)
    }

    /// Withdraw receipt tokens worth `assets`
    pub fn withdraw_receipt(ctx: Context<WithdrawReceipt>, assets: u64, receiver: Pubkey) -> Result<()> {
        instructions::withdraw::receipt_handler(ctx, AmountFormat::Assets(assets), receiver)
    }

    /// Redeem shares for receipt tokens
    pub fn redeem_receipt(ctx: Context<WithdrawReceipt>, shares: u64, receiver: Pubkey) -> Result<()> {
        instructions::withdraw::receipt_handler(ctx, AmountFormat::Shares(shares), receiver)
    }

    /// Relayed deposit authorized by an ed25519 signature of the depositor
    pub fn deposit_with_sig(ctx: Context<DepositWithSig>, intent: DepositIntent) -> Result<()> {
        instructions::meta::deposit_handler(ctx, intent)
    }

    /// Relayed withdrawal authorized by an ed25519 signature of the owner
    pub fn withdraw_with_sig(ctx: Context<WithdrawWithSig>, intent: WithdrawIntent) -> Result<()> {
        instructions::meta::withdraw_handler(ctx, intent)
    }

    /// Move shares to another holder, settling rewards of both
    pub fn transfer_shares(ctx: Context<TransferShares>, shares: u64) -> Result<()> {
        instructions::transfer::handler(ctx, shares)
    }

    /// Register rewards the controller lists for the receipt token
    pub fn register_reward_tokens(ctx: Context<RegisterRewards>) -> Result<()> {
        instructions::rewards::register_handler(ctx)
    }

    /// Claim the caller's rewards to `receiver`
    pub fn claim_rewards<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimVaultRewards<'info>>,
        receiver: Pubkey,
        reward_mints: Vec<Pubkey>,
    ) -> Result<()> {
        let caller = ctx.accounts.caller.key();
        instructions::rewards::claim_handler(ctx, caller, receiver, reward_mints)
    }

    /// Claim for `on_behalf_of` as its authorized claimer
    pub fn claim_rewards_on_behalf<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimVaultRewards<'info>>,
        on_behalf_of: Pubkey,
        receiver: Pubkey,
        reward_mints: Vec<Pubkey>,
    ) -> Result<()> {
        instructions::rewards::claim_handler(ctx, on_behalf_of, receiver, reward_mints)
    }

    /// Claim the caller's rewards to itself
    pub fn claim_rewards_to_self<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimVaultRewards<'info>>,
        reward_mints: Vec<Pubkey>,
    ) -> Result<()> {
        let caller = ctx.accounts.caller.key();
        instructions::rewards::claim_handler(ctx, caller, caller, reward_mints)
    }

    // ============ View Functions (CPI composable) ============

    /// Preview shares for deposit (floor rounding)
    pub fn preview_deposit(ctx: Context<VaultView>, assets: u64) -> Result<()> {
        instructions::view::preview_deposit(ctx, assets)
    }

    /// Preview assets required for mint (ceiling rounding)
    pub fn preview_mint(ctx: Context<VaultView>, shares: u64) -> Result<()> {
        instructions::view::preview_mint(ctx, shares)
    }

    /// Preview shares to burn for withdraw (ceiling rounding)
    pub fn preview_withdraw(ctx: Context<VaultView>, assets: u64) -> Result<()> {
        instructions::view::preview_withdraw(ctx, assets)
    }

    /// Preview assets for redeem (floor rounding)
    pub fn preview_redeem(ctx: Context<VaultView>, shares: u64) -> Result<()> {
        instructions::view::preview_redeem(ctx, shares)
    }

    /// Convert assets to shares (floor rounding)
    pub fn convert_to_shares(ctx: Context<VaultView>, assets: u64) -> Result<()> {
        instructions::view::convert_to_shares_view(ctx, assets)
    }

    /// Convert shares to assets (floor rounding)
    pub fn convert_to_assets(ctx: Context<VaultView>, shares: u64) -> Result<()> {
        instructions::view::convert_to_assets_view(ctx, shares)
    }

    /// Underlying value of the receipt tokens held by the vault
    pub fn total_assets(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::get_total_assets(ctx)
    }

    /// Current exchange rate of the reserve (ray)
    pub fn rate(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::rate(ctx)
    }

    /// Max assets depositable under the reserve's supply cap
    pub fn max_deposit(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::max_deposit(ctx)
    }

    /// Max shares mintable under the reserve's supply cap
    pub fn max_mint(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::max_mint(ctx)
    }

    /// Max assets owner can withdraw
    pub fn max_withdraw(ctx: Context<VaultViewWithOwner>) -> Result<()> {
        instructions::view::max_withdraw(ctx)
    }

    /// Max shares owner can redeem
    pub fn max_redeem(ctx: Context<VaultViewWithOwner>) -> Result<()> {
        instructions::view::max_redeem(ctx)
    }

    /// Whether `reward_mint` is registered with the vault
    pub fn is_registered_reward_token(ctx: Context<RewardsView>, reward_mint: Pubkey) -> Result<()> {
        instructions::view::is_registered_reward_token(ctx, reward_mint)
    }

    /// Current reward index of `reward_mint`
    pub fn get_current_rewards_index(ctx: Context<RewardsView>, reward_mint: Pubkey) -> Result<()> {
        instructions::view::get_current_rewards_index(ctx, reward_mint)
    }

    /// Owed plus accrued rewards of a user
    pub fn get_claimable_rewards(ctx: Context<UserRewardsView>, reward_mint: Pubkey) -> Result<()> {
        instructions::view::get_claimable_rewards(ctx, reward_mint)
    }

    /// Settled but unpaid rewards of a user
    pub fn get_unclaimed_rewards(ctx: Context<UserRewardsView>, reward_mint: Pubkey) -> Result<()> {
        instructions::view::get_unclaimed_rewards(ctx, reward_mint)
    }

    /// Rewards held by the vault plus those the controller owes it
    pub fn get_total_claimable_rewards(
        ctx: Context<VaultRewardsView>,
        reward_mint: Pubkey,
    ) -> Result<()> {
        instructions::view::get_total_claimable_rewards(ctx, reward_mint)
    }
}
