use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};
use lending_pool_itf::Reserve;
use rewards_controller_itf::AssetRewards;

use super::common::{mint_shares, reward_indices, settle_account};
use crate::{
    caps::ReserveSnapshot,
    constants::USER_REWARDS_SEED,
    engine::{plan_deposit, receipt_units_in, AmountFormat, Route},
    error::VaultError,
    events::Deposit as DepositEvent,
    state::{UserRewards, Vault},
    validation::{is_canonical_shares_account, require_recipient},
};

/// Deposit underlying, supplied to the lending pool on the way in
#[derive(Accounts)]
#[instruction(amount: u64, receiver: Pubkey)]
pub struct DepositToPool<'info> {
    #[account(mut)]
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

    #[account(
        mut,
        constraint = caller_underlying_account.mint == vault.underlying_mint,
        constraint = caller_underlying_account.owner == caller.key(),
    )]
    pub caller_underlying_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = reserve.liquidity_supply)]
    pub liquidity_supply: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = vault.receipt_vault)]
    pub receipt_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = vault.shares_mint)]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = receiver_shares_account.mint == vault.shares_mint,
        constraint = is_canonical_shares_account(
            &receiver_shares_account.key(),
            &receiver_shares_account.owner,
            &vault.shares_mint,
        ) @ VaultError::InvalidSharesAccount,
        constraint = receiver_shares_account.owner == receiver,
    )]
    pub receiver_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = caller,
        space = UserRewards::LEN,
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), receiver.as_ref()],
        bump
    )]
    pub receiver_rewards: Box<Account<'info, UserRewards>>,

    /// CHECK: lending pool program, address checked
    #[account(address = lending_pool_itf::ID)]
    pub lending_pool_program: UncheckedAccount<'info>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
    pub system_program: Program<'info, System>,
}

/// Deposit receipt tokens directly
#[derive(Accounts)]
#[instruction(amount: u64, receiver: Pubkey)]
pub struct DepositReceipt<'info> {
    #[account(mut)]
    pub caller: Signer<'info>,

    #[account(mut)]
    pub vault: Box<Account<'info, Vault>>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = vault.asset_rewards)]
    pub asset_rewards: Box<Account<'info, AssetRewards>>,

    #[account(address = vault.receipt_mint)]
    pub receipt_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = caller_receipt_account.mint == vault.receipt_mint,
        constraint = caller_receipt_account.owner == caller.key(),
    )]
    pub caller_receipt_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = vault.receipt_vault)]
    pub receipt_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = vault.shares_mint)]
    pub shares_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        constraint = receiver_shares_account.mint == vault.shares_mint,
        constraint = is_canonical_shares_account(
            &receiver_shares_account.key(),
            &receiver_shares_account.owner,
            &vault.shares_mint,
        ) @ VaultError::InvalidSharesAccount,
        constraint = receiver_shares_account.owner == receiver,
    )]
    pub receiver_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = caller,
        space = UserRewards::LEN,
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), receiver.as_ref()],
        bump
    )]
    pub receiver_rewards: Box<Account<'info, UserRewards>>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
    pub system_program: Program<'info, System>,
}

/// Supply underlying to the pool for the vault and mint shares to `receiver`
pub fn pool_handler(ctx: Context<DepositToPool>, amount: AmountFormat, receiver: Pubkey) -> Result<()> {
    require_recipient(&receiver)?;

    let now = Clock::get()?.unix_timestamp;
    let snapshot = ReserveSnapshot::capture(&ctx.accounts.reserve, now)?;
    let plan = plan_deposit(amount, Route::LendingPool, &snapshot)?;

    // Settle the receiver before its balance changes
    let indices = reward_indices(
        &ctx.accounts.vault,
        &ctx.accounts.asset_rewards,
        &ctx.accounts.reserve,
        now,
    )?;
    let vault_key = ctx.accounts.vault.key();
    let receiver_balance = ctx.accounts.receiver_shares_account.amount;
    let rewards_bump = ctx.bumps.receiver_rewards;
    ctx.accounts
        .receiver_rewards
        .init_if_empty(vault_key, receiver, rewards_bump);
    settle_account(
        &mut ctx.accounts.vault,
        &mut ctx.accounts.receiver_rewards,
        receiver_balance,
        &indices,
    )?;

    lending_pool_itf::cpi::supply(
        CpiContext::new(
            ctx.accounts.lending_pool_program.to_account_info(),
            lending_pool_itf::cpi::accounts::Supply {
                authority: ctx.accounts.caller.to_account_info(),
                reserve: ctx.accounts.reserve.to_account_info(),
                underlying_mint: ctx.accounts.underlying_mint.to_account_info(),
                source_liquidity: ctx.accounts.caller_underlying_account.to_account_info(),
                liquidity_supply: ctx.accounts.liquidity_supply.to_account_info(),
                receipt_mint: ctx.accounts.receipt_mint.to_account_info(),
                destination_receipt: ctx.accounts.receipt_vault.to_account_info(),
                token_program: ctx.accounts.asset_token_program.to_account_info(),
            },
        ),
        plan.assets,
    )?;

    mint_shares(
        &ctx.accounts.vault,
        &ctx.accounts.shares_mint,
        &ctx.accounts.receiver_shares_account,
        &ctx.accounts.token_2022_program,
        plan.shares,
    )?;

    emit!(DepositEvent {
        vault: vault_key,
        caller: ctx.accounts.caller.key(),
        owner: receiver,
        assets: plan.assets,
        shares: plan.shares,
        through_pool: true,
    });

    Ok(())
}

/// Pull receipt tokens worth the planned assets and mint shares to `receiver`
pub fn receipt_handler(ctx: Context<DepositReceipt>, amount: AmountFormat, receiver: Pubkey) -> Result<()> {
    require_recipient(&receiver)?;

    let now = Clock::get()?.unix_timestamp;
    let snapshot = ReserveSnapshot::capture(&ctx.accounts.reserve, now)?;
    let plan = plan_deposit(amount, Route::Direct, &snapshot)?;
    // Receipt balances are scaled, round the pulled units up
    let receipt_units = receipt_units_in(plan.assets, snapshot.rate())?;

    let indices = reward_indices(
        &ctx.accounts.vault,
        &ctx.accounts.asset_rewards,
        &ctx.accounts.reserve,
        now,
    )?;
    let vault_key = ctx.accounts.vault.key();
    let receiver_balance = ctx.accounts.receiver_shares_account.amount;
    let rewards_bump = ctx.bumps.receiver_rewards;
    ctx.accounts
        .receiver_rewards
        .init_if_empty(vault_key, receiver, rewards_bump);
    settle_account(
        &mut ctx.accounts.vault,
        &mut ctx.accounts.receiver_rewards,
        receiver_balance,
        &indices,
    )?;

    transfer_checked(
        CpiContext::new(
            ctx.accounts.asset_token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.caller_receipt_account.to_account_info(),
                to: ctx.accounts.receipt_vault.to_account_info(),
                mint: ctx.accounts.receipt_mint.to_account_info(),
                authority: ctx.accounts.caller.to_account_info(),
            },
        ),
        receipt_units,
        ctx.accounts.receipt_mint.decimals,
    )?;

    mint_shares(
        &ctx.accounts.vault,
        &ctx.accounts.shares_mint,
        &ctx.accounts.receiver_shares_account,
        &ctx.accounts.token_2022_program,
        plan.shares,
    )?;

    emit!(DepositEvent {
        vault: vault_key,
        caller: ctx.accounts.caller.key(),
        owner: receiver,
        assets: plan.assets,
        shares: plan.shares,
        through_pool: false,
    });

    Ok(())
}
