//! Deposits and withdrawals authorized by an off-chain signature.
//!
//! The signer's Ed25519 verification must be the instruction right before
//! this one, and the vault PDA must already be the SPL delegate of the
//! account it pulls from (underlying for deposits, shares for withdrawals).
//! Any relayer may submit; it pays for the nonce account.

use anchor_lang::{prelude::*, solana_program::sysvar::instructions::ID as SYSVAR_INSTRUCTIONS_ID};
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{Mint, TokenAccount, TokenInterface},
};
use lending_pool_itf::Reserve;
use rewards_controller_itf::AssetRewards;

use super::common::{
    burn_shares_as_vault, mint_shares, require_allowance, reward_indices, settle_account,
};
use crate::{
    caps::ReserveSnapshot,
    constants::{NONCE_SEED, USER_REWARDS_SEED, VAULT_SEED},
    engine::{plan_deposit, plan_withdraw, AmountFormat, Route},
    error::VaultError,
    events::{Deposit as DepositEvent, NonceConsumed, Withdraw as WithdrawEvent},
    state::{SigNonce, UserRewards, Vault},
    validation::{
        is_canonical_shares_account, require_depositor, require_not_expired, require_owner,
        require_recipient, verify_preceding_signature, DepositIntent, WithdrawIntent,
    },
};

#[derive(Accounts)]
#[instruction(intent: DepositIntent)]
pub struct DepositWithSig<'info> {
    #[account(mut)]
    pub relayer: Signer<'info>,

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
        constraint = depositor_underlying_account.mint == vault.underlying_mint,
        constraint = depositor_underlying_account.owner == intent.depositor,
    )]
    pub depositor_underlying_account: Box<InterfaceAccount<'info, TokenAccount>>,

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
        constraint = receiver_shares_account.owner == intent.receiver,
    )]
    pub receiver_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = relayer,
        space = UserRewards::LEN,
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), intent.receiver.as_ref()],
        bump
    )]
    pub receiver_rewards: Box<Account<'info, UserRewards>>,

    #[account(
        init_if_needed,
        payer = relayer,
        space = SigNonce::LEN,
        seeds = [NONCE_SEED, vault.key().as_ref(), intent.depositor.as_ref()],
        bump
    )]
    pub depositor_nonce: Box<Account<'info, SigNonce>>,

    /// CHECK: Sysvar fixed address
    #[account(address = SYSVAR_INSTRUCTIONS_ID)]
    pub instructions_sysvar: UncheckedAccount<'info>,

    /// CHECK: lending pool program, address checked
    #[account(address = lending_pool_itf::ID)]
    pub lending_pool_program: UncheckedAccount<'info>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(intent: WithdrawIntent)]
pub struct WithdrawWithSig<'info> {
    #[account(mut)]
    pub relayer: Signer<'info>,

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
        constraint = receiver_underlying_account.owner == intent.receiver,
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
        constraint = owner_shares_account.owner == intent.owner,
    )]
    pub owner_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), intent.owner.as_ref()],
        bump = owner_rewards.bump,
    )]
    pub owner_rewards: Box<Account<'info, UserRewards>>,

    #[account(
        init_if_needed,
        payer = relayer,
        space = SigNonce::LEN,
        seeds = [NONCE_SEED, vault.key().as_ref(), intent.owner.as_ref()],
        bump
    )]
    pub owner_nonce: Box<Account<'info, SigNonce>>,

    /// CHECK: Sysvar fixed address
    #[account(address = SYSVAR_INSTRUCTIONS_ID)]
    pub instructions_sysvar: UncheckedAccount<'info>,

    /// CHECK: lending pool program, address checked
    #[account(address = lending_pool_itf::ID)]
    pub lending_pool_program: UncheckedAccount<'info>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
    pub system_program: Program<'info, System>,
}

/// Consume the signer's nonce; the intent must carry the value being consumed
fn consume_nonce(
    nonce: &mut SigNonce,
    vault: Pubkey,
    signer: Pubkey,
    bump: u8,
    presented: u64,
) -> Result<()> {
    nonce.init_if_empty(vault, signer, bump);
    let expected = nonce.consume()?;
    require!(presented == expected, VaultError::InvalidSignature);

    emit!(NonceConsumed {
        vault,
        signer,
        nonce: expected,
    });
    Ok(())
}

pub fn deposit_handler(ctx: Context<DepositWithSig>, intent: DepositIntent) -> Result<()> {
    require_depositor(&intent.depositor)?;
    require_recipient(&intent.receiver)?;
    let amount = AmountFormat::from_pair(intent.shares, intent.assets)?;

    let now = Clock::get()?.unix_timestamp;
    require_not_expired(intent.deadline, now)?;

    let vault_key = ctx.accounts.vault.key();
    require_keys_eq!(intent.vault, vault_key, VaultError::InvalidSignature);

    let nonce_bump = ctx.bumps.depositor_nonce;
    consume_nonce(
        &mut ctx.accounts.depositor_nonce,
        vault_key,
        intent.depositor,
        nonce_bump,
        intent.nonce,
    )?;
    verify_preceding_signature(
        &ctx.accounts.instructions_sysvar,
        &intent.depositor,
        &intent.digest()?,
    )?;

    let snapshot = ReserveSnapshot::capture(&ctx.accounts.reserve, now)?;
    let plan = plan_deposit(amount, Route::LendingPool, &snapshot)?;

    // The vault spends the depositor's underlying as its delegate
    require_allowance(&vault_key, &ctx.accounts.depositor_underlying_account, plan.assets)?;

    let indices = reward_indices(
        &ctx.accounts.vault,
        &ctx.accounts.asset_rewards,
        &ctx.accounts.reserve,
        now,
    )?;
    let receiver_balance = ctx.accounts.receiver_shares_account.amount;
    let rewards_bump = ctx.bumps.receiver_rewards;
    ctx.accounts
        .receiver_rewards
        .init_if_empty(vault_key, intent.receiver, rewards_bump);
    settle_account(
        &mut ctx.accounts.vault,
        &mut ctx.accounts.receiver_rewards,
        receiver_balance,
        &indices,
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

    lending_pool_itf::cpi::supply(
        CpiContext::new_with_signer(
            ctx.accounts.lending_pool_program.to_account_info(),
            lending_pool_itf::cpi::accounts::Supply {
                authority: ctx.accounts.vault.to_account_info(),
                reserve: ctx.accounts.reserve.to_account_info(),
                underlying_mint: ctx.accounts.underlying_mint.to_account_info(),
                source_liquidity: ctx.accounts.depositor_underlying_account.to_account_info(),
                liquidity_supply: ctx.accounts.liquidity_supply.to_account_info(),
                receipt_mint: ctx.accounts.receipt_mint.to_account_info(),
                destination_receipt: ctx.accounts.receipt_vault.to_account_info(),
                token_program: ctx.accounts.asset_token_program.to_account_info(),
            },
            signer_seeds,
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
        caller: intent.depositor,
        owner: intent.receiver,
        assets: plan.assets,
        shares: plan.shares,
        through_pool: true,
    });

    Ok(())
}

pub fn withdraw_handler(ctx: Context<WithdrawWithSig>, intent: WithdrawIntent) -> Result<()> {
    require_owner(&intent.owner)?;
    require_recipient(&intent.receiver)?;
    let amount = AmountFormat::from_pair(intent.shares, intent.assets)?;

    let now = Clock::get()?.unix_timestamp;
    require_not_expired(intent.deadline, now)?;

    let vault_key = ctx.accounts.vault.key();
    require_keys_eq!(intent.vault, vault_key, VaultError::InvalidSignature);

    let nonce_bump = ctx.bumps.owner_nonce;
    consume_nonce(
        &mut ctx.accounts.owner_nonce,
        vault_key,
        intent.owner,
        nonce_bump,
        intent.nonce,
    )?;
    verify_preceding_signature(
        &ctx.accounts.instructions_sysvar,
        &intent.owner,
        &intent.digest()?,
    )?;

    let snapshot = ReserveSnapshot::capture(&ctx.accounts.reserve, now)?;
    let owner_balance = ctx.accounts.owner_shares_account.amount;
    let plan = plan_withdraw(
        amount,
        Route::LendingPool,
        &snapshot,
        owner_balance,
        ctx.accounts.liquidity_supply.amount,
    )?;

    // The vault burns the owner's shares as its delegate
    require_allowance(&vault_key, &ctx.accounts.owner_shares_account, plan.shares)?;

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

    burn_shares_as_vault(
        &ctx.accounts.vault,
        &ctx.accounts.shares_mint,
        &ctx.accounts.owner_shares_account,
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
        vault: vault_key,
        caller: ctx.accounts.relayer.key(),
        receiver: intent.receiver,
        owner: intent.owner,
        assets: plan.assets,
        shares: plan.shares,
        through_pool: true,
    });

    Ok(())
}
