use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_2022::{
        spl_token_2022::{
            extension::ExtensionType,
            instruction::{initialize_mint2, initialize_non_transferable_mint},
        },
        Token2022,
    },
    token_interface::{Mint, TokenAccount, TokenInterface},
};
use lending_pool_itf::Reserve;
use rewards_controller_itf::AssetRewards;

use super::common::register_listed_rewards;
use crate::{
    constants::{SHARES_MINT_SEED, VAULT_SEED},
    error::VaultError,
    events::VaultInitialized,
    state::Vault,
};

#[derive(Accounts)]
#[instruction(vault_id: u64)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = Vault::LEN,
        seeds = [VAULT_SEED, receipt_mint.key().as_ref(), &vault_id.to_le_bytes()],
        bump
    )]
    pub vault: Box<Account<'info, Vault>>,

    pub underlying_mint: Box<InterfaceAccount<'info, Mint>>,

    pub receipt_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Lending pool reserve of the underlying
    pub reserve: Box<Account<'info, Reserve>>,

    /// Rewards controller configuration of the receipt
    pub asset_rewards: Box<Account<'info, AssetRewards>>,

    /// CHECK: Shares mint is initialized via CPI in handler
    #[account(
        mut,
        seeds = [SHARES_MINT_SEED, vault.key().as_ref()],
        bump
    )]
    pub shares_mint: UncheckedAccount<'info>,

    #[account(
        init,
        payer = authority,
        associated_token::mint = receipt_mint,
        associated_token::authority = vault,
        associated_token::token_program = asset_token_program,
    )]
    pub receipt_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub asset_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

pub fn handler(ctx: Context<Initialize>, vault_id: u64) -> Result<()> {
    let reserve = &ctx.accounts.reserve;
    require_keys_eq!(
        reserve.underlying_mint,
        ctx.accounts.underlying_mint.key(),
        VaultError::InvalidPoolBinding
    );
    require_keys_eq!(
        reserve.receipt_mint,
        ctx.accounts.receipt_mint.key(),
        VaultError::InvalidPoolBinding
    );
    require_keys_eq!(
        ctx.accounts.asset_rewards.asset,
        ctx.accounts.receipt_mint.key(),
        VaultError::InvalidPoolBinding
    );

    let vault_key = ctx.accounts.vault.key();
    let receipt_decimals = ctx.accounts.receipt_mint.decimals;
    let shares_mint_bump = ctx.bumps.shares_mint;

    // Shares only move through this program, so the mint is non-transferable
    let mint_size = ExtensionType::try_calculate_account_len::<spl_token_2022::state::Mint>(&[
        ExtensionType::NonTransferable,
    ])
    .map_err(|_| VaultError::MathOverflow)?;
    let lamports = ctx.accounts.rent.minimum_balance(mint_size);

    let shares_mint_bump_bytes = [shares_mint_bump];
    let shares_mint_seeds: &[&[u8]] = &[
        SHARES_MINT_SEED,
        vault_key.as_ref(),
        &shares_mint_bump_bytes,
    ];

    invoke_signed(
        &anchor_lang::solana_program::system_instruction::create_account(
            &ctx.accounts.authority.key(),
            &ctx.accounts.shares_mint.key(),
            lamports,
            mint_size as u64,
            &ctx.accounts.token_2022_program.key(),
        ),
        &[
            ctx.accounts.authority.to_account_info(),
            ctx.accounts.shares_mint.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
        &[shares_mint_seeds],
    )?;

    let non_transferable_ix = initialize_non_transferable_mint(
        &ctx.accounts.token_2022_program.key(),
        &ctx.accounts.shares_mint.key(),
    )?;
    invoke_signed(
        &non_transferable_ix,
        &[ctx.accounts.shares_mint.to_account_info()],
        &[shares_mint_seeds],
    )?;

    // Vault PDA is mint authority, no freeze authority
    let init_mint_ix = initialize_mint2(
        &ctx.accounts.token_2022_program.key(),
        &ctx.accounts.shares_mint.key(),
        &vault_key,
        None,
        receipt_decimals,
    )?;
    invoke_signed(
        &init_mint_ix,
        &[ctx.accounts.shares_mint.to_account_info()],
        &[shares_mint_seeds],
    )?;

    let now = Clock::get()?.unix_timestamp;

    let vault = &mut ctx.accounts.vault;
    vault.authority = ctx.accounts.authority.key();
    vault.underlying_mint = ctx.accounts.underlying_mint.key();
    vault.receipt_mint = ctx.accounts.receipt_mint.key();
    vault.shares_mint = ctx.accounts.shares_mint.key();
    vault.receipt_vault = ctx.accounts.receipt_vault.key();
    vault.reserve = ctx.accounts.reserve.key();
    vault.asset_rewards = ctx.accounts.asset_rewards.key();
    vault.receipt_decimals = receipt_decimals;
    vault.bump = ctx.bumps.vault;
    vault.vault_id = vault_id;
    vault.rewards = Vec::new();
    vault._reserved = [0u8; 64];

    register_listed_rewards(
        vault,
        vault_key,
        &ctx.accounts.asset_rewards,
        &ctx.accounts.reserve,
        now,
    )?;

    emit!(VaultInitialized {
        vault: vault_key,
        authority: vault.authority,
        underlying_mint: vault.underlying_mint,
        receipt_mint: vault.receipt_mint,
        shares_mint: vault.shares_mint,
        vault_id,
    });

    msg!(
        "Vault initialized for receipt {} with {} rewards",
        vault.receipt_mint,
        vault.rewards.len()
    );

    Ok(())
}
