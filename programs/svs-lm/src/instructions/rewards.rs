use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};
use lending_pool_itf::Reserve;
use rewards_controller_itf::{AssetRewards, ClaimerConfig, UserAssetRewards, CLAIMER_SEED};

use super::common::{register_listed_rewards, reward_indices, transfer_from_vault};
use crate::{
    constants::{CLAIM_ACCOUNTS_PER_REWARD, USER_REWARDS_SEED, VAULT_SEED},
    error::VaultError,
    events::RewardsClaimed,
    rewards::{claimable_rewards, finish_claim, plan_claims, ClaimTarget},
    state::{UserRewards, Vault},
    validation::{is_canonical_shares_account, require_claimer, require_recipient},
};

/// Pick up rewards the controller added since the last registration
#[derive(Accounts)]
pub struct RegisterRewards<'info> {
    #[account(mut)]
    pub vault: Box<Account<'info, Vault>>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(address = vault.asset_rewards)]
    pub asset_rewards: Box<Account<'info, AssetRewards>>,
}

/// Claim accrued rewards of `on_behalf_of`.
///
/// Remaining accounts, per requested non-default reward mint:
/// `[reward_mint, vault_reward_account (mut), receiver_reward_account (mut), reward_treasury (mut)]`
#[derive(Accounts)]
pub struct ClaimVaultRewards<'info> {
    pub caller: Signer<'info>,

    #[account(mut)]
    pub vault: Box<Account<'info, Vault>>,

    #[account(address = vault.reserve)]
    pub reserve: Box<Account<'info, Reserve>>,

    #[account(mut, address = vault.asset_rewards)]
    pub asset_rewards: Box<Account<'info, AssetRewards>>,

    /// The vault's own accrual record at the controller
    #[account(
        mut,
        constraint = vault_asset_rewards.user == vault.key() @ VaultError::RewardAccountsMismatch,
        constraint = vault_asset_rewards.asset == vault.receipt_mint @ VaultError::RewardAccountsMismatch,
    )]
    pub vault_asset_rewards: Box<Account<'info, UserAssetRewards>>,

    #[account(
        constraint = on_behalf_of_shares_account.mint == vault.shares_mint,
        constraint = is_canonical_shares_account(
            &on_behalf_of_shares_account.key(),
            &on_behalf_of_shares_account.owner,
            &vault.shares_mint,
        ) @ VaultError::InvalidSharesAccount,
    )]
    pub on_behalf_of_shares_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [USER_REWARDS_SEED, vault.key().as_ref(), on_behalf_of_shares_account.owner.as_ref()],
        bump = on_behalf_of_rewards.bump,
    )]
    pub on_behalf_of_rewards: Box<Account<'info, UserRewards>>,

    #[account(
        seeds = [CLAIMER_SEED, on_behalf_of_shares_account.owner.as_ref()],
        seeds::program = rewards_controller_itf::ID,
        bump,
    )]
    pub claimer_config: Option<Account<'info, ClaimerConfig>>,

    /// CHECK: rewards controller program, address checked
    #[account(address = rewards_controller_itf::ID)]
    pub rewards_controller_program: UncheckedAccount<'info>,

    pub reward_token_program: Interface<'info, TokenInterface>,
}

pub fn register_handler(ctx: Context<RegisterRewards>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();

    register_listed_rewards(
        &mut ctx.accounts.vault,
        vault_key,
        &ctx.accounts.asset_rewards,
        &ctx.accounts.reserve,
        now,
    )
}

pub fn claim_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, ClaimVaultRewards<'info>>,
    on_behalf_of: Pubkey,
    receiver: Pubkey,
    reward_mints: Vec<Pubkey>,
) -> Result<()> {
    require_recipient(&receiver)?;
    require_keys_eq!(
        ctx.accounts.on_behalf_of_shares_account.owner,
        on_behalf_of,
        VaultError::InvalidOwner
    );
    let caller = ctx.accounts.caller.key();
    require_claimer(&caller, &on_behalf_of, ctx.accounts.claimer_config.as_deref())?;

    let now = Clock::get()?.unix_timestamp;
    let indices = reward_indices(
        &ctx.accounts.vault,
        &ctx.accounts.asset_rewards,
        &ctx.accounts.reserve,
        now,
    )?;
    let unit = ctx.accounts.vault.asset_unit()?;
    let balance = ctx.accounts.on_behalf_of_shares_account.amount;
    let vault_key = ctx.accounts.vault.key();

    let remaining = ctx.remaining_accounts;
    let targets = plan_claims(&reward_mints, &ctx.accounts.vault.rewards, remaining.len())?;

    for target in targets {
        let ClaimTarget {
            mint,
            position,
            first_account,
        } = target;
        let Some([reward_mint_info, vault_reward_info, receiver_reward_info, treasury_info]) =
            remaining.get(first_account..first_account + CLAIM_ACCOUNTS_PER_REWARD)
        else {
            return err!(VaultError::RewardAccountsMismatch);
        };

        require_keys_eq!(
            reward_mint_info.key(),
            mint,
            VaultError::RewardAccountsMismatch
        );
        let reward_mint = InterfaceAccount::<Mint>::try_from(reward_mint_info)?;
        let mut vault_reward_account = InterfaceAccount::<TokenAccount>::try_from(vault_reward_info)?;
        let receiver_reward_account = InterfaceAccount::<TokenAccount>::try_from(receiver_reward_info)?;
        require!(
            vault_reward_account.mint == mint && vault_reward_account.owner == vault_key,
            VaultError::RewardAccountsMismatch
        );
        require!(
            receiver_reward_account.mint == mint && receiver_reward_account.owner == receiver,
            VaultError::RewardAccountsMismatch
        );

        let current_index = indices[position];
        let user_reward = claimable_rewards(
            balance,
            &ctx.accounts.on_behalf_of_rewards.entries[position],
            &ctx.accounts.vault.rewards[position],
            current_index,
            unit,
        )?;

        let mut held = vault_reward_account.amount;
        if user_reward > held as u128 {
            // Pull everything the controller owes the vault for this reward
            let receipt_mint_key = ctx.accounts.vault.receipt_mint;
            let vault_id_bytes = ctx.accounts.vault.vault_id.to_le_bytes();
            let bump = ctx.accounts.vault.bump;
            let signer_seeds: &[&[&[u8]]] = &[&[
                VAULT_SEED,
                receipt_mint_key.as_ref(),
                vault_id_bytes.as_ref(),
                &[bump],
            ]];

            rewards_controller_itf::cpi::claim_rewards(
                CpiContext::new_with_signer(
                    ctx.accounts.rewards_controller_program.to_account_info(),
                    rewards_controller_itf::cpi::accounts::ClaimRewards {
                        claimer: ctx.accounts.vault.to_account_info(),
                        asset_rewards: ctx.accounts.asset_rewards.to_account_info(),
                        user_asset_rewards: ctx.accounts.vault_asset_rewards.to_account_info(),
                        reward_mint: reward_mint_info.clone(),
                        reward_treasury: treasury_info.clone(),
                        destination: vault_reward_info.clone(),
                        token_program: ctx.accounts.reward_token_program.to_account_info(),
                    },
                    signer_seeds,
                ),
                u64::MAX,
            )?;

            vault_reward_account.reload()?;
            held = vault_reward_account.amount;
        }

        let resolution = finish_claim(
            &mut ctx.accounts.on_behalf_of_rewards.entries[position],
            user_reward,
            held,
            current_index,
        );
        ctx.accounts.vault.rewards[position].observe(current_index);

        if resolution.paid > 0 {
            transfer_from_vault(
                &ctx.accounts.vault,
                vault_reward_info.clone(),
                receiver_reward_info.clone(),
                &reward_mint,
                &ctx.accounts.reward_token_program,
                resolution.paid,
            )?;
        }

        emit!(RewardsClaimed {
            vault: vault_key,
            on_behalf_of,
            receiver,
            reward_mint: mint,
            paid: resolution.paid,
            deferred: resolution.deferred,
        });
    }

    Ok(())
}
