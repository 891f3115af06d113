use anchor_lang::{prelude::*, solana_program::program_option::COption};
use anchor_spl::{
    token_2022::{self, Burn, MintTo, Token2022},
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};
use lending_pool_itf::Reserve;
use rewards_controller_itf::AssetRewards;

use crate::{
    constants::VAULT_SEED,
    error::VaultError,
    events::RewardTokenRegistered,
    rewards,
    state::{UserRewards, Vault},
};

/// Current index of every registered reward, aligned with `vault.rewards`
pub fn reward_indices(
    vault: &Vault,
    asset_rewards: &AssetRewards,
    reserve: &Reserve,
    now: i64,
) -> Result<Vec<u128>> {
    let unit = asset_rewards.asset_unit().ok_or(VaultError::MathOverflow)?;

    vault
        .rewards
        .iter()
        .map(|cache| {
            rewards::current_index(
                cache,
                asset_rewards.reward(&cache.mint),
                reserve.scaled_total_supply,
                unit,
                now,
            )
        })
        .collect()
}

/// Register every reward the controller lists for the receipt asset.
///
/// Each new entry starts at the controller's current index.
pub fn register_listed_rewards(
    vault: &mut Vault,
    vault_key: Pubkey,
    asset_rewards: &AssetRewards,
    reserve: &Reserve,
    now: i64,
) -> Result<()> {
    let unit = asset_rewards.asset_unit().ok_or(VaultError::MathOverflow)?;

    for reward in asset_rewards.rewards.iter() {
        let (_, start_index) = reward
            .asset_index(reserve.scaled_total_supply, unit, now)
            .ok_or(VaultError::MathOverflow)?;

        if rewards::register_reward_token(&mut vault.rewards, reward.mint, start_index)? {
            emit!(RewardTokenRegistered {
                vault: vault_key,
                reward_mint: reward.mint,
                start_index,
            });
            msg!("Reward registered: {} at index {}", reward.mint, start_index);
        }
    }
    Ok(())
}

/// Settle `user_rewards` for every registered reward at the pre-change `balance`
pub fn settle_account(
    vault: &mut Vault,
    user_rewards: &mut UserRewards,
    balance: u64,
    indices: &[u128],
) -> Result<()> {
    let unit = vault.asset_unit()?;
    rewards::settle_user(
        balance,
        &mut user_rewards.entries,
        &mut vault.rewards,
        indices,
        unit,
    )
}

/// A spender other than the owner must be the delegate of `account` for at least `amount`
pub fn require_allowance(spender: &Pubkey, account: &TokenAccount, amount: u64) -> Result<()> {
    if *spender == account.owner {
        return Ok(());
    }
    require!(
        account.delegate == COption::Some(*spender) && account.delegated_amount >= amount,
        VaultError::InsufficientAllowance
    );
    Ok(())
}

/// Mint shares (vault PDA is mint authority)
pub fn mint_shares<'info>(
    vault: &Account<'info, Vault>,
    shares_mint: &InterfaceAccount<'info, Mint>,
    to: &InterfaceAccount<'info, TokenAccount>,
    token_2022_program: &Program<'info, Token2022>,
    shares: u64,
) -> Result<()> {
    let receipt_mint_key = vault.receipt_mint;
    let vault_id_bytes = vault.vault_id.to_le_bytes();
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        receipt_mint_key.as_ref(),
        vault_id_bytes.as_ref(),
        &[vault.bump],
    ]];

    token_2022::mint_to(
        CpiContext::new_with_signer(
            token_2022_program.to_account_info(),
            MintTo {
                mint: shares_mint.to_account_info(),
                to: to.to_account_info(),
                authority: vault.to_account_info(),
            },
            signer_seeds,
        ),
        shares,
    )
}

/// Burn shares with `authority` being the owner or its delegate
pub fn burn_shares<'info>(
    shares_mint: &InterfaceAccount<'info, Mint>,
    from: &InterfaceAccount<'info, TokenAccount>,
    authority: AccountInfo<'info>,
    token_2022_program: &Program<'info, Token2022>,
    shares: u64,
) -> Result<()> {
    token_2022::burn(
        CpiContext::new(
            token_2022_program.to_account_info(),
            Burn {
                mint: shares_mint.to_account_info(),
                from: from.to_account_info(),
                authority,
            },
        ),
        shares,
    )
}

/// Burn shares the vault PDA was approved for
pub fn burn_shares_as_vault<'info>(
    vault: &Account<'info, Vault>,
    shares_mint: &InterfaceAccount<'info, Mint>,
    from: &InterfaceAccount<'info, TokenAccount>,
    token_2022_program: &Program<'info, Token2022>,
    shares: u64,
) -> Result<()> {
    let receipt_mint_key = vault.receipt_mint;
    let vault_id_bytes = vault.vault_id.to_le_bytes();
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        receipt_mint_key.as_ref(),
        vault_id_bytes.as_ref(),
        &[vault.bump],
    ]];

    token_2022::burn(
        CpiContext::new_with_signer(
            token_2022_program.to_account_info(),
            Burn {
                mint: shares_mint.to_account_info(),
                from: from.to_account_info(),
                authority: vault.to_account_info(),
            },
            signer_seeds,
        ),
        shares,
    )
}

/// Transfer tokens out of a vault-owned account
pub fn transfer_from_vault<'info>(
    vault: &Account<'info, Vault>,
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    mint: &InterfaceAccount<'info, Mint>,
    token_program: &Interface<'info, TokenInterface>,
    amount: u64,
) -> Result<()> {
    let receipt_mint_key = vault.receipt_mint;
    let vault_id_bytes = vault.vault_id.to_le_bytes();
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        receipt_mint_key.as_ref(),
        vault_id_bytes.as_ref(),
        &[vault.bump],
    ]];

    transfer_checked(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            TransferChecked {
                from,
                to,
                mint: mint.to_account_info(),
                authority: vault.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
        mint.decimals,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_code;
    use anchor_lang::solana_program::program_pack::Pack;
    use anchor_spl::token_2022::spl_token_2022::state::{Account as SplAccount, AccountState};

    fn shares_account(owner: Pubkey, delegate: Option<Pubkey>, delegated_amount: u64) -> TokenAccount {
        let account = SplAccount {
            mint: Pubkey::new_unique(),
            owner,
            amount: 1_000,
            delegate: delegate.into(),
            state: AccountState::Initialized,
            is_native: COption::None,
            delegated_amount,
            close_authority: COption::None,
        };
        let mut data = vec![0u8; SplAccount::LEN];
        SplAccount::pack(account, &mut data).unwrap();
        TokenAccount::try_deserialize(&mut data.as_slice()).unwrap()
    }

    #[test]
    fn test_owner_needs_no_allowance() {
        let owner = Pubkey::new_unique();
        let account = shares_account(owner, None, 0);
        assert!(require_allowance(&owner, &account, 1_000).is_ok());
    }

    #[test]
    fn test_delegate_within_allowance() {
        let owner = Pubkey::new_unique();
        let spender = Pubkey::new_unique();
        let account = shares_account(owner, Some(spender), 50);

        assert!(require_allowance(&spender, &account, 50).is_ok());
        assert_eq!(
            error_code(require_allowance(&spender, &account, 51)),
            u32::from(VaultError::InsufficientAllowance)
        );
    }

    #[test]
    fn test_stranger_has_no_allowance() {
        let owner = Pubkey::new_unique();
        let account = shares_account(owner, Some(Pubkey::new_unique()), u64::MAX);
        assert_eq!(
            error_code(require_allowance(&Pubkey::new_unique(), &account, 1)),
            u32::from(VaultError::InsufficientAllowance)
        );
    }
}
