use anchor_lang::{
    prelude::*,
    solana_program::{
        ed25519_program,
        sysvar::instructions::{load_current_index_checked, load_instruction_at_checked},
    },
};
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use constant_time_eq::constant_time_eq;
use rewards_controller_itf::ClaimerConfig;

use crate::{constants::SIGNATURE_DOMAIN, engine::AmountFormat, error::VaultError};

pub fn require_recipient(recipient: &Pubkey) -> Result<()> {
    require_keys_neq!(*recipient, Pubkey::default(), VaultError::InvalidRecipient);
    Ok(())
}

pub fn require_owner(owner: &Pubkey) -> Result<()> {
    require_keys_neq!(*owner, Pubkey::default(), VaultError::InvalidOwner);
    Ok(())
}

pub fn require_depositor(depositor: &Pubkey) -> Result<()> {
    require_keys_neq!(*depositor, Pubkey::default(), VaultError::InvalidDepositor);
    Ok(())
}

/// `caller` acts for itself or is the claimer the rewards controller recorded for `on_behalf_of`
pub fn require_claimer(
    caller: &Pubkey,
    on_behalf_of: &Pubkey,
    config: Option<&ClaimerConfig>,
) -> Result<()> {
    if caller == on_behalf_of {
        return Ok(());
    }
    match config {
        Some(c) if c.user == *on_behalf_of && c.claimer == *caller => Ok(()),
        _ => err!(VaultError::InvalidClaimer),
    }
}

/// Reward records are keyed by owner, so each owner holds shares in exactly
/// one account: its Token-2022 associated token account of the shares mint.
pub fn is_canonical_shares_account(account: &Pubkey, owner: &Pubkey, shares_mint: &Pubkey) -> bool {
    *account == get_associated_token_address_with_program_id(owner, shares_mint, &spl_token_2022::ID)
}

pub fn require_not_expired(deadline: i64, now: i64) -> Result<()> {
    require!(now <= deadline, VaultError::InvalidExpiration);
    Ok(())
}

impl AmountFormat {
    /// Exactly one of `shares` and `assets` must be non-zero
    pub fn from_pair(shares: u64, assets: u64) -> Result<Self> {
        match (shares, assets) {
            (0, 0) => err!(VaultError::InvalidZeroAmount),
            (shares, 0) => Ok(Self::Shares(shares)),
            (0, assets) => Ok(Self::Assets(assets)),
            _ => err!(VaultError::OnlyOneAmountFormatAllowed),
        }
    }
}

/// Deposit authorized off-chain by `depositor`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositIntent {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub receiver: Pubkey,
    pub shares: u64,
    pub assets: u64,
    pub nonce: u64,
    pub deadline: i64,
}

impl DepositIntent {
    pub const ACTION: &'static [u8] = b"deposit";

    pub fn digest(&self) -> Result<[u8; 32]> {
        intent_digest(Self::ACTION, self)
    }
}

/// Withdrawal authorized off-chain by `owner`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawIntent {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub receiver: Pubkey,
    pub shares: u64,
    pub assets: u64,
    pub nonce: u64,
    pub deadline: i64,
}

impl WithdrawIntent {
    pub const ACTION: &'static [u8] = b"withdraw";

    pub fn digest(&self) -> Result<[u8; 32]> {
        intent_digest(Self::ACTION, self)
    }
}

/// blake3(domain || action || borsh(intent))
pub fn intent_digest<T: AnchorSerialize>(action: &[u8], intent: &T) -> Result<[u8; 32]> {
    let mut payload = Vec::new();
    intent
        .serialize(&mut payload)
        .map_err(|_| error!(VaultError::InvalidSignature))?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(SIGNATURE_DOMAIN);
    hasher.update(action);
    hasher.update(&payload);
    Ok(*hasher.finalize().as_bytes())
}

/// Offsets block of the native Ed25519 program instruction data
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ed25519SignatureOffsets {
    pub signature_offset: u16,
    pub signature_instruction_index: u16,
    pub public_key_offset: u16,
    pub public_key_instruction_index: u16,
    pub message_data_offset: u16,
    pub message_data_size: u16,
    pub message_instruction_index: u16,
}

impl Ed25519SignatureOffsets {
    pub const LEN: usize = 14;
}

/// num_signatures + padding
const ED25519_HEADER_LEN: usize = 2;
/// Instruction index meaning "the Ed25519 instruction itself"
const SAME_INSTRUCTION: u16 = u16::MAX;

/// Check that Ed25519 instruction data carries exactly one signature by
/// `signer` over `message`, all stored inline.
///
/// The native program has already verified the signature itself when this runs.
pub fn verify_signed_message(data: &[u8], signer: &Pubkey, message: &[u8]) -> Result<()> {
    require!(
        data.len() >= ED25519_HEADER_LEN + Ed25519SignatureOffsets::LEN,
        VaultError::InvalidSignature
    );
    require!(data[0] == 1, VaultError::InvalidSignature);

    let mut raw = &data[ED25519_HEADER_LEN..ED25519_HEADER_LEN + Ed25519SignatureOffsets::LEN];
    let offsets = Ed25519SignatureOffsets::deserialize(&mut raw)
        .map_err(|_| error!(VaultError::InvalidSignature))?;

    require!(
        offsets.signature_instruction_index == SAME_INSTRUCTION
            && offsets.public_key_instruction_index == SAME_INSTRUCTION
            && offsets.message_instruction_index == SAME_INSTRUCTION,
        VaultError::InvalidSignature
    );

    let pubkey = slice_at(data, offsets.public_key_offset, 32)?;
    let signed = slice_at(data, offsets.message_data_offset, offsets.message_data_size as usize)?;

    require!(
        constant_time_eq(pubkey, signer.as_ref()) && constant_time_eq(signed, message),
        VaultError::InvalidSignature
    );
    Ok(())
}

fn slice_at(data: &[u8], offset: u16, len: usize) -> Result<&[u8]> {
    let start = offset as usize;
    let end = start.checked_add(len).ok_or(VaultError::InvalidSignature)?;
    data.get(start..end)
        .ok_or_else(|| error!(VaultError::InvalidSignature))
}

/// The instruction right before the current one must be an Ed25519
/// verification of `message` by `signer`.
pub fn verify_preceding_signature(
    instructions_sysvar: &AccountInfo,
    signer: &Pubkey,
    message: &[u8],
) -> Result<()> {
    let current: usize = load_current_index_checked(instructions_sysvar)?.into();
    require!(current > 0, VaultError::InvalidSignature);

    let ix = load_instruction_at_checked(current - 1, instructions_sysvar)?;
    require_keys_eq!(
        ix.program_id,
        ed25519_program::ID,
        VaultError::InvalidSignature
    );
    verify_signed_message(&ix.data, signer, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_code;

    /// Ed25519 instruction data with inline pubkey, dummy signature and message
    fn ed25519_data(signer: &Pubkey, message: &[u8]) -> Vec<u8> {
        let pubkey_offset = (ED25519_HEADER_LEN + Ed25519SignatureOffsets::LEN) as u16;
        let signature_offset = pubkey_offset + 32;
        let message_offset = signature_offset + 64;
        let offsets = Ed25519SignatureOffsets {
            signature_offset,
            signature_instruction_index: SAME_INSTRUCTION,
            public_key_offset: pubkey_offset,
            public_key_instruction_index: SAME_INSTRUCTION,
            message_data_offset: message_offset,
            message_data_size: message.len() as u16,
            message_instruction_index: SAME_INSTRUCTION,
        };

        let mut data = vec![1u8, 0];
        offsets.serialize(&mut data).unwrap();
        data.extend_from_slice(signer.as_ref());
        data.extend_from_slice(&[7u8; 64]);
        data.extend_from_slice(message);
        data
    }

    fn intent() -> DepositIntent {
        DepositIntent {
            vault: Pubkey::new_unique(),
            depositor: Pubkey::new_unique(),
            receiver: Pubkey::new_unique(),
            shares: 0,
            assets: 1_000,
            nonce: 0,
            deadline: 100,
        }
    }

    #[test]
    fn test_default_addresses_rejected() {
        let zero = Pubkey::default();
        assert_eq!(
            error_code(require_recipient(&zero)),
            u32::from(VaultError::InvalidRecipient)
        );
        assert_eq!(error_code(require_owner(&zero)), u32::from(VaultError::InvalidOwner));
        assert_eq!(
            error_code(require_depositor(&zero)),
            u32::from(VaultError::InvalidDepositor)
        );
        assert!(require_recipient(&Pubkey::new_unique()).is_ok());
    }

    #[test]
    fn test_only_associated_shares_account_is_canonical() {
        let owner = Pubkey::new_unique();
        let shares_mint = Pubkey::new_unique();
        let associated =
            get_associated_token_address_with_program_id(&owner, &shares_mint, &spl_token_2022::ID);

        assert!(is_canonical_shares_account(&associated, &owner, &shares_mint));
        // A side account the owner also controls does not count
        assert!(!is_canonical_shares_account(&Pubkey::new_unique(), &owner, &shares_mint));
        assert!(!is_canonical_shares_account(&associated, &Pubkey::new_unique(), &shares_mint));
        assert!(!is_canonical_shares_account(&associated, &owner, &Pubkey::new_unique()));

        let legacy = get_associated_token_address_with_program_id(
            &owner,
            &shares_mint,
            &anchor_spl::token::ID,
        );
        assert!(!is_canonical_shares_account(&legacy, &owner, &shares_mint));
    }

    #[test]
    fn test_amount_format_exclusivity() {
        assert_eq!(AmountFormat::from_pair(5, 0).unwrap(), AmountFormat::Shares(5));
        assert_eq!(AmountFormat::from_pair(0, 9).unwrap(), AmountFormat::Assets(9));
        assert_eq!(
            error_code(AmountFormat::from_pair(5, 9)),
            u32::from(VaultError::OnlyOneAmountFormatAllowed)
        );
        assert_eq!(
            error_code(AmountFormat::from_pair(0, 0)),
            u32::from(VaultError::InvalidZeroAmount)
        );
    }

    #[test]
    fn test_claimer_delegation() {
        let user = Pubkey::new_unique();
        let claimer = Pubkey::new_unique();
        let config = ClaimerConfig { user, claimer };

        assert!(require_claimer(&user, &user, None).is_ok());
        assert!(require_claimer(&claimer, &user, Some(&config)).is_ok());
        assert_eq!(
            error_code(require_claimer(&claimer, &user, None)),
            u32::from(VaultError::InvalidClaimer)
        );

        let stranger = Pubkey::new_unique();
        assert_eq!(
            error_code(require_claimer(&stranger, &user, Some(&config))),
            u32::from(VaultError::InvalidClaimer)
        );

        // a config recorded for someone else does not delegate this user
        let other = ClaimerConfig {
            user: Pubkey::new_unique(),
            claimer,
        };
        assert!(require_claimer(&claimer, &user, Some(&other)).is_err());
    }

    #[test]
    fn test_deadline_inclusive() {
        assert!(require_not_expired(100, 100).is_ok());
        assert_eq!(
            error_code(require_not_expired(100, 101)),
            u32::from(VaultError::InvalidExpiration)
        );
    }

    #[test]
    fn test_digest_binds_every_field() {
        let base = intent();
        let digest = base.digest().unwrap();

        assert_eq!(digest, base.digest().unwrap());
        assert_ne!(digest, DepositIntent { nonce: 1, ..base }.digest().unwrap());
        assert_ne!(digest, DepositIntent { assets: 1_001, ..base }.digest().unwrap());

        // same fields under the other action never collide
        let as_withdraw = WithdrawIntent {
            vault: base.vault,
            owner: base.depositor,
            receiver: base.receiver,
            shares: base.shares,
            assets: base.assets,
            nonce: base.nonce,
            deadline: base.deadline,
        };
        assert_ne!(digest, as_withdraw.digest().unwrap());
    }

    #[test]
    fn test_signed_message_accepted() {
        let signer = Pubkey::new_unique();
        let digest = intent().digest().unwrap();
        let data = ed25519_data(&signer, &digest);

        assert!(verify_signed_message(&data, &signer, &digest).is_ok());
    }

    #[test]
    fn test_signed_message_wrong_signer_or_message() {
        let signer = Pubkey::new_unique();
        let digest = intent().digest().unwrap();
        let data = ed25519_data(&signer, &digest);

        assert_eq!(
            error_code(verify_signed_message(&data, &Pubkey::new_unique(), &digest)),
            u32::from(VaultError::InvalidSignature)
        );
        assert_eq!(
            error_code(verify_signed_message(&data, &signer, &[0u8; 32])),
            u32::from(VaultError::InvalidSignature)
        );
    }

    #[test]
    fn test_signed_message_rejects_foreign_offsets() {
        let signer = Pubkey::new_unique();
        let digest = [3u8; 32];
        let mut data = ed25519_data(&signer, &digest);
        // message_instruction_index points at instruction 0
        data[14] = 0;
        data[15] = 0;

        assert!(verify_signed_message(&data, &signer, &digest).is_err());
    }

    #[test]
    fn test_signed_message_malformed() {
        let signer = Pubkey::new_unique();
        let digest = [3u8; 32];

        let mut two = ed25519_data(&signer, &digest);
        two[0] = 2;
        assert!(verify_signed_message(&two, &signer, &digest).is_err());

        let truncated = &ed25519_data(&signer, &digest)[..60];
        assert!(verify_signed_message(truncated, &signer, &digest).is_err());
        assert!(verify_signed_message(&[1, 0], &signer, &digest).is_err());
    }
}
