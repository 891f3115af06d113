use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Recipient must not be the default address")]
    InvalidRecipient,

    #[msg("Owner must not be the default address")]
    InvalidOwner,

    #[msg("Depositor must not be the default address")]
    InvalidDepositor,

    #[msg("Caller is neither the account nor its registered claimer")]
    InvalidClaimer,

    #[msg("Only one of shares or assets may be non-zero")]
    OnlyOneAmountFormatAllowed,

    #[msg("Amount must be greater than zero")]
    InvalidZeroAmount,

    #[msg("Deposit exceeds the reserve supply cap")]
    ExceedsMaxDeposit,

    #[msg("Mint exceeds the reserve supply cap")]
    ExceedsMaxMint,

    #[msg("Withdraw exceeds the available liquidity or balance")]
    ExceedsMaxWithdraw,

    #[msg("Redeem exceeds the available liquidity or balance")]
    ExceedsMaxRedeem,

    #[msg("Reward token is not registered with the vault")]
    RewardNotInitialized,

    #[msg("Signed intent does not match")]
    InvalidSignature,

    #[msg("Signed intent expired")]
    InvalidExpiration,

    #[msg("Caller allowance over the owner's shares is insufficient")]
    InsufficientAllowance,

    #[msg("Reserve or rewards account does not belong to the vault assets")]
    InvalidPoolBinding,

    #[msg("Share account is not the owner's associated token account")]
    InvalidSharesAccount,

    #[msg("Insufficient shares balance")]
    InsufficientShares,

    #[msg("Reward registry is full")]
    TooManyRewardTokens,

    #[msg("Reward accounts do not match the requested rewards")]
    RewardAccountsMismatch,

    #[msg("Arithmetic overflow")]
    MathOverflow,

    #[msg("Division by zero")]
    DivisionByZero,
}

#[cfg(test)]
pub(crate) fn error_code<T: std::fmt::Debug>(result: Result<T>) -> u32 {
    match result.unwrap_err() {
        Error::AnchorError(e) => e.error_code_number,
        Error::ProgramError(e) => panic!("unexpected program error: {e:?}"),
    }
}
