use anchor_lang::prelude::*;

#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub underlying_mint: Pubkey,
    pub receipt_mint: Pubkey,
    pub shares_mint: Pubkey,
    pub vault_id: u64,
}

#[event]
pub struct Deposit {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u64,
    pub through_pool: bool,
}

#[event]
pub struct Withdraw {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub receiver: Pubkey,
    pub owner: Pubkey,
    pub assets: u64,
    pub shares: u64,
    pub through_pool: bool,
}

#[event]
pub struct SharesTransferred {
    pub vault: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub shares: u64,
}

#[event]
pub struct RewardTokenRegistered {
    pub vault: Pubkey,
    pub reward_mint: Pubkey,
    pub start_index: u128,
}

#[event]
pub struct RewardsClaimed {
    pub vault: Pubkey,
    pub on_behalf_of: Pubkey,
    pub receiver: Pubkey,
    pub reward_mint: Pubkey,
    pub paid: u64,
    pub deferred: u128,
}

#[event]
pub struct NonceConsumed {
    pub vault: Pubkey,
    pub signer: Pubkey,
    pub nonce: u64,
}
