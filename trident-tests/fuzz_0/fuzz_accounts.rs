use trident_fuzz::fuzzing::*;

/// Storage for all account addresses used in fuzz testing.
///
/// Docs: https://ackee.xyz/trident/docs/latest/trident-api-macro/trident-types/fuzz-accounts/
#[derive(Default)]
pub struct AccountAddresses {
    pub vault: AddressStorage,

    pub shares_mint: AddressStorage,

    pub receipt_mint: AddressStorage,

    pub receipt_vault: AddressStorage,

    pub reserve: AddressStorage,

    pub asset_rewards: AddressStorage,

    pub holder: AddressStorage,

    pub holder_shares_account: AddressStorage,

    pub holder_rewards: AddressStorage,

    pub reward_mint: AddressStorage,
}
