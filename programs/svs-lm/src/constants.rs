pub const VAULT_SEED: &[u8] = b"vault";
pub const SHARES_MINT_SEED: &[u8] = b"shares";
pub const USER_REWARDS_SEED: &[u8] = b"user_rewards";
pub const NONCE_SEED: &[u8] = b"nonce";

/// 1e27 fixed-point scale of exchange rates
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Upper bound of the reward registry (accounts are sized for it up front)
pub const MAX_REWARD_TOKENS: usize = 8;

/// Number of remaining accounts consumed per claimed reward
pub const CLAIM_ACCOUNTS_PER_REWARD: usize = 4;

/// Domain tag mixed into every signed meta-transaction digest
pub const SIGNATURE_DOMAIN: &[u8] = b"svs-lm:v1";
