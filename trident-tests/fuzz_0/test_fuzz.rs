use anchor_lang::prelude::Pubkey;
use fuzz_accounts::*;
use svs_lm::{
    caps::ReserveSnapshot,
    constants::RAY,
    engine::{plan_deposit, plan_withdraw, AmountFormat, Route},
    math::{convert_to_assets, convert_to_shares, Rounding},
    rewards::{claimable_rewards, finish_claim, register_reward_token, settle_user},
    state::{RewardIndexCache, UserRewardsData},
};
use trident_fuzz::fuzzing::*;
mod fuzz_accounts;

const HOLDERS: usize = 3;
const ASSET_UNIT: u128 = 1_000_000;

/// Vault state tracking for invariant checks
#[derive(Default, Clone)]
struct VaultTracker {
    initialized: bool,
    rate: u128,
    balances: [u64; HOLDERS],
    records: [[UserRewardsData; 1]; HOLDERS],
    registry: Vec<RewardIndexCache>,
    reward_index: u128,
    /// Rewards the controller credited to the vault
    funded: u128,
    /// Rewards transferred out to holders
    paid: u128,
}

#[derive(FuzzTestMethods)]
struct FuzzTest {
    trident: Trident,
    fuzz_accounts: AccountAddresses,
    vault_tracker: VaultTracker,
}

#[flow_executor]
impl FuzzTest {
    fn new() -> Self {
        Self {
            trident: Trident::default(),
            fuzz_accounts: AccountAddresses::default(),
            vault_tracker: VaultTracker::default(),
        }
    }

    #[init]
    fn start(&mut self) {
        self.vault_tracker = VaultTracker::default();
    }

    /// Register a reward and start from a random exchange rate
    #[flow]
    fn flow_initialize(&mut self) {
        if self.vault_tracker.initialized {
            return;
        }

        let start_index = (rand::random::<u128>() % 1_000) * ASSET_UNIT;
        let registered = register_reward_token(
            &mut self.vault_tracker.registry,
            Pubkey::new_unique(),
            start_index,
        )
        .unwrap();
        assert!(registered);

        self.vault_tracker.reward_index = start_index;
        self.vault_tracker.rate = RAY + rand::random::<u128>() % RAY;
        self.vault_tracker.initialized = true;
    }

    /// Pool income only ever raises the exchange rate
    #[flow]
    fn flow_accrue_yield(&mut self) {
        if !self.vault_tracker.initialized {
            return;
        }
        let bump = self.vault_tracker.rate / 10_000 * (rand::random::<u128>() % 50);
        self.vault_tracker.rate = self.vault_tracker.rate.saturating_add(bump);
    }

    /// Controller emissions; deltas are whole units so vault funding is exact
    #[flow]
    fn flow_accrue_rewards(&mut self) {
        if !self.vault_tracker.initialized {
            return;
        }
        let delta = (rand::random::<u128>() % 100) * ASSET_UNIT;
        let total: u128 = self.vault_tracker.balances.iter().map(|b| *b as u128).sum();

        self.vault_tracker.reward_index += delta;
        self.vault_tracker.funded += total * delta / ASSET_UNIT;
    }

    #[flow]
    fn flow_deposit(&mut self) {
        if !self.vault_tracker.initialized {
            return;
        }

        let holder = rand::random::<usize>() % HOLDERS;
        let assets = rand::random::<u64>() % 1_000_000_000_000;
        let snapshot = self.snapshot();

        let Ok(plan) = plan_deposit(AmountFormat::Assets(assets), Route::LendingPool, &snapshot)
        else {
            return;
        };

        // Invariant: redeeming freshly minted shares never returns more than deposited
        let back = convert_to_assets(plan.shares, snapshot.rate(), Rounding::Floor).unwrap();
        assert!(back <= assets, "Invariant: round-trip should not create free assets");

        self.settle(holder);
        self.vault_tracker.balances[holder] += plan.shares;
    }

    #[flow]
    fn flow_mint(&mut self) {
        if !self.vault_tracker.initialized {
            return;
        }

        let holder = rand::random::<usize>() % HOLDERS;
        let shares = rand::random::<u64>() % 1_000_000_000_000;
        let snapshot = self.snapshot();

        let Ok(plan) = plan_deposit(AmountFormat::Shares(shares), Route::Direct, &snapshot) else {
            return;
        };

        // Invariant: assets paid cover the shares at the current rate
        let worth = convert_to_shares(plan.assets, snapshot.rate(), Rounding::Floor).unwrap();
        assert!(worth >= shares, "Invariant: mint must be paid in full");

        self.settle(holder);
        self.vault_tracker.balances[holder] += plan.shares;
    }

    #[flow]
    fn flow_redeem(&mut self) {
        if !self.vault_tracker.initialized {
            return;
        }

        let holder = rand::random::<usize>() % HOLDERS;
        let balance = self.vault_tracker.balances[holder];
        if balance == 0 {
            return;
        }
        let shares = (rand::random::<u64>() % balance).max(1);
        let snapshot = self.snapshot();

        let plan = plan_withdraw(AmountFormat::Shares(shares), Route::Direct, &snapshot, balance, 0);
        let Ok(plan) = plan else {
            return;
        };

        // Invariant: assets received are at most the shares' value
        let value = convert_to_assets(shares, snapshot.rate(), Rounding::Ceiling).unwrap();
        assert!(plan.assets <= value, "Invariant: redeem cannot overpay");

        self.settle(holder);
        self.vault_tracker.balances[holder] -= plan.shares;
    }

    #[flow]
    fn flow_transfer(&mut self) {
        if !self.vault_tracker.initialized {
            return;
        }

        let from = rand::random::<usize>() % HOLDERS;
        let to = (from + 1 + rand::random::<usize>() % (HOLDERS - 1)) % HOLDERS;
        let balance = self.vault_tracker.balances[from];
        if balance == 0 {
            return;
        }
        let shares = rand::random::<u64>() % balance + 1;

        self.settle(from);
        self.settle(to);
        self.vault_tracker.balances[from] -= shares;
        self.vault_tracker.balances[to] += shares;
    }

    /// Claim with whatever the vault still holds; the rest is deferred
    #[flow]
    fn flow_claim(&mut self) {
        if !self.vault_tracker.initialized {
            return;
        }

        let holder = rand::random::<usize>() % HOLDERS;
        let owed = self.claimable(holder);
        let held = u64::try_from(self.vault_tracker.funded - self.vault_tracker.paid)
            .unwrap_or(u64::MAX);
        let index = self.vault_tracker.reward_index;

        let resolution = finish_claim(&mut self.vault_tracker.records[holder][0], owed, held, index);
        self.vault_tracker.registry[0].observe(index);

        assert_eq!(resolution.paid as u128 + resolution.deferred, owed);
        self.vault_tracker.paid += resolution.paid as u128;
        assert!(
            self.vault_tracker.paid <= self.vault_tracker.funded,
            "Invariant: cannot pay out more rewards than were funded"
        );
    }

    /// Settling twice at the same index changes nothing
    #[flow]
    fn flow_settle_idempotence(&mut self) {
        if !self.vault_tracker.initialized {
            return;
        }

        let holder = rand::random::<usize>() % HOLDERS;
        self.settle(holder);
        let once = self.vault_tracker.records[holder];
        self.settle(holder);
        assert_eq!(once, self.vault_tracker.records[holder]);
    }

    #[end]
    fn end(&mut self) {
        if self.vault_tracker.initialized {
            // Final invariant: every funded reward is either paid or still owed
            let owed: u128 = (0..HOLDERS).map(|h| self.claimable(h)).sum();
            assert_eq!(
                self.vault_tracker.paid + owed,
                self.vault_tracker.funded,
                "Invariant: rewards are conserved"
            );
        }
    }

    fn snapshot(&self) -> ReserveSnapshot {
        ReserveSnapshot {
            active: true,
            decimals: 6,
            current_exchange_rate: self.vault_tracker.rate,
            ..ReserveSnapshot::default()
        }
    }

    fn settle(&mut self, holder: usize) {
        let tracker = &mut self.vault_tracker;
        settle_user(
            tracker.balances[holder],
            &mut tracker.records[holder],
            &mut tracker.registry,
            &[tracker.reward_index],
            ASSET_UNIT,
        )
        .unwrap();
    }

    fn claimable(&self, holder: usize) -> u128 {
        let tracker = &self.vault_tracker;
        claimable_rewards(
            tracker.balances[holder],
            &tracker.records[holder][0],
            &tracker.registry[0],
            tracker.reward_index,
            ASSET_UNIT,
        )
        .unwrap()
    }
}

fn main() {
    // Run 1000 iterations with up to 100 flows per iteration
    FuzzTest::fuzz(1000, 100);
}
