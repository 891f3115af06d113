//! Multi-step vault scenarios driven through the planning and reward
//! accounting layers, with token balances kept in an in-memory ledger.

use std::collections::HashMap;

use anchor_lang::prelude::*;
use svs_lm::{
    caps::{self, ReserveSnapshot},
    constants::RAY,
    engine::{plan_deposit, plan_withdraw, receipt_units_in, receipt_units_out, AmountFormat, Route},
    error::VaultError,
    rewards::{claimable_rewards, finish_claim, register_reward_token, settle_user},
    state::{RewardIndexCache, UserRewardsData},
};

const UNIT: u128 = 1_000_000;

fn code<T: std::fmt::Debug>(result: Result<T>) -> u32 {
    match result.unwrap_err() {
        Error::AnchorError(e) => e.error_code_number,
        Error::ProgramError(e) => panic!("unexpected program error: {e:?}"),
    }
}

fn reserve(rate: u128) -> ReserveSnapshot {
    ReserveSnapshot {
        active: true,
        paused: false,
        frozen: false,
        supply_cap: 0,
        decimals: 6,
        aggregate_supply: 0,
        accrued_to_treasury: 0,
        current_exchange_rate: rate,
    }
}

/// Shares and reward records of every holder, plus the vault's registry
#[derive(Default)]
struct Ledger {
    shares: HashMap<&'static str, u64>,
    records: HashMap<&'static str, [UserRewardsData; 1]>,
    registry: Vec<RewardIndexCache>,
    total_shares: u64,
}

impl Ledger {
    fn with_reward(start_index: u128) -> Self {
        let mut ledger = Self::default();
        assert!(register_reward_token(&mut ledger.registry, Pubkey::new_unique(), start_index).unwrap());
        ledger
    }

    fn balance(&self, who: &'static str) -> u64 {
        self.shares.get(who).copied().unwrap_or_default()
    }

    fn settle(&mut self, who: &'static str, index: u128) {
        let balance = self.balance(who);
        let entries = self.records.entry(who).or_default();
        settle_user(balance, entries, &mut self.registry, &[index], UNIT).unwrap();
    }

    fn mint(&mut self, who: &'static str, shares: u64, index: u128) {
        self.settle(who, index);
        *self.shares.entry(who).or_default() += shares;
        self.total_shares += shares;
    }

    fn burn(&mut self, who: &'static str, shares: u64, index: u128) {
        self.settle(who, index);
        *self.shares.get_mut(who).unwrap() -= shares;
        self.total_shares -= shares;
    }

    fn transfer(&mut self, from: &'static str, to: &'static str, shares: u64, index: u128) {
        self.settle(from, index);
        self.settle(to, index);
        *self.shares.get_mut(from).unwrap() -= shares;
        *self.shares.entry(to).or_default() += shares;
    }

    fn claimable(&self, who: &'static str, index: u128) -> u128 {
        let data = self.records.get(who).copied().unwrap_or_default()[0];
        claimable_rewards(self.balance(who), &data, &self.registry[0], index, UNIT).unwrap()
    }
}

#[test]
fn deposit_then_redeem_after_yield() {
    let mut ledger = Ledger::with_reward(0);
    let snapshot = reserve(RAY + RAY / 10);

    let plan = plan_deposit(AmountFormat::Assets(1_100_000), Route::LendingPool, &snapshot).unwrap();
    assert_eq!(plan.shares, 1_000_000);
    ledger.mint("alice", plan.shares, 0);

    // Pool income moves the rate from 1.1 to 1.2
    let grown = reserve(RAY + RAY / 5);
    let plan = plan_withdraw(
        AmountFormat::Shares(ledger.balance("alice")),
        Route::LendingPool,
        &grown,
        ledger.balance("alice"),
        u64::MAX,
    )
    .unwrap();
    assert_eq!(plan.assets, 1_200_000);
    ledger.burn("alice", plan.shares, 0);

    assert_eq!(ledger.balance("alice"), 0);
    assert_eq!(ledger.total_shares, 0);
}

#[test]
fn every_entry_point_rounds_toward_the_vault() {
    let snapshot = reserve(3 * RAY);

    let deposit = plan_deposit(AmountFormat::Assets(10), Route::LendingPool, &snapshot).unwrap();
    assert_eq!(deposit.shares, 3);

    let mint = plan_deposit(AmountFormat::Shares(3), Route::LendingPool, &snapshot).unwrap();
    assert_eq!(mint.assets, 9);

    let withdraw = plan_withdraw(AmountFormat::Assets(10), Route::LendingPool, &snapshot, 4, u64::MAX).unwrap();
    assert_eq!(withdraw.shares, 4);

    let redeem = plan_withdraw(AmountFormat::Shares(3), Route::LendingPool, &snapshot, 4, u64::MAX).unwrap();
    assert_eq!(redeem.assets, 9);

    // Depositing then redeeming never returns more than went in
    let back = plan_withdraw(AmountFormat::Shares(deposit.shares), Route::Direct, &snapshot, deposit.shares, 0).unwrap();
    assert!(back.assets <= 10);

    assert_eq!(
        code(plan_deposit(AmountFormat::Assets(2), Route::LendingPool, &snapshot)),
        u32::from(VaultError::InvalidZeroAmount)
    );
}

#[test]
fn direct_receipt_path_ignores_supply_cap() {
    let mut snapshot = reserve(RAY);
    snapshot.supply_cap = 1_000;
    snapshot.aggregate_supply = 999_000_000;

    assert_eq!(caps::max_deposit(&snapshot).unwrap(), 1_000_000);
    assert_eq!(
        code(plan_deposit(AmountFormat::Assets(1_000_001), Route::LendingPool, &snapshot)),
        u32::from(VaultError::ExceedsMaxDeposit)
    );

    let plan = plan_deposit(AmountFormat::Assets(5_000_000), Route::Direct, &snapshot).unwrap();
    assert_eq!(plan.shares, 5_000_000);
    assert_eq!(receipt_units_in(plan.assets, snapshot.rate()).unwrap(), 5_000_000);
}

#[test]
fn receipt_units_round_against_the_caller() {
    let rate = 3 * RAY;
    assert_eq!(receipt_units_in(10, rate).unwrap(), 4);
    assert_eq!(receipt_units_out(10, rate).unwrap(), 3);
    assert_eq!(
        code(receipt_units_out(2, rate)),
        u32::from(VaultError::InvalidZeroAmount)
    );
}

#[test]
fn paused_pool_blocks_pool_route_only() {
    let mut snapshot = reserve(RAY);
    snapshot.paused = true;

    assert_eq!(
        code(plan_withdraw(AmountFormat::Shares(10), Route::LendingPool, &snapshot, 10, u64::MAX)),
        u32::from(VaultError::ExceedsMaxRedeem)
    );
    let plan = plan_withdraw(AmountFormat::Shares(10), Route::Direct, &snapshot, 10, 0).unwrap();
    assert_eq!(plan.assets, 10);
}

#[test]
fn illiquid_pool_limits_redemption() {
    let snapshot = reserve(2 * RAY);
    // 500 underlying left in the pool covers 250 shares
    assert_eq!(caps::max_redeem(&snapshot, 1_000, 500).unwrap(), 250);
    assert_eq!(caps::max_withdraw(&snapshot, 1_000, 500).unwrap(), 500);
    assert_eq!(
        code(plan_withdraw(AmountFormat::Assets(502), Route::LendingPool, &snapshot, 1_000, 500)),
        u32::from(VaultError::ExceedsMaxWithdraw)
    );
}

#[test]
fn rewards_follow_balances_across_transfers() {
    let mut ledger = Ledger::with_reward(1_000);

    ledger.mint("alice", 2_000_000, 1_000);
    ledger.mint("bob", 1_000_000, 1_500);

    assert_eq!(ledger.claimable("alice", 2_100), 2_200);
    assert_eq!(ledger.claimable("bob", 2_100), 600);

    ledger.transfer("alice", "bob", 1_000_000, 2_100);
    assert_eq!(ledger.claimable("alice", 2_100), 2_200);
    assert_eq!(ledger.claimable("bob", 2_100), 600);

    assert_eq!(ledger.claimable("alice", 2_400), 2_500);
    assert_eq!(ledger.claimable("bob", 2_400), 1_200);
    assert_eq!(ledger.registry[0].last_updated_index, 2_100);
}

#[test]
fn third_party_deposit_settles_the_receiver_at_its_full_balance() {
    let mut ledger = Ledger::with_reward(0);
    ledger.mint("dave", 50_000_000, 100);

    // Someone else deposits one share for dave: settlement reads the
    // holder's single shares account, never an empty side account
    ledger.mint("dave", 1, 130);

    assert_eq!(ledger.claimable("dave", 130), 1_500);
    assert_eq!(ledger.records["dave"][0].rewards_index_on_last_interaction, 130);
}

#[test]
fn settling_an_empty_balance_forfeits_accrual() {
    let mut ledger = Ledger::with_reward(0);
    ledger.mint("dave", 50_000_000, 100);

    // What a settlement against a zero-balance account would record
    let entries = ledger.records.get_mut("dave").unwrap();
    settle_user(0, entries, &mut ledger.registry, &[130], UNIT).unwrap();

    assert_eq!(ledger.claimable("dave", 130), 0);
}

#[test]
fn holder_who_never_interacted_accrues_from_registration() {
    let mut ledger = Ledger::with_reward(400);
    // Balance credited without a settlement record (e.g. before the reward existed)
    ledger.shares.insert("carol", 3_000_000);

    assert_eq!(ledger.claimable("carol", 500), 300);
}

#[test]
fn repeated_settlement_at_one_index_is_idempotent() {
    let mut ledger = Ledger::with_reward(0);
    ledger.mint("alice", 1_000_000, 10);
    ledger.settle("alice", 70);
    let once = ledger.records["alice"];
    ledger.settle("alice", 70);

    assert_eq!(ledger.records["alice"], once);
    assert_eq!(once[0].unclaimed_rewards, 60);
}

#[test]
fn shortfall_is_deferred_and_paid_later() {
    let mut ledger = Ledger::with_reward(0);
    ledger.mint("alice", 1_000_000, 100);

    let owed = ledger.claimable("alice", 2_600);
    assert_eq!(owed, 2_500);

    let record = &mut ledger.records.get_mut("alice").unwrap()[0];
    let first = finish_claim(record, owed, 1_000, 2_600);
    assert_eq!(first.paid, 1_000);
    assert_eq!(first.deferred, 1_500);
    assert_eq!(ledger.claimable("alice", 2_600), 1_500);

    let owed = ledger.claimable("alice", 2_700);
    let record = &mut ledger.records.get_mut("alice").unwrap()[0];
    let second = finish_claim(record, owed, 10_000, 2_700);
    assert_eq!(second.paid, 1_600);
    assert_eq!(second.deferred, 0);
    assert_eq!(first.paid as u128 + second.paid as u128, 2_600);
}

#[test]
fn registry_rejects_more_than_capacity() {
    let mut registry = Vec::new();
    for _ in 0..svs_lm::constants::MAX_REWARD_TOKENS {
        assert!(register_reward_token(&mut registry, Pubkey::new_unique(), 0).unwrap());
    }
    assert_eq!(
        code(register_reward_token(&mut registry, Pubkey::new_unique(), 0)),
        u32::from(VaultError::TooManyRewardTokens)
    );
}
