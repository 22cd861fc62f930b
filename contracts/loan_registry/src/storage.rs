//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the registry:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key           | Type      | Description                           |
//! |---------------|-----------|---------------------------------------|
//! | `Admin`       | `Address` | Address that initialised the registry |
//! | `Token`       | `Address` | Fungible asset being lent             |
//! | `Collection`  | `Address` | Collateral collection contract        |
//! | `LoanCount`   | `u64`     | Number of loans ever created          |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                       | Type        | Description                     |
//! |---------------------------|-------------|---------------------------------|
//! | `LoanTerms(id)`           | `LoanTerms` | Immutable loan terms            |
//! | `LoanState(id)`           | `LoanState` | Status and escrowed collateral  |
//! | `BorrowerLoanCount(addr)` | `u32`   | Loans requested by `addr`       |
//! | `BorrowerLoan(addr, n)`   | `u64`   | Id of `addr`'s `n`-th loan      |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{Config, Loan, LoanState, LoanTerms};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

/// Upper bound on ids returned by one `borrower_loans` page.
pub const MAX_PAGE_SIZE: u32 = 50;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Registry administrator (Instance).
    Admin,
    /// Fungible asset contract (Instance).
    Token,
    /// Collateral collection contract (Instance).
    Collection,
    /// Number of loans created so far; the next id is `LoanCount + 1` (Instance).
    LoanCount,
    /// Immutable loan terms keyed by ID (Persistent).
    LoanTerms(u64),
    /// Mutable loan state keyed by ID (Persistent).
    LoanState(u64),
    /// Number of loans requested by a borrower (Persistent).
    BorrowerLoanCount(Address),
    /// Id of a borrower's n-th loan, zero-based (Persistent).
    BorrowerLoan(Address, u32),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn save_config(env: &Env, config: &Config) {
    let instance = env.storage().instance();
    instance.set(&DataKey::Admin, &config.admin);
    instance.set(&DataKey::Token, &config.token);
    instance.set(&DataKey::Collection, &config.collection);
    bump_instance(env);
}

/// Load the registry configuration.
/// Fails with `NotInitialized` before `init` has run.
pub fn load_config(env: &Env) -> Result<Config, Error> {
    bump_instance(env);
    let instance = env.storage().instance();
    let admin = instance.get(&DataKey::Admin).ok_or(Error::NotInitialized)?;
    let token = instance.get(&DataKey::Token).ok_or(Error::NotInitialized)?;
    let collection = instance
        .get(&DataKey::Collection)
        .ok_or(Error::NotInitialized)?;
    Ok(Config {
        admin,
        token,
        collection,
    })
}

pub fn loan_count(env: &Env) -> u64 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::LoanCount)
        .unwrap_or(0)
}

/// Reads, increments, and stores the loan counter.
/// Returns the ID to use for the *current* loan (post-increment value), so
/// the first loan is 1.
pub fn next_loan_id(env: &Env) -> Result<u64, Error> {
    let id = loan_count(env)
        .checked_add(1)
        .ok_or(Error::ArithmeticOverflow)?;
    env.storage().instance().set(&DataKey::LoanCount, &id);
    Ok(id)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Save both the immutable terms and initial state for a new loan, and
/// index it under its borrower.
pub fn save_loan(env: &Env, loan: &Loan) {
    let terms_key = DataKey::LoanTerms(loan.id);
    let state_key = DataKey::LoanState(loan.id);

    let terms = LoanTerms {
        id: loan.id,
        borrower: loan.borrower.clone(),
        amount: loan.amount,
        interest_rate: loan.interest_rate,
        duration: loan.duration,
        created_at: loan.created_at,
    };

    let state = LoanState {
        status: loan.status,
        collateral: loan.collateral.clone(),
    };

    env.storage().persistent().set(&terms_key, &terms);
    env.storage().persistent().set(&state_key, &state);
    bump_persistent(env, &terms_key);
    bump_persistent(env, &state_key);

    index_borrower_loan(env, &loan.borrower, loan.id);
}

/// One entry per loan, so a borrower's index never outgrows a ledger entry.
fn index_borrower_loan(env: &Env, borrower: &Address, id: u64) {
    let n = borrower_loan_count(env, borrower);
    let entry_key = DataKey::BorrowerLoan(borrower.clone(), n);
    env.storage().persistent().set(&entry_key, &id);
    bump_persistent(env, &entry_key);

    let count_key = DataKey::BorrowerLoanCount(borrower.clone());
    env.storage().persistent().set(&count_key, &(n + 1));
    bump_persistent(env, &count_key);
}

/// Load the full `Loan` by combining terms and state.
pub fn load_loan(env: &Env, id: u64) -> Result<Loan, Error> {
    let terms = load_loan_terms(env, id)?;
    let state = load_loan_state(env, id)?;
    Ok(Loan {
        id: terms.id,
        borrower: terms.borrower,
        amount: terms.amount,
        interest_rate: terms.interest_rate,
        duration: terms.duration,
        created_at: terms.created_at,
        collateral: state.collateral,
        status: state.status,
    })
}

pub fn load_loan_terms(env: &Env, id: u64) -> Result<LoanTerms, Error> {
    let key = DataKey::LoanTerms(id);
    let terms: LoanTerms = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::LoanNotFound)?;
    bump_persistent(env, &key);
    Ok(terms)
}

pub fn load_loan_state(env: &Env, id: u64) -> Result<LoanState, Error> {
    let key = DataKey::LoanState(id);
    let state: LoanState = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::LoanNotFound)?;
    bump_persistent(env, &key);
    Ok(state)
}

/// Save only the mutable loan state.
pub fn save_loan_state(env: &Env, id: u64, state: &LoanState) {
    let key = DataKey::LoanState(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

pub fn borrower_loan_count(env: &Env, borrower: &Address) -> u32 {
    let key = DataKey::BorrowerLoanCount(borrower.clone());
    match env.storage().persistent().get(&key) {
        Some(count) => {
            bump_persistent(env, &key);
            count
        }
        None => 0,
    }
}

/// Up to `limit` of `borrower`'s loan ids starting at position `start`,
/// oldest first. `limit` is capped at [`MAX_PAGE_SIZE`].
pub fn borrower_loans(env: &Env, borrower: &Address, start: u32, limit: u32) -> Vec<u64> {
    let count = borrower_loan_count(env, borrower);
    let end = start
        .saturating_add(limit.min(MAX_PAGE_SIZE))
        .min(count);

    let mut ids = Vec::new(env);
    for n in start..end {
        let key = DataKey::BorrowerLoan(borrower.clone(), n);
        if let Some(id) = env.storage().persistent().get::<_, u64>(&key) {
            bump_persistent(env, &key);
            ids.push_back(id);
        }
    }
    ids
}
