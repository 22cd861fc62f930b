//! Event payloads published by the registry.
//!
//! | Topic                      | Data                   |
//! |----------------------------|------------------------|
//! | `("requested", loan_id)`   | [`LoanRequested`]      |
//! | `("collat", loan_id)`      | [`LoanCollateralized`] |
//! | `("repaid", loan_id)`      | [`LoanRepaid`]         |
//! | `("funded",)`              | [`ReserveFunded`]      |

use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanRequested {
    pub loan_id: u64,
    pub borrower: Address,
    pub amount: i128,
    pub interest_rate: u32,
    pub duration: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanCollateralized {
    pub loan_id: u64,
    pub borrower: Address,
    pub collection: Address,
    pub token_id: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanRepaid {
    pub loan_id: u64,
    pub borrower: Address,
    /// Principal plus interest collected.
    pub amount: i128,
    /// Asset released back to the borrower.
    pub token_id: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReserveFunded {
    pub funder: Address,
    pub amount: i128,
}

pub fn emit_loan_requested(env: &Env, event: LoanRequested) {
    env.events()
        .publish((symbol_short!("requested"), event.loan_id), event);
}

pub fn emit_loan_collateralized(env: &Env, event: LoanCollateralized) {
    env.events()
        .publish((symbol_short!("collat"), event.loan_id), event);
}

pub fn emit_loan_repaid(env: &Env, event: LoanRepaid) {
    env.events()
        .publish((symbol_short!("repaid"), event.loan_id), event);
}

pub fn emit_reserve_funded(env: &Env, event: ReserveFunded) {
    env.events().publish((symbol_short!("funded"),), event);
}
