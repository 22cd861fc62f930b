//! # Loan Registry Contract
//!
//! Fungible-token loans secured by a non-fungible collateral asset. The single
//! Soroban contract `LoanRegistry` owns every loan record, drives each loan
//! through its lifecycle, and orchestrates the value transfers that go with
//! each step:
//!
//! | Phase            | Entry Point(s)                                   |
//! |------------------|--------------------------------------------------|
//! | Bootstrap        | [`LoanRegistry::init`], [`LoanRegistry::fund_reserve`] |
//! | Origination      | [`LoanRegistry::request_loan`]                   |
//! | Escrow           | [`LoanRegistry::collateralize_nft`]              |
//! | Settlement       | [`LoanRegistry::repay_loan`]                     |
//! | Queries          | `get_loan_details`, `get_repayment_amount`, `get_borrower_loans`, `get_borrower_loan_count`, `loan_count`, `reserve_balance`, `get_config` |
//!
//! ## Architecture
//!
//! Storage access is delegated to [`storage`], value movement to [`ledger`],
//! and interest arithmetic to [`interest`]. This file contains the public
//! entry points, precondition checks, and event emissions.
//!
//! Every entry point returns `Result`. When one returns an error the host
//! discards all of its effects, so a loan is either fully advanced or left
//! untouched.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, Vec};

mod events;
mod interest;
mod ledger;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use events::{LoanCollateralized, LoanRepaid, LoanRequested, ReserveFunded};
pub use ledger::{CollateralClient, CollateralInterface};
pub use types::{Collateral, CollateralSlot, Config, Loan, LoanStatus};

use types::LoanState;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    InvalidAmount      = 1,
    LoanNotFound       = 2,
    NotBorrower        = 3,
    InvalidState       = 4,
    TransferFailed     = 5,
    AlreadyInitialized = 6,
    NotInitialized     = 7,
    ArithmeticOverflow = 8,
}

#[contract]
pub struct LoanRegistry;

#[contractimpl]
impl LoanRegistry {
    // ─────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────

    /// Initialise the registry with the asset it lends and the collection it
    /// accepts as collateral.
    ///
    /// Must be called exactly once after deployment; later calls fail with
    /// `Error::AlreadyInitialized`.
    pub fn init(env: Env, admin: Address, token: Address, collection: Address) -> Result<(), Error> {
        admin.require_auth();
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        storage::save_config(
            &env,
            &Config {
                admin,
                token,
                collection,
            },
        );
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<Config, Error> {
        storage::load_config(&env)
    }

    /// Move `amount` of the lent asset from `funder` into the registry reserve.
    pub fn fund_reserve(env: Env, funder: Address, amount: i128) -> Result<(), Error> {
        funder.require_auth();
        let config = storage::load_config(&env)?;
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        ledger::transfer_fungible(
            &env,
            &config.token,
            &funder,
            &env.current_contract_address(),
            amount,
        )?;

        events::emit_reserve_funded(&env, ReserveFunded { funder, amount });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Loan lifecycle
    // ─────────────────────────────────────────────────────────

    /// Open a loan of `amount` at a flat `interest_rate` percent and pay the
    /// principal out of the reserve to `borrower`.
    ///
    /// `duration` (seconds) is recorded but has no effect on repayment.
    /// Returns the new loan id. If the payout fails no loan is created and
    /// the id is not consumed.
    pub fn request_loan(
        env: Env,
        borrower: Address,
        amount: i128,
        interest_rate: u32,
        duration: u64,
    ) -> Result<u64, Error> {
        borrower.require_auth();
        let config = storage::load_config(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        // Reject terms whose repayment cannot be represented.
        interest::repayment_amount(amount, interest_rate)?;

        ledger::transfer_fungible(
            &env,
            &config.token,
            &env.current_contract_address(),
            &borrower,
            amount,
        )?;

        let id = storage::next_loan_id(&env)?;
        let loan = Loan {
            id,
            borrower: borrower.clone(),
            amount,
            interest_rate,
            duration,
            created_at: env.ledger().timestamp(),
            collateral: CollateralSlot::Empty,
            status: LoanStatus::Requested,
        };
        storage::save_loan(&env, &loan);

        events::emit_loan_requested(
            &env,
            LoanRequested {
                loan_id: id,
                borrower,
                amount,
                interest_rate,
                duration,
            },
        );
        Ok(id)
    }

    /// Escrow `token_id` from the configured collection against `loan_id`.
    ///
    /// Only the loan's borrower may call this, and only while the loan is
    /// `Requested`.
    pub fn collateralize_nft(
        env: Env,
        borrower: Address,
        loan_id: u64,
        token_id: u32,
    ) -> Result<(), Error> {
        borrower.require_auth();
        let config = storage::load_config(&env)?;
        let terms = storage::load_loan_terms(&env, loan_id)?;
        if terms.borrower != borrower {
            return Err(Error::NotBorrower);
        }

        let mut state = storage::load_loan_state(&env, loan_id)?;
        if state.status != LoanStatus::Requested {
            return Err(Error::InvalidState);
        }

        ledger::transfer_asset(
            &env,
            &config.collection,
            &borrower,
            &env.current_contract_address(),
            token_id,
        )?;

        state.status = LoanStatus::Collateralized;
        state.collateral = CollateralSlot::Held(Collateral {
            collection: config.collection.clone(),
            token_id,
        });
        storage::save_loan_state(&env, loan_id, &state);

        events::emit_loan_collateralized(
            &env,
            LoanCollateralized {
                loan_id,
                borrower,
                collection: config.collection,
                token_id,
            },
        );
        Ok(())
    }

    /// Collect principal plus interest from the borrower and hand the escrowed
    /// asset back.
    ///
    /// Both transfers succeed together or the call fails with
    /// `Error::TransferFailed` and the loan stays `Collateralized`.
    pub fn repay_loan(env: Env, borrower: Address, loan_id: u64) -> Result<(), Error> {
        borrower.require_auth();
        let config = storage::load_config(&env)?;
        let terms = storage::load_loan_terms(&env, loan_id)?;
        if terms.borrower != borrower {
            return Err(Error::NotBorrower);
        }

        let state = storage::load_loan_state(&env, loan_id)?;
        let collateral = match (state.status, state.collateral) {
            (LoanStatus::Collateralized, CollateralSlot::Held(collateral)) => collateral,
            _ => return Err(Error::InvalidState),
        };

        let due = interest::repayment_amount(terms.amount, terms.interest_rate)?;
        let registry = env.current_contract_address();

        ledger::transfer_fungible(&env, &config.token, &borrower, &registry, due)?;
        ledger::transfer_asset(
            &env,
            &collateral.collection,
            &registry,
            &borrower,
            collateral.token_id,
        )?;

        storage::save_loan_state(
            &env,
            loan_id,
            &LoanState {
                status: LoanStatus::Repaid,
                collateral: CollateralSlot::Empty,
            },
        );

        events::emit_loan_repaid(
            &env,
            LoanRepaid {
                loan_id,
                borrower,
                amount: due,
                token_id: collateral.token_id,
            },
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    /// Retrieve a loan by its ID.
    pub fn get_loan_details(env: Env, loan_id: u64) -> Result<Loan, Error> {
        storage::load_loan(&env, loan_id)
    }

    /// Amount `repay_loan` would collect for `loan_id`.
    pub fn get_repayment_amount(env: Env, loan_id: u64) -> Result<i128, Error> {
        let terms = storage::load_loan_terms(&env, loan_id)?;
        interest::repayment_amount(terms.amount, terms.interest_rate)
    }

    /// Page of loan ids requested by `borrower`, oldest first.
    ///
    /// Returns at most `limit` ids (capped at 50) starting at position
    /// `start`; an empty vector once `start` passes the end.
    pub fn get_borrower_loans(env: Env, borrower: Address, start: u32, limit: u32) -> Vec<u64> {
        storage::borrower_loans(&env, &borrower, start, limit)
    }

    /// Number of loans `borrower` has requested.
    pub fn get_borrower_loan_count(env: Env, borrower: Address) -> u32 {
        storage::borrower_loan_count(&env, &borrower)
    }

    pub fn loan_count(env: Env) -> u64 {
        storage::loan_count(&env)
    }

    /// Lent-asset balance currently held by the registry.
    pub fn reserve_balance(env: Env) -> Result<i128, Error> {
        let config = storage::load_config(&env)?;
        Ok(ledger::fungible_balance(
            &env,
            &config.token,
            &env.current_contract_address(),
        ))
    }
}
