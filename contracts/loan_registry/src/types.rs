//! # Types
//!
//! Shared data structures used across all modules of the loan registry.
//!
//! ## Design decisions
//!
//! ### Terms / State split
//!
//! A `Loan` is internally stored as two separate ledger entries:
//!
//! - [`LoanTerms`] — written once at request time; never mutated.
//! - [`LoanState`] — rewritten on collateralization and on repayment.
//!
//! The public API exposes the reconstructed [`Loan`] struct for convenience.
//!
//! ### Status as a Finite-State Machine
//!
//! [`LoanStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Requested ──► Collateralized ──► Repaid
//! ```
//!
//! Backward transitions and transitions out of the terminal `Repaid` state
//! are rejected with `Error::InvalidState`.

use soroban_sdk::{contracttype, Address};

/// Lifecycle status of a loan.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoanStatus {
    /// Principal disbursed; no collateral posted yet.
    Requested,
    /// Collateral held in escrow by the registry.
    Collateralized,
    /// Principal and interest collected; collateral returned.
    Repaid,
}

/// A non-fungible asset held in escrow against a loan.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Collateral {
    /// Collection contract that tracks custody of the asset.
    pub collection: Address,
    pub token_id: u32,
}

/// Custody slot of a loan.
///
/// `Held` exactly while the loan is `Collateralized`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CollateralSlot {
    Empty,
    Held(Collateral),
}

impl CollateralSlot {
    pub fn is_held(&self) -> bool {
        matches!(self, CollateralSlot::Held(_))
    }
}

/// Registry-wide configuration, written once by `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub admin: Address,
    /// Fungible asset lent out and collected on repayment.
    pub token: Address,
    /// Non-fungible collection accepted as collateral.
    pub collection: Address,
}

/// Immutable loan terms, written once at request time.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanTerms {
    pub id: u64,
    pub borrower: Address,
    pub amount: i128,
    pub interest_rate: u32,
    pub duration: u64,
    pub created_at: u64,
}

/// Mutable loan state, updated on every lifecycle transition.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoanState {
    pub status: LoanStatus,
    pub collateral: CollateralSlot,
}

/// Full on-chain representation of a loan.
///
/// Used as the public API return type; reconstructed internally from
/// the split `LoanTerms` + `LoanState` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Loan {
    /// Unique identifier, starting at 1.
    pub id: u64,
    /// Address that requested the loan; the only one allowed to act on it.
    pub borrower: Address,
    /// Principal disbursed to the borrower.
    pub amount: i128,
    /// Flat interest in whole percent of the principal.
    pub interest_rate: u32,
    /// Requested repayment window in seconds. Recorded, not enforced.
    pub duration: u64,
    /// Ledger timestamp at request time.
    pub created_at: u64,
    /// Escrowed asset; `Held` only while `Collateralized`.
    pub collateral: CollateralSlot,
    /// Current lifecycle status.
    pub status: LoanStatus,
}
