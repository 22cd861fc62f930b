//! Canonical event types emitted by the loan registry contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/loan_registry/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the registry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A loan was opened and its principal paid out (`requested` topic).
    LoanRequested,
    /// Collateral was moved into escrow (`collat` topic).
    LoanCollateralized,
    /// Principal plus interest was collected and collateral released (`repaid` topic).
    LoanRepaid,
    /// Liquidity was added to the lending reserve (`funded` topic).
    ReserveFunded,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "requested" => Self::LoanRequested,
            "collat" => Self::LoanCollateralized,
            "repaid" => Self::LoanRepaid,
            "funded" => Self::ReserveFunded,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoanRequested => "loan_requested",
            Self::LoanCollateralized => "loan_collateralized",
            Self::LoanRepaid => "loan_repaid",
            Self::ReserveFunded => "reserve_funded",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`].
    pub fn from_stored(s: &str) -> Self {
        match s {
            "loan_requested" => Self::LoanRequested,
            "loan_collateralized" => Self::LoanCollateralized,
            "loan_repaid" => Self::LoanRepaid,
            "reserve_funded" => Self::ReserveFunded,
            _ => Self::Unknown,
        }
    }
}

/// A fully decoded registry event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanEvent {
    pub event_type: String,
    pub loan_id: Option<String>,
    /// Borrower for loan events, funder for reserve events.
    pub actor: Option<String>,
    /// Principal, repayment, or funding amount as a decimal string (i128).
    pub amount: Option<String>,
    /// Collateral asset id, when the event carries one.
    pub token_id: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub loan_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub token_id: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Lifecycle status as observed from indexed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Requested,
    Collateralized,
    Repaid,
}

/// Off-chain view of a single loan, folded from its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub loan_id: String,
    pub status: LoanStatus,
    pub borrower: Option<String>,
    /// Principal from the `requested` event.
    pub amount: Option<String>,
    /// Asset currently in escrow; `None` before collateralization and after repayment.
    pub token_id: Option<i64>,
    pub requested_ledger: Option<i64>,
    pub last_ledger: i64,
}

impl LoanSummary {
    /// Fold a loan's events (in ledger order) into its latest observed state.
    ///
    /// Returns `None` when `events` holds nothing the registry emits for a loan.
    /// Status only moves forward, so an out-of-order or replayed event never
    /// rewinds a loan.
    pub fn from_events(loan_id: &str, events: &[EventRecord]) -> Option<Self> {
        let mut summary: Option<LoanSummary> = None;

        for ev in events {
            let status = match EventKind::from_stored(&ev.event_type) {
                EventKind::LoanRequested => LoanStatus::Requested,
                EventKind::LoanCollateralized => LoanStatus::Collateralized,
                EventKind::LoanRepaid => LoanStatus::Repaid,
                EventKind::ReserveFunded | EventKind::Unknown => continue,
            };

            let entry = summary.get_or_insert_with(|| LoanSummary {
                loan_id: loan_id.to_string(),
                status,
                borrower: None,
                amount: None,
                token_id: None,
                requested_ledger: None,
                last_ledger: ev.ledger,
            });

            if entry.borrower.is_none() {
                entry.borrower = ev.actor.clone();
            }
            entry.last_ledger = entry.last_ledger.max(ev.ledger);

            match status {
                LoanStatus::Requested => {
                    entry.amount = ev.amount.clone();
                    entry.requested_ledger = Some(ev.ledger);
                }
                LoanStatus::Collateralized if entry.status != LoanStatus::Repaid => {
                    entry.token_id = ev.token_id;
                }
                LoanStatus::Repaid => entry.token_id = None,
                LoanStatus::Collateralized => {}
            }

            if rank(status) > rank(entry.status) {
                entry.status = status;
            }
        }

        summary
    }
}

fn rank(status: LoanStatus) -> u8 {
    match status {
        LoanStatus::Requested => 0,
        LoanStatus::Collateralized => 1,
        LoanStatus::Repaid => 2,
    }
}
