#![allow(dead_code)]

extern crate std;

use crate::types::{Loan, LoanStatus};

/// Principal is always positive.
pub fn assert_amount_positive(loan: &Loan) {
    assert!(
        loan.amount > 0,
        "loan {} has non-positive amount ({})",
        loan.id,
        loan.amount
    );
}

/// Ids start at 1; zero is never assigned.
pub fn assert_id_assigned(loan: &Loan) {
    assert!(loan.id > 0, "loan has unassigned id 0");
}

/// Collateral is present exactly while the loan is `Collateralized`.
pub fn assert_collateral_matches_status(loan: &Loan) {
    match loan.status {
        LoanStatus::Collateralized => assert!(
            loan.collateral.is_held(),
            "loan {} is Collateralized without collateral",
            loan.id
        ),
        LoanStatus::Requested | LoanStatus::Repaid => assert!(
            !loan.collateral.is_held(),
            "loan {} is {:?} but still references collateral",
            loan.id,
            loan.status
        ),
    }
}

/// Only forward transitions are allowed:
///   Requested      -> Collateralized
///   Collateralized -> Repaid
///   Repaid         -> (none)
/// Staying in the same status is not a transition and is accepted.
pub fn assert_valid_status_transition(from: &LoanStatus, to: &LoanStatus) {
    let valid = from == to
        || matches!(
            (from, to),
            (LoanStatus::Requested, LoanStatus::Collateralized)
                | (LoanStatus::Collateralized, LoanStatus::Repaid)
        );

    assert!(
        valid,
        "invalid status transition from {:?} to {:?}",
        from, to
    );
}

/// Terms fixed at request time never change.
pub fn assert_terms_unchanged(original: &Loan, current: &Loan) {
    assert_eq!(original.id, current.id, "loan id changed");
    assert_eq!(original.borrower, current.borrower, "loan borrower changed");
    assert_eq!(original.amount, current.amount, "loan amount changed");
    assert_eq!(
        original.interest_rate, current.interest_rate,
        "loan interest_rate changed"
    );
    assert_eq!(original.duration, current.duration, "loan duration changed");
    assert_eq!(
        original.created_at, current.created_at,
        "loan created_at changed"
    );
}

/// Loans listed in creation order carry ids 1, 2, 3, ...
pub fn assert_sequential_ids(loans: &[Loan]) {
    for (i, loan) in loans.iter().enumerate() {
        assert_eq!(
            loan.id,
            i as u64 + 1,
            "expected id {}, got {}",
            i + 1,
            loan.id
        );
    }
}

/// Repayment is principal plus `rate` whole percent of principal.
pub fn assert_repayment_formula(loan: &Loan, repayment: i128) {
    let expected = loan.amount + loan.amount * loan.interest_rate as i128 / 100;
    assert_eq!(
        repayment, expected,
        "loan {} repayment {} != {}",
        loan.id, repayment, expected
    );
}

/// Run all stateless loan invariants.
pub fn assert_all_loan_invariants(loan: &Loan) {
    assert_amount_positive(loan);
    assert_id_assigned(loan);
    assert_collateral_matches_status(loan);
}
