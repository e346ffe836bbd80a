//! Status guard: may this payment's activity date still be corrected?

use thiserror::Error;

use billfix_core::PaymentId;

use crate::payment::{Payment, PaymentStatus};

/// Statuses after which a payment is part of the financial record.
pub const TERMINAL_STATUSES: [PaymentStatus; 2] = [PaymentStatus::Released, PaymentStatus::Credited];

/// Rejection naming the status that blocked the correction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("the payment is in the {status} state")]
pub struct GuardRejection {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
}

/// Pure predicate over a payment's current status. Holds no state, so every
/// record in a batch is judged independently.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusGuard;

impl StatusGuard {
    pub fn allows(status: PaymentStatus) -> bool {
        !TERMINAL_STATUSES.contains(&status)
    }

    pub fn check(payment: &Payment) -> Result<(), GuardRejection> {
        if Self::allows(payment.status()) {
            Ok(())
        } else {
            Err(GuardRejection {
                payment_id: payment.id_typed(),
                status: payment.status(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billfix_core::{ClinicDetailStudyId, Protocol};
    use proptest::prelude::*;

    fn payment_in(status: PaymentStatus) -> Payment {
        Payment::new(
            PaymentId::new(),
            Protocol::parse("P-1").unwrap(),
            ClinicDetailStudyId::new(),
            status,
            100,
        )
    }

    #[test]
    fn rejection_message_names_the_status() {
        let err = StatusGuard::check(&payment_in(PaymentStatus::Released)).unwrap_err();
        assert_eq!(err.to_string(), "the payment is in the released state");
    }

    #[test]
    fn sibling_decisions_are_independent() {
        let credited = payment_in(PaymentStatus::Credited);
        let approved = payment_in(PaymentStatus::Approved);
        assert!(StatusGuard::check(&credited).is_err());
        assert!(StatusGuard::check(&approved).is_ok());
        assert!(StatusGuard::check(&credited).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: the guard rejects exactly the terminal statuses.
        #[test]
        fn guard_rejects_exactly_terminal_statuses(idx in 0usize..PaymentStatus::ALL.len()) {
            let status = PaymentStatus::ALL[idx];
            let decision = StatusGuard::check(&payment_in(status));
            let terminal = matches!(status, PaymentStatus::Released | PaymentStatus::Credited);
            prop_assert_eq!(decision.is_err(), terminal);
            if let Err(rejection) = decision {
                prop_assert_eq!(rejection.status, status);
            }
        }
    }
}
