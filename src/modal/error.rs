//! Error types for the donation modal.

use thiserror::Error;

use crate::Amount;
use crate::model::ModalStep;

/// Message shown under the amount field when validation fails.
pub const AMOUNT_ERROR_MESSAGE: &str = "Please select an amount";

/// Error returned by [`DonationModal::apply`](super::DonationModal::apply).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModalError {
    #[error("modal is closed")]
    Closed,

    #[error("amount {0} is below the minimum of {min}", min = Amount::MINIMUM)]
    AmountBelowMinimum(Amount),

    #[error("donation intent is frozen during the payment step")]
    IntentFrozen,

    #[error("{event} is not valid from the {step} step")]
    InvalidTransition {
        step: ModalStep,
        event: &'static str,
    },
}
