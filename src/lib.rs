pub mod amount;
pub mod config;
pub mod modal;
pub mod model;
pub mod session;
pub mod submission;
pub mod thank_you;

pub use amount::Amount;
pub use modal::DonationModal;
pub use model::{DonationIntent, ModalStep};
pub use thank_you::{Reconciler, ThankYouOutcome, ThankYouView};
