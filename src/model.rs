//! Core domain types for the donation flow.

use std::fmt;

use crate::Amount;

/// Preset amounts offered on the amount step, in major units.
pub const PRESET_AMOUNTS: [i64; 6] = [25, 50, 100, 250, 500, 1000];

/// Amount used when the modal is opened without a preset.
pub const DEFAULT_PRESET: Amount = Amount::from_major_units(50);

/// Heading shown when the donation is not tied to a campaign.
pub const DEFAULT_CAMPAIGN_HEADING: &str = "Help hospitalized children with cancer";

/// The amount, frequency and campaign a donor is about to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationIntent {
    pub amount: Amount,
    pub is_monthly: bool,
    pub campaign: Option<String>,
}

impl DonationIntent {
    /// Create a one-time intent. An empty campaign label is stored as absent.
    pub fn new(amount: Amount, campaign: Option<&str>) -> Self {
        Self {
            amount,
            is_monthly: false,
            campaign: campaign
                .filter(|label| !label.is_empty())
                .map(str::to_owned),
        }
    }

    /// Heading for the campaign card.
    pub fn heading(&self) -> &str {
        self.campaign.as_deref().unwrap_or(DEFAULT_CAMPAIGN_HEADING)
    }
}

impl Default for DonationIntent {
    fn default() -> Self {
        Self::new(DEFAULT_PRESET, None)
    }
}

/// Step of the donation modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalStep {
    /// Choosing amount and frequency.
    #[default]
    Amount,
    /// Hosted payment widget is shown; the intent is frozen.
    Payment,
}

impl fmt::Display for ModalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModalStep::Amount => f.write_str("amount"),
            ModalStep::Payment => f.write_str("payment"),
        }
    }
}
